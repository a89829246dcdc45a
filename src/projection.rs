use crate::kmeans::SeededRng;
use crate::vectorizer::SparseMatrix;

const MAX_POWER_ITERATIONS: usize = 200;
const TOLERANCE: f64 = 1e-10;

/// Projects every row onto the first two principal components of the
/// column-centred matrix. Used for scatter plots of the clustered records.
pub fn project_2d(matrix: &SparseMatrix) -> Vec<[f64; 2]> {
    let n = matrix.n_rows();
    let d = matrix.n_cols;
    if n < 2 || d == 0 {
        return vec![[0.0, 0.0]; n];
    }

    let mut mean = vec![0.0; d];
    for row in &matrix.rows {
        for (i, v) in row.iter() { mean[i] += v; }
    }
    for m in &mut mean { *m /= n as f64; }

    let mut rng = SeededRng::new(0);
    let first = leading_component(matrix, &mean, &[], &mut rng);
    let second = match &first {
        Some(v1) => leading_component(matrix, &mean, std::slice::from_ref(v1), &mut rng),
        None => None,
    };

    let s1 = first.as_ref().map(|v| centred_product(matrix, &mean, v));
    let s2 = second.as_ref().map(|v| centred_product(matrix, &mean, v));
    (0..n)
        .map(|i| [
            s1.as_ref().map_or(0.0, |s| s[i]),
            s2.as_ref().map_or(0.0, |s| s[i]),
        ])
        .collect()
}

/// (X - 1·meanᵀ) v
fn centred_product(matrix: &SparseMatrix, mean: &[f64], v: &[f64]) -> Vec<f64> {
    let offset = dot(mean, v);
    matrix.rows.iter().map(|row| row.dot_dense(v) - offset).collect()
}

/// (X - 1·meanᵀ)ᵀ u
fn centred_transpose_product(matrix: &SparseMatrix, mean: &[f64], u: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; matrix.n_cols];
    for (row, &w) in matrix.rows.iter().zip(u) {
        for (i, v) in row.iter() { out[i] += v * w; }
    }
    let total: f64 = u.iter().sum();
    for (o, m) in out.iter_mut().zip(mean) { *o -= m * total; }
    out
}

fn leading_component(matrix: &SparseMatrix, mean: &[f64], found: &[Vec<f64>], rng: &mut SeededRng) -> Option<Vec<f64>> {
    let mut v: Vec<f64> = (0..matrix.n_cols).map(|_| rng.next_f64() - 0.5).collect();
    orthogonalize(&mut v, found);
    normalize(&mut v)?;

    for _ in 0..MAX_POWER_ITERATIONS {
        let u = centred_product(matrix, mean, &v);
        let mut next = centred_transpose_product(matrix, mean, &u);
        orthogonalize(&mut next, found);
        // a zero image means no variance is left outside `found`
        normalize(&mut next)?;
        let delta: f64 = next.iter().zip(&v).map(|(a, b)| (a - b).abs()).sum();
        v = next;
        if delta < TOLERANCE { break; }
    }

    // deterministic sign: the largest loading is positive
    let pivot = v.iter().copied().fold(0.0_f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
    if pivot < 0.0 { for x in &mut v { *x = -*x; } }
    Some(v)
}

fn orthogonalize(v: &mut [f64], basis: &[Vec<f64>]) {
    for b in basis {
        let p = dot(v, b);
        for (x, y) in v.iter_mut().zip(b) { *x -= p * y; }
    }
}

fn normalize(v: &mut [f64]) -> Option<()> {
    let norm = dot(v, v).sqrt();
    if norm < 1e-12 { return None; }
    for x in v.iter_mut() { *x /= norm; }
    Some(())
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
