use crate::config::ClusteringConfig;
use crate::error::{Result, TriageError};
use crate::vectorizer::{SparseMatrix, SparseRow};
use rayon::prelude::*;

/// SplitMix64: small, seedable and stable across platforms and releases.
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    pub fn next_index(&mut self, n: usize) -> usize {
        ((self.next_f64() * n as f64) as usize).min(n.saturating_sub(1))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    pub labels: Vec<usize>,
    pub centroids: Vec<Vec<f64>>,
    pub inertia: f64,
    pub iterations: usize,
}

impl Clustering {
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centroids.len()];
        for &l in &self.labels { sizes[l] += 1; }
        sizes
    }
}

struct Centroid {
    coords: Vec<f64>,
    sq_norm: f64,
}

impl Centroid {
    fn from_row(row: &SparseRow, n_cols: usize) -> Self {
        let mut coords = vec![0.0; n_cols];
        for (i, v) in row.iter() { coords[i] = v; }
        Self { coords, sq_norm: row.squared_norm() }
    }

    fn from_coords(coords: Vec<f64>) -> Self {
        let sq_norm = coords.iter().map(|v| v * v).sum();
        Self { coords, sq_norm }
    }
}

fn sq_distance(row: &SparseRow, row_sq_norm: f64, c: &Centroid) -> f64 {
    (row_sq_norm - 2.0 * row.dot_dense(&c.coords) + c.sq_norm).max(0.0)
}

/// Partitions the rows of `matrix` into `config.clusters` groups.
///
/// Seeding is greedy k-means++ driven by `config.seed`, so identical input and
/// configuration always yield identical labels.
pub fn kmeans(matrix: &SparseMatrix, config: &ClusteringConfig) -> Result<Clustering> {
    let k = config.clusters;
    let n = matrix.n_rows();
    if k == 0 {
        return Err(TriageError::Config("clusters must be at least 1".into()));
    }
    let needed = k.max(2);
    if n < needed {
        return Err(TriageError::InsufficientRecords { got: n, needed, clusters: k });
    }

    let row_norms: Vec<f64> = matrix.rows.iter().map(SparseRow::squared_norm).collect();
    let mut rng = SeededRng::new(config.seed);
    let mut best: Option<Clustering> = None;
    for run in 0..config.n_init.max(1) {
        let centroids = kmeans_plus_plus(matrix, &row_norms, k, &mut rng);
        let result = lloyd(matrix, &row_norms, centroids, config.max_iter);
        tracing::debug!(run, inertia = result.inertia, iterations = result.iterations, "k-means run finished");
        if best.as_ref().map_or(true, |b| result.inertia < b.inertia) {
            best = Some(result);
        }
    }
    best.ok_or_else(|| TriageError::Config("n_init must be at least 1".into()))
}

fn kmeans_plus_plus(matrix: &SparseMatrix, row_norms: &[f64], k: usize, rng: &mut SeededRng) -> Vec<Centroid> {
    let n = matrix.n_rows();
    let n_cols = matrix.n_cols;
    let trials = 2 + (k as f64).ln() as usize;

    let first = rng.next_index(n);
    let mut centroids = vec![Centroid::from_row(&matrix.rows[first], n_cols)];
    let mut closest: Vec<f64> = matrix.rows.par_iter().zip(row_norms.par_iter())
        .map(|(row, &norm)| sq_distance(row, norm, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let potential: f64 = closest.iter().sum();
        let mut best: Option<(usize, Vec<f64>, f64)> = None;
        for _ in 0..trials {
            let candidate = if potential > 0.0 {
                sample_weighted(&closest, potential, rng)
            } else {
                rng.next_index(n)
            };
            let cand = Centroid::from_row(&matrix.rows[candidate], n_cols);
            let updated: Vec<f64> = matrix.rows.par_iter().zip(row_norms.par_iter()).zip(closest.par_iter())
                .map(|((row, &norm), &prev)| prev.min(sq_distance(row, norm, &cand)))
                .collect();
            let pot: f64 = updated.iter().sum();
            if best.as_ref().map_or(true, |(_, _, p)| pot < *p) {
                best = Some((candidate, updated, pot));
            }
        }
        if let Some((idx, updated, _)) = best {
            closest = updated;
            centroids.push(Centroid::from_row(&matrix.rows[idx], n_cols));
        }
    }
    centroids
}

fn sample_weighted(weights: &[f64], total: f64, rng: &mut SeededRng) -> usize {
    let target = rng.next_f64() * total;
    let mut acc = 0.0;
    for (i, w) in weights.iter().enumerate() {
        acc += w;
        if acc > target { return i; }
    }
    // rounding can leave target just past the last partial sum
    weights.iter().rposition(|w| *w > 0.0).unwrap_or(weights.len() - 1)
}

fn assign(matrix: &SparseMatrix, row_norms: &[f64], centroids: &[Centroid]) -> Vec<(usize, f64)> {
    matrix.rows.par_iter().zip(row_norms.par_iter())
        .map(|(row, &norm)| {
            let mut best = (0usize, f64::INFINITY);
            for (c, centroid) in centroids.iter().enumerate() {
                let d = sq_distance(row, norm, centroid);
                if d < best.1 { best = (c, d); }
            }
            best
        })
        .collect()
}

fn lloyd(matrix: &SparseMatrix, row_norms: &[f64], mut centroids: Vec<Centroid>, max_iter: usize) -> Clustering {
    let k = centroids.len();
    let n_cols = matrix.n_cols;
    let mut labels: Vec<usize> = Vec::new();
    let mut distances: Vec<f64>;
    let mut iterations = 0;

    loop {
        let assigned = assign(matrix, row_norms, &centroids);
        let new_labels: Vec<usize> = assigned.iter().map(|(l, _)| *l).collect();
        distances = assigned.iter().map(|(_, d)| *d).collect();
        let converged = new_labels == labels;
        labels = new_labels;
        if converged || iterations >= max_iter { break; }
        iterations += 1;

        let mut sums = vec![vec![0.0; n_cols]; k];
        let mut counts = vec![0usize; k];
        for (row, &l) in matrix.rows.iter().zip(&labels) {
            counts[l] += 1;
            for (i, v) in row.iter() { sums[l][i] += v; }
        }

        // empty clusters take the points farthest from their current centroid
        let mut far: Vec<usize> = (0..labels.len()).collect();
        far.sort_by(|&a, &b| distances[b].total_cmp(&distances[a]).then(a.cmp(&b)));
        let mut far = far.into_iter();

        centroids = sums.into_iter().zip(&counts).enumerate()
            .map(|(c, (sum, &count))| {
                if count > 0 {
                    Centroid::from_coords(sum.into_iter().map(|v| v / count as f64).collect())
                } else {
                    match far.next() {
                        Some(idx) => {
                            tracing::debug!(cluster = c, row = idx, "re-seeding empty cluster");
                            Centroid::from_row(&matrix.rows[idx], n_cols)
                        }
                        None => Centroid::from_coords(vec![0.0; n_cols]),
                    }
                }
            })
            .collect();
    }

    let inertia = distances.iter().sum();
    Clustering {
        labels,
        centroids: centroids.into_iter().map(|c| c.coords).collect(),
        inertia,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rng_is_reproducible() {
        let mut a = SeededRng::new(42);
        let mut b = SeededRng::new(42);
        for _ in 0..100 { assert_eq!(a.next_u64(), b.next_u64()); }
        let mut c = SeededRng::new(7);
        for _ in 0..1000 {
            let x = c.next_f64();
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn weighted_sampling_skips_zero_weights() {
        let mut rng = SeededRng::new(1);
        for _ in 0..200 {
            let i = sample_weighted(&[0.0, 3.0, 0.0, 1.0], 4.0, &mut rng);
            assert!(i == 1 || i == 3);
        }
    }
}
