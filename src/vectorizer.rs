use crate::config::VectorizerConfig;
use crate::error::{Result, TriageError};
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static RE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").unwrap());

pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst", "an",
    "and", "another", "any", "anyhow", "anyone", "anything", "anyway", "anywhere", "are", "around",
    "as", "at", "back", "be", "became", "because", "become", "becomes", "becoming", "been",
    "before", "beforehand", "behind", "being", "below", "beside", "besides", "between", "beyond",
    "both", "but", "by", "can", "cannot", "could", "do", "done", "down", "due", "during", "each",
    "eg", "either", "else", "elsewhere", "enough", "etc", "even", "ever", "every", "everyone",
    "everything", "everywhere", "except", "few", "for", "former", "formerly", "from", "further",
    "had", "has", "have", "he", "hence", "her", "here", "hereafter", "hereby", "herein", "hers",
    "herself", "him", "himself", "his", "how", "however", "ie", "if", "in", "indeed", "into", "is",
    "it", "its", "itself", "just", "last", "latter", "latterly", "least", "less", "ltd", "made",
    "many", "may", "me", "meanwhile", "might", "mine", "more", "moreover", "most", "mostly",
    "much", "must", "my", "myself", "namely", "neither", "never", "nevertheless", "next", "no",
    "nobody", "none", "noone", "nor", "not", "nothing", "now", "nowhere", "of", "off", "often",
    "on", "once", "only", "onto", "or", "other", "others", "otherwise", "our", "ours", "ourselves",
    "out", "over", "own", "per", "perhaps", "please", "rather", "re", "same", "seem", "seemed",
    "seeming", "seems", "several", "she", "should", "since", "so", "some", "somehow", "someone",
    "something", "sometime", "sometimes", "somewhere", "still", "such", "than", "that", "the",
    "their", "them", "themselves", "then", "thence", "there", "thereafter", "thereby", "therefore",
    "therein", "thereupon", "these", "they", "this", "those", "though", "through", "throughout",
    "thru", "thus", "to", "together", "too", "toward", "towards", "under", "until", "up", "upon",
    "us", "very", "via", "was", "we", "well", "were", "what", "whatever", "when", "whence",
    "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon", "wherever",
    "whether", "which", "while", "whither", "who", "whoever", "whole", "whom", "whose", "why",
    "will", "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

/// One row of a sparse matrix; `indices` is strictly increasing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseRow {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl SparseRow {
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn dot_dense(&self, dense: &[f64]) -> f64 {
        self.iter().map(|(i, v)| v * dense[i]).sum()
    }

    pub fn squared_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseMatrix {
    pub n_cols: usize,
    pub rows: Vec<SparseRow>,
}

impl SparseMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn to_dense_row(&self, row: usize) -> Vec<f64> {
        let mut out = vec![0.0; self.n_cols];
        for (i, v) in self.rows[row].iter() { out[i] = v; }
        out
    }
}

/// Fitted term-frequency / inverse-document-frequency model.
#[derive(Debug, Clone)]
pub struct TfidfModel {
    /// Column order: vocabulary terms sorted alphabetically.
    pub vocabulary: Vec<String>,
    pub idf: Vec<f64>,
    index: AHashMap<String, usize>,
    stop_words: AHashSet<String>,
    ngram_min: usize,
    ngram_max: usize,
}

impl TfidfModel {
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn transform<S: AsRef<str>>(&self, docs: &[S]) -> SparseMatrix {
        let rows = docs.iter().map(|d| {
            let terms = analyze(d.as_ref(), &self.stop_words, self.ngram_min, self.ngram_max);
            let mut tf: BTreeMap<usize, f64> = BTreeMap::new();
            for t in terms {
                if let Some(&col) = self.index.get(&t) { *tf.entry(col).or_insert(0.0) += 1.0; }
            }
            let mut row = SparseRow::default();
            for (col, count) in tf {
                row.indices.push(col);
                row.values.push(count * self.idf[col]);
            }
            let norm = row.squared_norm().sqrt();
            if norm > 0.0 { for v in &mut row.values { *v /= norm; } }
            row
        }).collect();
        SparseMatrix { n_cols: self.vocabulary.len(), rows }
    }
}

pub fn tokenize(text: &str, stop_words: &AHashSet<String>) -> Vec<String> {
    let lower = text.to_lowercase();
    RE_TOKEN.find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .filter(|t| !stop_words.contains(t))
        .collect()
}

fn analyze(text: &str, stop_words: &AHashSet<String>, ngram_min: usize, ngram_max: usize) -> Vec<String> {
    let tokens = tokenize(text, stop_words);
    let mut out = Vec::new();
    for n in ngram_min..=ngram_max {
        if n == 1 {
            out.extend(tokens.iter().cloned());
        } else {
            out.extend(tokens.windows(n).map(|w| w.iter().join(" ")));
        }
    }
    out
}

fn stop_word_set(config: &VectorizerConfig) -> AHashSet<String> {
    match &config.stop_words {
        Some(words) => words.iter().map(|w| w.to_lowercase()).collect(),
        None => ENGLISH_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
    }
}

pub fn fit<S: AsRef<str>>(docs: &[S], config: &VectorizerConfig) -> Result<TfidfModel> {
    let stop_words = stop_word_set(config);
    let analyzed: Vec<Vec<String>> = docs.iter()
        .map(|d| analyze(d.as_ref(), &stop_words, config.ngram_min, config.ngram_max))
        .collect();

    let mut corpus_counts: AHashMap<&str, usize> = AHashMap::new();
    let mut doc_freq: AHashMap<&str, usize> = AHashMap::new();
    for terms in &analyzed {
        for t in terms { *corpus_counts.entry(t.as_str()).or_insert(0) += 1; }
        for t in terms.iter().map(String::as_str).unique() { *doc_freq.entry(t).or_insert(0) += 1; }
    }
    if corpus_counts.is_empty() {
        return Err(TriageError::EmptyVocabulary);
    }

    let vocabulary: Vec<String> = corpus_counts.iter()
        .sorted_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)))
        .take(config.max_features)
        .map(|(t, _)| t.to_string())
        .sorted()
        .collect();

    let n = docs.len() as f64;
    let idf: Vec<f64> = vocabulary.iter()
        .map(|t| {
            let df = doc_freq.get(t.as_str()).copied().unwrap_or(0) as f64;
            ((1.0 + n) / (1.0 + df)).ln() + 1.0
        })
        .collect();
    let index = vocabulary.iter().enumerate().map(|(i, t)| (t.clone(), i)).collect();
    tracing::debug!(terms = vocabulary.len(), docs = docs.len(), "fitted vocabulary");

    Ok(TfidfModel {
        vocabulary,
        idf,
        index,
        stop_words,
        ngram_min: config.ngram_min,
        ngram_max: config.ngram_max,
    })
}

pub fn fit_transform<S: AsRef<str>>(docs: &[S], config: &VectorizerConfig) -> Result<(TfidfModel, SparseMatrix)> {
    let model = fit(docs, config)?;
    let matrix = model.transform(docs);
    Ok((model, matrix))
}
