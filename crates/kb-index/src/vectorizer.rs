//! TF-IDF weighting over unigrams and bigrams.
//!
//! The vocabulary is assigned in sorted token order and the idf uses the
//! smoothed form `ln((1 + n) / (1 + df)) + 1`, so a fitted vectorizer is a
//! pure function of the corpus text. Vectors are L2-normalized, which makes
//! cosine similarity a plain sparse dot product.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\b\w\w+\b").unwrap();
}

/// Sparse document vector: (column, weight) pairs sorted by column
pub type SparseVector = Vec<(usize, f64)>;

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

/// Lowercase word tokens of two or more characters
fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    WORD.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
}

/// Unigrams plus adjacent bigrams joined with a single space
fn terms_of(text: &str) -> Vec<String> {
    let tokens = tokenize(text);
    let mut terms = Vec::with_capacity(tokens.len() * 2);
    terms.extend(tokens.iter().cloned());
    for pair in tokens.windows(2) {
        terms.push(format!("{} {}", pair[0], pair[1]));
    }
    terms
}

impl TfidfVectorizer {
    /// Fit vocabulary and idf weights over a corpus of texts
    pub fn fit(corpus: &[&str]) -> Self {
        let n_docs = corpus.len();
        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        for text in corpus {
            let unique: BTreeSet<String> = terms_of(text).into_iter().collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        // BTreeMap iteration fixes column order independent of insertion order
        let sorted: BTreeMap<String, usize> = document_frequency
            .keys()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(idx, term)| (term, idx))
            .collect();

        let mut idf = vec![0.0; sorted.len()];
        for (term, &idx) in &sorted {
            let df = document_frequency[term];
            idf[idx] = ((1.0 + n_docs as f64) / (1.0 + df as f64)).ln() + 1.0;
        }

        Self {
            vocabulary: sorted,
            idf,
        }
    }

    /// Rebuild a vectorizer from persisted vocabulary and idf weights
    pub fn from_parts(vocabulary: BTreeMap<String, usize>, idf: Vec<f64>) -> Option<Self> {
        if vocabulary.len() != idf.len() {
            return None;
        }
        if vocabulary.values().any(|&idx| idx >= idf.len()) {
            return None;
        }
        Some(Self { vocabulary, idf })
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Transform text into an L2-normalized TF-IDF vector.
    ///
    /// Terms outside the fitted vocabulary are ignored; text with no known
    /// terms yields an empty vector.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in terms_of(text) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut vector: SparseVector = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .collect();

        let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in vector.iter_mut() {
                *w /= norm;
            }
        }
        vector
    }
}

/// Dot product of two sorted sparse vectors; cosine similarity once both
/// sides are normalized
pub fn sparse_dot(a: &SparseVector, b: &SparseVector) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut sum = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}
