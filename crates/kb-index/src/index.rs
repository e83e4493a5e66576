//! Searchable TF-IDF index with a JSON snapshot round trip.
//!
//! The snapshot stores entries, vocabulary and idf weights only; document
//! vectors are reconstructed from entry texts on load, so
//! `load(save(index))` ranks any fixed query identically.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entry::{is_rule_candidate, KbEntry};
use crate::error::KbError;
use crate::vectorizer::{sparse_dot, SparseVector, TfidfVectorizer};

/// Persisted snapshot layout
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    entries: Vec<KbEntry>,
    vocabulary: BTreeMap<String, usize>,
    idf_weights: Vec<f64>,
}

/// Read-only term-weighted index over the guidance corpus.
///
/// Built once offline, then shared across audit runs; queries never mutate
/// it, so sharing a reference across threads is safe.
#[derive(Debug)]
pub struct KbIndex {
    entries: Vec<KbEntry>,
    vectorizer: TfidfVectorizer,
    doc_vectors: Vec<SparseVector>,
}

impl KbIndex {
    /// Build an index from candidate snippets.
    ///
    /// Snippets that do not pass the imperative-language filter are dropped
    /// before fitting, keeping the index compact and rule-relevant.
    pub fn build(candidates: Vec<KbEntry>) -> Result<Self, KbError> {
        let entries: Vec<KbEntry> = candidates
            .into_iter()
            .filter(|e| is_rule_candidate(&e.text))
            .collect();
        if entries.is_empty() {
            return Err(KbError::EmptyCorpus);
        }

        let corpus: Vec<&str> = entries.iter().map(|e| e.text.as_str()).collect();
        let vectorizer = TfidfVectorizer::fit(&corpus);
        let doc_vectors = entries
            .iter()
            .map(|e| vectorizer.transform(&e.text))
            .collect();

        Ok(Self {
            entries,
            vectorizer,
            doc_vectors,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[KbEntry] {
        &self.entries
    }

    /// Serialize vocabulary, idf weights and entry metadata to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), KbError> {
        let snapshot = Snapshot {
            entries: self.entries.clone(),
            vocabulary: self.vectorizer.vocabulary().clone(),
            idf_weights: self.vectorizer.idf().to_vec(),
        };
        let json = serde_json::to_string(&snapshot)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a snapshot and deterministically rebuild document vectors
    pub fn load(path: &Path) -> Result<Self, KbError> {
        let raw = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&raw)?;
        let vectorizer = TfidfVectorizer::from_parts(snapshot.vocabulary, snapshot.idf_weights)
            .ok_or_else(|| {
                KbError::InconsistentSnapshot(
                    "vocabulary and idf weights are not aligned".to_string(),
                )
            })?;
        let doc_vectors = snapshot
            .entries
            .iter()
            .map(|e| vectorizer.transform(&e.text))
            .collect();
        Ok(Self {
            entries: snapshot.entries,
            vectorizer,
            doc_vectors,
        })
    }

    /// Rank entries by cosine similarity to the query.
    ///
    /// With a tag filter, at most `3 * k` ranked candidates are scanned
    /// before giving up, so a sparse index cannot starve filtered queries
    /// indefinitely. Empty or whitespace queries return no matches without
    /// touching the vector machinery.
    pub fn search(
        &self,
        query: &str,
        k: usize,
        tag_filter: Option<&str>,
    ) -> Vec<(&KbEntry, f64)> {
        if query.trim().is_empty() || k == 0 {
            return Vec::new();
        }

        let query_vector = self.vectorizer.transform(query);
        let mut ranked: Vec<(usize, f64)> = self
            .doc_vectors
            .iter()
            .enumerate()
            .map(|(idx, doc)| (idx, sparse_dot(&query_vector, doc)))
            .collect();
        // Descending similarity, ascending entry index on ties
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut results = Vec::with_capacity(k);
        for &(idx, similarity) in ranked.iter().take(k.saturating_mul(3)) {
            let entry = &self.entries[idx];
            if let Some(tag) = tag_filter {
                if !entry.has_tag(tag) {
                    continue;
                }
            }
            results.push((entry, similarity));
            if results.len() >= k {
                break;
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_entries() -> Vec<KbEntry> {
        vec![
            KbEntry::new(
                "Level 2 headings must use title case.",
                vec!["heading".to_string(), "title case".to_string()],
            ),
            KbEntry::new(
                "Avoid placing citations inside headings.",
                vec!["citation".to_string(), "heading".to_string()],
            ),
            KbEntry::new(
                "Use inclusive language and avoid bias.",
                vec!["bias".to_string(), "inclusive".to_string()],
            ),
            KbEntry::new(
                "Spell out Latin abbreviations in running text.",
                vec!["abbreviation".to_string()],
            ),
        ]
    }

    #[test]
    fn test_build_filters_non_imperative_snippets() {
        let mut candidates = sample_entries();
        candidates.push(KbEntry::new(
            "The annual meeting took place in Chicago.",
            vec![],
        ));
        let index = KbIndex::build(candidates).unwrap();
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_build_rejects_empty_corpus() {
        let result = KbIndex::build(vec![KbEntry::new("Nothing normative here at all?", vec![])]);
        assert!(matches!(result, Err(KbError::EmptyCorpus)));
    }

    #[test]
    fn test_self_query_ranks_first_with_unit_similarity() {
        let index = KbIndex::build(sample_entries()).unwrap();
        let hits = index.search("Level 2 headings must use title case.", 3, None);
        assert!(!hits.is_empty());
        let (best, similarity) = &hits[0];
        assert_eq!(best.text, "Level 2 headings must use title case.");
        assert!((similarity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_query_short_circuits() {
        let index = KbIndex::build(sample_entries()).unwrap();
        assert!(index.search("", 3, None).is_empty());
        assert!(index.search("   \n\t", 3, None).is_empty());
    }

    #[test]
    fn test_tag_filter_skips_unrelated_entries() {
        let index = KbIndex::build(sample_entries()).unwrap();
        let hits = index.search("headings title case citations", 2, Some("citation"));
        assert!(!hits.is_empty());
        for (entry, _) in &hits {
            assert!(entry.has_tag("citation"));
        }
    }

    #[test]
    fn test_tag_filter_scan_window_is_bounded() {
        let index = KbIndex::build(sample_entries()).unwrap();
        // No entry carries this tag; the bounded scan must return empty
        // rather than looping or panicking.
        let hits = index.search("title case", 1, Some("no-such-tag"));
        assert!(hits.is_empty());
    }

    #[test]
    fn test_save_load_preserves_rankings() {
        let dir = std::env::temp_dir().join("kb-index-roundtrip-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("kb_index.json");

        let index = KbIndex::build(sample_entries()).unwrap();
        index.save(&path).unwrap();
        let reloaded = KbIndex::load(&path).unwrap();

        for query in [
            "title case headings",
            "inclusive bias",
            "citations in headings",
        ] {
            let before: Vec<(String, f64)> = index
                .search(query, 3, None)
                .into_iter()
                .map(|(e, s)| (e.entry_id.clone(), s))
                .collect();
            let after: Vec<(String, f64)> = reloaded
                .search(query, 3, None)
                .into_iter()
                .map(|(e, s)| (e.entry_id.clone(), s))
                .collect();
            assert_eq!(before, after);
        }

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_rejects_misaligned_snapshot() {
        let dir = std::env::temp_dir().join("kb-index-misaligned-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.json");
        std::fs::write(
            &path,
            r#"{"entries":[],"vocabulary":{"alpha":0,"beta":1},"idf_weights":[1.0]}"#,
        )
        .unwrap();
        assert!(matches!(
            KbIndex::load(&path),
            Err(KbError::InconsistentSnapshot(_))
        ));
        std::fs::remove_file(&path).ok();
    }
}
