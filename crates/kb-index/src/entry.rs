use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

lazy_static! {
    /// Prescriptive vocabulary that marks a snippet as normative guidance
    static ref IMPERATIVE_HINTS: Regex = Regex::new(
        r"(?i)\b(must|should|do not|avoid|use|write|spell|capitali[sz]e|heading|title case|inclusive|bias|accessible)\b"
    )
    .unwrap();
}

/// One curated guidance snippet, immutable after index build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KbEntry {
    pub entry_id: String,
    pub text: String,
    pub tags: Vec<String>,
    pub source_url: Option<String>,
    pub source_file: Option<String>,
}

impl KbEntry {
    /// Create an entry with a content-derived id and normalized tags
    pub fn new(text: impl Into<String>, mut tags: Vec<String>) -> Self {
        let text = text.into();
        tags.sort();
        tags.dedup();
        Self {
            entry_id: stable_id(&text),
            text,
            tags,
            source_url: None,
            source_file: None,
        }
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Content-derived stable identifier: first 12 hex chars of a SHA-256 digest
pub fn stable_id(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut id = String::with_capacity(12);
    for byte in digest.iter().take(6) {
        id.push_str(&format!("{:02x}", byte));
    }
    id
}

/// Keep only snippets likely to express a normative rule
pub fn is_rule_candidate(text: &str) -> bool {
    IMPERATIVE_HINTS.is_match(text)
}
