//! Three-tier rule evaluation.
//!
//! Layers are run in order for every block:
//! 1. Structural (L1) - block-shape rules, currently heading rules
//! 2. Pattern (L2) - independent regex detectors over raw block text
//! 3. Linguistic heuristic (L3) - per-sentence checks over the analyzed
//!    document, mapped back to the owning block

pub mod heuristic;
pub mod pattern;
pub mod structural;

pub use heuristic::{HeuristicConfig, HeuristicRegistry};
pub use pattern::PatternRegistry;
pub use structural::StructuralRegistry;

use shared_types::Severity;

/// A raised finding before layer/location stamping and KB enrichment
#[derive(Debug, Clone)]
pub struct Finding {
    pub rule_id: String,
    pub tags: Vec<String>,
    pub severity: Severity,
    pub message: String,
    pub excerpt: Option<String>,
    pub span: Option<(usize, usize)>,
    pub suggested_fix: Option<String>,
}

impl Finding {
    pub fn new(rule_id: &str, tags: &[&str], severity: Severity, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            severity,
            message: message.into(),
            excerpt: None,
            span: None,
            suggested_fix: None,
        }
    }

    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = Some(excerpt.into());
        self
    }

    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.span = Some((start, end));
        self
    }

    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = Some(fix.into());
        self
    }
}
