//! Layer 1 - structural rules.
//!
//! A registry of (block predicate, evaluator) pairs. Both current rules
//! fire on headings only, but the registry accepts evaluators for any
//! block shape.

use shared_types::{Block, BlockKind, Severity};

use crate::layers::Finding;
use crate::titlecase::{is_title_case, to_title_case};

pub type BlockPredicate = fn(&Block) -> bool;
pub type BlockEvaluator = fn(&Block) -> Vec<Finding>;

pub struct StructuralRegistry {
    rules: Vec<(BlockPredicate, BlockEvaluator)>,
}

impl StructuralRegistry {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn register(&mut self, predicate: BlockPredicate, evaluator: BlockEvaluator) {
        self.rules.push((predicate, evaluator));
    }

    /// Run every applicable evaluator against one block
    pub fn run(&self, block: &Block) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (predicate, evaluator) in &self.rules {
            if predicate(block) {
                findings.extend(evaluator(block));
            }
        }
        findings
    }
}

impl Default for StructuralRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(is_heading, check_heading_title_case);
        registry.register(is_heading, check_citation_in_heading);
        registry
    }
}

fn is_heading(block: &Block) -> bool {
    block.kind == BlockKind::Heading
}

/// Level-2 headings must follow headline capitalization
fn check_heading_title_case(block: &Block) -> Vec<Finding> {
    if block.level != Some(2) || is_title_case(&block.text) {
        return Vec::new();
    }
    vec![
        Finding::new(
            "APS-H2-TITLECASE",
            &["heading", "level-2-heading", "title-case"],
            Severity::Warning,
            "Level 2 headings must be in Title Case.",
        )
        .with_excerpt(&block.text)
        .with_fix(format!(
            "\u{201c}{}\u{201d} \u{2192} \u{201c}{}\u{201d}.",
            block.text,
            to_title_case(&block.text)
        )),
    ]
}

/// Syntactic proxy for an inline citation: parentheses plus a digit
fn check_citation_in_heading(block: &Block) -> Vec<Finding> {
    let text = &block.text;
    if text.contains('(') && text.contains(')') && text.chars().any(|c| c.is_ascii_digit()) {
        vec![
            Finding::new(
                "APS-NO-CITATION-IN-HEADING",
                &["heading", "citation"],
                Severity::Warning,
                "Avoid including citations inside headings.",
            )
            .with_excerpt(text)
            .with_fix("Move the citation out of the heading and place it in the body text."),
        ]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn h2(text: &str) -> Block {
        Block::heading(2, text)
    }

    #[test]
    fn test_proper_title_case_raises_nothing() {
        let registry = StructuralRegistry::default();
        assert!(registry.run(&h2("A Study of Results")).is_empty());
    }

    #[test]
    fn test_title_case_violation_includes_fix() {
        let registry = StructuralRegistry::default();
        let findings = registry.run(&h2("A study of the Results"));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "APS-H2-TITLECASE");
        let fix = findings[0].suggested_fix.as_deref().unwrap();
        assert!(fix.contains("A Study of the Results"));
    }

    #[test]
    fn test_title_case_only_applies_to_level_two() {
        let registry = StructuralRegistry::default();
        assert!(registry.run(&Block::heading(3, "a lowercase heading")).is_empty());
        assert!(registry.run(&Block::heading(1, "a lowercase heading")).is_empty());
    }

    #[test]
    fn test_citation_in_heading_detected_at_any_level() {
        let registry = StructuralRegistry::default();
        let findings = registry.run(&Block::heading(3, "Background (Smith, 2019)"));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "APS-NO-CITATION-IN-HEADING");
    }

    #[test]
    fn test_parentheses_without_digits_pass() {
        let registry = StructuralRegistry::default();
        assert!(registry
            .run(&Block::heading(3, "Methods (and Their Limits)"))
            .is_empty());
    }

    #[test]
    fn test_non_heading_blocks_are_ignored() {
        let registry = StructuralRegistry::default();
        assert!(registry
            .run(&Block::paragraph("a lowercase sentence (Smith, 2019)"))
            .is_empty());
    }
}
