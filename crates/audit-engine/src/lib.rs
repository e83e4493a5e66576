//! Audit engine - layered style/grammar auditing of prose documents
//!
//! This crate provides:
//! - A markdown block parser (headings, paragraphs, list items, code)
//! - Three rule layers: structural (L1), pattern (L2), linguistic
//!   heuristic (L3)
//! - Report assembly with knowledge-base enrichment and atomic emission
//!
//! Analysis is synchronous and pure: the same input text and knowledge
//! base always produce the identical issue sequence.

pub mod analysis;
pub mod error;
pub mod layers;
pub mod parser;
pub mod report;
pub mod titlecase;

use std::collections::BTreeSet;

use shared_types::{Block, Issue, IssueLocation, Layer, PageMeta, Report, Span};

pub use error::AuditError;
pub use layers::{Finding, HeuristicConfig, HeuristicRegistry, PatternRegistry, StructuralRegistry};
pub use report::{write_reports, ReportBuilder, ReportPaths};

/// Parsed blocks plus the stamped issues they produced
#[derive(Debug)]
pub struct Analysis {
    pub blocks: Vec<Block>,
    pub issues: Vec<Issue>,
}

/// AuditEngine entry point.
///
/// Rule registries are constructed once and passed in (or defaulted); the
/// engine holds no mutable state across runs.
pub struct AuditEngine {
    structural: StructuralRegistry,
    pattern: PatternRegistry,
    heuristic: HeuristicRegistry,
    heuristic_config: HeuristicConfig,
}

impl AuditEngine {
    pub fn new() -> Self {
        Self {
            structural: StructuralRegistry::default(),
            pattern: PatternRegistry::default(),
            heuristic: HeuristicRegistry::default(),
            heuristic_config: HeuristicConfig::default(),
        }
    }

    pub fn with_registries(
        structural: StructuralRegistry,
        pattern: PatternRegistry,
        heuristic: HeuristicRegistry,
        heuristic_config: HeuristicConfig,
    ) -> Self {
        Self {
            structural,
            pattern,
            heuristic,
            heuristic_config,
        }
    }

    /// Parse the document and run all three layers.
    ///
    /// Issues come out grouped per block in document order: L1, then L2,
    /// then the L3 findings attributed to that block.
    pub fn analyze(&self, text: &str) -> Analysis {
        let blocks = parser::parse(text);
        let heuristic_by_block = self.heuristic_findings(&blocks);

        let mut issues = Vec::new();
        for (block_index, block) in blocks.iter().enumerate() {
            let location = IssueLocation {
                block_kind: block.kind,
                level: block.level,
                line_start: block.line_start,
            };

            for finding in self.structural.run(block) {
                issues.push(stamp(finding, Layer::L1, &location));
            }

            for mut finding in self.pattern.run(&block.text) {
                // Pattern findings carry the matched slice; widen the
                // excerpt to the block text for reviewer context.
                finding.excerpt = Some(truncate_chars(&block.text, 240));
                issues.push(stamp(finding, Layer::L2, &location));
            }

            for finding in heuristic_by_block
                .iter()
                .filter(|(idx, _)| *idx == block_index)
                .map(|(_, f)| f.clone())
            {
                issues.push(stamp(finding, Layer::L3, &location));
            }
        }

        Analysis { blocks, issues }
    }

    /// Run the heuristic layer over the whole document at once.
    ///
    /// Findings are deduplicated per rule id by (block, line, offending
    /// text) and returned with their owning block index. The block index
    /// keeps blocks without line numbers from colliding with each other.
    fn heuristic_findings(&self, blocks: &[Block]) -> Vec<(usize, Finding)> {
        let sentences = analysis::analyze_blocks(blocks);
        let mut seen: BTreeSet<(String, usize, usize, String)> = BTreeSet::new();
        let mut findings = Vec::new();
        for sentence in &sentences {
            for finding in self.heuristic.run(sentence, &self.heuristic_config) {
                let line = sentence.line.unwrap_or(0);
                let offending = finding.excerpt.clone().unwrap_or_default();
                let key = (
                    finding.rule_id.clone(),
                    sentence.block_index,
                    line,
                    offending,
                );
                if seen.insert(key) {
                    findings.push((sentence.block_index, finding));
                }
            }
        }
        findings
    }

    /// Full pipeline: analyze, enrich with KB matches, assemble the report
    pub fn audit(
        &self,
        page: PageMeta,
        text: &str,
        kb: Option<&kb_index::KbIndex>,
    ) -> Report {
        let analysis = self.analyze(text);
        ReportBuilder::new(kb).build(page, analysis.issues)
    }
}

impl Default for AuditEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn stamp(finding: Finding, layer: Layer, location: &IssueLocation) -> Issue {
    let mut tags = finding.tags;
    tags.sort();
    tags.dedup();
    Issue {
        rule_id: finding.rule_id,
        layer,
        severity: finding.severity,
        tags,
        message: finding.message,
        excerpt: finding.excerpt,
        span: finding.span.map(|(start, end)| Span { start, end }),
        suggested_fix: finding.suggested_fix,
        location: location.clone(),
        kb_matches: Vec::new(),
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
# A Study of Results

## A study of the Results

Earlier work (Smith, 2019) is widely cited. Smith et al found the effect.

- The experiment was conducted by assistants.
";

    #[test]
    fn test_engine_detects_issues_across_layers() {
        let engine = AuditEngine::new();
        let analysis = engine.analyze(SAMPLE);

        let rule_ids: Vec<&str> = analysis.issues.iter().map(|i| i.rule_id.as_str()).collect();
        assert!(rule_ids.contains(&"APS-H2-TITLECASE"));
        assert!(rule_ids.contains(&"REGEX-CITATION-YEAR"));
        assert!(rule_ids.contains(&"APS-ET-AL-PERIOD"));
        assert!(rule_ids.contains(&"HEUR-PASSIVE-VOICE"));
    }

    #[test]
    fn test_citation_year_raised_exactly_once() {
        let engine = AuditEngine::new();
        let analysis = engine.analyze("Some prose with a citation (Smith, 2019) inside.");
        let count = analysis
            .issues
            .iter()
            .filter(|i| i.rule_id == "REGEX-CITATION-YEAR")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_et_al_with_period_not_flagged() {
        let engine = AuditEngine::new();
        let analysis = engine.analyze("As Smith et al. argue, the data hold up.");
        assert!(analysis
            .issues
            .iter()
            .all(|i| i.rule_id != "APS-ET-AL-PERIOD"));
    }

    #[test]
    fn test_issue_locations_point_at_owning_block() {
        let engine = AuditEngine::new();
        let analysis = engine.analyze(SAMPLE);
        let title_issue = analysis
            .issues
            .iter()
            .find(|i| i.rule_id == "APS-H2-TITLECASE")
            .unwrap();
        assert_eq!(title_issue.location.block_kind, shared_types::BlockKind::Heading);
        assert_eq!(title_issue.location.level, Some(2));
        assert_eq!(title_issue.location.line_start, Some(3));
    }

    #[test]
    fn test_layers_stamped_correctly() {
        let engine = AuditEngine::new();
        let analysis = engine.analyze(SAMPLE);
        for issue in &analysis.issues {
            let expected = if issue.rule_id.starts_with("HEUR-") {
                Layer::L3
            } else if issue.rule_id.starts_with("APS-H2")
                || issue.rule_id.starts_with("APS-NO-")
            {
                Layer::L1
            } else {
                Layer::L2
            };
            assert_eq!(issue.layer, expected, "rule {}", issue.rule_id);
        }
    }

    #[test]
    fn test_repeat_runs_are_identical() {
        let engine = AuditEngine::new();
        let first = engine.analyze(SAMPLE);
        let second = engine.analyze(SAMPLE);
        let a = serde_json::to_string(&first.issues).unwrap();
        let b = serde_json::to_string(&second.issues).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_document_yields_empty_analysis() {
        let engine = AuditEngine::new();
        let analysis = engine.analyze("");
        assert!(analysis.blocks.is_empty());
        assert!(analysis.issues.is_empty());
    }

    #[test]
    fn test_heuristic_dedup_scoped_to_owning_block() {
        // Identical blocks without line numbers must each keep their own
        // finding rather than colliding on a shared default line.
        let engine = AuditEngine::new();
        let blocks = vec![
            Block::paragraph("The test was conducted by staff."),
            Block::paragraph("The test was conducted by staff."),
        ];
        let findings = engine.heuristic_findings(&blocks);
        let count = findings
            .iter()
            .filter(|(_, f)| f.rule_id == "HEUR-PASSIVE-VOICE")
            .count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_duplicate_heuristic_findings_deduplicated() {
        // Two identical sentences in one paragraph share a line, so the
        // passive-voice finding is reported once.
        let engine = AuditEngine::new();
        let text = "The test was conducted by staff. The test was conducted by staff.";
        let analysis = engine.analyze(text);
        let count = analysis
            .issues
            .iter()
            .filter(|i| i.rule_id == "HEUR-PASSIVE-VOICE")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_long_sentence_thresholds() {
        let engine = AuditEngine::new();
        let thirty_five = (0..35).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
        let analysis = engine.analyze(&format!("{thirty_five}."));
        assert!(analysis
            .issues
            .iter()
            .any(|i| i.rule_id == "HEUR-LONG-SENTENCE"));

        let ten = (0..10).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
        let analysis = engine.analyze(&format!("{ten}."));
        assert!(analysis
            .issues
            .iter()
            .all(|i| i.rule_id != "HEUR-LONG-SENTENCE"));
    }

    #[test]
    fn test_audit_without_kb_produces_report() {
        let engine = AuditEngine::new();
        let report = engine.audit(
            PageMeta {
                url: None,
                title: "Sample".to_string(),
            },
            SAMPLE,
            None,
        );
        assert_eq!(report.summary.issues_found, report.issues.len());
        assert!(report.issues.iter().all(|i| i.kb_matches.is_empty()));
    }
}
