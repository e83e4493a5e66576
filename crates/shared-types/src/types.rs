use serde::{Deserialize, Serialize};

/// Structural kind of a parsed document block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Heading,
    Paragraph,
    ListItem,
    Code,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Bullet,
    Ordered,
}

/// One block-level unit of a parsed document.
///
/// The block sequence preserves document order; `text` is plain content
/// with inline markup already stripped. Line numbers are 1-based and
/// best-effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>, // heading level 1..6
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_kind: Option<ListKind>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_start: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_end: Option<usize>,
}

impl Block {
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Heading,
            level: Some(level),
            list_kind: None,
            text: text.into(),
            line_start: None,
            line_end: None,
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            level: None,
            list_kind: None,
            text: text.into(),
            line_start: None,
            line_end: None,
        }
    }
}

/// Rule-evaluation tier that raised an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    L1,
    L2,
    L3,
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layer::L1 => write!(f, "L1"),
            Layer::L2 => write!(f, "L2"),
            Layer::L3 => write!(f, "L3"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Byte offsets into the owning block's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Where in the document an issue was raised
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueLocation {
    #[serde(rename = "type")]
    pub block_kind: BlockKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_start: Option<usize>,
}

/// A guidance snippet attached to an issue by the knowledge-base search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KbMatch {
    pub kb_entry_id: String,
    pub kb_text: String,
    pub kb_tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kb_source_url: Option<String>,
    pub similarity: f64,
}

/// One finding raised by a rule evaluator.
///
/// Immutable once appended to a report. `tags` are kept sorted so repeated
/// runs serialize identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub rule_id: String,
    pub layer: Layer,
    pub severity: Severity,
    pub tags: Vec<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
    pub location: IssueLocation,
    pub kb_matches: Vec<KbMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub issues_found: usize,
    pub by_layer: LayerCounts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerCounts {
    #[serde(rename = "L1")]
    pub l1: usize,
    #[serde(rename = "L2")]
    pub l2: usize,
    #[serde(rename = "L3")]
    pub l3: usize,
}

/// Full audit result for one document, one per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub page: PageMeta,
    pub generated_at: String,
    pub summary: ReportSummary,
    pub issues: Vec<Issue>,
}

impl Report {
    pub fn count_by_layer(issues: &[Issue]) -> LayerCounts {
        let mut counts = LayerCounts::default();
        for issue in issues {
            match issue.layer {
                Layer::L1 => counts.l1 += 1,
                Layer::L2 => counts.l2 += 1,
                Layer::L3 => counts.l3 += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_issue_serializes_optional_fields_sparsely() {
        let issue = Issue {
            rule_id: "APS-H2-TITLECASE".to_string(),
            layer: Layer::L1,
            severity: Severity::Warning,
            tags: vec!["heading".to_string()],
            message: "Level 2 headings must be in Title Case.".to_string(),
            excerpt: None,
            span: None,
            suggested_fix: None,
            location: IssueLocation {
                block_kind: BlockKind::Heading,
                level: Some(2),
                line_start: Some(3),
            },
            kb_matches: vec![],
        };
        let json = serde_json::to_string(&issue).unwrap();
        assert!(!json.contains("excerpt"));
        assert!(!json.contains("span"));
        assert!(json.contains("\"layer\":\"L1\""));
        assert!(json.contains("\"type\":\"heading\""));
    }

    #[test]
    fn test_layer_counts_aggregation() {
        let mk = |layer: Layer| Issue {
            rule_id: "X".to_string(),
            layer,
            severity: Severity::Info,
            tags: vec![],
            message: String::new(),
            excerpt: None,
            span: None,
            suggested_fix: None,
            location: IssueLocation {
                block_kind: BlockKind::Paragraph,
                level: None,
                line_start: None,
            },
            kb_matches: vec![],
        };
        let issues = vec![mk(Layer::L1), mk(Layer::L2), mk(Layer::L2), mk(Layer::L3)];
        let counts = Report::count_by_layer(&issues);
        assert_eq!(counts.l1, 1);
        assert_eq!(counts.l2, 2);
        assert_eq!(counts.l3, 1);
    }

    #[test]
    fn test_report_roundtrip() {
        let report = Report {
            page: PageMeta {
                url: Some("https://example.org/style".to_string()),
                title: "Style Page".to_string(),
            },
            generated_at: "20250101T000000Z".to_string(),
            summary: ReportSummary {
                issues_found: 0,
                by_layer: LayerCounts::default(),
            },
            issues: vec![],
        };
        let json = serde_json::to_string(&report).unwrap();
        let parsed: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }
}
