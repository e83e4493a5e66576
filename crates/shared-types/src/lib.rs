pub mod types;

pub use types::{
    Block, BlockKind, Issue, IssueLocation, KbMatch, Layer, LayerCounts, ListKind, PageMeta,
    Report, ReportSummary, Severity, Span,
};
