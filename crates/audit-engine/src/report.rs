//! Report assembly and emission.
//!
//! Both artifacts render from the same issue sequence: the structured JSON
//! report and the narrative markdown are different views of one `Report`,
//! so they cannot diverge. Emission is pairwise-atomic: both artifacts are
//! rendered to strings and staged as temp files before either final name
//! is created, and a failure anywhere removes what was staged.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use kb_index::KbIndex;
use shared_types::{Issue, KbMatch, PageMeta, Report, ReportSummary};

use crate::error::AuditError;

/// KB text is clipped to this length in match payloads
const KB_TEXT_LIMIT: usize = 300;
/// Narrative excerpts are clipped to this length
const EXCERPT_LIMIT: usize = 500;
/// Matches attached per issue
const KB_MATCHES_PER_ISSUE: usize = 3;

pub struct ReportBuilder<'a> {
    kb: Option<&'a KbIndex>,
}

impl<'a> ReportBuilder<'a> {
    /// A builder without a knowledge base attaches no matches; the audit
    /// itself is unaffected.
    pub fn new(kb: Option<&'a KbIndex>) -> Self {
        Self { kb }
    }

    /// Assemble the final report from stamped issues in document order
    pub fn build(&self, page: PageMeta, mut issues: Vec<Issue>) -> Report {
        for issue in issues.iter_mut() {
            issue.kb_matches = self.kb_matches_for(issue);
        }
        let by_layer = Report::count_by_layer(&issues);
        Report {
            page,
            generated_at: Utc::now().format("%Y%m%dT%H%M%SZ").to_string(),
            summary: ReportSummary {
                issues_found: issues.len(),
                by_layer,
            },
            issues,
        }
    }

    fn kb_matches_for(&self, issue: &Issue) -> Vec<KbMatch> {
        let Some(kb) = self.kb else {
            return Vec::new();
        };
        let query = match &issue.excerpt {
            Some(excerpt) => format!("{} {}", issue.message, excerpt),
            None => issue.message.clone(),
        };
        let tag_hint = tag_hint_for(issue);
        kb.search(&query, KB_MATCHES_PER_ISSUE, tag_hint)
            .into_iter()
            .map(|(entry, similarity)| KbMatch {
                kb_entry_id: entry.entry_id.clone(),
                kb_text: truncate_with_ellipsis(&entry.text, KB_TEXT_LIMIT),
                kb_tags: entry.tags.clone(),
                kb_source_url: entry.source_url.clone(),
                similarity: round3(similarity),
            })
            .collect()
    }
}

/// Layer-appropriate tag hint for the KB query
fn tag_hint_for(issue: &Issue) -> Option<&'static str> {
    match issue.layer {
        shared_types::Layer::L1 if issue.tags.iter().any(|t| t == "heading") => Some("heading"),
        shared_types::Layer::L2 if issue.tags.iter().any(|t| t == "citation") => Some("citation"),
        _ => None,
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn truncate_with_ellipsis(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let clipped: String = text.chars().take(limit).collect();
        format!("{clipped}\u{2026}")
    }
}

/// Filename-safe slug: lowercased alphanumeric runs joined by hyphens
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut pending_hyphen = false;
    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
        if slug.len() >= 80 {
            break;
        }
    }
    if slug.is_empty() {
        "report".to_string()
    } else {
        slug
    }
}

/// Serialize the structured report
pub fn to_json(report: &Report) -> Result<String, AuditError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Render the narrative markdown report
pub fn to_markdown(report: &Report) -> String {
    let mut lines: Vec<String> = Vec::new();
    let title = if report.page.title.is_empty() {
        report.page.url.clone().unwrap_or_else(|| "page".to_string())
    } else {
        report.page.title.clone()
    };
    lines.push(format!("# Audit Report \u{2013} {}", title));
    lines.push(format!("_Generated: {} UTC_", report.generated_at));
    lines.push(String::new());
    lines.push(format!(
        "- **URL**: {}",
        report.page.url.as_deref().unwrap_or("(local file)")
    ));
    lines.push(format!("- **Issues found**: {}", report.summary.issues_found));
    lines.push(String::new());

    for (idx, issue) in report.issues.iter().enumerate() {
        lines.push(format!("## {}. [{}] {}", idx + 1, issue.layer, issue.message));
        if let Some(excerpt) = &issue.excerpt {
            let flat = excerpt.replace('\n', " ");
            lines.push(String::new());
            lines.push("**Excerpt**".to_string());
            lines.push(String::new());
            lines.push(format!("> {}", truncate_chars(&flat, EXCERPT_LIMIT)));
        }
        let loc = &issue.location;
        let level = loc
            .level
            .map(|l| format!(" level {}", l))
            .unwrap_or_default();
        let line = loc
            .line_start
            .map(|l| l.to_string())
            .unwrap_or_else(|| "?".to_string());
        lines.push(String::new());
        lines.push(format!(
            "- **Location**: `{:?}`{} line ~{}",
            loc.block_kind, level, line
        ));
        lines.push(format!("- **Rule ID**: `{}`", issue.rule_id));
        if let Some(fix) = &issue.suggested_fix {
            lines.push(format!("- **Suggested fix**: {}", fix));
        }
        if !issue.kb_matches.is_empty() {
            lines.push("- **Relevant guidance (similarity)**:".to_string());
            for m in &issue.kb_matches {
                let source = m
                    .kb_source_url
                    .as_deref()
                    .map(|url| format!(" \u{2014} source: {}", url))
                    .unwrap_or_default();
                lines.push(format!("  - {}: {}{}", m.similarity, m.kb_text, source));
            }
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

/// Paths of the two emitted artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub json: PathBuf,
    pub markdown: PathBuf,
}

/// Write both artifacts, or neither.
///
/// Both renderings happen before any file is touched, so a failed run never
/// leaves a partial report pair.
pub fn write_reports(out_dir: &Path, report: &Report) -> Result<ReportPaths, AuditError> {
    let json = to_json(report)?;
    let markdown = to_markdown(report);

    fs::create_dir_all(out_dir)?;
    let base = format!("{}_{}", report.generated_at, slugify(&report.page.title));
    let json_path = out_dir.join(format!("{base}.json"));
    let md_path = out_dir.join(format!("{base}.md"));

    write_pair(&json_path, &json, &md_path, &markdown)?;

    Ok(ReportPaths {
        json: json_path,
        markdown: md_path,
    })
}

/// Stage both temp files before renaming either, so a failure while staging
/// commits nothing. On any error the temp files and a half-committed target
/// are removed.
fn write_pair(
    json_path: &Path,
    json: &str,
    md_path: &Path,
    markdown: &str,
) -> Result<(), AuditError> {
    let json_tmp = tmp_path(json_path);
    let md_tmp = tmp_path(md_path);

    let mut json_committed = false;
    let result: Result<(), AuditError> = (|| {
        fs::write(&json_tmp, json)?;
        fs::write(&md_tmp, markdown)?;
        fs::rename(&json_tmp, json_path)?;
        json_committed = true;
        fs::rename(&md_tmp, md_path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&json_tmp);
        let _ = fs::remove_file(&md_tmp);
        if json_committed {
            let _ = fs::remove_file(json_path);
        }
    }
    result
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
