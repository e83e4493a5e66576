//! Offline corpus ingestion.
//!
//! Reads curated guidance chunks from JSONL files, pulls out snippet text
//! and tags, hydrates source URLs from an optional filename-to-URL map and
//! produces the entry list the index is built from. Unreadable lines are
//! skipped with a warning rather than failing the build.

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::warn;

use crate::entry::{stable_id, KbEntry};
use crate::error::KbError;

/// Keys the upstream chunker has used for snippet text, in priority order
const TEXT_KEYS: &[&str] = &["text", "content", "chunk_text", "body"];

/// Topical keywords promoted to tags when found in the snippet text
const TOPIC_HINTS: &[&str] = &[
    "heading",
    "title case",
    "inclusive",
    "bias",
    "accessibility",
    "punctuation",
    "citation",
];

/// Parse one JSONL file into raw chunk objects, skipping bad lines
pub fn read_jsonl(path: &Path) -> Result<Vec<Value>, KbError> {
    let raw = fs::read_to_string(path)?;
    let mut chunks = Vec::new();
    for (line_no, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(value) => chunks.push(value),
            Err(err) => {
                warn!(
                    file = %path.display(),
                    line = line_no + 1,
                    %err,
                    "skipping unparseable corpus line"
                );
            }
        }
    }
    Ok(chunks)
}

/// Extract snippet text from a chunk object.
///
/// Falls back to joining every string value when none of the known text
/// keys is present.
pub fn extract_text(chunk: &Value) -> String {
    for key in TEXT_KEYS {
        if let Some(text) = chunk.get(key).and_then(Value::as_str) {
            if !text.trim().is_empty() {
                return text.to_string();
            }
        }
    }
    if let Some(nodes) = chunk.get("nodes").and_then(Value::as_array) {
        let joined = nodes
            .iter()
            .filter_map(|n| n.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        if !joined.trim().is_empty() {
            return joined;
        }
    }
    chunk
        .as_object()
        .map(|obj| {
            obj.values()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

/// Infer tags from chunk metadata and topical keywords in the text
pub fn infer_tags(chunk: &Value) -> Vec<String> {
    let mut tags: BTreeSet<String> = BTreeSet::new();

    if chunk.get("heading").is_some() || chunk.get("title").is_some() {
        tags.insert("heading".to_string());
    }
    if let Some(level) = chunk.get("level").and_then(Value::as_u64) {
        tags.insert(format!("level-{}-heading", level));
    }

    let fragment = chunk
        .get("fragment")
        .or_else(|| chunk.get("jump_url"))
        .and_then(Value::as_str)
        .unwrap_or("");
    for part in fragment.split('/').filter(|p| !p.is_empty()) {
        tags.insert(part.to_string());
    }

    let text = extract_text(chunk).to_lowercase();
    for hint in TOPIC_HINTS {
        if text.contains(hint) {
            tags.insert(hint.to_string());
        }
    }

    tags.into_iter().collect()
}

/// Load a filename-to-URL map from a two-column CSV.
///
/// Tolerates a missing header and malformed quoting by splitting each line
/// on the first comma.
pub fn load_urls_map(path: &Path) -> HashMap<String, String> {
    let Ok(raw) = fs::read_to_string(path) else {
        return HashMap::new();
    };
    let lines: Vec<&str> = raw.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let Some(first) = lines.first() else {
        return HashMap::new();
    };
    let has_header = {
        let header = first.to_lowercase();
        header.contains("filename") && header.contains("url")
    };

    let mut mapping = HashMap::new();
    for line in lines.iter().skip(if has_header { 1 } else { 0 }) {
        if let Some((filename, url)) = line.split_once(',') {
            mapping.insert(filename.trim().to_string(), url.trim().to_string());
        }
    }
    mapping
}

/// Turn raw chunk objects into index-ready entries.
///
/// The imperative-language filter is applied later by `KbIndex::build`;
/// this step only normalizes shape and metadata.
pub fn entries_from_chunks(chunks: &[Value], urls_map: &HashMap<String, String>) -> Vec<KbEntry> {
    let mut entries = Vec::new();
    for chunk in chunks {
        let text = extract_text(chunk).trim().to_string();
        if text.is_empty() {
            continue;
        }

        let source_file = chunk
            .get("file_name")
            .or_else(|| chunk.get("filename"))
            .or_else(|| chunk.get("file"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let source_url = chunk
            .get("source_url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                source_file
                    .as_deref()
                    .and_then(|f| urls_map.get(f))
                    .cloned()
            });
        let entry_id = chunk
            .get("chunk_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| stable_id(&text));

        entries.push(KbEntry {
            entry_id,
            text,
            tags: infer_tags(chunk),
            source_url,
            source_file,
        });
    }
    entries
}
