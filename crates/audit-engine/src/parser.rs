//! Markdown block parser.
//!
//! Flattens a markdown document into an ordered sequence of typed blocks:
//! headings, paragraphs, list items and fenced code. Inline markup is
//! stripped (only event text is kept), nested sub-list structure is not
//! preserved, and source line spans are best-effort 1-based numbers derived
//! from byte offsets. Malformed constructs fall back to whatever boundaries
//! the tokenizer recovers; the parse itself never fails.

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use shared_types::{Block, BlockKind, ListKind};

struct PendingBlock {
    kind: BlockKind,
    level: Option<u8>,
    list_kind: Option<ListKind>,
    text: String,
    line_start: Option<usize>,
    line_end: Option<usize>,
    emitted: bool,
}

impl PendingBlock {
    fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            level: None,
            list_kind: None,
            text: String::new(),
            line_start: None,
            line_end: None,
            emitted: false,
        }
    }

    fn into_block(self) -> Block {
        Block {
            kind: self.kind,
            level: self.level,
            list_kind: self.list_kind,
            text: self.text.trim().to_string(),
            line_start: self.line_start,
            line_end: self.line_end,
        }
    }
}

/// Byte offsets of line starts, for offset→line mapping
fn line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (idx, byte) in text.bytes().enumerate() {
        if byte == b'\n' {
            starts.push(idx + 1);
        }
    }
    starts
}

fn line_of(starts: &[usize], offset: usize) -> usize {
    match starts.binary_search(&offset) {
        Ok(line) => line + 1,
        Err(line) => line,
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    level as u8
}

/// Parse markdown text into an ordered block sequence.
///
/// Empty input yields an empty sequence.
pub fn parse(text: &str) -> Vec<Block> {
    let starts = line_starts(text);
    let mut blocks: Vec<Block> = Vec::new();
    let mut stack: Vec<PendingBlock> = Vec::new();
    let mut list_stack: Vec<ListKind> = Vec::new();

    let push_span = |pending: &mut PendingBlock, range: &std::ops::Range<usize>| {
        pending.line_start = Some(line_of(&starts, range.start));
        pending.line_end = Some(line_of(&starts, range.end.saturating_sub(1).max(range.start)));
    };

    for (event, range) in Parser::new(text).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                let mut pending = PendingBlock::new(BlockKind::Heading);
                pending.level = Some(heading_level(level));
                push_span(&mut pending, &range);
                stack.push(pending);
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(pending) = stack.pop() {
                    blocks.push(pending.into_block());
                }
            }
            Event::Start(Tag::Paragraph) => {
                match stack.last_mut() {
                    // Loose list items wrap their text in paragraphs; fold
                    // that text into the item block instead.
                    Some(item) if item.kind == BlockKind::ListItem => {
                        if !item.text.is_empty() {
                            item.text.push(' ');
                        }
                    }
                    _ => {
                        let mut pending = PendingBlock::new(BlockKind::Paragraph);
                        push_span(&mut pending, &range);
                        stack.push(pending);
                    }
                }
            }
            Event::End(TagEnd::Paragraph) => {
                if stack.last().map(|p| p.kind) == Some(BlockKind::Paragraph) {
                    if let Some(pending) = stack.pop() {
                        blocks.push(pending.into_block());
                    }
                }
            }
            Event::Start(Tag::List(ordinal)) => {
                // A nested list ends the textual content of its parent
                // item; emit the parent now to keep document order.
                if let Some(item) = stack.last_mut() {
                    if item.kind == BlockKind::ListItem && !item.emitted {
                        item.emitted = true;
                        blocks.push(Block {
                            kind: item.kind,
                            level: item.level,
                            list_kind: item.list_kind,
                            text: item.text.trim().to_string(),
                            line_start: item.line_start,
                            line_end: item.line_end,
                        });
                    }
                }
                list_stack.push(if ordinal.is_some() {
                    ListKind::Ordered
                } else {
                    ListKind::Bullet
                });
            }
            Event::End(TagEnd::List(_)) => {
                list_stack.pop();
            }
            Event::Start(Tag::Item) => {
                let mut pending = PendingBlock::new(BlockKind::ListItem);
                pending.list_kind = list_stack.last().copied();
                push_span(&mut pending, &range);
                stack.push(pending);
            }
            Event::End(TagEnd::Item) => {
                if let Some(pending) = stack.pop() {
                    if !pending.emitted {
                        blocks.push(pending.into_block());
                    }
                }
            }
            Event::Start(Tag::CodeBlock(_)) => {
                let mut pending = PendingBlock::new(BlockKind::Code);
                push_span(&mut pending, &range);
                stack.push(pending);
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(pending) = stack.pop() {
                    blocks.push(pending.into_block());
                }
            }
            Event::Text(content) | Event::Code(content) => {
                if let Some(pending) = stack.last_mut() {
                    if !pending.emitted {
                        pending.text.push_str(&content);
                    }
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(pending) = stack.last_mut() {
                    if !pending.emitted && !pending.text.is_empty() {
                        pending.text.push(' ');
                    }
                }
            }
            // Inline/raw HTML and everything else is markup, not content
            _ => {}
        }
    }

    // Unterminated constructs left on the stack still become blocks
    for pending in stack.drain(..) {
        if !pending.emitted {
            blocks.push(pending.into_block());
        }
    }

    blocks
}
