//! Lightweight linguistic analysis for the heuristic layer.
//!
//! The document's prose blocks are segmented into sentences once, and each
//! sentence is tokenized into words annotated by closed lexicons (be-forms,
//! modals, determiners, pronouns, participle shapes). This stands in for a
//! full part-of-speech/dependency parse: coarse, but deterministic and
//! sufficient for the registered heuristics.

use lazy_static::lazy_static;
use regex::Regex;
use shared_types::Block;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\w[\w'\u{2019}-]*").unwrap();
}

/// Forms of "to be" that can govern a passive construction
pub const BE_FORMS: &[&str] = &["am", "is", "are", "was", "were", "be", "been", "being"];

/// Modal auxiliaries
pub const MODALS: &[&str] = &[
    "can", "could", "may", "might", "must", "shall", "should", "will", "would",
];

/// Determiners that can introduce a noun phrase
pub const DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "each", "every", "any", "some", "no",
    "his", "her", "its", "their", "our", "my", "your",
];

/// Pronouns that can stand as a sentence subject
pub const SUBJECT_PRONOUNS: &[&str] = &[
    "i", "we", "you", "he", "she", "it", "they", "this", "that", "these", "those", "one", "who",
];

pub const REFLEXIVE_PRONOUNS: &[&str] = &[
    "myself",
    "yourself",
    "himself",
    "herself",
    "itself",
    "ourselves",
    "yourselves",
    "themselves",
];

/// Irregular past participles not ending in -ed/-en
const IRREGULAR_PARTICIPLES: &[&str] = &[
    "done", "made", "found", "held", "shown", "built", "sent", "kept", "left", "lost", "paid",
    "said", "told", "thought", "brought", "bought", "caught", "taught", "sold", "won",
    "understood", "read", "set", "put", "meant", "felt", "led", "heard", "begun", "sung", "drawn",
    "known", "grown", "thrown", "worn", "torn",
];

/// Finite verbs common in expository prose, used by the fragment heuristic
const COMMON_FINITE_VERBS: &[&str] = &[
    "show", "shows", "showed", "indicate", "indicates", "suggest", "suggests", "find", "finds",
    "demonstrate", "demonstrates", "report", "reports", "describe", "describes", "contain",
    "contains", "include", "includes", "provide", "provides", "require", "requires", "use",
    "uses", "present", "presents", "examine", "examines", "reveal", "reveals", "remain",
    "remains", "seem", "seems", "appear", "appears", "support", "supports", "need", "needs",
    "make", "makes", "take", "takes", "give", "gives", "get", "gets", "go", "goes", "come",
    "comes", "run", "runs", "offer", "offers", "have", "has", "had", "do", "does", "did",
];

/// One word of a sentence with its byte offset into the sentence text
#[derive(Debug, Clone)]
pub struct Word {
    pub text: String,
    pub lower: String,
    pub offset: usize,
}

/// A segmented sentence attributed to its originating block
#[derive(Debug, Clone)]
pub struct AnalyzedSentence {
    pub text: String,
    pub words: Vec<Word>,
    /// Index of the owning block in the parsed sequence
    pub block_index: usize,
    /// Best-effort source line of the owning block
    pub line: Option<usize>,
}

impl AnalyzedSentence {
    pub fn word_count(&self) -> usize {
        self.words.len()
    }
}

pub fn is_be_form(lower: &str) -> bool {
    BE_FORMS.contains(&lower)
}

pub fn is_modal(lower: &str) -> bool {
    MODALS.contains(&lower)
}

pub fn is_determiner(lower: &str) -> bool {
    DETERMINERS.contains(&lower)
}

pub fn is_subject_pronoun(lower: &str) -> bool {
    SUBJECT_PRONOUNS.contains(&lower)
}

pub fn is_reflexive(lower: &str) -> bool {
    REFLEXIVE_PRONOUNS.contains(&lower)
}

/// Past-participle shape: -ed/-en suffix or a known irregular form
pub fn is_past_participle(lower: &str) -> bool {
    (lower.len() > 3 && (lower.ends_with("ed") || lower.ends_with("en")))
        || IRREGULAR_PARTICIPLES.contains(&lower)
}

/// Whether a word can plausibly act as the finite verb of a clause
pub fn is_finite_verb_candidate(lower: &str) -> bool {
    is_be_form(lower)
        || is_modal(lower)
        || COMMON_FINITE_VERBS.contains(&lower)
        || (lower.len() > 3 && lower.ends_with("ed"))
}

/// Split text into sentences at `.`, `!` or `?` followed by whitespace and
/// an uppercase letter or an opening parenthesis
pub fn split_sentences(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            // look ahead: whitespace then sentence-initial character
            let mut j = i + 1;
            let mut saw_space = false;
            while j < chars.len() && chars[j].is_whitespace() {
                saw_space = true;
                j += 1;
            }
            if saw_space && j < chars.len() && (chars[j].is_uppercase() || chars[j] == '(') {
                let sentence = current.trim().to_string();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                current.clear();
                i = j;
                continue;
            }
        }
        i += 1;
    }
    let tail = current.trim().to_string();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

fn tokenize(sentence: &str) -> Vec<Word> {
    WORD.find_iter(sentence)
        .map(|m| Word {
            text: m.as_str().to_string(),
            lower: m.as_str().to_lowercase(),
            offset: m.start(),
        })
        .collect()
}

/// Segment every block of the document into analyzed sentences.
///
/// Blocks are natural sentence boundaries, so the whole document can be
/// analyzed in one pass while every finding still maps back to its block.
pub fn analyze_blocks(blocks: &[Block]) -> Vec<AnalyzedSentence> {
    let mut sentences = Vec::new();
    for (block_index, block) in blocks.iter().enumerate() {
        for text in split_sentences(&block.text) {
            let words = tokenize(&text);
            sentences.push(AnalyzedSentence {
                text,
                words,
                block_index,
                line: block.line_start,
            });
        }
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_on_terminator_before_uppercase() {
        let sentences = split_sentences("First sentence. Second one! Third? (Aside.)");
        assert_eq!(sentences.len(), 4);
        assert_eq!(sentences[0], "First sentence.");
        assert_eq!(sentences[2], "Third?");
    }

    #[test]
    fn test_no_split_before_lowercase() {
        // An abbreviation followed by lowercase keeps the sentence whole
        let sentences = split_sentences("The e. coli sample grew overnight.");
        assert_eq!(sentences.len(), 1);
    }

    #[test]
    fn test_tokenize_offsets_and_case() {
        let words = tokenize("The team's results");
        assert_eq!(words.len(), 3);
        assert_eq!(words[1].lower, "team's");
        assert_eq!(words[2].offset, 11);
    }

    #[test]
    fn test_participle_shapes() {
        assert!(is_past_participle("tested"));
        assert!(is_past_participle("written"));
        assert!(is_past_participle("shown"));
        assert!(!is_past_participle("red"));
        assert!(!is_past_participle("table"));
    }

    #[test]
    fn test_analyze_blocks_attributes_sentences() {
        let blocks = vec![
            Block::paragraph("One sentence here. Another one follows."),
            Block::heading(2, "A Heading"),
        ];
        let sentences = analyze_blocks(&blocks);
        assert_eq!(sentences.len(), 3);
        assert_eq!(sentences[0].block_index, 0);
        assert_eq!(sentences[2].block_index, 1);
        assert_eq!(sentences[2].text, "A Heading");
    }
}
