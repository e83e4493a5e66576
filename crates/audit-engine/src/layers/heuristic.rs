//! Layer 3 - linguistic heuristics.
//!
//! Each heuristic is a pure function over one analyzed sentence, registered
//! under a stable rule id. The engine deduplicates findings per rule by
//! (block, line, offending text) within a document pass, so a repeated
//! template sentence is reported once per line of its block.

use shared_types::Severity;

use crate::analysis::{
    is_be_form, is_determiner, is_finite_verb_candidate, is_modal, is_past_participle,
    is_reflexive, is_subject_pronoun, AnalyzedSentence,
};
use crate::layers::Finding;

/// Tunable thresholds for the heuristic layer
#[derive(Debug, Clone)]
pub struct HeuristicConfig {
    /// Sentences longer than this many words are flagged as run-ons
    pub max_sentence_words: usize,
    /// Sentences at or below this length are never fragment candidates
    pub fragment_min_words: usize,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            max_sentence_words: 30,
            fragment_min_words: 5,
        }
    }
}

pub type HeuristicCheck = fn(&AnalyzedSentence, &HeuristicConfig) -> Vec<Finding>;

pub struct HeuristicRegistry {
    rules: Vec<(&'static str, HeuristicCheck)>,
}

impl HeuristicRegistry {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn register(&mut self, rule_id: &'static str, check: HeuristicCheck) {
        self.rules.push((rule_id, check));
    }

    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|(id, _)| *id).collect()
    }

    /// Run every heuristic against one sentence
    pub fn run(&self, sentence: &AnalyzedSentence, config: &HeuristicConfig) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (_, check) in &self.rules {
            findings.extend(check(sentence, config));
        }
        findings
    }
}

impl Default for HeuristicRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("HEUR-LONG-SENTENCE", check_long_sentence);
        registry.register("HEUR-PASSIVE-VOICE", check_passive_voice);
        registry.register("HEUR-FRAGMENT", check_fragment);
        registry.register("HEUR-COLLECTIVE-AGREEMENT", check_collective_agreement);
        registry.register("HEUR-COMPOUND-MODIFIER", check_compound_modifier);
        registry.register("HEUR-AMBIGUOUS-WHICH", check_ambiguous_which);
        registry.register("HEUR-MISSING-DETERMINER", check_missing_determiner);
        registry.register("HEUR-EXCLAMATION", check_exclamation);
        registry.register("HEUR-CORRELATIVE-PAIR", check_correlative_pair);
        registry.register("HEUR-LATIN-ABBREV", check_latin_abbrev);
        registry.register("HEUR-INTENSIFIER", check_intensifier);
        registry.register("HEUR-MODAL-TO", check_modal_to);
        registry.register("HEUR-REFLEXIVE-SUBJECT", check_reflexive_subject);
        registry.register("HEUR-ARTICLE-AGREEMENT", check_article_agreement);
        registry
    }
}

/// Collective nouns that commonly trigger number disagreement
const COLLECTIVE_NOUNS: &[&str] = &[
    "team", "committee", "group", "staff", "family", "audience", "board", "faculty",
    "government", "jury", "crowd", "class", "crew", "panel",
];

/// Plural verb forms that disagree with a singular collective subject
const PLURAL_VERBS: &[&str] = &["are", "were", "have", "do"];

/// Compound modifiers that need a hyphen before a noun
const COMPOUND_MODIFIERS: &[(&str, &str)] = &[
    ("well", "known"),
    ("well", "being"),
    ("long", "term"),
    ("short", "term"),
    ("high", "quality"),
    ("high", "level"),
    ("low", "level"),
    ("full", "time"),
    ("part", "time"),
    ("decision", "making"),
    ("evidence", "based"),
    ("peer", "reviewed"),
    ("real", "world"),
];

/// Function words that cannot be the modified noun
const NON_NOUN_FOLLOWERS: &[&str] = &[
    "that", "than", "and", "or", "but", "to", "in", "of", "by", "for", "as", "at", "with", "is",
    "are", "was", "were",
];

/// Singular countable nouns that need a determiner as a bare subject
const COUNTABLE_SUBJECT_NOUNS: &[&str] = &[
    "study", "result", "paper", "method", "report", "author", "experiment", "analysis",
    "table", "figure", "sample", "survey", "finding", "article", "chapter",
];

const INTENSIFIERS: &[&str] = &[
    "very", "really", "quite", "extremely", "basically", "actually", "literally", "totally",
    "absolutely", "definitely",
];

const LATIN_ABBREVS: &[(&str, &str)] = &[
    ("e.g.", "for example"),
    ("i.e.", "that is"),
    ("etc.", "and so on"),
    ("viz.", "namely"),
    ("cf.", "compare"),
];

/// Words with a silent 'h' that take "an"
const SILENT_H_WORDS: &[&str] = &["hour", "hours", "honest", "honor", "honour", "heir", "herb", "herbs", "honorable"];

/// Words starting with 'u'/'eu' pronounced as a consonant ("you"), taking "a"
const U_AS_CONSONANT_WORDS: &[&str] = &[
    "university", "unique", "unit", "united", "union", "user", "usual", "useful", "usage",
    "uniform", "unicorn", "ubiquitous", "utility", "euro", "european", "eulogy", "one", "once",
];

fn sentence_finding(
    rule_id: &str,
    tags: &[&str],
    severity: Severity,
    message: impl Into<String>,
    sentence: &AnalyzedSentence,
) -> Finding {
    Finding::new(rule_id, tags, severity, message).with_excerpt(&sentence.text)
}

fn check_long_sentence(sentence: &AnalyzedSentence, config: &HeuristicConfig) -> Vec<Finding> {
    if sentence.word_count() <= config.max_sentence_words {
        return Vec::new();
    }
    vec![sentence_finding(
        "HEUR-LONG-SENTENCE",
        &["readability"],
        Severity::Warning,
        format!("Sentence longer than {} words.", config.max_sentence_words),
        sentence,
    )
    .with_fix("Split into shorter sentences; aim for one idea per sentence.")]
}

/// A "to be" form governing a past participle, optionally followed by "by"
fn check_passive_voice(sentence: &AnalyzedSentence, _config: &HeuristicConfig) -> Vec<Finding> {
    let words = &sentence.words;
    for window in words.windows(2) {
        if is_be_form(&window[0].lower) && is_past_participle(&window[1].lower) {
            return vec![sentence_finding(
                "HEUR-PASSIVE-VOICE",
                &["voice"],
                Severity::Info,
                "Possible passive voice.",
                sentence,
            )
            .with_fix("Prefer active voice where possible.")];
        }
    }
    Vec::new()
}

/// No finite-verb candidate and no subject candidate above the length floor.
/// Only applies to text punctuated as a sentence, so headings and bare list
/// items are not treated as fragments.
fn check_fragment(sentence: &AnalyzedSentence, config: &HeuristicConfig) -> Vec<Finding> {
    if sentence.word_count() <= config.fragment_min_words
        || !sentence.text.ends_with(['.', '!', '?'])
    {
        return Vec::new();
    }
    let has_verb = sentence
        .words
        .iter()
        .any(|w| is_finite_verb_candidate(&w.lower));
    let has_subject = sentence
        .words
        .iter()
        .any(|w| is_subject_pronoun(&w.lower));
    if has_verb || has_subject {
        return Vec::new();
    }
    vec![sentence_finding(
        "HEUR-FRAGMENT",
        &["grammar"],
        Severity::Warning,
        "Possible sentence fragment: no main verb found.",
        sentence,
    )
    .with_fix("Rewrite as a complete sentence with a subject and a verb.")]
}

fn check_collective_agreement(
    sentence: &AnalyzedSentence,
    _config: &HeuristicConfig,
) -> Vec<Finding> {
    for window in sentence.words.windows(2) {
        if COLLECTIVE_NOUNS.contains(&window[0].lower.as_str())
            && PLURAL_VERBS.contains(&window[1].lower.as_str())
        {
            let offending = format!("{} {}", window[0].text, window[1].text);
            return vec![Finding::new(
                "HEUR-COLLECTIVE-AGREEMENT",
                &["grammar", "agreement"],
                Severity::Warning,
                "Collective noun with a plural verb.",
            )
            .with_excerpt(offending)
            .with_fix("Treat collective nouns as singular in formal prose.")];
        }
    }
    Vec::new()
}

fn check_compound_modifier(sentence: &AnalyzedSentence, _config: &HeuristicConfig) -> Vec<Finding> {
    let words = &sentence.words;
    let mut findings = Vec::new();
    for window in words.windows(3) {
        let pair = (window[0].lower.as_str(), window[1].lower.as_str());
        let followed_by_noun = window[2].lower.chars().all(|c| c.is_alphabetic())
            && !NON_NOUN_FOLLOWERS.contains(&window[2].lower.as_str());
        if followed_by_noun
            && COMPOUND_MODIFIERS
                .iter()
                .any(|(a, b)| *a == pair.0 && *b == pair.1)
        {
            let offending = format!("{} {} {}", window[0].text, window[1].text, window[2].text);
            findings.push(
                Finding::new(
                    "HEUR-COMPOUND-MODIFIER",
                    &["hyphenation"],
                    Severity::Info,
                    "Compound modifier before a noun should be hyphenated.",
                )
                .with_excerpt(offending)
                .with_fix(format!(
                    "Write '{}-{}' when it modifies the following noun.",
                    pair.0, pair.1
                )),
            );
        }
    }
    findings
}

/// Restrictive "which" with no preceding comma reads ambiguously
fn check_ambiguous_which(sentence: &AnalyzedSentence, _config: &HeuristicConfig) -> Vec<Finding> {
    let text = &sentence.text;
    let mut findings = Vec::new();
    for word in &sentence.words {
        if word.lower == "which" && word.offset > 0 {
            let before = text[..word.offset].trim_end();
            if !before.is_empty() && !before.ends_with(',') && !before.ends_with('(') {
                findings.push(
                    Finding::new(
                        "HEUR-AMBIGUOUS-WHICH",
                        &["grammar", "clarity"],
                        Severity::Info,
                        "Relative 'which' without a preceding comma may be ambiguous.",
                    )
                    .with_excerpt(&sentence.text)
                    .with_fix("Use ', which' for nonrestrictive clauses or 'that' for restrictive ones."),
                );
                break;
            }
        }
    }
    findings
}

/// Bare singular countable noun opening the sentence as its subject
fn check_missing_determiner(sentence: &AnalyzedSentence, _config: &HeuristicConfig) -> Vec<Finding> {
    let words = &sentence.words;
    if words.len() < 2 {
        return Vec::new();
    }
    let first = &words[0];
    let second = &words[1];
    if COUNTABLE_SUBJECT_NOUNS.contains(&first.lower.as_str())
        && is_finite_verb_candidate(&second.lower)
    {
        let offending = format!("{} {}", first.text, second.text);
        return vec![Finding::new(
            "HEUR-MISSING-DETERMINER",
            &["grammar", "determiner"],
            Severity::Info,
            "Singular countable subject noun without a determiner.",
        )
        .with_excerpt(offending)
        .with_fix(format!("Write 'The {}' or 'A {}'.", first.lower, first.lower))];
    }
    Vec::new()
}

fn check_exclamation(sentence: &AnalyzedSentence, _config: &HeuristicConfig) -> Vec<Finding> {
    if !sentence.text.contains('!') {
        return Vec::new();
    }
    vec![sentence_finding(
        "HEUR-EXCLAMATION",
        &["tone"],
        Severity::Info,
        "Exclamation marks are rarely appropriate in formal prose.",
        sentence,
    )
    .with_fix("Replace the exclamation mark with a period.")]
}

/// Correlative conjunction whose partner never appears
fn check_correlative_pair(sentence: &AnalyzedSentence, _config: &HeuristicConfig) -> Vec<Finding> {
    let lowers: Vec<&str> = sentence.words.iter().map(|w| w.lower.as_str()).collect();
    let has = |w: &str| lowers.contains(&w);
    let has_pair = |a: &str, b: &str| {
        lowers
            .windows(2)
            .any(|pair| pair[0] == a && pair[1] == b)
    };

    let mut missing: Option<(&str, &str)> = None;
    if has("either") && !has("or") {
        missing = Some(("either", "or"));
    } else if has("neither") && !has("nor") {
        missing = Some(("neither", "nor"));
    } else if has_pair("not", "only") && !(has_pair("but", "also")) {
        missing = Some(("not only", "but also"));
    }

    match missing {
        Some((head, partner)) => vec![sentence_finding(
            "HEUR-CORRELATIVE-PAIR",
            &["grammar", "conjunction"],
            Severity::Warning,
            format!("'{}' is not paired with '{}'.", head, partner),
            sentence,
        )
        .with_fix(format!("Pair '{}' with '{}'.", head, partner))],
        None => Vec::new(),
    }
}

fn check_latin_abbrev(sentence: &AnalyzedSentence, _config: &HeuristicConfig) -> Vec<Finding> {
    let lower = sentence.text.to_lowercase();
    let mut findings = Vec::new();
    for (abbrev, spelled) in LATIN_ABBREVS {
        if lower.contains(abbrev) {
            findings.push(
                Finding::new(
                    "HEUR-LATIN-ABBREV",
                    &["style", "abbreviation"],
                    Severity::Info,
                    format!("Prefer '{}' over '{}' in running text.", spelled, abbrev),
                )
                .with_excerpt(&sentence.text)
                .with_fix(format!("Replace '{}' with '{}'.", abbrev, spelled)),
            );
        }
    }
    findings
}

fn check_intensifier(sentence: &AnalyzedSentence, _config: &HeuristicConfig) -> Vec<Finding> {
    let mut findings = Vec::new();
    for word in &sentence.words {
        if INTENSIFIERS.contains(&word.lower.as_str()) {
            findings.push(
                Finding::new(
                    "HEUR-INTENSIFIER",
                    &["style", "concision"],
                    Severity::Info,
                    format!("Intensifier '{}' weakens the sentence.", word.lower),
                )
                .with_excerpt(&word.text)
                .with_fix("Delete the intensifier or choose a stronger word."),
            );
        }
    }
    findings
}

/// A modal verb is never followed directly by "to"
fn check_modal_to(sentence: &AnalyzedSentence, _config: &HeuristicConfig) -> Vec<Finding> {
    for window in sentence.words.windows(2) {
        if is_modal(&window[0].lower) && window[1].lower == "to" {
            let offending = format!("{} {}", window[0].text, window[1].text);
            return vec![Finding::new(
                "HEUR-MODAL-TO",
                &["grammar"],
                Severity::Warning,
                format!("Modal verb '{}' cannot be followed by 'to'.", window[0].lower),
            )
            .with_excerpt(offending)
            .with_fix(format!("Write '{} <verb>' without 'to'.", window[0].lower))];
        }
    }
    Vec::new()
}

/// Reflexive pronoun standing as a grammatical subject
fn check_reflexive_subject(sentence: &AnalyzedSentence, _config: &HeuristicConfig) -> Vec<Finding> {
    let words = &sentence.words;
    for (idx, word) in words.iter().enumerate() {
        if !is_reflexive(&word.lower) {
            continue;
        }
        let at_start = idx == 0;
        let after_conjunction = idx >= 1
            && idx <= 3
            && matches!(words[idx - 1].lower.as_str(), "and" | "or");
        if at_start || after_conjunction {
            return vec![Finding::new(
                "HEUR-REFLEXIVE-SUBJECT",
                &["grammar", "pronoun"],
                Severity::Warning,
                format!("Reflexive pronoun '{}' used as a subject.", word.lower),
            )
            .with_excerpt(&sentence.text)
            .with_fix("Use a plain personal pronoun as the subject (e.g. 'I', 'we').")];
        }
    }
    Vec::new()
}

/// Does the following word begin with a vowel sound?
fn starts_with_vowel_sound(lower: &str) -> bool {
    if U_AS_CONSONANT_WORDS.contains(&lower) {
        return false;
    }
    if SILENT_H_WORDS.contains(&lower) {
        return true;
    }
    matches!(lower.chars().next(), Some('a' | 'e' | 'i' | 'o' | 'u'))
}

/// Indefinite article chosen against the phonetic onset of the next word
fn check_article_agreement(sentence: &AnalyzedSentence, _config: &HeuristicConfig) -> Vec<Finding> {
    let mut findings = Vec::new();
    for window in sentence.words.windows(2) {
        let article = window[0].lower.as_str();
        let next = &window[1].lower;
        if !next.chars().next().map(char::is_alphabetic).unwrap_or(false) {
            continue;
        }
        let expected = if starts_with_vowel_sound(next) { "an" } else { "a" };
        if (article == "a" || article == "an") && article != expected {
            let offending = format!("{} {}", window[0].text, window[1].text);
            findings.push(
                Finding::new(
                    "HEUR-ARTICLE-AGREEMENT",
                    &["grammar", "article"],
                    Severity::Warning,
                    format!("Use '{}' before '{}'.", expected, next),
                )
                .with_excerpt(offending)
                .with_fix(format!("Change to '{} {}'.", expected, next)),
            );
        }
    }
    findings
}
