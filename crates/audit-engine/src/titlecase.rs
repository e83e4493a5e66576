//! Headline capitalization check and corrector.
//!
//! First and last significant tokens are always capitalized; a closed set
//! of minor words stays lowercase when interior; every other token is
//! capitalized at its first letter. Tokens with no alphanumeric content are
//! skipped without affecting the verdict. The corrector applies the same
//! rules, so correcting twice never changes the result again.

/// Minor words kept lowercase when interior (articles, short
/// prepositions/conjunctions)
pub const MINOR_WORDS: &[&str] = &[
    "a", "an", "the", "and", "but", "or", "for", "nor", "as", "at", "by", "from", "in", "into",
    "near", "of", "on", "onto", "to", "up", "with", "over", "via",
];

fn is_minor_word(word: &str) -> bool {
    MINOR_WORDS.contains(&word)
}

/// Alphanumeric core of a token, keeping apostrophes and hyphens
fn clean_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '\'' | '\u{2019}' | '-'))
        .collect()
}

fn first_alphabetic(token: &str) -> Option<char> {
    token.chars().find(|c| c.is_alphanumeric())
}

/// Indices of tokens that carry alphanumeric content
fn significant_indices(tokens: &[&str]) -> Vec<usize> {
    tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| !clean_token(t).is_empty())
        .map(|(i, _)| i)
        .collect()
}

/// Check whether a heading follows headline capitalization
pub fn is_title_case(text: &str) -> bool {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let significant = significant_indices(&tokens);
    let (Some(&first), Some(&last)) = (significant.first(), significant.last()) else {
        return true;
    };

    for &idx in &significant {
        let clean = clean_token(tokens[idx]);
        let Some(initial) = first_alphabetic(&clean) else {
            continue;
        };
        let is_edge = idx == first || idx == last;
        if is_edge || !is_minor_word(&clean.to_lowercase()) {
            if initial.is_alphabetic() && !initial.is_uppercase() {
                return false;
            }
        } else if initial.is_alphabetic() && !initial.is_lowercase() {
            // interior minor word should stay lowercase
            return false;
        }
    }
    true
}

/// Rewrite the first alphanumeric character of a token
fn recase_token(token: &str, uppercase: bool) -> String {
    let mut out = String::with_capacity(token.len());
    let mut done = false;
    for c in token.chars() {
        if !done && c.is_alphanumeric() {
            done = true;
            if uppercase {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Produce the headline-capitalized form of a heading.
///
/// Idempotent: `to_title_case(to_title_case(x)) == to_title_case(x)`.
pub fn to_title_case(text: &str) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let significant = significant_indices(&tokens);
    let (Some(&first), Some(&last)) = (significant.first(), significant.last()) else {
        return text.trim().to_string();
    };

    let corrected: Vec<String> = tokens
        .iter()
        .enumerate()
        .map(|(idx, token)| {
            let clean = clean_token(token);
            if clean.is_empty() {
                return token.to_string();
            }
            let is_edge = idx == first || idx == last;
            let lowercase_minor = !is_edge && is_minor_word(&clean.to_lowercase());
            recase_token(token, !lowercase_minor)
        })
        .collect();

    corrected.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_accepts_proper_title_case() {
        assert!(is_title_case("A Study of Results"));
        assert!(is_title_case("The Use of the Comma in Lists"));
        assert!(is_title_case("Writing for an Audience"));
    }

    #[test]
    fn test_rejects_lowercase_major_word() {
        assert!(!is_title_case("A study of the Results"));
    }

    #[test]
    fn test_rejects_capitalized_interior_minor_word() {
        assert!(!is_title_case("A Study Of Results"));
    }

    #[test]
    fn test_edge_minor_words_must_be_capitalized() {
        assert!(is_title_case("The Results"));
        assert!(!is_title_case("the Results"));
        // Last token is a minor word but still must be capitalized
        assert!(!is_title_case("What It All Adds up to"));
        assert!(is_title_case("What It All Adds up To"));
    }

    #[test]
    fn test_correction_matches_expected_fix() {
        assert_eq!(to_title_case("A study of the Results"), "A Study of the Results");
    }

    #[test]
    fn test_correction_lowercases_interior_minor_words() {
        assert_eq!(to_title_case("A Study Of Results"), "A Study of Results");
    }

    #[test]
    fn test_punctuation_only_tokens_are_skipped() {
        assert!(is_title_case("Results — and Methods"));
        assert_eq!(to_title_case("results — and methods"), "Results — and Methods");
    }

    #[test]
    fn test_acronyms_survive_correction() {
        assert_eq!(to_title_case("APA and the MLA"), "APA and the MLA");
    }

    #[test]
    fn test_corrected_text_passes_check() {
        for heading in [
            "a study of the results",
            "ON THE ORIGIN of species",
            "what it all adds up to",
        ] {
            assert!(is_title_case(&to_title_case(heading)));
        }
    }

    proptest! {
        #[test]
        fn prop_correction_is_idempotent(s in "[ a-zA-Z0-9'\\-()]{0,40}") {
            let once = to_title_case(&s);
            let twice = to_title_case(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_corrected_headings_pass_the_check(s in "[ a-zA-Z]{1,40}") {
            prop_assert!(is_title_case(&to_title_case(&s)));
        }
    }
}
