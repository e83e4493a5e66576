//! Layer 2 - pattern detectors.
//!
//! A fixed but extensible registry of independent regex detectors run over
//! the raw text of every block. Each detector reports every non-overlapping
//! match as its own finding with a byte span. Detectors are commutative:
//! registration order only affects output ordering, never which matches are
//! found. A detector whose pattern does not compile is rejected at
//! registration and skipped with a warning.

use regex::Regex;
use shared_types::Severity;
use tracing::warn;

use crate::error::AuditError;
use crate::layers::Finding;

/// How a detector recognizes a match
enum Matcher {
    Plain(Regex),
    /// Match the regex, then drop matches immediately followed by the
    /// given character. Stands in for negative lookahead, which the regex
    /// crate does not support.
    NotFollowedBy(Regex, char),
}

impl Matcher {
    fn matches<'t>(&self, text: &'t str) -> Vec<(usize, usize)> {
        match self {
            Matcher::Plain(re) => re.find_iter(text).map(|m| (m.start(), m.end())).collect(),
            Matcher::NotFollowedBy(re, forbidden) => re
                .find_iter(text)
                .filter(|m| text[m.end()..].chars().next() != Some(*forbidden))
                .map(|m| (m.start(), m.end()))
                .collect(),
        }
    }
}

struct PatternDetector {
    rule_id: String,
    tags: Vec<String>,
    severity: Severity,
    message: String,
    suggested_fix: Option<String>,
    matcher: Matcher,
}

pub struct PatternRegistry {
    detectors: Vec<PatternDetector>,
}

impl PatternRegistry {
    pub fn empty() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    /// Register a plain regex detector.
    ///
    /// An invalid pattern is an error; `register_or_skip` is the lenient
    /// variant used when loading detector tables.
    pub fn register(
        &mut self,
        rule_id: &str,
        pattern: &str,
        tags: &[&str],
        severity: Severity,
        message: &str,
        suggested_fix: Option<&str>,
    ) -> Result<(), AuditError> {
        let regex = Regex::new(pattern).map_err(|source| AuditError::InvalidPattern {
            rule_id: rule_id.to_string(),
            source: Box::new(source),
        })?;
        self.push(rule_id, tags, severity, message, suggested_fix, Matcher::Plain(regex));
        Ok(())
    }

    /// Register a detector, skipping it with a warning when the pattern is
    /// invalid. The engine keeps running without the broken detector.
    pub fn register_or_skip(
        &mut self,
        rule_id: &str,
        pattern: &str,
        tags: &[&str],
        severity: Severity,
        message: &str,
        suggested_fix: Option<&str>,
    ) {
        if let Err(err) = self.register(rule_id, pattern, tags, severity, message, suggested_fix) {
            warn!(rule_id, %err, "skipping pattern detector with invalid expression");
        }
    }

    fn register_not_followed_by(
        &mut self,
        rule_id: &str,
        pattern: &str,
        forbidden: char,
        tags: &[&str],
        severity: Severity,
        message: &str,
        suggested_fix: Option<&str>,
    ) -> Result<(), AuditError> {
        let regex = Regex::new(pattern).map_err(|source| AuditError::InvalidPattern {
            rule_id: rule_id.to_string(),
            source: Box::new(source),
        })?;
        self.push(
            rule_id,
            tags,
            severity,
            message,
            suggested_fix,
            Matcher::NotFollowedBy(regex, forbidden),
        );
        Ok(())
    }

    fn push(
        &mut self,
        rule_id: &str,
        tags: &[&str],
        severity: Severity,
        message: &str,
        suggested_fix: Option<&str>,
        matcher: Matcher,
    ) {
        self.detectors.push(PatternDetector {
            rule_id: rule_id.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            severity,
            message: message.to_string(),
            suggested_fix: suggested_fix.map(str::to_string),
            matcher,
        });
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Run every detector over one block's text
    pub fn run(&self, text: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        for detector in &self.detectors {
            for (start, end) in detector.matcher.matches(text) {
                let mut finding = Finding {
                    rule_id: detector.rule_id.clone(),
                    tags: detector.tags.clone(),
                    severity: detector.severity,
                    message: detector.message.clone(),
                    excerpt: None,
                    span: Some((start, end)),
                    suggested_fix: detector.suggested_fix.clone(),
                };
                finding.excerpt = Some(text[start..end].to_string());
                findings.push(finding);
            }
        }
        findings
    }
}

impl Default for PatternRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();

        // Any parenthetical containing a 4-digit year
        registry.register_or_skip(
            "REGEX-CITATION-YEAR",
            r"\([^)]*\b\d{4}\b[^)]*\)",
            &["citation"],
            Severity::Info,
            "Potential citation detected.",
            Some("Verify citation format; avoid placing citations in headings."),
        );

        // 'et al' must be followed by a period
        if let Err(err) = registry.register_not_followed_by(
            "APS-ET-AL-PERIOD",
            r"(?i)\bet al\b",
            '.',
            &["citation", "et-al"],
            Severity::Warning,
            "In 'et al.', a period must follow 'al'.",
            Some("Change 'et al' \u{2192} 'et al.'."),
        ) {
            warn!(%err, "skipping pattern detector with invalid expression");
        }

        registry.register_or_skip(
            "PUNCT-DOUBLE-SPACE",
            r"\. {2,}",
            &["punctuation"],
            Severity::Info,
            "Double space after a period.",
            Some("Replace with a single space."),
        );

        // A URL interrupted by whitespace, where the continuation still
        // looks like a path or domain fragment
        registry.register_or_skip(
            "URL-SPACE",
            r"https?://\S+[ \t]+[a-z0-9]*[./][a-z0-9./_~#?&=%-]+",
            &["url"],
            Severity::Warning,
            "URL appears to contain a space.",
            Some("Remove spaces; ensure full URL is contiguous."),
        );

        registry.register_or_skip(
            "DOI-DETECTED",
            r"\b10\.\d{4,9}/[-._;()/:A-Za-z0-9]+\b",
            &["doi"],
            Severity::Info,
            "DOI detected; ensure correct formatting.",
            Some("Check that the DOI is correct and formatted consistently."),
        );

        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids_of(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.rule_id.as_str()).collect()
    }

    #[test]
    fn test_citation_year_matches_exactly_once() {
        let registry = PatternRegistry::default();
        let findings = registry.run("As shown before (Smith, 2019), results vary.");
        assert_eq!(ids_of(&findings), vec!["REGEX-CITATION-YEAR"]);
        let (start, end) = findings[0].span.unwrap();
        assert_eq!(&"As shown before (Smith, 2019), results vary."[start..end], "(Smith, 2019)");
    }

    #[test]
    fn test_parenthetical_without_year_passes() {
        let registry = PatternRegistry::default();
        assert!(registry.run("An aside (see appendix) with no year.").is_empty());
    }

    #[test]
    fn test_et_al_without_period_flagged_per_occurrence() {
        let registry = PatternRegistry::default();
        let findings = registry.run("Smith et al found what Jones et al missed.");
        assert_eq!(
            ids_of(&findings),
            vec!["APS-ET-AL-PERIOD", "APS-ET-AL-PERIOD"]
        );
    }

    #[test]
    fn test_et_al_with_period_passes() {
        let registry = PatternRegistry::default();
        assert!(registry.run("Smith et al. agree.").is_empty());
        // with a year, only the citation-year finding fires
        let findings = registry.run("Smith et al. (2020) agree.");
        assert_eq!(ids_of(&findings), vec!["REGEX-CITATION-YEAR"]);
    }

    #[test]
    fn test_double_space_after_period() {
        let registry = PatternRegistry::default();
        let findings = registry.run("End of sentence.  Next one.");
        assert_eq!(ids_of(&findings), vec!["PUNCT-DOUBLE-SPACE"]);
    }

    #[test]
    fn test_url_with_embedded_space() {
        let registry = PatternRegistry::default();
        let findings = registry.run("See https://example.org/long path/to/page for details.");
        assert_eq!(ids_of(&findings), vec!["URL-SPACE"]);
    }

    #[test]
    fn test_intact_url_followed_by_prose_passes() {
        let registry = PatternRegistry::default();
        assert!(registry
            .run("See https://example.org/page and then read on. More text here.")
            .is_empty());
    }

    #[test]
    fn test_doi_detected() {
        let registry = PatternRegistry::default();
        let findings = registry.run("Available at 10.1037/a0024338 online.");
        assert_eq!(ids_of(&findings), vec!["DOI-DETECTED"]);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let mut registry = PatternRegistry::empty();
        let result = registry.register(
            "BAD-RULE",
            r"(unclosed",
            &[],
            Severity::Info,
            "never fires",
            None,
        );
        assert!(matches!(result, Err(AuditError::InvalidPattern { .. })));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_or_skip_keeps_engine_running() {
        let mut registry = PatternRegistry::empty();
        registry.register_or_skip("BAD-RULE", r"(unclosed", &[], Severity::Info, "x", None);
        registry.register_or_skip("GOOD-RULE", r"good", &[], Severity::Info, "found", None);
        assert_eq!(registry.len(), 1);
        assert_eq!(ids_of(&registry.run("a good day")), vec!["GOOD-RULE"]);
    }

    #[test]
    fn test_registration_order_only_affects_output_order() {
        let text = "a good day for a fine walk";
        let mut forward = PatternRegistry::empty();
        forward.register_or_skip("A-RULE", r"good", &[], Severity::Info, "a", None);
        forward.register_or_skip("B-RULE", r"fine", &[], Severity::Info, "b", None);
        let mut backward = PatternRegistry::empty();
        backward.register_or_skip("B-RULE", r"fine", &[], Severity::Info, "b", None);
        backward.register_or_skip("A-RULE", r"good", &[], Severity::Info, "a", None);

        let mut a: Vec<_> = forward
            .run(text)
            .into_iter()
            .map(|f| (f.rule_id, f.span))
            .collect();
        let mut b: Vec<_> = backward
            .run(text)
            .into_iter()
            .map(|f| (f.rule_id, f.span))
            .collect();
        assert_ne!(a, b);
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }
}
