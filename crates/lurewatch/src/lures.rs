//! Lure identification.
//!
//! This module turns a list of candidate domains into the subset that
//! looks like phishing lures, keeping the terms that flagged each one.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::terms::TermMatcher;

/// A domain flagged as a likely phishing lure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lure {
    /// The domain as it appeared in the input, trimmed.
    pub domain: String,

    /// Terms found in the domain, in term-list order.
    pub matched_terms: Vec<String>,
}

impl Lure {
    /// Create a new lure record.
    #[must_use]
    pub fn new(domain: impl Into<String>, matched_terms: Vec<String>) -> Self {
        Self {
            domain: domain.into(),
            matched_terms,
        }
    }
}

impl std::fmt::Display for Lure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.domain, self.matched_terms.join(", "))
    }
}

/// Check a single domain, returning a [`Lure`] if it reaches the threshold.
///
/// Blank input yields `None`.
#[must_use]
pub fn check_domain(matcher: &TermMatcher, domain: &str) -> Option<Lure> {
    let domain = domain.trim();
    if domain.is_empty() {
        return None;
    }

    let matched = matcher.matches(domain);
    trace!(domain, matches = matched.len(), "Checked domain");
    if matched.len() < matcher.min_matches() {
        return None;
    }

    Some(Lure::new(
        domain,
        matched.into_iter().map(str::to_string).collect(),
    ))
}

/// Identify lures among `domains`, preserving input order.
///
/// Repeated domains produce repeated lures; deduplication happens when
/// notifications are planned.
pub fn identify_lures<I, S>(matcher: &TermMatcher, domains: I) -> Vec<Lure>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut scanned = 0usize;
    let lures: Vec<Lure> = domains
        .into_iter()
        .inspect(|_| scanned += 1)
        .filter_map(|d| check_domain(matcher, d.as_ref()))
        .collect();

    debug!(scanned, lures = lures.len(), "Identified lures");
    lures
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_domains() -> Vec<&'static str> {
        vec![
            "paypal-login.appspot.com",
            "ciscomail.com",
            "cisco.heroku.com",
            "apple.com",
        ]
    }

    #[test]
    fn test_identify_lures_reference_sample() {
        let lures = identify_lures(&TermMatcher::default(), sample_domains());

        assert_eq!(
            lures,
            vec![
                Lure::new(
                    "paypal-login.appspot.com",
                    vec!["login".to_string(), "paypal".to_string()]
                ),
                Lure::new(
                    "ciscomail.com",
                    vec!["cisco".to_string(), "mail".to_string()]
                ),
            ]
        );
    }

    #[test]
    fn test_original_casing_preserved() {
        let lure = check_domain(&TermMatcher::default(), "  PayPal-Login.com \n").unwrap();
        assert_eq!(lure.domain, "PayPal-Login.com");
        assert_eq!(lure.matched_terms, vec!["login", "paypal"]);
    }

    #[test]
    fn test_blank_domains_skipped() {
        let lures = identify_lures(&TermMatcher::default(), ["", "   ", "gmail-login.net"]);
        assert_eq!(lures.len(), 1);
        assert_eq!(lures[0].domain, "gmail-login.net");
    }

    #[test]
    fn test_repeated_domains_kept() {
        let lures = identify_lures(&TermMatcher::default(), ["ciscomail.com", "ciscomail.com"]);
        assert_eq!(lures.len(), 2);
    }

    #[test]
    fn test_no_lures() {
        let lures = identify_lures(&TermMatcher::default(), ["example.com", "rust-lang.org"]);
        assert!(lures.is_empty());
    }

    #[test]
    fn test_lure_display() {
        let lure = Lure::new("ciscomail.com", vec!["cisco".into(), "mail".into()]);
        assert_eq!(lure.to_string(), "ciscomail.com [cisco, mail]");
    }

    #[test]
    fn test_lure_serialize() {
        let lure = Lure::new("ciscomail.com", vec!["cisco".into(), "mail".into()]);
        let json = serde_json::to_string(&lure).unwrap();
        assert_eq!(
            json,
            r#"{"domain":"ciscomail.com","matched_terms":["cisco","mail"]}"#
        );
    }
}
