//! Term matching for candidate domains.
//!
//! A [`TermMatcher`] holds the term list and compiles it into a single
//! case-insensitive [`RegexSet`] of escaped literals, so each domain is
//! scanned once no matter how many terms there are.

use regex::{RegexSet, RegexSetBuilder};
use tracing::debug;

use crate::error::{Error, Result};

/// Terms flagged when no term list is configured.
pub const DEFAULT_TERMS: &[&str] = &["cisco", "gmail", "login", "mail", "paying", "paypal", ".gov"];

/// Number of distinct terms a domain must contain to count as a lure.
pub const DEFAULT_MIN_MATCHES: usize = 2;

/// Multi-pattern substring matcher over domain names.
#[derive(Debug, Clone)]
pub struct TermMatcher {
    terms: Vec<String>,
    set: RegexSet,
    min_matches: usize,
}

impl TermMatcher {
    /// Build a matcher from a term list and a lure threshold.
    ///
    /// Terms are trimmed and lowercased. Repeated terms are kept once, at
    /// their first position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTerm`] for a blank term,
    /// [`Error::EmptyTermList`] when no terms are given, and
    /// [`Error::InvalidThreshold`] when `min_matches` is zero or exceeds the
    /// number of distinct terms.
    pub fn new<I, S>(terms: I, min_matches: usize) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for raw in terms {
            let term = raw.as_ref().trim().to_lowercase();
            if term.is_empty() {
                return Err(Error::invalid_term(raw.as_ref(), "term is empty"));
            }
            if !normalized.contains(&term) {
                normalized.push(term);
            }
        }

        if normalized.is_empty() {
            return Err(Error::EmptyTermList);
        }
        if min_matches == 0 || min_matches > normalized.len() {
            return Err(Error::InvalidThreshold {
                min_matches,
                terms: normalized.len(),
            });
        }

        let set = RegexSetBuilder::new(normalized.iter().map(|t| regex::escape(t)))
            .case_insensitive(true)
            .build()?;

        debug!(terms = normalized.len(), min_matches, "Compiled term matcher");
        Ok(Self {
            terms: normalized,
            set,
            min_matches,
        })
    }

    /// The normalized term list, in match order.
    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// The lure threshold.
    #[must_use]
    pub fn min_matches(&self) -> usize {
        self.min_matches
    }

    /// All terms found in `domain`, in term-list order.
    ///
    /// Overlapping terms each count: `gmail.com` yields both `gmail` and `mail`.
    #[must_use]
    pub fn matches(&self, domain: &str) -> Vec<&str> {
        self.set
            .matches(domain)
            .into_iter()
            .map(|i| self.terms[i].as_str())
            .collect()
    }

    /// Whether `domain` contains at least `min_matches` terms.
    #[must_use]
    pub fn is_lure(&self, domain: &str) -> bool {
        self.matches(domain).len() >= self.min_matches
    }
}

impl Default for TermMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_TERMS, DEFAULT_MIN_MATCHES).expect("default term list is valid")
    }
}
