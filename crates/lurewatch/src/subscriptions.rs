//! User term subscriptions.

use std::collections::BTreeMap;

/// Which terms each user has asked to be alerted on.
///
/// Users keep their insertion order; each user's terms keep the order they
/// were added in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscriptions {
    users: Vec<String>,
    terms: BTreeMap<String, Vec<String>>,
}

impl Subscriptions {
    /// Create an empty subscription table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `user` to `term`.
    ///
    /// The term is trimmed and lowercased. Returns `false` if the user was
    /// already subscribed to it or the term is blank.
    pub fn add(&mut self, user: impl Into<String>, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return false;
        }

        let user = user.into();
        if !self.terms.contains_key(&user) {
            self.users.push(user.clone());
        }
        let entry = self.terms.entry(user).or_default();
        if entry.contains(&term) {
            return false;
        }
        entry.push(term);
        true
    }

    /// Terms `user` is subscribed to.
    #[must_use]
    pub fn terms_for(&self, user: &str) -> &[String] {
        self.terms.get(user).map(Vec::as_slice).unwrap_or_default()
    }

    /// Users subscribed to `term`, in insertion order.
    #[must_use]
    pub fn subscribers_of(&self, term: &str) -> Vec<&str> {
        let term = term.trim().to_lowercase();
        self.iter()
            .filter(|(_, terms)| terms.contains(&term))
            .map(|(user, _)| user)
            .collect()
    }

    /// Iterate `(user, terms)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.users
            .iter()
            .map(|user| (user.as_str(), self.terms_for(user)))
    }

    /// Number of subscribed users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether nobody is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl<U: Into<String>, T: AsRef<str>> FromIterator<(U, T)> for Subscriptions {
    fn from_iter<I: IntoIterator<Item = (U, T)>>(iter: I) -> Self {
        let mut subscriptions = Self::new();
        for (user, term) in iter {
            subscriptions.add(user, term.as_ref());
        }
        subscriptions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut subs = Subscriptions::new();
        assert!(subs.add("A", "cisco"));
        assert!(subs.add("A", "mail"));
        assert!(subs.add("B", "paypal"));

        assert_eq!(subs.terms_for("A"), &["cisco".to_string(), "mail".to_string()]);
        assert_eq!(subs.subscribers_of("paypal"), vec!["B"]);
        assert_eq!(subs.len(), 2);
    }

    #[test]
    fn test_duplicate_subscription_ignored() {
        let mut subs = Subscriptions::new();
        assert!(subs.add("A", "cisco"));
        assert!(!subs.add("A", " CISCO "));
        assert_eq!(subs.terms_for("A").len(), 1);
    }

    #[test]
    fn test_blank_term_ignored() {
        let mut subs = Subscriptions::new();
        assert!(!subs.add("A", "   "));
        assert!(subs.is_empty());
    }

    #[test]
    fn test_unknown_user_has_no_terms() {
        let subs = Subscriptions::new();
        assert!(subs.terms_for("ghost").is_empty());
        assert!(subs.subscribers_of("cisco").is_empty());
    }

    #[test]
    fn test_iter_keeps_insertion_order() {
        let subs: Subscriptions = [("Z", "mail"), ("A", "cisco"), ("Z", "login")]
            .into_iter()
            .collect();

        let users: Vec<&str> = subs.iter().map(|(user, _)| user).collect();
        assert_eq!(users, vec!["Z", "A"]);
        assert_eq!(subs.subscribers_of("MAIL"), vec!["Z"]);
    }
}
