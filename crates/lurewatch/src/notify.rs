//! Notification planning.
//!
//! [`LureNotifier`] ties the term matcher, the subscription table and the
//! team hierarchy together. The expensive parts (reporting chains and the
//! term → recipients map) are computed once, when the notifier is built, so
//! each scan only does set unions.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::hierarchy::{ReportsChain, TeamHierarchy};
use crate::lures::{identify_lures, Lure};
use crate::subscriptions::Subscriptions;
use crate::terms::TermMatcher;

/// Who to alert about one lure domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// The lure domain.
    pub domain: String,

    /// Terms that flagged the domain.
    pub terms: Vec<String>,

    /// Users to notify, sorted.
    pub users: Vec<String>,
}

/// Identifies lures and works out who needs to hear about them.
#[derive(Debug, Clone)]
pub struct LureNotifier {
    matcher: TermMatcher,
    chain: ReportsChain,
    recipients: BTreeMap<String, BTreeSet<String>>,
}

impl LureNotifier {
    /// Build a notifier, precomputing reporting chains and term recipients.
    ///
    /// A subscriber to a term receives alerts for it, and so does everyone
    /// who reports to that subscriber.
    ///
    /// # Errors
    ///
    /// Returns an error if the hierarchy contains a reporting cycle.
    pub fn new(
        matcher: TermMatcher,
        subscriptions: &Subscriptions,
        hierarchy: &TeamHierarchy,
    ) -> Result<Self> {
        let chain = hierarchy.reports_chain()?;

        let mut recipients: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (user, terms) in subscriptions.iter() {
            let below = chain.subordinates(user);
            for term in terms {
                let entry = recipients.entry(term.clone()).or_default();
                entry.insert(user.to_string());
                if let Some(below) = below {
                    entry.extend(below.iter().cloned());
                }
            }
        }

        let unmatched: Vec<&str> = recipients
            .keys()
            .filter(|t| !matcher.terms().contains(*t))
            .map(String::as_str)
            .collect();
        if !unmatched.is_empty() {
            debug!(?unmatched, "Subscriptions reference terms outside the term list");
        }

        info!(
            subscribers = subscriptions.len(),
            hierarchy_users = chain.len(),
            terms = recipients.len(),
            "Notifier ready"
        );
        Ok(Self {
            matcher,
            chain,
            recipients,
        })
    }

    /// The term matcher in use.
    #[must_use]
    pub fn matcher(&self) -> &TermMatcher {
        &self.matcher
    }

    /// The precomputed reporting chain.
    #[must_use]
    pub fn reports_chain(&self) -> &ReportsChain {
        &self.chain
    }

    /// Everyone alerted when `term` is hit.
    #[must_use]
    pub fn users_for_term(&self, term: &str) -> Option<&BTreeSet<String>> {
        self.recipients.get(term)
    }

    /// Identify lures among `domains`.
    pub fn identify_lures<I, S>(&self, domains: I) -> Vec<Lure>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        identify_lures(&self.matcher, domains)
    }

    /// Plan the notification for a single lure.
    #[must_use]
    pub fn plan(&self, lure: &Lure) -> Notification {
        let users: BTreeSet<&String> = lure
            .matched_terms
            .iter()
            .filter_map(|term| self.recipients.get(term))
            .flatten()
            .collect();

        Notification {
            domain: lure.domain.clone(),
            terms: lure.matched_terms.clone(),
            users: users.into_iter().cloned().collect(),
        }
    }

    /// Plan notifications for `lures`.
    ///
    /// Produces one entry per distinct domain, in first-seen order. A lure
    /// nobody subscribes to still gets an entry, with no users.
    #[must_use]
    pub fn notify(&self, lures: &[Lure]) -> Vec<Notification> {
        let mut seen: HashSet<&str> = HashSet::new();
        let notifications: Vec<Notification> = lures
            .iter()
            .filter(|lure| seen.insert(lure.domain.as_str()))
            .map(|lure| self.plan(lure))
            .collect();

        debug!(
            lures = lures.len(),
            notifications = notifications.len(),
            "Planned notifications"
        );
        notifications
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The reference scenario: subscriptions and reporting graph that
    /// yield `paypal-login → {B, E}` and `ciscomail → {A, B, C, E, K}`.
    fn reference_notifier() -> LureNotifier {
        let subscriptions: Subscriptions = [
            ("E", "paypal"),
            ("B", "login"),
            ("C", "cisco"),
            ("E", "mail"),
            ("B", "mail"),
            ("F", "gmail"),
        ]
        .into_iter()
        .collect();

        let hierarchy = TeamHierarchy::from_pairs([
            ("A", Some("C")),
            ("K", Some("C")),
            ("C", Some("D")),
            ("B", Some("D")),
            ("E", Some("D")),
            ("F", Some("D")),
        ]);

        LureNotifier::new(TermMatcher::default(), &subscriptions, &hierarchy).unwrap()
    }

    #[test]
    fn test_reference_scenario() {
        let notifier = reference_notifier();
        let lures = notifier.identify_lures([
            "paypal-login.appspot.com",
            "ciscomail.com",
            "cisco.heroku.com",
            "apple.com",
        ]);
        let notifications = notifier.notify(&lures);

        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].domain, "paypal-login.appspot.com");
        assert_eq!(notifications[0].users, vec!["B", "E"]);
        assert_eq!(notifications[1].domain, "ciscomail.com");
        assert_eq!(notifications[1].users, vec!["A", "B", "C", "E", "K"]);
    }

    #[test]
    fn test_subscriber_reports_are_included() {
        let notifier = reference_notifier();
        let users = notifier.users_for_term("cisco").unwrap();
        assert!(users.contains("C"));
        assert!(users.contains("K"));
        assert!(!users.contains("D"));
    }

    #[test]
    fn test_managers_are_not_included() {
        let notifier = reference_notifier();
        let users = notifier.users_for_term("paypal").unwrap();
        assert_eq!(users.iter().collect::<Vec<_>>(), vec!["E"]);
    }

    #[test]
    fn test_unsubscribed_lure_has_no_users() {
        let subscriptions = Subscriptions::new();
        let notifier = LureNotifier::new(
            TermMatcher::default(),
            &subscriptions,
            &TeamHierarchy::new(),
        )
        .unwrap();

        let notifications = notifier.notify(&[Lure::new(
            "ciscomail.com",
            vec!["cisco".into(), "mail".into()],
        )]);
        assert_eq!(notifications.len(), 1);
        assert!(notifications[0].users.is_empty());
    }

    #[test]
    fn test_duplicate_domains_collapse() {
        let notifier = reference_notifier();
        let lures = notifier.identify_lures(["ciscomail.com", "gmail-login.com", "ciscomail.com"]);
        assert_eq!(lures.len(), 3);

        let notifications = notifier.notify(&lures);
        let domains: Vec<&str> = notifications.iter().map(|n| n.domain.as_str()).collect();
        assert_eq!(domains, vec!["ciscomail.com", "gmail-login.com"]);
    }

    #[test]
    fn test_subscriber_outside_hierarchy() {
        let subscriptions: Subscriptions = [("loner", "paypal")].into_iter().collect();
        let notifier = LureNotifier::new(
            TermMatcher::default(),
            &subscriptions,
            &TeamHierarchy::new(),
        )
        .unwrap();

        let lure = Lure::new("paypal-login.com", vec!["login".into(), "paypal".into()]);
        assert_eq!(notifier.plan(&lure).users, vec!["loner"]);
    }

    #[test]
    fn test_cycle_rejected() {
        let hierarchy = TeamHierarchy::from_pairs([("A", Some("B")), ("B", Some("A"))]);
        let result = LureNotifier::new(TermMatcher::default(), &Subscriptions::new(), &hierarchy);
        assert!(result.is_err());
    }

    #[test]
    fn test_notification_serialize() {
        let notification = Notification {
            domain: "ciscomail.com".to_string(),
            terms: vec!["cisco".to_string()],
            users: vec!["C".to_string()],
        };
        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["domain"], "ciscomail.com");
        assert_eq!(json["users"][0], "C");
    }
}
