//! Team hierarchy and reporting chains.
//!
//! The hierarchy is stored as a user → manager map. From it we derive a
//! [`ReportsChain`]: for every user, the set of everyone who reports to them
//! directly or through intermediate managers. Notifications for a subscriber
//! fan out to that whole set.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::error::{Error, Result};

/// Who reports to whom, one manager per user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamHierarchy {
    managers: BTreeMap<String, Option<String>>,
}

/// Every user's direct and indirect reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportsChain {
    subordinates: BTreeMap<String, BTreeSet<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

impl TeamHierarchy {
    /// Create an empty hierarchy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a hierarchy from `(user, manager)` pairs.
    ///
    /// A later pair for the same user replaces the earlier one.
    pub fn from_pairs<I, U, M>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (U, Option<M>)>,
        U: Into<String>,
        M: Into<String>,
    {
        let mut hierarchy = Self::new();
        for (user, manager) in pairs {
            hierarchy.set_manager(user, manager);
        }
        hierarchy
    }

    /// Record that `user` reports to `manager` (or to nobody).
    pub fn set_manager(&mut self, user: impl Into<String>, manager: Option<impl Into<String>>) {
        self.managers.insert(user.into(), manager.map(Into::into));
    }

    /// The manager `user` reports to, if any.
    #[must_use]
    pub fn manager_of(&self, user: &str) -> Option<&str> {
        self.managers.get(user).and_then(|m| m.as_deref())
    }

    /// Number of users with a hierarchy entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.managers.len()
    }

    /// Whether the hierarchy has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }

    /// Every user named in the hierarchy, as a report or as a manager.
    fn users(&self) -> BTreeSet<&str> {
        self.managers
            .iter()
            .flat_map(|(user, manager)| std::iter::once(user.as_str()).chain(manager.as_deref()))
            .collect()
    }

    /// Manager → direct reports.
    fn direct_reports(&self) -> HashMap<&str, Vec<&str>> {
        let mut reports: HashMap<&str, Vec<&str>> = HashMap::new();
        for (user, manager) in &self.managers {
            if let Some(manager) = manager {
                reports.entry(manager.as_str()).or_default().push(user.as_str());
            }
        }
        reports
    }

    /// Compute every user's transitive reports.
    ///
    /// Walks the graph iteratively, so deep organizations don't grow the
    /// call stack.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HierarchyCycle`] if any user reports to themselves,
    /// directly or through others.
    pub fn reports_chain(&self) -> Result<ReportsChain> {
        let reports = self.direct_reports();
        let mut state: HashMap<&str, Visit> = HashMap::new();
        let mut subordinates: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for start in self.users() {
            if state.contains_key(start) {
                continue;
            }

            let mut stack: Vec<(&str, bool)> = vec![(start, false)];
            while let Some((user, expanded)) = stack.pop() {
                let children = reports.get(user).map(Vec::as_slice).unwrap_or_default();

                if expanded {
                    let mut below = BTreeSet::new();
                    for &child in children {
                        below.insert(child.to_string());
                        if let Some(grand) = subordinates.get(child) {
                            below.extend(grand.iter().cloned());
                        }
                    }
                    state.insert(user, Visit::Done);
                    subordinates.insert(user.to_string(), below);
                    continue;
                }

                if state.get(user) == Some(&Visit::Done) {
                    continue;
                }
                state.insert(user, Visit::InProgress);
                stack.push((user, true));

                for &child in children {
                    match state.get(child) {
                        Some(Visit::InProgress) => {
                            return Err(Error::HierarchyCycle {
                                user: child.to_string(),
                            });
                        }
                        Some(Visit::Done) => {}
                        None => stack.push((child, false)),
                    }
                }
            }
        }

        debug!(users = subordinates.len(), "Built reports chain");
        Ok(ReportsChain { subordinates })
    }
}

impl ReportsChain {
    /// Everyone below `user`, or `None` if the user isn't in the hierarchy.
    #[must_use]
    pub fn subordinates(&self, user: &str) -> Option<&BTreeSet<String>> {
        self.subordinates.get(user)
    }

    /// Number of users in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subordinates.len()
    }

    /// Whether the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subordinates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(set: &BTreeSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    /// E ← B ← {A, C}, C ← K, D standalone.
    fn sample() -> TeamHierarchy {
        TeamHierarchy::from_pairs([
            ("A", Some("B")),
            ("B", Some("E")),
            ("C", Some("B")),
            ("K", Some("C")),
            ("E", None::<&str>),
            ("D", None),
        ])
    }

    #[test]
    fn test_transitive_reports() {
        let chain = sample().reports_chain().unwrap();

        assert_eq!(names(chain.subordinates("E").unwrap()), vec!["A", "B", "C", "K"]);
        assert_eq!(names(chain.subordinates("B").unwrap()), vec!["A", "C", "K"]);
        assert_eq!(names(chain.subordinates("C").unwrap()), vec!["K"]);
        assert!(chain.subordinates("K").unwrap().is_empty());
        assert!(chain.subordinates("D").unwrap().is_empty());
    }

    #[test]
    fn test_manager_only_user_is_included() {
        let hierarchy = TeamHierarchy::from_pairs([("A", Some("Z"))]);
        let chain = hierarchy.reports_chain().unwrap();

        assert_eq!(names(chain.subordinates("Z").unwrap()), vec!["A"]);
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_unknown_user() {
        let chain = sample().reports_chain().unwrap();
        assert!(chain.subordinates("nobody").is_none());
    }

    #[test]
    fn test_manager_of() {
        let hierarchy = sample();
        assert_eq!(hierarchy.manager_of("A"), Some("B"));
        assert_eq!(hierarchy.manager_of("E"), None);
        assert_eq!(hierarchy.manager_of("nobody"), None);
    }

    #[test]
    fn test_later_pair_overrides() {
        let hierarchy = TeamHierarchy::from_pairs([("A", Some("B")), ("A", Some("C"))]);
        assert_eq!(hierarchy.manager_of("A"), Some("C"));
        assert_eq!(hierarchy.len(), 1);
    }

    #[test]
    fn test_cycle_detected() {
        let hierarchy = TeamHierarchy::from_pairs([
            ("A", Some("B")),
            ("B", Some("C")),
            ("C", Some("A")),
        ]);
        let err = hierarchy.reports_chain().unwrap_err();
        assert!(matches!(err, Error::HierarchyCycle { .. }));
    }

    #[test]
    fn test_self_report_detected() {
        let hierarchy = TeamHierarchy::from_pairs([("A", Some("A"))]);
        assert!(hierarchy.reports_chain().is_err());
    }

    #[test]
    fn test_cycle_below_valid_root_detected() {
        let hierarchy = TeamHierarchy::from_pairs([
            ("root", None),
            ("X", Some("Y")),
            ("Y", Some("X")),
        ]);
        assert!(hierarchy.reports_chain().is_err());
    }

    #[test]
    fn test_deep_chain() {
        let pairs: Vec<(String, Option<String>)> = (1..1_000)
            .map(|i| (format!("u{i}"), Some(format!("u{}", i - 1))))
            .collect();
        let chain = TeamHierarchy::from_pairs(pairs).reports_chain().unwrap();

        assert_eq!(chain.subordinates("u0").unwrap().len(), 999);
        assert!(chain.subordinates("u999").unwrap().is_empty());
    }

    #[test]
    fn test_empty_hierarchy() {
        let hierarchy = TeamHierarchy::new();
        assert!(hierarchy.is_empty());
        assert!(hierarchy.reports_chain().unwrap().is_empty());
    }
}
