//! `lurewatch` - Phishing-lure domain detection with hierarchical notification
//!
//! This library flags candidate domains that contain several suspicious terms
//! and works out which users to alert: every subscriber to a matched term,
//! plus everyone who reports to that subscriber.
//!
//! ```
//! use lurewatch::{LureNotifier, Subscriptions, TeamHierarchy, TermMatcher};
//!
//! let subscriptions: Subscriptions = [("C", "cisco"), ("B", "mail")].into_iter().collect();
//! let hierarchy = TeamHierarchy::from_pairs([("K", Some("C"))]);
//! let notifier = LureNotifier::new(TermMatcher::default(), &subscriptions, &hierarchy)?;
//!
//! let lures = notifier.identify_lures(["ciscomail.com", "apple.com"]);
//! let notifications = notifier.notify(&lures);
//! assert_eq!(notifications[0].users, vec!["B", "C", "K"]);
//! # Ok::<(), lurewatch::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod input;
pub mod logging;
pub mod lures;
pub mod notify;
pub mod pipeline;
pub mod storage;
pub mod subscriptions;
pub mod terms;

pub use config::Config;
pub use error::{Error, Result};
pub use hierarchy::{ReportsChain, TeamHierarchy};
pub use logging::init_logging;
pub use lures::{identify_lures, Lure};
pub use notify::{LureNotifier, Notification};
pub use pipeline::{NotificationSink, Pipeline, ScanReport};
pub use storage::{LogStats, NotificationLog, StoredNotification};
pub use subscriptions::Subscriptions;
pub use terms::TermMatcher;
