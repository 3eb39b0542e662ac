//! Scan pipeline and notification delivery.
//!
//! A producer task streams domains through a bounded channel; the consumer
//! flags lures, plans notifications and hands each one to every configured
//! [`NotificationSink`]. A failing sink is logged and counted but doesn't
//! stop the scan.

use std::collections::HashSet;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::lures::{check_domain, Lure};
use crate::notify::{LureNotifier, Notification};
use crate::storage::{NotificationLog, RunSummary};

/// Default bound on in-flight domains between producer and consumer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// A destination for planned notifications.
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Deliver one notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification could not be delivered.
    async fn deliver(&self, notification: &Notification) -> Result<()>;
}

/// Writes each notification as one JSON object per line.
pub struct JsonLinesSink<W> {
    name: &'static str,
    writer: Mutex<W>,
}

impl<W> std::fmt::Debug for JsonLinesSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesSink")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A [`JsonLinesSink`] on standard output.
pub type StdoutSink = JsonLinesSink<std::io::Stdout>;

impl JsonLinesSink<std::io::Stdout> {
    /// Create a sink that prints to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new("stdout", std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Create a sink over any writer.
    #[must_use]
    pub fn new(name: &'static str, writer: W) -> Self {
        Self {
            name,
            writer: Mutex::new(writer),
        }
    }

    /// Take the writer back out of the sink.
    ///
    /// # Errors
    ///
    /// Returns an error if a writer thread panicked while holding the lock.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|_| Error::delivery(self.name, "writer lock poisoned"))
    }
}

#[async_trait::async_trait]
impl<W: Write + Send> NotificationSink for JsonLinesSink<W> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn deliver(&self, notification: &Notification) -> Result<()> {
        let line = serde_json::to_string(notification)?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| Error::delivery(self.name, "writer lock poisoned"))?;
        writeln!(writer, "{line}").map_err(|e| Error::delivery(self.name, e.to_string()))?;
        writer
            .flush()
            .map_err(|e| Error::delivery(self.name, e.to_string()))
    }
}

/// Records notifications in the [`NotificationLog`] under one scan run.
#[derive(Debug)]
pub struct LogSink {
    log: Arc<Mutex<NotificationLog>>,
    run_id: i64,
    recorded: AtomicUsize,
}

impl LogSink {
    /// Start a new run in `log` and record into it.
    ///
    /// # Errors
    ///
    /// Returns an error if the run cannot be created.
    pub fn begin(log: Arc<Mutex<NotificationLog>>) -> Result<Self> {
        let run_id = log
            .lock()
            .map_err(|_| Error::delivery("log", "notification log lock poisoned"))?
            .begin_run()?;
        Ok(Self {
            log,
            run_id,
            recorded: AtomicUsize::new(0),
        })
    }

    /// The run this sink records under.
    #[must_use]
    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    /// New rows written so far.
    #[must_use]
    pub fn recorded(&self) -> usize {
        self.recorded.load(Ordering::SeqCst)
    }

    /// Close the run with the scan's counters.
    ///
    /// # Errors
    ///
    /// Returns an error if the run cannot be updated.
    pub fn finish(&self, report: &ScanReport) -> Result<()> {
        self.log
            .lock()
            .map_err(|_| Error::delivery("log", "notification log lock poisoned"))?
            .finish_run(self.run_id, report.summary())
    }
}

#[async_trait::async_trait]
impl NotificationSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, notification: &Notification) -> Result<()> {
        let inserted = self
            .log
            .lock()
            .map_err(|_| Error::delivery("log", "notification log lock poisoned"))?
            .record(self.run_id, notification)?;
        self.recorded.fetch_add(inserted, Ordering::SeqCst);
        Ok(())
    }
}

/// Outcome of a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Domains read from the input.
    pub domains_scanned: usize,
    /// Lures found, in input order (repeats included).
    pub lures: Vec<Lure>,
    /// Notifications planned, one per distinct lure domain.
    pub notifications: Vec<Notification>,
    /// Successful sink deliveries.
    pub deliveries: usize,
    /// Failed sink deliveries.
    pub failed_deliveries: usize,
}

impl ScanReport {
    /// Counters for the notification log.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            domains_scanned: self.domains_scanned,
            lures: self.lures.len(),
            notifications: self.notifications.len(),
        }
    }
}

/// Streams domains through the notifier into a set of sinks.
pub struct Pipeline {
    notifier: Arc<LureNotifier>,
    sinks: Vec<Arc<dyn NotificationSink>>,
    capacity: usize,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("sinks", &self.sinks.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Create a pipeline with no sinks.
    #[must_use]
    pub fn new(notifier: Arc<LureNotifier>) -> Self {
        Self {
            notifier,
            sinks: Vec::new(),
            capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Set the channel bound. Zero is treated as one.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Add a delivery sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Scan `domains` and deliver notifications to every sink.
    ///
    /// # Errors
    ///
    /// Returns an error only if the producer task fails; sink failures are
    /// reported in [`ScanReport::failed_deliveries`].
    pub async fn run(&self, domains: Vec<String>) -> Result<ScanReport> {
        let (tx, mut rx) = mpsc::channel::<String>(self.capacity);

        let producer = tokio::spawn(async move {
            for domain in domains {
                if tx.send(domain).await.is_err() {
                    break;
                }
            }
        });

        let mut report = ScanReport::default();
        let mut seen: HashSet<String> = HashSet::new();

        while let Some(domain) = rx.recv().await {
            report.domains_scanned += 1;

            let Some(lure) = check_domain(self.notifier.matcher(), &domain) else {
                continue;
            };
            if seen.insert(lure.domain.clone()) {
                let notification = self.notifier.plan(&lure);
                self.deliver(&notification, &mut report).await;
                report.notifications.push(notification);
            }
            report.lures.push(lure);
        }

        producer
            .await
            .map_err(|e| Error::internal(format!("domain producer failed: {e}")))?;

        info!(
            domains = report.domains_scanned,
            lures = report.lures.len(),
            notifications = report.notifications.len(),
            failed = report.failed_deliveries,
            "Scan complete"
        );
        Ok(report)
    }

    async fn deliver(&self, notification: &Notification, report: &mut ScanReport) {
        for sink in &self.sinks {
            match sink.deliver(notification).await {
                Ok(()) => {
                    report.deliveries += 1;
                    debug!(sink = sink.name(), domain = %notification.domain, "Delivered");
                }
                Err(e) => {
                    report.failed_deliveries += 1;
                    warn!(sink = sink.name(), domain = %notification.domain, error = %e, "Delivery failed");
                }
            }
        }
    }
}
