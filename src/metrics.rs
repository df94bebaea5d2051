use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing registry and summary activity.
#[derive(Default)]
pub struct RegistryMetrics {
    students_created: AtomicU64,
    students_updated: AtomicU64,
    students_deleted: AtomicU64,
    summaries_generated: AtomicU64,
    summaries_failed: AtomicU64,
}

impl RegistryMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly created student.
    pub fn record_created(&self) {
        self.students_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful update.
    pub fn record_updated(&self) {
        self.students_updated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful deletion.
    pub fn record_deleted(&self) {
        self.students_deleted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of a summary request that reached the generator.
    pub fn record_summary(&self, succeeded: bool) {
        let counter = if succeeded {
            &self.summaries_generated
        } else {
            &self.summaries_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            students_created: self.students_created.load(Ordering::Relaxed),
            students_updated: self.students_updated.load(Ordering::Relaxed),
            students_deleted: self.students_deleted.load(Ordering::Relaxed),
            summaries_generated: self.summaries_generated.load(Ordering::Relaxed),
            summaries_failed: self.summaries_failed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of the counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Students created since startup.
    pub students_created: u64,
    /// Successful updates since startup.
    pub students_updated: u64,
    /// Successful deletions since startup.
    pub students_deleted: u64,
    /// Summaries returned to clients.
    pub summaries_generated: u64,
    /// Summaries that failed upstream or came back empty.
    pub summaries_failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_registry_activity() {
        let metrics = RegistryMetrics::new();
        metrics.record_created();
        metrics.record_created();
        metrics.record_updated();
        metrics.record_deleted();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.students_created, 2);
        assert_eq!(snapshot.students_updated, 1);
        assert_eq!(snapshot.students_deleted, 1);
    }

    #[test]
    fn splits_summary_outcomes() {
        let metrics = RegistryMetrics::new();
        metrics.record_summary(true);
        metrics.record_summary(false);
        metrics.record_summary(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.summaries_generated, 1);
        assert_eq!(snapshot.summaries_failed, 2);
    }

    #[test]
    fn snapshot_starts_empty() {
        assert_eq!(RegistryMetrics::new().snapshot(), MetricsSnapshot::default());
    }
}
