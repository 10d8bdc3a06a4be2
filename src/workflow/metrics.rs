use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Real-time counters for a [`super::PhaseRules`] instance.
///
/// Updated on every call; callers can snapshot them at any time.
#[derive(Debug, Default)]
pub struct RuleMetrics {
    compilations: AtomicU64,
    filters_seen: AtomicU64,
    filters_compiled: AtomicU64,
    filters_dropped: AtomicU64,
    row_builds: AtomicU64,
    rows_built: AtomicU64,
    diagnostics: AtomicU64,
}

impl RuleMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on_compilation(&self, seen: usize, compiled: usize) {
        self.compilations.fetch_add(1, Ordering::SeqCst);
        self.filters_seen.fetch_add(to_u64(seen), Ordering::SeqCst);
        self.filters_compiled.fetch_add(to_u64(compiled), Ordering::SeqCst);
        self.filters_dropped
            .fetch_add(to_u64(seen.saturating_sub(compiled)), Ordering::SeqCst);
    }

    pub(crate) fn on_rows_built(&self, rows: usize) {
        self.row_builds.fetch_add(1, Ordering::SeqCst);
        self.rows_built.fetch_add(to_u64(rows), Ordering::SeqCst);
    }

    pub(crate) fn on_diagnostics(&self, count: usize) {
        self.diagnostics.fetch_add(to_u64(count), Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> RuleMetricsSnapshot {
        RuleMetricsSnapshot {
            compilations: self.compilations.load(Ordering::SeqCst),
            filters_seen: self.filters_seen.load(Ordering::SeqCst),
            filters_compiled: self.filters_compiled.load(Ordering::SeqCst),
            filters_dropped: self.filters_dropped.load(Ordering::SeqCst),
            row_builds: self.row_builds.load(Ordering::SeqCst),
            rows_built: self.rows_built.load(Ordering::SeqCst),
            diagnostics: self.diagnostics.load(Ordering::SeqCst),
        }
    }
}

fn to_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

/// Immutable snapshot of [`RuleMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleMetricsSnapshot {
    pub compilations: u64,
    pub filters_seen: u64,
    pub filters_compiled: u64,
    pub filters_dropped: u64,
    pub row_builds: u64,
    pub rows_built: u64,
    pub diagnostics: u64,
}

impl fmt::Display for RuleMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "compilations={}, filters={}/{} (dropped={}), rows={} over {} builds, diagnostics={}",
            self.compilations,
            self.filters_compiled,
            self.filters_seen,
            self.filters_dropped,
            self.rows_built,
            self.row_builds,
            self.diagnostics
        )
    }
}
