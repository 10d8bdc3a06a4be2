//! One-stop facade over validation, row aggregation and selection compilation.
//!
//! [`PhaseRules`] owns a validated [`TableConfig`] and adds what a host needs around the pure
//! components:
//!
//! - real-time counters ([`RuleMetrics`])
//! - observer hooks for every diagnostic, with an alert threshold
//! - classification of an apply request ([`ApplyOutcome`])

mod metrics;

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::aggregation::{Row, RowAggregator, Snapshot};
use crate::config::{ConfigValidator, TableConfig, load_first_available};
use crate::diagnostics::{Diagnostics, Outcome};
use crate::observability::{DiagnosticEvent, DiagnosticObserver, Severity, Stage};
use crate::predicate::{Predicate, PredicateTreeBuilder};
use crate::selection::SelectionCriteria;

pub use metrics::{RuleMetrics, RuleMetricsSnapshot};

/// What applying a selection to the host view amounts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplyOutcome {
    /// The predicate selects at least one phase.
    Applied,
    /// Nothing was selected; the host clears its filter.
    Cleared,
    /// Rows were selected but none produced a usable phase group.
    NoValidCriteria,
}

impl ApplyOutcome {
    pub fn classify(selection: &[SelectionCriteria], predicate: &Predicate) -> Self {
        if selection.is_empty() {
            ApplyOutcome::Cleared
        } else if predicate.children().is_empty() {
            ApplyOutcome::NoValidCriteria
        } else {
            ApplyOutcome::Applied
        }
    }
}

/// Result of [`PhaseRules::compile`].
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub predicate: Predicate,
    pub outcome: ApplyOutcome,
}

/// Validated rules plus metrics and observer plumbing.
pub struct PhaseRules {
    config: TableConfig,
    config_diagnostics: Diagnostics,
    aggregator: RowAggregator,
    builder: PredicateTreeBuilder,
    observer: Option<Arc<dyn DiagnosticObserver>>,
    alert_threshold: Severity,
    metrics: Arc<RuleMetrics>,
}

impl PhaseRules {
    /// Validate `raw` and build the facade. `None` falls back to the built-in defaults.
    pub fn new(raw: Option<&TableConfig>) -> Self {
        Self::from_outcome(ConfigValidator::new().validate(raw))
    }

    /// Load the first usable config among `candidates`, falling back to the defaults.
    pub fn from_candidates<I, P>(candidates: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self::from_outcome(load_first_available(candidates, &ConfigValidator::new()))
    }

    fn from_outcome(validated: Outcome<TableConfig>) -> Self {
        let (config, config_diagnostics) = validated.into_parts();
        let metrics = Arc::new(RuleMetrics::new());
        metrics.on_diagnostics(config_diagnostics.len());
        debug!(
            columns = config.columns.len(),
            diagnostics = config_diagnostics.len(),
            "phase rules ready"
        );
        Self {
            config,
            config_diagnostics,
            aggregator: RowAggregator::new(),
            builder: PredicateTreeBuilder::new(),
            observer: None,
            alert_threshold: Severity::Error,
            metrics,
        }
    }

    /// Attach an observer. Diagnostics already raised while validating the config are replayed.
    pub fn with_observer(mut self, observer: Arc<dyn DiagnosticObserver>) -> Self {
        self.observer = Some(observer);
        let replay = self.config_diagnostics.clone();
        self.emit(Stage::Config, &replay);
        self
    }

    /// Minimum severity forwarded to [`DiagnosticObserver::on_alert`]. Defaults to `Error`.
    pub fn with_alert_threshold(mut self, threshold: Severity) -> Self {
        self.alert_threshold = threshold;
        self
    }

    /// The validated config.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Diagnostics raised while loading and validating the config.
    pub fn config_diagnostics(&self) -> &Diagnostics {
        &self.config_diagnostics
    }

    /// Get a handle to real-time metrics.
    pub fn metrics(&self) -> Arc<RuleMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Aggregate `snapshot` into table rows.
    pub fn build_rows(&self, snapshot: &Snapshot) -> Outcome<Vec<Row>> {
        let outcome = self.aggregator.build_rows(snapshot, &self.config);
        self.metrics.on_rows_built(outcome.value.len());
        self.metrics.on_diagnostics(outcome.diagnostics.len());
        self.emit(Stage::Aggregate, &outcome.diagnostics);
        outcome
    }

    /// Compile `selection` into a predicate tree and classify the result.
    pub fn compile(&self, selection: &[SelectionCriteria]) -> Outcome<Compiled> {
        let outcome = self.builder.build(selection);

        let seen: usize = selection.iter().map(|c| c.attribute_filters.len()).sum();
        let compiled: usize = outcome
            .value
            .children()
            .iter()
            .map(|phase| phase.children().len().saturating_sub(1))
            .sum();
        self.metrics.on_compilation(seen, compiled);
        self.metrics.on_diagnostics(outcome.diagnostics.len());
        self.emit(Stage::Compile, &outcome.diagnostics);

        let apply = ApplyOutcome::classify(selection, &outcome.value);
        debug!(outcome = ?apply, filters = seen, compiled, "compiled selection");
        outcome.map(|predicate| Compiled {
            predicate,
            outcome: apply,
        })
    }

    fn emit(&self, stage: Stage, diagnostics: &Diagnostics) {
        let Some(observer) = &self.observer else {
            return;
        };
        for message in diagnostics {
            let event = DiagnosticEvent::new(stage, message.as_str());
            observer.on_diagnostic(&event);
            if event.severity >= self.alert_threshold {
                observer.on_alert(&event);
            }
        }
    }
}
