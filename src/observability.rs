//! Observer hooks for diagnostics raised while validating configs, compiling selections and
//! building rows.
//!
//! The library itself only logs through `tracing`; attach a [`DiagnosticObserver`] to
//! [`crate::workflow::PhaseRules`] to receive every diagnostic as a structured event.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{error, info, warn};

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational event.
    Info,
    /// A config element or filter was dropped; the rest still works.
    Warning,
    /// The whole config was discarded in favour of the built-in defaults.
    Error,
}

impl Severity {
    /// Classify a diagnostic message.
    pub fn classify(message: &str) -> Self {
        if message.contains("Using defaults") || message.contains("Using embedded defaults") {
            Severity::Error
        } else if message.contains("skipped") || message.contains("ignored") || message.starts_with("Phase ") {
            Severity::Warning
        } else {
            Severity::Info
        }
    }
}

/// Where a diagnostic was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Config,
    Compile,
    Aggregate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Config => "config",
            Stage::Compile => "compile",
            Stage::Aggregate => "aggregate",
        };
        f.write_str(name)
    }
}

/// A single diagnostic event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEvent {
    pub stage: Stage,
    pub severity: Severity,
    pub message: String,
}

impl DiagnosticEvent {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            stage,
            severity: Severity::classify(&message),
            message,
        }
    }
}

/// Observer interface for diagnostics.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait DiagnosticObserver: Send + Sync {
    /// Called for every diagnostic.
    fn on_diagnostic(&self, _event: &DiagnosticEvent) {}

    /// Called when a diagnostic meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_diagnostic`].
    fn on_alert(&self, event: &DiagnosticEvent) {
        self.on_diagnostic(event)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn DiagnosticObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn DiagnosticObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl DiagnosticObserver for CompositeObserver {
    fn on_diagnostic(&self, event: &DiagnosticEvent) {
        for o in &self.observers {
            o.on_diagnostic(event);
        }
    }

    fn on_alert(&self, event: &DiagnosticEvent) {
        for o in &self.observers {
            o.on_alert(event);
        }
    }
}

/// Forwards events to `tracing` at a level matching their severity.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl DiagnosticObserver for TracingObserver {
    fn on_diagnostic(&self, event: &DiagnosticEvent) {
        match event.severity {
            Severity::Info => info!(stage = %event.stage, "{}", event.message),
            Severity::Warning => warn!(stage = %event.stage, "{}", event.message),
            Severity::Error => error!(stage = %event.stage, "{}", event.message),
        }
    }

    fn on_alert(&self, event: &DiagnosticEvent) {
        error!(stage = %event.stage, severity = ?event.severity, alert = true, "{}", event.message);
    }
}

/// Keeps every event in memory. Handy for hosts that show diagnostics in a panel.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    events: Mutex<Vec<DiagnosticEvent>>,
    alerts: Mutex<Vec<DiagnosticEvent>>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received through [`DiagnosticObserver::on_diagnostic`].
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().map(|guard| guard.to_vec()).unwrap_or_default()
    }

    /// Events received through [`DiagnosticObserver::on_alert`].
    pub fn alerts(&self) -> Vec<DiagnosticEvent> {
        self.alerts.lock().map(|guard| guard.to_vec()).unwrap_or_default()
    }
}

impl DiagnosticObserver for CollectingObserver {
    fn on_diagnostic(&self, event: &DiagnosticEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }

    fn on_alert(&self, event: &DiagnosticEvent) {
        if let Ok(mut alerts) = self.alerts.lock() {
            alerts.push(event.clone());
        }
    }
}
