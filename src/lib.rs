//! `phase-rules` turns a declarative phase-table config into two things a BIM host needs:
//!
//! - **rows**: one aggregated [`aggregation::Row`] per construction phase, built from scanned
//!   model objects and the model's phase catalog
//! - **queries**: an engine-neutral [`predicate::Predicate`] tree selecting the objects of the
//!   phases (and attribute values) a user picked in the table
//!
//! Nothing here talks to a host model. Callers feed [`aggregation::Snapshot`]s and
//! [`selection::SelectionCriteria`] in and translate the predicate tree into their own query API.
//!
//! ## Pipeline
//!
//! 1. [`config::ConfigValidator`] normalizes a raw [`config::TableConfig`], dropping defective
//!    columns with a diagnostic and falling back to [`config::default_config`] when nothing
//!    usable remains.
//! 2. [`aggregation::RowAggregator`] folds a snapshot into rows using the column definitions.
//! 3. [`selection::collect_selection`] turns edited rows into selection criteria.
//! 4. [`predicate::PredicateTreeBuilder`] compiles criteria through apply rules
//!    ([`rules::ApplyRuleCompiler`]), legacy mappings ([`rules::LegacyRuleMapper`]) or the generic
//!    template-field path.
//!
//! No step fails. Every entry point returns a value together with ordered, human-readable
//! [`diagnostics::Diagnostics`]. Only reading a config file can return an [`error::ConfigError`].
//!
//! ## Quick example
//!
//! ```rust
//! use phase_rules::config::parse_config_str;
//! use phase_rules::selection::{EditableRow, collect_selection};
//! use phase_rules::workflow::{ApplyOutcome, PhaseRules};
//!
//! # fn main() -> Result<(), phase_rules::ConfigError> {
//! let raw = parse_config_str(
//!     r#"{
//!         "version": 2,
//!         "columns": [
//!             { "key": "phase_number", "type": "Integer", "objectType": "Phase", "attribute": "number" },
//!             { "key": "profile", "editable": true, "targetObjectType": "Part", "targetAttribute": "profile" }
//!         ]
//!     }"#,
//! )?;
//! let rules = PhaseRules::new(Some(&raw));
//!
//! let rows = vec![EditableRow::new(3, true).with_value("profile", "HEA200")];
//! let selection = collect_selection(&rows, &rules.config().columns);
//! let compiled = rules.compile(&selection).value;
//!
//! assert_eq!(compiled.outcome, ApplyOutcome::Applied);
//! assert_eq!(compiled.predicate.to_string(), "((PHASE = 3 AND PROFILE = 'HEA200'))");
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: config model, defaults, validation and file loading
//! - [`rules`]: apply-rule validation/compilation and legacy mappings
//! - [`predicate`]: predicate tree model and builder
//! - [`aggregation`]: per-phase row aggregation
//! - [`selection`]: selection criteria and their normalization
//! - [`types`]: value types and the [`types::TypedCell`] sum type
//! - [`source`]: `(objectType, attribute)` resolution
//! - [`workflow`]: facade with metrics and observer hooks
//! - [`observability`]: diagnostic observers
//! - [`diagnostics`], [`error`]: reporting

pub mod aggregation;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod observability;
pub mod predicate;
pub mod rules;
pub mod selection;
pub mod source;
pub mod types;
pub mod workflow;

pub use diagnostics::{Diagnostics, Outcome};
pub use error::{ConfigError, ConfigResult, RuleError, SourceError};
