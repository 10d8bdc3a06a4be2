//! Per-phase table rows aggregated from scanned model objects.
//!
//! A [`Snapshot`] is everything the host collected in one load cycle: object records, the model's
//! phase catalog and optional per-phase object counts. [`RowAggregator`] folds it into one [`Row`]
//! per phase using the column definitions of a validated [`crate::config::TableConfig`].

pub mod reduce;
pub mod rows;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::TypedCell;

pub use reduce::reduce;
pub use rows::RowAggregator;

/// One scanned model object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRecord {
    pub phase_number: i32,
    #[serde(default)]
    pub phase_name: String,
    /// Values keyed by dotted source name (`part.profile`, `assembly.WEIGHT`, `part.ua.NOTE`).
    #[serde(default)]
    pub attributes: BTreeMap<String, TypedCell>,
}

impl ObjectRecord {
    pub fn new(phase_number: i32, phase_name: impl Into<String>) -> Self {
        Self {
            phase_number,
            phase_name: phase_name.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<TypedCell>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Attribute lookup, exact key first, then case-insensitive.
    pub fn attribute(&self, key: &str) -> Option<&TypedCell> {
        self.attributes.get(key).or_else(|| {
            self.attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
    }
}

/// A phase known to the model, whether or not any object was scanned for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub phase_number: i32,
    #[serde(default)]
    pub phase_name: String,
}

impl CatalogEntry {
    pub fn new(phase_number: i32, phase_name: impl Into<String>) -> Self {
        Self {
            phase_number,
            phase_name: phase_name.into(),
        }
    }
}

/// Input of one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub objects: Vec<ObjectRecord>,
    #[serde(default)]
    pub all_phases: Vec<CatalogEntry>,
    /// Authoritative object counts; override whatever the scan found.
    #[serde(default)]
    pub phase_object_counts: BTreeMap<i32, usize>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.all_phases.is_empty() && self.phase_object_counts.is_empty()
    }
}

/// One output row of the phase table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub phase_number: i32,
    pub phase_name: String,
    pub object_count: usize,
    /// Cells keyed by column key.
    pub cells: BTreeMap<String, TypedCell>,
}

impl Row {
    pub fn new(phase_number: i32, phase_name: impl Into<String>, object_count: usize) -> Self {
        Self {
            phase_number,
            phase_name: phase_name.into(),
            object_count,
            cells: BTreeMap::new(),
        }
    }

    /// Cell by column key, case-insensitive.
    pub fn cell(&self, key: &str) -> Option<&TypedCell> {
        self.cells.get(key).or_else(|| {
            self.cells
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
    }

    /// Replace the phase name unless `name` is blank.
    pub fn update_phase_name(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() {
            self.phase_name = name.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ObjectRecord, Row, Snapshot};
    use crate::types::TypedCell;

    #[test]
    fn attribute_lookup_is_case_insensitive() {
        let record = ObjectRecord::new(1, "Phase 1").with_attribute("part.PROFILE", "HEA200");
        assert_eq!(record.attribute("part.profile"), Some(&TypedCell::text("HEA200")));
        assert_eq!(record.attribute("part.material"), None);
    }

    #[test]
    fn row_cells_are_case_insensitive() {
        let mut row = Row::new(1, "", 0);
        row.cells.insert("Phase_Name".to_string(), TypedCell::text("A"));
        assert_eq!(row.cell("phase_name"), Some(&TypedCell::text("A")));
        row.update_phase_name("  ");
        assert_eq!(row.phase_name, "");
        row.update_phase_name(" Steel ");
        assert_eq!(row.phase_name, "Steel");
    }

    #[test]
    fn empty_snapshot() {
        assert!(Snapshot::default().is_empty());
    }
}
