//! Folding a [`Snapshot`] into one [`Row`] per phase.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

use super::reduce::{count_cell, reduce};
use super::{ObjectRecord, Row, Snapshot};
use crate::config::{AggregateFn, ColumnConfig, TableConfig};
use crate::diagnostics::{Diagnostics, Outcome};
use crate::source::{part_fallback_key, resolve};
use crate::types::{ObjectType, TypedCell};

/// Builds the phase table rows.
///
/// Stateless; every call keeps its own accumulators so concurrent callers never share state.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowAggregator;

impl RowAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Aggregate `snapshot` with the columns of a validated `config`.
    ///
    /// Rows are ordered by phase number, then case-insensitively by phase name. Catalog phases
    /// without scanned objects appear as zero-object rows.
    pub fn build_rows(&self, snapshot: &Snapshot, config: &TableConfig) -> Outcome<Vec<Row>> {
        let mut diagnostics = Diagnostics::new();
        if snapshot.is_empty() {
            return Outcome::new(Vec::new(), diagnostics);
        }
        if config.columns.is_empty() {
            let message = "build rows skipped: config has no columns.";
            warn!("{message}");
            diagnostics.push(message);
            return Outcome::new(Vec::new(), diagnostics);
        }

        let columns = &config.columns;
        let mut pass = Pass::default();

        let mut groups: BTreeMap<i32, Vec<&ObjectRecord>> = BTreeMap::new();
        for record in &snapshot.objects {
            groups.entry(record.phase_number).or_default().push(record);
        }

        let mut rows: Vec<Row> = groups
            .into_iter()
            .map(|(phase, records)| pass.aggregate_phase(phase, &records, columns))
            .collect();

        for entry in &snapshot.all_phases {
            let index = match rows.iter().position(|r| r.phase_number == entry.phase_number) {
                Some(index) => index,
                None => {
                    rows.push(empty_row(entry.phase_number, columns));
                    rows.len() - 1
                }
            };
            apply_identity(&mut rows[index], &entry.phase_name, columns);
        }

        for row in &mut rows {
            if let Some(&count) = snapshot.phase_object_counts.get(&row.phase_number) {
                row.object_count = count;
                apply_counts(row, columns);
            }
        }

        rows.sort_by(compare_rows);
        debug!(
            rows = rows.len(),
            objects = snapshot.objects.len(),
            catalog = snapshot.all_phases.len(),
            "built phase rows"
        );
        Outcome::new(rows, diagnostics)
    }
}

/// Per-call state.
#[derive(Default)]
struct Pass {
    fallbacks_logged: HashSet<String>,
}

impl Pass {
    fn aggregate_phase(&mut self, phase_number: i32, records: &[&ObjectRecord], columns: &[ColumnConfig]) -> Row {
        let phase_name = records
            .iter()
            .map(|r| r.phase_name.trim())
            .find(|name| !name.is_empty())
            .unwrap_or_default();
        let mut row = Row::new(phase_number, phase_name, records.len());

        for column in columns {
            let cell = if column.aggregate == AggregateFn::Count {
                count_cell(records.len())
            } else {
                let values: Vec<TypedCell> = records.iter().map(|r| self.resolve_value(r, column)).collect();
                reduce(&values, records.len(), column.aggregate)
            };
            row.cells.insert(column.key.clone(), cell.convert_to(column.value_type));
        }
        row
    }

    fn resolve_value(&mut self, record: &ObjectRecord, column: &ColumnConfig) -> TypedCell {
        let Some(object_type) = column.object_type else {
            return TypedCell::Empty;
        };

        if object_type == ObjectType::Phase {
            return match column.attribute.trim().to_ascii_lowercase().as_str() {
                "number" => TypedCell::from(record.phase_number),
                "name" => TypedCell::text(&record.phase_name),
                _ => TypedCell::Empty,
            };
        }

        let Ok(source) = resolve(object_type, &column.attribute) else {
            return TypedCell::Empty;
        };
        // A present key wins even when its value is empty.
        if let Some(value) = record.attribute(&source.key) {
            return value.clone();
        }

        if object_type == ObjectType::Assembly {
            let fallback = part_fallback_key(&source);
            if let Some(value) = record.attribute(&fallback) {
                if self.fallbacks_logged.insert(source.key.to_lowercase()) {
                    warn!(
                        source = %source.key,
                        fallback = %fallback,
                        "assembly main-part value unavailable, using part value"
                    );
                }
                return value.clone();
            }
        }

        TypedCell::Empty
    }
}

fn empty_row(phase_number: i32, columns: &[ColumnConfig]) -> Row {
    let mut row = Row::new(phase_number, "", 0);
    for column in columns {
        row.cells.insert(column.key.clone(), TypedCell::Empty);
    }
    row
}

/// Re-apply phase identity and Count columns from a catalog entry.
///
/// The row keeps a scanned phase name; the catalog name only fills a blank one. Name columns
/// always show a non-blank catalog name.
fn apply_identity(row: &mut Row, catalog_name: &str, columns: &[ColumnConfig]) {
    if row.phase_name.trim().is_empty() {
        row.update_phase_name(catalog_name);
    }
    let number = TypedCell::from(row.phase_number);
    let name = TypedCell::text(catalog_name);
    let count = count_cell(row.object_count);

    for column in columns {
        let cell = if column.aggregate == AggregateFn::Count {
            &count
        } else if column.is_phase_attribute("number") {
            &number
        } else if column.is_phase_attribute("name") && name.has_value() {
            &name
        } else {
            continue;
        };
        row.cells.insert(column.key.clone(), cell.convert_to(column.value_type));
    }
}

fn apply_counts(row: &mut Row, columns: &[ColumnConfig]) {
    let count = count_cell(row.object_count);
    for column in columns.iter().filter(|c| c.aggregate == AggregateFn::Count) {
        row.cells.insert(column.key.clone(), count.convert_to(column.value_type));
    }
}

fn compare_rows(a: &Row, b: &Row) -> Ordering {
    a.phase_number
        .cmp(&b.phase_number)
        .then_with(|| a.phase_name.to_lowercase().cmp(&b.phase_name.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::{Pass, RowAggregator, compare_rows};
    use crate::aggregation::{CatalogEntry, ObjectRecord, Row, Snapshot};
    use crate::config::{AggregateFn, ColumnConfig, TableConfig, default_config};
    use crate::types::{ObjectType, TypedCell, ValueType};

    fn column(key: &str, value_type: ValueType, object_type: ObjectType, attribute: &str, aggregate: AggregateFn) -> ColumnConfig {
        ColumnConfig {
            key: key.to_string(),
            label: key.to_string(),
            value_type,
            object_type: Some(object_type),
            attribute: attribute.to_string(),
            aggregate,
            ..ColumnConfig::default()
        }
    }

    fn sample_config() -> TableConfig {
        TableConfig {
            columns: vec![
                column("phase_number", ValueType::Integer, ObjectType::Phase, "number", AggregateFn::First),
                column("phase_name", ValueType::String, ObjectType::Phase, "name", AggregateFn::First),
                column("profiles", ValueType::String, ObjectType::Part, "profile", AggregateFn::Distinct),
                column("max_weight", ValueType::Number, ObjectType::Assembly, "WEIGHT", AggregateFn::Max),
                column("min_weight", ValueType::Number, ObjectType::Assembly, "WEIGHT", AggregateFn::Min),
                column("objects", ValueType::Integer, ObjectType::Phase, "number", AggregateFn::Count),
            ],
            ..TableConfig::default()
        }
    }

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            objects: vec![
                ObjectRecord::new(2, "Roof")
                    .with_attribute("part.profile", "HEA200")
                    .with_attribute("assembly.WEIGHT", 12.5),
                ObjectRecord::new(1, "")
                    .with_attribute("part.PROFILE", "IPE300")
                    .with_attribute("part.WEIGHT", 4.0),
                ObjectRecord::new(2, "Roof")
                    .with_attribute("part.profile", "hea200")
                    .with_attribute("assembly.WEIGHT", "7"),
                ObjectRecord::new(2, "Roof").with_attribute("part.profile", "UPN100"),
            ],
            ..Snapshot::default()
        }
    }

    #[test]
    fn aggregates_per_phase() {
        let outcome = RowAggregator::new().build_rows(&sample_snapshot(), &sample_config());
        assert!(outcome.diagnostics.is_empty());
        let rows = outcome.value;
        assert_eq!(rows.len(), 2);

        let roof = &rows[1];
        assert_eq!(roof.phase_number, 2);
        assert_eq!(roof.phase_name, "Roof");
        assert_eq!(roof.object_count, 3);
        assert_eq!(roof.cell("phase_number"), Some(&TypedCell::Integer(2)));
        assert_eq!(roof.cell("profiles"), Some(&TypedCell::text("HEA200; UPN100")));
        assert_eq!(roof.cell("max_weight"), Some(&TypedCell::Number(12.5)));
        assert_eq!(roof.cell("min_weight"), Some(&TypedCell::Number(7.0)));
        assert_eq!(roof.cell("objects"), Some(&TypedCell::Integer(3)));
    }

    #[test]
    fn assembly_columns_fall_back_to_part_values() {
        let rows = RowAggregator::new().build_rows(&sample_snapshot(), &sample_config()).value;
        let first = &rows[0];
        assert_eq!(first.phase_number, 1);
        assert_eq!(first.phase_name, "");
        assert_eq!(first.cell("max_weight"), Some(&TypedCell::Number(4.0)));
        assert_eq!(first.cell("phase_name"), Some(&TypedCell::Empty));
    }

    #[test]
    fn catalog_phase_without_objects_gets_zero_row() {
        let snapshot = Snapshot {
            objects: vec![ObjectRecord::new(1, "Base").with_attribute("part.profile", "IPE300")],
            all_phases: vec![CatalogEntry::new(3, "Later"), CatalogEntry::new(1, "Base")],
            ..Snapshot::default()
        };
        let rows = RowAggregator::new().build_rows(&snapshot, &sample_config()).value;
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].phase_name, "Base");
        assert_eq!(rows[0].cell("phase_name"), Some(&TypedCell::text("Base")));

        let later = &rows[1];
        assert_eq!(later.phase_number, 3);
        assert_eq!(later.phase_name, "Later");
        assert_eq!(later.object_count, 0);
        assert_eq!(later.cell("phase_number"), Some(&TypedCell::Integer(3)));
        assert_eq!(later.cell("phase_name"), Some(&TypedCell::text("Later")));
        assert_eq!(later.cell("objects"), Some(&TypedCell::Integer(0)));
        assert_eq!(later.cell("profiles"), Some(&TypedCell::Empty));
        assert_eq!(later.cell("max_weight"), Some(&TypedCell::Empty));
    }

    #[test]
    fn phase_object_counts_override_scanned_counts() {
        let mut snapshot = sample_snapshot();
        snapshot.phase_object_counts.insert(2, 40);
        snapshot.phase_object_counts.insert(9, 5);
        let rows = RowAggregator::new().build_rows(&snapshot, &sample_config()).value;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].object_count, 40);
        assert_eq!(rows[1].cell("objects"), Some(&TypedCell::Integer(40)));
        assert_eq!(rows[0].object_count, 1);
    }

    #[test]
    fn values_convert_to_column_type() {
        let config = TableConfig {
            columns: vec![
                column("count_text", ValueType::String, ObjectType::Phase, "number", AggregateFn::Count),
                column("weight_int", ValueType::Integer, ObjectType::Assembly, "WEIGHT", AggregateFn::First),
            ],
            ..TableConfig::default()
        };
        let snapshot = Snapshot {
            objects: vec![ObjectRecord::new(4, "A").with_attribute("assembly.weight", "8")],
            ..Snapshot::default()
        };
        let rows = RowAggregator::new().build_rows(&snapshot, &config).value;
        assert_eq!(rows[0].cell("count_text"), Some(&TypedCell::text("1")));
        assert_eq!(rows[0].cell("weight_int"), Some(&TypedCell::Integer(8)));
    }

    #[test]
    fn empty_inputs_yield_no_rows() {
        let aggregator = RowAggregator::new();
        let outcome = aggregator.build_rows(&Snapshot::default(), &default_config());
        assert!(outcome.value.is_empty());
        assert!(outcome.diagnostics.is_empty());

        let outcome = aggregator.build_rows(&sample_snapshot(), &TableConfig::default());
        assert!(outcome.value.is_empty());
        assert!(outcome.diagnostics.contains("config has no columns"));
    }

    #[test]
    fn same_phase_sorted_by_name_is_stable_across_numbers() {
        let snapshot = Snapshot {
            all_phases: vec![CatalogEntry::new(5, "b"), CatalogEntry::new(-1, "A")],
            ..Snapshot::default()
        };
        let rows = RowAggregator::new().build_rows(&snapshot, &default_config()).value;
        let numbers: Vec<i32> = rows.iter().map(|r| r.phase_number).collect();
        assert_eq!(numbers, vec![-1, 5]);
        assert_eq!(rows[1].cell("object_count"), Some(&TypedCell::Integer(0)));
    }

    #[test]
    fn catalog_name_fills_only_blank_scanned_names() {
        let snapshot = Snapshot {
            objects: vec![ObjectRecord::new(1, "Scanned"), ObjectRecord::new(2, " ")],
            all_phases: vec![CatalogEntry::new(1, "Catalog"), CatalogEntry::new(2, "Steel")],
            ..Snapshot::default()
        };
        let rows = RowAggregator::new().build_rows(&snapshot, &sample_config()).value;

        assert_eq!(rows[0].phase_name, "Scanned");
        assert_eq!(rows[0].cell("phase_name"), Some(&TypedCell::text("Catalog")));
        assert_eq!(rows[1].phase_name, "Steel");
        assert_eq!(rows[1].cell("phase_name"), Some(&TypedCell::text("Steel")));
    }

    #[test]
    fn present_empty_assembly_value_does_not_fall_back() {
        let snapshot = Snapshot {
            objects: vec![
                ObjectRecord::new(1, "Base")
                    .with_attribute("assembly.WEIGHT", TypedCell::Empty)
                    .with_attribute("part.WEIGHT", 9.0),
            ],
            ..Snapshot::default()
        };
        let rows = RowAggregator::new().build_rows(&snapshot, &sample_config()).value;
        assert_eq!(rows[0].cell("max_weight"), Some(&TypedCell::Empty));
        assert_eq!(rows[0].cell("min_weight"), Some(&TypedCell::Empty));
    }

    #[test]
    fn fallback_is_recorded_once_per_source() {
        let config = sample_config();
        let max_weight = config.column("max_weight").unwrap();
        let min_weight = config.column("min_weight").unwrap();
        let records: Vec<ObjectRecord> = (1..=4)
            .map(|n| ObjectRecord::new(1, "Base").with_attribute("part.weight", f64::from(n)))
            .collect();

        let mut pass = Pass::default();
        let mut values = Vec::new();
        for record in &records {
            values.push(pass.resolve_value(record, max_weight));
            values.push(pass.resolve_value(record, min_weight));
        }

        assert_eq!(values.len(), 8);
        assert!(values.iter().all(TypedCell::has_value));
        assert_eq!(pass.fallbacks_logged.len(), 1);
        assert!(pass.fallbacks_logged.contains("assembly.weight"));
    }

    #[test]
    fn rows_with_equal_phase_numbers_order_by_name_ignoring_case() {
        let mut rows = vec![
            Row::new(2, "steel", 0),
            Row::new(1, "beta", 0),
            Row::new(1, "Alpha", 0),
            Row::new(1, "alpha2", 0),
            Row::new(1, "Beta2", 0),
        ];
        rows.sort_by(compare_rows);

        let order: Vec<(i32, &str)> = rows.iter().map(|r| (r.phase_number, r.phase_name.as_str())).collect();
        assert_eq!(
            order,
            vec![(1, "Alpha"), (1, "alpha2"), (1, "beta"), (1, "Beta2"), (2, "steel")]
        );
    }
}
