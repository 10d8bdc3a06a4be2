//! Per-phase selection criteria: what the user picked in the phase table.
//!
//! [`collect_selection`] turns table row state into [`SelectionCriteria`]; [`normalize_selection`]
//! groups, validates and de-duplicates criteria before they are compiled into a predicate tree.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::config::{ApplyRuleConfig, BOOLEAN_MODE_POSITIVE_NUMBER, ClauseConfig, ColumnConfig};
use crate::diagnostics::Diagnostics;
use crate::rules::{is_truthy, literal_values};
use crate::types::{ObjectType, TypedCell, ValueType, format_number};

/// One editable column value applied to a phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_object_type: Option<ObjectType>,
    #[serde(default)]
    pub target_attribute: String,
    #[serde(default)]
    pub boolean_mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_rule: Option<ApplyRuleConfig>,
    #[serde(default)]
    pub value_type: ValueType,
    #[serde(default)]
    pub value: String,
}

impl AttributeFilter {
    /// A filter carrying `value` for an editable column.
    pub fn for_column(column: &ColumnConfig, value: impl Into<String>) -> Self {
        Self {
            target_object_type: column.target_object_type,
            target_attribute: column.target_attribute.clone(),
            boolean_mode: column.boolean_mode.clone(),
            apply_rule: column.apply_rule.clone(),
            value_type: column.value_type,
            value: value.into(),
        }
    }

    pub fn is_positive_number_mode(&self) -> bool {
        self.boolean_mode.trim().eq_ignore_ascii_case(BOOLEAN_MODE_POSITIVE_NUMBER)
    }

    /// Filters without a target attribute or value never reach compilation.
    pub fn is_usable(&self) -> bool {
        !self.target_attribute.trim().is_empty() && !self.value.trim().is_empty()
    }

    /// Case-insensitive identity used to collapse duplicate filters within one phase.
    pub fn signature(&self) -> String {
        let object_type = self.target_object_type.map(|t| t.to_string()).unwrap_or_default();
        let rule = self.apply_rule.as_ref().map(rule_signature).unwrap_or_default();
        format!(
            "{object_type}:{}:{}:{}:{}:{rule}",
            self.target_attribute, self.boolean_mode, self.value_type, self.value
        )
        .to_lowercase()
    }
}

/// Everything selected for one phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionCriteria {
    pub phase_number: i32,
    #[serde(default)]
    pub attribute_filters: Vec<AttributeFilter>,
}

impl SelectionCriteria {
    pub fn new(phase_number: i32) -> Self {
        Self {
            phase_number,
            attribute_filters: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: AttributeFilter) -> Self {
        self.attribute_filters.push(filter);
        self
    }
}

/// State of one table row as edited by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditableRow {
    pub selected: bool,
    /// `None` when the row has no usable phase number.
    pub phase_number: Option<i32>,
    /// Cell values keyed by column key.
    pub values: BTreeMap<String, TypedCell>,
}

impl EditableRow {
    pub fn new(phase_number: i32, selected: bool) -> Self {
        Self {
            selected,
            phase_number: Some(phase_number),
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<TypedCell>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    fn value(&self, key: &str) -> Option<&TypedCell> {
        self.values.get(key).or_else(|| {
            self.values
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
    }
}

/// Build selection criteria from table rows.
///
/// Only selected rows count, and only the first row per phase number. Each editable column with a
/// target attribute contributes a filter when its cell holds a usable value for the column type.
pub fn collect_selection(rows: &[EditableRow], columns: &[ColumnConfig]) -> Vec<SelectionCriteria> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();

    for row in rows.iter().filter(|r| r.selected) {
        let Some(phase_number) = row.phase_number else {
            continue;
        };
        if !seen.insert(phase_number) {
            continue;
        }

        let attribute_filters = columns
            .iter()
            .filter(|c| c.editable && !c.target_attribute.trim().is_empty())
            .filter_map(|column| {
                let cell = row.value(&column.key)?;
                let value = editable_filter_value(column, cell)?;
                Some(AttributeFilter::for_column(column, value))
            })
            .collect();

        result.push(SelectionCriteria {
            phase_number,
            attribute_filters,
        });
    }

    result
}

fn editable_filter_value(column: &ColumnConfig, cell: &TypedCell) -> Option<String> {
    match column.value_type {
        ValueType::Boolean => boolean_filter_value(column, cell),
        ValueType::Integer | ValueType::Number if matches!(cell, TypedCell::Boolean(_)) => None,
        ValueType::Integer => match cell.convert_to(ValueType::Integer) {
            TypedCell::Integer(i) => Some(i.to_string()),
            _ => None,
        },
        ValueType::Number => match cell.convert_to(ValueType::Number) {
            TypedCell::Number(n) => Some(format_number(n)),
            _ => None,
        },
        ValueType::String => match cell {
            TypedCell::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        },
    }
}

// `false` only matters when something compiles from it: positiveNumber mode or an onFalse branch.
fn boolean_filter_value(column: &ColumnConfig, cell: &TypedCell) -> Option<String> {
    let positive_number = column.is_positive_number_mode();
    let has_on_false = column.apply_rule.as_ref().is_some_and(|r| r.on_false.is_some());

    match cell {
        TypedCell::Boolean(true) => Some("true".to_string()),
        TypedCell::Boolean(false) if positive_number || has_on_false => Some("false".to_string()),
        TypedCell::String(text) => {
            let text = text.trim();
            if is_truthy(text) {
                Some("true".to_string())
            } else if positive_number && (text.eq_ignore_ascii_case("false") || text == "0") {
                Some("false".to_string())
            } else if has_on_false && text.eq_ignore_ascii_case("false") {
                Some("false".to_string())
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Group criteria by phase number, drop invalid phases and unusable or duplicate filters.
///
/// Output is ordered by ascending phase number. Filters of all criteria for the same phase are
/// merged in input order; the first of each signature wins.
pub fn normalize_selection(selection: &[SelectionCriteria], diagnostics: &mut Diagnostics) -> Vec<SelectionCriteria> {
    let mut groups: BTreeMap<i32, Vec<&AttributeFilter>> = BTreeMap::new();
    for criteria in selection {
        groups
            .entry(criteria.phase_number)
            .or_default()
            .extend(criteria.attribute_filters.iter());
    }

    let mut result = Vec::with_capacity(groups.len());
    for (phase_number, filters) in groups {
        if phase_number <= 0 {
            diagnostics.push(format!("Phase {phase_number}: invalid phase number, criteria ignored."));
            continue;
        }

        let mut signatures = HashSet::new();
        let attribute_filters = filters
            .into_iter()
            .filter(|f| f.is_usable())
            .filter(|f| signatures.insert(f.signature()))
            .cloned()
            .collect();

        result.push(SelectionCriteria {
            phase_number,
            attribute_filters,
        });
    }
    result
}

fn rule_signature(rule: &ApplyRuleConfig) -> String {
    format!(
        "{}|{}|{}",
        clause_signature(rule.on_true.as_ref()),
        clause_signature(rule.on_false.as_ref()),
        clause_signature(rule.on_value.as_ref())
    )
}

fn clause_signature(clause: Option<&ClauseConfig>) -> String {
    let Some(clause) = clause else {
        return String::new();
    };
    let value = literal_values(&clause.value).join(",");
    format!("{}:{}:{value}", clause.field, clause.op)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{AttributeFilter, EditableRow, SelectionCriteria, collect_selection, normalize_selection};
    use crate::config::{ApplyRuleConfig, ClauseConfig, ColumnConfig, default_config};
    use crate::diagnostics::Diagnostics;
    use crate::types::{ObjectType, TypedCell, ValueType};

    fn profile_filter(value: &str) -> AttributeFilter {
        AttributeFilter {
            target_object_type: Some(ObjectType::Part),
            target_attribute: "profile".to_string(),
            value: value.to_string(),
            ..AttributeFilter::default()
        }
    }

    #[test]
    fn normalize_groups_sorts_and_dedupes() {
        let selection = vec![
            SelectionCriteria::new(3).with_filter(profile_filter("HEA200")),
            SelectionCriteria::new(1).with_filter(profile_filter("IPE100")),
            SelectionCriteria::new(3)
                .with_filter(profile_filter("hea200"))
                .with_filter(profile_filter("  "))
                .with_filter(profile_filter("HEB300")),
            SelectionCriteria::new(0).with_filter(profile_filter("X")),
        ];

        let mut diagnostics = Diagnostics::new();
        let normalized = normalize_selection(&selection, &mut diagnostics);

        assert_eq!(diagnostics.as_slice(), ["Phase 0: invalid phase number, criteria ignored."]);
        let phases: Vec<i32> = normalized.iter().map(|c| c.phase_number).collect();
        assert_eq!(phases, vec![1, 3]);
        let values: Vec<&str> = normalized[1].attribute_filters.iter().map(|f| f.value.as_str()).collect();
        assert_eq!(values, vec!["HEA200", "HEB300"]);
    }

    #[test]
    fn signature_includes_apply_rule() {
        let plain = profile_filter("HEA200");
        let mut ruled = profile_filter("HEA200");
        ruled.apply_rule = Some(ApplyRuleConfig {
            on_value: Some(ClauseConfig::new("PROFILE", "startswith", json!(null))),
            ..ApplyRuleConfig::default()
        });
        assert_ne!(plain.signature(), ruled.signature());
    }

    #[test]
    fn collects_selected_rows_once_per_phase() {
        let columns = default_config().columns;
        let rows = vec![
            EditableRow::new(2, true)
                .with_value("profile", " HEA200 ")
                .with_value("exclude_existing", true)
                .with_value("exclude_gratings", false),
            EditableRow::new(2, true).with_value("profile", "IPE100"),
            EditableRow::new(3, false).with_value("profile", "HEB300"),
            EditableRow {
                selected: true,
                phase_number: None,
                ..EditableRow::default()
            },
        ];

        let selection = collect_selection(&rows, &columns);
        assert_eq!(selection.len(), 1);
        let filters = &selection[0].attribute_filters;
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].target_attribute, "profile");
        assert_eq!(filters[0].value, "HEA200");
        assert_eq!(filters[1].target_attribute, "exclude_existing");
        assert_eq!(filters[1].value, "true");
    }

    #[test]
    fn false_is_kept_for_positive_number_and_on_false() {
        let positive = ColumnConfig {
            key: "painted".to_string(),
            value_type: ValueType::Boolean,
            editable: true,
            target_object_type: Some(ObjectType::Part),
            target_attribute: "PT_PAINTED".to_string(),
            boolean_mode: "positiveNumber".to_string(),
            ..ColumnConfig::default()
        };
        let on_false = ColumnConfig {
            key: "galvanized".to_string(),
            boolean_mode: String::new(),
            target_attribute: "PT_GALV".to_string(),
            apply_rule: Some(ApplyRuleConfig {
                on_false: Some(ClauseConfig::new("", "eq", json!(0))),
                ..ApplyRuleConfig::default()
            }),
            ..positive.clone()
        };

        let rows = vec![
            EditableRow::new(1, true)
                .with_value("painted", "0")
                .with_value("galvanized", false),
        ];
        let selection = collect_selection(&rows, &[positive, on_false]);
        let values: Vec<&str> = selection[0].attribute_filters.iter().map(|f| f.value.as_str()).collect();
        assert_eq!(values, vec!["false", "false"]);
    }

    #[test]
    fn numeric_cells_render_invariantly() {
        let length = ColumnConfig {
            key: "length".to_string(),
            value_type: ValueType::Number,
            editable: true,
            target_object_type: Some(ObjectType::Part),
            target_attribute: "LENGTH".to_string(),
            ..ColumnConfig::default()
        };
        let rows = vec![
            EditableRow::new(1, true).with_value("LENGTH_UNUSED", 1.0).with_value("Length", TypedCell::Number(2.5)),
        ];
        let selection = collect_selection(&rows, &[length]);
        assert_eq!(selection[0].attribute_filters[0].value, "2.5");
    }

    #[test]
    fn numeric_columns_accept_either_numeric_cell() {
        let numeric = |key: &str, value_type: ValueType| ColumnConfig {
            key: key.to_string(),
            value_type,
            editable: true,
            target_object_type: Some(ObjectType::Part),
            target_attribute: key.to_ascii_uppercase(),
            ..ColumnConfig::default()
        };
        let columns = [
            numeric("count", ValueType::Integer),
            numeric("length", ValueType::Number),
            numeric("bolts", ValueType::Integer),
            numeric("flag", ValueType::Number),
        ];
        let rows = vec![
            EditableRow::new(1, true)
                .with_value("count", TypedCell::Number(3.0))
                .with_value("length", TypedCell::Integer(1200))
                .with_value("bolts", TypedCell::Number(2.5))
                .with_value("flag", true),
        ];

        let selection = collect_selection(&rows, &columns);
        let values: Vec<(&str, &str)> = selection[0]
            .attribute_filters
            .iter()
            .map(|f| (f.target_attribute.as_str(), f.value.as_str()))
            .collect();
        assert_eq!(values, vec![("COUNT", "3"), ("LENGTH", "1200")]);
    }
}
