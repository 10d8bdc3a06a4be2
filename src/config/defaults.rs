//! Built-in table configuration used when no usable config is available.

use super::{AggregateFn, ColumnConfig, EXCLUDE_EXISTING, EXCLUDE_GRATINGS, SUPPORTED_VERSION, TableConfig};
use crate::types::{ObjectType, ValueType};

/// Actions offered when a config lists none.
pub const DEFAULT_ACTIONS: [&str; 3] = ["select", "show_only", "visualize"];

/// The embedded default config. Already in validated form.
pub fn default_config() -> TableConfig {
    TableConfig {
        version: SUPPORTED_VERSION,
        phase_key: "number".to_string(),
        actions: default_actions(),
        columns: vec![
            model_column("phase_number", "Phase", ValueType::Integer, ObjectType::Phase, "number", 10)
                .with_filter_ops(&["equals", "in", "range"]),
            model_column("phase_name", "Name", ValueType::String, ObjectType::Phase, "name", 20)
                .with_filter_ops(&["equals", "contains", "in"]),
            ColumnConfig {
                key: "profile".to_string(),
                label: "Profile".to_string(),
                value_type: ValueType::String,
                editable: true,
                target_object_type: Some(ObjectType::Part),
                target_attribute: "profile".to_string(),
                order: 25,
                ..ColumnConfig::default()
            }
            .with_filter_ops(&["equals", "contains", "in"]),
            legacy_flag_column(EXCLUDE_GRATINGS, "Exclude Gratings", 26),
            legacy_flag_column(EXCLUDE_EXISTING, "Exclude Existing", 27),
            ColumnConfig {
                aggregate: AggregateFn::Count,
                ..model_column("object_count", "Count", ValueType::Integer, ObjectType::Phase, "number", 30)
            }
            .with_filter_ops(&["equals", "range"]),
        ],
    }
}

pub(crate) fn default_actions() -> Vec<String> {
    DEFAULT_ACTIONS.iter().map(|a| a.to_string()).collect()
}

fn model_column(
    key: &str,
    label: &str,
    value_type: ValueType,
    object_type: ObjectType,
    attribute: &str,
    order: i32,
) -> ColumnConfig {
    ColumnConfig {
        key: key.to_string(),
        label: label.to_string(),
        value_type,
        object_type: Some(object_type),
        attribute: attribute.to_string(),
        order,
        ..ColumnConfig::default()
    }
}

fn legacy_flag_column(key: &str, label: &str, order: i32) -> ColumnConfig {
    ColumnConfig {
        key: key.to_string(),
        label: label.to_string(),
        value_type: ValueType::Boolean,
        editable: true,
        target_attribute: key.to_string(),
        order,
        ..ColumnConfig::default()
    }
    .with_filter_ops(&["equals"])
}

impl ColumnConfig {
    fn with_filter_ops(mut self, ops: &[&str]) -> Self {
        self.filter_ops = ops.iter().map(|op| op.to_string()).collect();
        self
    }
}
