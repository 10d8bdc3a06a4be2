//! Declarative table configuration.
//!
//! A [`TableConfig`] describes the phase table: which columns exist, where read-only columns take
//! their values from, and what editable columns do to the host query once a user fills them in.
//! Raw configs are deserialized from camelCase JSON and must go through
//! [`validator::ConfigValidator`] before use.

pub mod defaults;
pub mod filter_ops;
pub mod loader;
pub mod validator;

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{ObjectType, ValueType, deserialize_token, normalize_token};

pub use defaults::default_config;
pub use filter_ops::FilterOp;
pub use loader::{load_config_from_path, load_first_available, parse_config_str};
pub use validator::ConfigValidator;

/// The only config version this crate understands.
pub const SUPPORTED_VERSION: i32 = 2;

/// `booleanMode` value mapping a Boolean column to "attribute > 0" / "attribute = 0".
pub const BOOLEAN_MODE_POSITIVE_NUMBER: &str = "positiveNumber";

/// Legacy editable column name: exclude objects flagged as existing stock.
pub const EXCLUDE_EXISTING: &str = "exclude_existing";

/// Legacy editable column name: exclude grating profiles.
pub const EXCLUDE_GRATINGS: &str = "exclude_gratings";

/// How per-object values of one column collapse into one cell per phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum AggregateFn {
    /// Value of the first object that has one.
    #[default]
    First,
    /// Unique values, case-insensitive, joined with `"; "`.
    Distinct,
    /// Number of objects in the phase.
    Count,
    /// Smallest numeric value.
    Min,
    /// Largest numeric value.
    Max,
}

impl AggregateFn {
    const NAMES: &'static [&'static str] = &["First", "Distinct", "Count", "Min", "Max"];

    /// Case-insensitive parse.
    pub fn parse(token: &str) -> Option<Self> {
        match normalize_token(token).as_str() {
            "first" => Some(AggregateFn::First),
            "distinct" => Some(AggregateFn::Distinct),
            "count" => Some(AggregateFn::Count),
            "min" => Some(AggregateFn::Min),
            "max" => Some(AggregateFn::Max),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for AggregateFn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_token(deserializer, Self::NAMES, Self::parse)
    }
}

/// Top-level table configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    #[serde(default = "default_version")]
    pub version: i32,
    #[serde(default = "default_phase_key", deserialize_with = "null_as_default")]
    pub phase_key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub actions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<ColumnConfig>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_VERSION,
            phase_key: default_phase_key(),
            actions: Vec::new(),
            columns: Vec::new(),
        }
    }
}

impl TableConfig {
    /// Case-insensitive column lookup by key.
    pub fn column(&self, key: &str) -> Option<&ColumnConfig> {
        self.columns.iter().find(|c| c.key.eq_ignore_ascii_case(key))
    }
}

/// One table column.
///
/// Read-only columns set `object_type` + `attribute`. Editable columns set `target_object_type` +
/// `target_attribute` (or just `target_attribute` for the two legacy names) and may carry an
/// `apply_rule` or `boolean_mode`.
///
/// Enum-valued settings parse case-insensitively. A value that names no known variant does not
/// fail the whole config: it is recorded in `unrecognized` and the validator drops the column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawColumnConfig")]
pub struct ColumnConfig {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub editable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_type: Option<ObjectType>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub attribute: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_object_type: Option<ObjectType>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub target_attribute: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub boolean_mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_rule: Option<ApplyRuleConfig>,
    pub aggregate: AggregateFn,
    pub order: i32,
    pub visible_by_default: bool,
    pub filter_ops: Vec<String>,
    /// Settings that named no known variant, as `(setting, raw value)`.
    #[serde(skip)]
    pub unrecognized: Vec<(&'static str, String)>,
}

/// Wire form of [`ColumnConfig`] with enum settings kept as raw text.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawColumnConfig {
    #[serde(default, deserialize_with = "null_as_default")]
    key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    label: String,
    #[serde(rename = "type", default)]
    value_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    editable: bool,
    #[serde(default)]
    object_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    attribute: String,
    #[serde(default)]
    target_object_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    target_attribute: String,
    #[serde(default, deserialize_with = "null_as_default")]
    boolean_mode: String,
    #[serde(default)]
    apply_rule: Option<ApplyRuleConfig>,
    #[serde(default)]
    aggregate: Option<String>,
    #[serde(default)]
    order: i32,
    #[serde(default = "default_true")]
    visible_by_default: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    filter_ops: Vec<String>,
}

impl From<RawColumnConfig> for ColumnConfig {
    fn from(raw: RawColumnConfig) -> Self {
        let mut unrecognized = Vec::new();
        let value_type = parse_setting("type", raw.value_type, ValueType::parse, &mut unrecognized);
        let object_type = parse_setting("objectType", raw.object_type, ObjectType::parse, &mut unrecognized);
        let target_object_type =
            parse_setting("targetObjectType", raw.target_object_type, ObjectType::parse, &mut unrecognized);
        let aggregate = parse_setting("aggregate", raw.aggregate, AggregateFn::parse, &mut unrecognized);

        Self {
            key: raw.key,
            label: raw.label,
            value_type: value_type.unwrap_or_default(),
            editable: raw.editable,
            object_type,
            attribute: raw.attribute,
            target_object_type,
            target_attribute: raw.target_attribute,
            boolean_mode: raw.boolean_mode,
            apply_rule: raw.apply_rule,
            aggregate: aggregate.unwrap_or_default(),
            order: raw.order,
            visible_by_default: raw.visible_by_default,
            filter_ops: raw.filter_ops,
            unrecognized,
        }
    }
}

/// Blank or missing settings are unset; anything else must parse.
fn parse_setting<T>(
    name: &'static str,
    value: Option<String>,
    parse: fn(&str) -> Option<T>,
    unrecognized: &mut Vec<(&'static str, String)>,
) -> Option<T> {
    let value = value.filter(|v| !v.trim().is_empty())?;
    let parsed = parse(&value);
    if parsed.is_none() {
        unrecognized.push((name, value));
    }
    parsed
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            label: String::new(),
            value_type: ValueType::String,
            editable: false,
            object_type: None,
            attribute: String::new(),
            target_object_type: None,
            target_attribute: String::new(),
            boolean_mode: String::new(),
            apply_rule: None,
            aggregate: AggregateFn::First,
            order: 0,
            visible_by_default: true,
            filter_ops: Vec::new(),
            unrecognized: Vec::new(),
        }
    }
}

impl ColumnConfig {
    /// `true` when `boolean_mode` is `positiveNumber` (case-insensitive).
    pub fn is_positive_number_mode(&self) -> bool {
        self.boolean_mode.trim().eq_ignore_ascii_case(BOOLEAN_MODE_POSITIVE_NUMBER)
    }

    /// `true` for read-only columns bound to the phase number or name.
    pub fn is_phase_attribute(&self, attribute: &str) -> bool {
        self.object_type == Some(ObjectType::Phase) && self.attribute.eq_ignore_ascii_case(attribute)
    }
}

/// Conditional mapping from a user input to a query clause.
///
/// `on_true`/`on_false` apply to Boolean columns, `on_value` to every other type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRuleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_true: Option<ClauseConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_false: Option<ClauseConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_value: Option<ClauseConfig>,
}

impl ApplyRuleConfig {
    pub fn is_empty(&self) -> bool {
        self.on_true.is_none() && self.on_false.is_none() && self.on_value.is_none()
    }
}

/// One apply-rule branch.
///
/// A `null` or missing `value` means "use the user's input verbatim"; a scalar or list is a
/// fixed literal set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClauseConfig {
    #[serde(default, deserialize_with = "null_as_default")]
    pub field: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub op: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl ClauseConfig {
    pub fn new(field: impl Into<String>, op: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            field: field.into(),
            op: op.into(),
            value,
        }
    }
}

fn default_version() -> i32 {
    SUPPORTED_VERSION
}

fn default_phase_key() -> String {
    "number".to_string()
}

fn default_true() -> bool {
    true
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
