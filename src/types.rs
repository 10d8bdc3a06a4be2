//! Core value types shared by configuration, rule compilation and row aggregation.
//!
//! Every table cell is a [`TypedCell`]. Columns declare a [`ValueType`], and aggregated values are
//! coerced into that type with [`TypedCell::convert_to`].

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Logical value type of a table column or attribute filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ValueType {
    /// UTF-8 text.
    #[default]
    String,
    /// 64-bit floating point number.
    Number,
    /// Whole number. A constrained subtype of [`ValueType::Number`].
    Integer,
    /// Boolean.
    Boolean,
}

impl ValueType {
    const NAMES: &'static [&'static str] = &["String", "Number", "Integer", "Boolean"];

    /// `true` for [`ValueType::Number`] and [`ValueType::Integer`].
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueType::Number | ValueType::Integer)
    }

    /// Case-insensitive parse; also accepts `Int` and `Bool`.
    pub fn parse(token: &str) -> Option<Self> {
        match normalize_token(token).as_str() {
            "string" => Some(ValueType::String),
            "number" => Some(ValueType::Number),
            "integer" | "int" => Some(ValueType::Integer),
            "boolean" | "bool" => Some(ValueType::Boolean),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for ValueType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_token(deserializer, Self::NAMES, Self::parse)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::String => "String",
            ValueType::Number => "Number",
            ValueType::Integer => "Integer",
            ValueType::Boolean => "Boolean",
        };
        f.write_str(name)
    }
}

/// Kind of model object a column reads from or targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ObjectType {
    /// The phase itself (number / name).
    Phase,
    /// A single part.
    Part,
    /// An assembly, addressed through its main part.
    Assembly,
    /// A bolt group.
    Bolt,
}

impl ObjectType {
    const NAMES: &'static [&'static str] = &["Phase", "Part", "Assembly", "Bolt"];

    /// Case-insensitive parse.
    pub fn parse(token: &str) -> Option<Self> {
        match normalize_token(token).as_str() {
            "phase" => Some(ObjectType::Phase),
            "part" => Some(ObjectType::Part),
            "assembly" => Some(ObjectType::Assembly),
            "bolt" => Some(ObjectType::Bolt),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for ObjectType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_token(deserializer, Self::NAMES, Self::parse)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectType::Phase => "Phase",
            ObjectType::Part => "Part",
            ObjectType::Assembly => "Assembly",
            ObjectType::Bolt => "Bolt",
        };
        f.write_str(name)
    }
}

pub(crate) fn normalize_token(token: &str) -> String {
    token.trim().to_ascii_lowercase()
}

/// Deserialize a unit enum from a string through a case-insensitive `parse`.
pub(crate) fn deserialize_token<'de, D, T>(
    deserializer: D,
    names: &'static [&'static str],
    parse: fn(&str) -> Option<T>,
) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
{
    let token = String::deserialize(deserializer)?;
    parse(&token).ok_or_else(|| de::Error::unknown_variant(&token, names))
}

const TRUE_TOKENS: [&str; 5] = ["true", "1", "yes", "y", "on"];
const FALSE_TOKENS: [&str; 5] = ["false", "0", "no", "n", "off"];

/// A single typed attribute or cell value.
///
/// Text cells are always trimmed and never blank: blank text is represented as
/// [`TypedCell::Empty`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum TypedCell {
    /// Missing/empty value.
    #[default]
    Empty,
    /// Non-blank, trimmed text.
    String(String),
    /// Floating point number.
    Number(f64),
    /// Whole number.
    Integer(i64),
    /// Boolean.
    Boolean(bool),
}

impl TypedCell {
    /// Build a text cell, trimming the input. Blank input yields [`TypedCell::Empty`].
    pub fn text(value: impl AsRef<str>) -> Self {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            TypedCell::Empty
        } else {
            TypedCell::String(trimmed.to_string())
        }
    }

    /// Build a text cell from an optional value.
    pub fn from_optional_text(value: Option<&str>) -> Self {
        match value {
            Some(text) => Self::text(text),
            None => TypedCell::Empty,
        }
    }

    /// The value type this cell carries, or `None` for [`TypedCell::Empty`].
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            TypedCell::Empty => None,
            TypedCell::String(_) => Some(ValueType::String),
            TypedCell::Number(_) => Some(ValueType::Number),
            TypedCell::Integer(_) => Some(ValueType::Integer),
            TypedCell::Boolean(_) => Some(ValueType::Boolean),
        }
    }

    /// `true` unless the cell is [`TypedCell::Empty`].
    pub fn has_value(&self) -> bool {
        !matches!(self, TypedCell::Empty)
    }

    /// Invariant text form used for comparisons, de-duplication and string conversion.
    ///
    /// Empty cells render as an empty string.
    pub fn as_comparable_string(&self) -> String {
        match self {
            TypedCell::Empty => String::new(),
            TypedCell::String(s) => s.clone(),
            TypedCell::Number(n) => format_number(*n),
            TypedCell::Integer(i) => i.to_string(),
            TypedCell::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
        }
    }

    /// Best-effort numeric view: numbers as-is, booleans as 1/0, numeric text parsed.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            TypedCell::Empty => None,
            TypedCell::Number(n) => Some(*n),
            TypedCell::Integer(i) => Some(*i as f64),
            TypedCell::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            TypedCell::String(s) => parse_number(s),
        }
    }

    /// Coerce this cell into `target`.
    ///
    /// Never fails: when the conversion is not meaningful (e.g. non-numeric text to
    /// [`ValueType::Number`]) the result is [`TypedCell::Empty`]. Converting to the type the cell
    /// already has returns an identical cell.
    pub fn convert_to(&self, target: ValueType) -> TypedCell {
        if self.value_type() == Some(target) {
            return self.clone();
        }

        match target {
            ValueType::String => TypedCell::text(self.as_comparable_string()),
            ValueType::Number => self.to_number(),
            ValueType::Integer => self.to_integer(),
            ValueType::Boolean => self.to_boolean(),
        }
    }

    fn to_number(&self) -> TypedCell {
        self.as_number().map(TypedCell::Number).unwrap_or(TypedCell::Empty)
    }

    fn to_integer(&self) -> TypedCell {
        match self {
            TypedCell::Empty => TypedCell::Empty,
            TypedCell::Integer(i) => TypedCell::Integer(*i),
            TypedCell::Number(n) => whole_number(*n).map(TypedCell::Integer).unwrap_or(TypedCell::Empty),
            TypedCell::Boolean(b) => TypedCell::Integer(i64::from(*b)),
            TypedCell::String(s) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    return TypedCell::Integer(i);
                }
                parse_number(trimmed)
                    .and_then(whole_number)
                    .map(TypedCell::Integer)
                    .unwrap_or(TypedCell::Empty)
            }
        }
    }

    fn to_boolean(&self) -> TypedCell {
        match self {
            TypedCell::Empty => TypedCell::Empty,
            TypedCell::Boolean(b) => TypedCell::Boolean(*b),
            TypedCell::Number(n) => TypedCell::Boolean(n.abs() > f64::EPSILON),
            TypedCell::Integer(i) => TypedCell::Boolean(*i != 0),
            TypedCell::String(s) => parse_loose_bool(s)
                .map(TypedCell::Boolean)
                .unwrap_or(TypedCell::Empty),
        }
    }
}

impl fmt::Display for TypedCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_comparable_string())
    }
}

impl From<bool> for TypedCell {
    fn from(value: bool) -> Self {
        TypedCell::Boolean(value)
    }
}

impl From<i64> for TypedCell {
    fn from(value: i64) -> Self {
        TypedCell::Integer(value)
    }
}

impl From<i32> for TypedCell {
    fn from(value: i32) -> Self {
        TypedCell::Integer(i64::from(value))
    }
}

impl From<f64> for TypedCell {
    fn from(value: f64) -> Self {
        if value.is_finite() {
            TypedCell::Number(value)
        } else {
            TypedCell::Empty
        }
    }
}

impl From<&str> for TypedCell {
    fn from(value: &str) -> Self {
        TypedCell::text(value)
    }
}

impl From<String> for TypedCell {
    fn from(value: String) -> Self {
        TypedCell::text(value)
    }
}

/// Parse loose boolean tokens (`true/1/yes/y/on`, `false/0/no/n/off`), case-insensitive.
pub fn parse_loose_bool(text: &str) -> Option<bool> {
    let normalized = text.trim();
    if normalized.is_empty() {
        return None;
    }
    if TRUE_TOKENS.iter().any(|t| t.eq_ignore_ascii_case(normalized)) {
        return Some(true);
    }
    if FALSE_TOKENS.iter().any(|t| t.eq_ignore_ascii_case(normalized)) {
        return Some(false);
    }
    None
}

/// Parse invariant numeric text. Non-finite results are rejected.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Invariant, shortest round-trip text for a number (`3`, `1.5`, `-0.25`).
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // normalizes -0
        return "0".to_string();
    }
    format!("{value}")
}

fn whole_number(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{ObjectType, TypedCell, ValueType, format_number, parse_loose_bool};

    const ALL_TYPES: [ValueType; 4] = [
        ValueType::String,
        ValueType::Number,
        ValueType::Integer,
        ValueType::Boolean,
    ];

    fn sample_cells() -> Vec<TypedCell> {
        vec![
            TypedCell::Empty,
            TypedCell::text("HEA200"),
            TypedCell::text(" 42 "),
            TypedCell::text("2.5"),
            TypedCell::text("yes"),
            TypedCell::text("off"),
            TypedCell::Number(3.0),
            TypedCell::Number(1.5),
            TypedCell::Number(0.0),
            TypedCell::Integer(7),
            TypedCell::Integer(0),
            TypedCell::Boolean(true),
            TypedCell::Boolean(false),
        ]
    }

    #[test]
    fn convert_to_is_idempotent_for_every_type() {
        for cell in sample_cells() {
            for target in ALL_TYPES {
                let once = cell.convert_to(target);
                let twice = once.convert_to(target);
                assert_eq!(once, twice, "cell={cell:?} target={target}");
            }
        }
    }

    #[test]
    fn text_is_trimmed_and_blank_is_empty() {
        assert_eq!(TypedCell::text("  S235 "), TypedCell::String("S235".to_string()));
        assert_eq!(TypedCell::text("   "), TypedCell::Empty);
        assert_eq!(TypedCell::from_optional_text(None), TypedCell::Empty);
    }

    #[test]
    fn boolean_to_number_maps_to_one_and_zero() {
        assert_eq!(TypedCell::Boolean(true).convert_to(ValueType::Number), TypedCell::Number(1.0));
        assert_eq!(TypedCell::Boolean(false).convert_to(ValueType::Integer), TypedCell::Integer(0));
    }

    #[test]
    fn number_to_boolean_uses_epsilon() {
        assert_eq!(TypedCell::Number(0.0).convert_to(ValueType::Boolean), TypedCell::Boolean(false));
        assert_eq!(TypedCell::Number(-0.5).convert_to(ValueType::Boolean), TypedCell::Boolean(true));
        assert_eq!(TypedCell::Integer(2).convert_to(ValueType::Boolean), TypedCell::Boolean(true));
    }

    #[test]
    fn loose_text_tokens_parse_to_boolean() {
        for token in ["TRUE", "1", "Yes", "y", "on"] {
            assert_eq!(parse_loose_bool(token), Some(true), "{token}");
        }
        for token in ["false", "0", "NO", "n", "Off"] {
            assert_eq!(parse_loose_bool(token), Some(false), "{token}");
        }
        assert_eq!(parse_loose_bool("maybe"), None);
        assert_eq!(TypedCell::text("maybe").convert_to(ValueType::Boolean), TypedCell::Empty);
    }

    #[test]
    fn non_numeric_text_converts_to_empty() {
        assert_eq!(TypedCell::text("HEA200").convert_to(ValueType::Number), TypedCell::Empty);
        assert_eq!(TypedCell::text("HEA200").convert_to(ValueType::Integer), TypedCell::Empty);
    }

    #[test]
    fn integer_conversion_requires_whole_numbers() {
        assert_eq!(TypedCell::Number(4.0).convert_to(ValueType::Integer), TypedCell::Integer(4));
        assert_eq!(TypedCell::Number(4.5).convert_to(ValueType::Integer), TypedCell::Empty);
        assert_eq!(TypedCell::text("12.0").convert_to(ValueType::Integer), TypedCell::Integer(12));
        assert_eq!(TypedCell::text("12").convert_to(ValueType::Integer), TypedCell::Integer(12));
    }

    #[test]
    fn numbers_render_invariantly() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(TypedCell::Number(3.0).convert_to(ValueType::String), TypedCell::text("3"));
        assert_eq!(TypedCell::Boolean(true).convert_to(ValueType::String), TypedCell::text("true"));
    }

    #[test]
    fn enum_names_deserialize_in_any_case() {
        let types: Vec<ValueType> = serde_json::from_str(r#"["STRING", "number", "Int", " bool "]"#).unwrap();
        assert_eq!(types, ALL_TYPES.to_vec());

        let objects: Vec<ObjectType> = serde_json::from_str(r#"["PART", "assembly", "Bolt", "pHaSe"]"#).unwrap();
        assert_eq!(
            objects,
            vec![ObjectType::Part, ObjectType::Assembly, ObjectType::Bolt, ObjectType::Phase]
        );

        let err = serde_json::from_str::<ObjectType>(r#""Beam""#).unwrap_err();
        assert!(err.to_string().contains("unknown variant `Beam`"), "{err}");
    }
}
