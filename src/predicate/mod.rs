//! Engine-neutral boolean predicate trees.
//!
//! [`PredicateTreeBuilder`] compiles selection criteria into an OR over phases, each an AND of
//! the phase-number test and one predicate per attribute filter. Adapters for a concrete query
//! engine walk the tree; `Display` renders it as compact text for logs and tests.

pub mod builder;

use std::fmt;

use serde::Serialize;

use crate::types::format_number;

pub use builder::PredicateTreeBuilder;

/// A boolean expression over field comparisons.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Predicate {
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Leaf(Comparison),
}

impl Predicate {
    pub fn number(field: Field, op: NumericOp, value: f64) -> Self {
        Predicate::Leaf(Comparison {
            field,
            test: Test::Number { op, value },
        })
    }

    pub fn text(field: Field, op: StringOp, value: impl Into<String>) -> Self {
        Predicate::Leaf(Comparison {
            field,
            test: Test::Text { op, value: value.into() },
        })
    }

    /// OR of `items`, or the single item itself.
    pub fn any_of(mut items: Vec<Predicate>) -> Self {
        if items.len() == 1 {
            return items.remove(0);
        }
        Predicate::Or(items)
    }

    /// AND of `items`, or the single item itself.
    pub fn all_of(mut items: Vec<Predicate>) -> Self {
        if items.len() == 1 {
            return items.remove(0);
        }
        Predicate::And(items)
    }

    /// Number of leaf comparisons in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Predicate::Leaf(_) => 1,
            Predicate::And(items) | Predicate::Or(items) => items.iter().map(Predicate::leaf_count).sum(),
        }
    }

    /// `true` when the tree contains no comparison at all.
    pub fn is_empty(&self) -> bool {
        self.leaf_count() == 0
    }

    /// Direct children of an AND/OR node; empty for leaves.
    pub fn children(&self) -> &[Predicate] {
        match self {
            Predicate::And(items) | Predicate::Or(items) => items,
            Predicate::Leaf(_) => &[],
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Leaf(comparison) => write!(f, "{comparison}"),
            Predicate::And(items) => write_group(f, "AND", items),
            Predicate::Or(items) => write_group(f, "OR", items),
        }
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, joiner: &str, items: &[Predicate]) -> fmt::Result {
    f.write_str("(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " {joiner} ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(")")
}

/// One field test.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub field: Field,
    pub test: Test,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.test {
            Test::Number { op, value } => write!(f, "{} {op} {}", self.field, format_number(*value)),
            Test::Text { op, value } => write!(f, "{} {op} '{value}'", self.field, value = value.replace('\'', "''")),
        }
    }
}

/// Queryable field of a model object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    /// The object's phase number.
    PhaseNumber,
    /// A host template or report field by name (`PROFILE`, `PT_INFO_BESTAND`).
    Custom(String),
}

impl Field {
    pub fn custom(name: impl Into<String>) -> Self {
        Field::Custom(name.into())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::PhaseNumber => f.write_str("PHASE"),
            Field::Custom(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Test {
    Number { op: NumericOp, value: f64 },
    Text { op: StringOp, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NumericOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl fmt::Display for NumericOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            NumericOp::Eq => "=",
            NumericOp::Neq => "!=",
            NumericOp::Gt => ">",
            NumericOp::Gte => ">=",
            NumericOp::Lt => "<",
            NumericOp::Lte => "<=",
        };
        f.write_str(symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StringOp {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
}

impl fmt::Display for StringOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StringOp::Equals => "=",
            StringOp::NotEquals => "!=",
            StringOp::Contains => "contains",
            StringOp::NotContains => "notContains",
            StringOp::StartsWith => "startsWith",
            StringOp::NotStartsWith => "notStartsWith",
            StringOp::EndsWith => "endsWith",
            StringOp::NotEndsWith => "notEndsWith",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::{Field, NumericOp, Predicate, StringOp};

    fn sample_tree() -> Predicate {
        Predicate::Or(vec![Predicate::And(vec![
            Predicate::number(Field::PhaseNumber, NumericOp::Eq, 3.0),
            Predicate::any_of(vec![
                Predicate::text(Field::custom("PROFILE"), StringOp::Equals, "HEA200"),
                Predicate::text(Field::custom("PROFILE"), StringOp::Equals, "O'NEIL"),
            ]),
        ])])
    }

    #[test]
    fn renders_compact_text() {
        assert_eq!(
            sample_tree().to_string(),
            "((PHASE = 3 AND (PROFILE = 'HEA200' OR PROFILE = 'O''NEIL')))"
        );
    }

    #[test]
    fn counts_leaves() {
        assert_eq!(sample_tree().leaf_count(), 3);
        assert!(Predicate::Or(Vec::new()).is_empty());
        assert!(!sample_tree().is_empty());
    }

    #[test]
    fn single_item_groups_collapse() {
        let leaf = Predicate::number(Field::custom("W"), NumericOp::Gt, 1.5);
        assert_eq!(Predicate::any_of(vec![leaf.clone()]), leaf);
        assert_eq!(Predicate::all_of(vec![leaf.clone()]), leaf);
        assert_eq!(leaf.to_string(), "W > 1.5");
    }

    #[test]
    fn serializes_for_adapters() {
        let leaf = Predicate::number(Field::PhaseNumber, NumericOp::Eq, 2.0);
        let json = serde_json::to_value(&leaf).unwrap();
        assert_eq!(json["leaf"]["field"], "phaseNumber");
        assert_eq!(json["leaf"]["test"]["number"]["op"], "Eq");
        assert_eq!(json["leaf"]["test"]["number"]["value"], 2.0);
    }
}
