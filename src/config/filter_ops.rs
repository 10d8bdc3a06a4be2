//! Column filter operators offered to the UI, and which value types they apply to.

use std::fmt;

use crate::types::ValueType;

/// A filter operator a column may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    /// equals, eq
    Equals,
    /// notEquals, neq
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
    In,
    Range,
    Gt,
    Gte,
    Lt,
    Lte,
    IsTrue,
    IsFalse,
}

impl FilterOp {
    /// Parse any accepted spelling. `_` and `-` are ignored and matching is case-insensitive, so
    /// `not_equals`, `NotEquals` and `neq` all parse to [`FilterOp::NotEquals`].
    pub fn parse(s: &str) -> Option<Self> {
        let op = match op_token(s).as_str() {
            "equals" | "eq" => FilterOp::Equals,
            "notequals" | "neq" => FilterOp::NotEquals,
            "contains" => FilterOp::Contains,
            "notcontains" => FilterOp::NotContains,
            "startswith" => FilterOp::StartsWith,
            "notstartswith" => FilterOp::NotStartsWith,
            "endswith" => FilterOp::EndsWith,
            "notendswith" => FilterOp::NotEndsWith,
            "in" => FilterOp::In,
            "range" => FilterOp::Range,
            "gt" => FilterOp::Gt,
            "gte" => FilterOp::Gte,
            "lt" => FilterOp::Lt,
            "lte" => FilterOp::Lte,
            "istrue" => FilterOp::IsTrue,
            "isfalse" => FilterOp::IsFalse,
            _ => return None,
        };
        Some(op)
    }

    /// Canonical token written into validated configs.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOp::Equals => "equals",
            FilterOp::NotEquals => "notEquals",
            FilterOp::Contains => "contains",
            FilterOp::NotContains => "notContains",
            FilterOp::StartsWith => "startsWith",
            FilterOp::NotStartsWith => "notStartsWith",
            FilterOp::EndsWith => "endsWith",
            FilterOp::NotEndsWith => "notEndsWith",
            FilterOp::In => "in",
            FilterOp::Range => "range",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::IsTrue => "isTrue",
            FilterOp::IsFalse => "isFalse",
        }
    }

    /// Whether a column of `value_type` can offer this operator.
    pub fn is_legal_for(self, value_type: ValueType) -> bool {
        use FilterOp::*;

        match value_type {
            ValueType::String => matches!(
                self,
                Equals | NotEquals | Contains | NotContains | StartsWith | NotStartsWith | EndsWith | NotEndsWith | In
            ),
            ValueType::Number | ValueType::Integer => {
                matches!(self, Equals | NotEquals | In | Range | Gt | Gte | Lt | Lte)
            }
            ValueType::Boolean => matches!(self, Equals | NotEquals | IsTrue | IsFalse),
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lower-cased operator spelling with `_` and `-` removed.
pub(crate) fn op_token(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}
