//! Apply rules: per-column conditional mappings from user input to a query clause.
//!
//! A configured rule is compiled by [`compiler::ApplyRuleCompiler`]; columns without one may still
//! be recognized by [`legacy::LegacyRuleMapper`]. Both produce a [`RuntimeClause`], the normalized
//! form consumed by [`crate::predicate::PredicateTreeBuilder`].

pub mod compiler;
pub mod legacy;
pub mod validator;

use std::fmt;

use serde::Serialize;

use crate::config::filter_ops::op_token;
use crate::types::{ObjectType, ValueType, format_number};

pub use compiler::ApplyRuleCompiler;
pub use legacy::{LegacyMapping, LegacyRuleMapper};
pub use validator::ApplyRuleValidator;

/// Operator of a compiled clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RuleOp {
    Eq,
    Neq,
    In,
    Contains,
    NotContains,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl RuleOp {
    /// Parse an operator spelling. `_`/`-` are ignored, case-insensitive; `equals` and `notEquals`
    /// are accepted as aliases of `eq` and `neq`.
    pub fn parse(s: &str) -> Option<Self> {
        let op = match op_token(s).as_str() {
            "eq" | "equals" => RuleOp::Eq,
            "neq" | "notequals" => RuleOp::Neq,
            "in" => RuleOp::In,
            "contains" => RuleOp::Contains,
            "notcontains" => RuleOp::NotContains,
            "startswith" => RuleOp::StartsWith,
            "notstartswith" => RuleOp::NotStartsWith,
            "endswith" => RuleOp::EndsWith,
            "notendswith" => RuleOp::NotEndsWith,
            "gt" => RuleOp::Gt,
            "gte" => RuleOp::Gte,
            "lt" => RuleOp::Lt,
            "lte" => RuleOp::Lte,
            _ => return None,
        };
        Some(op)
    }

    /// Canonical lower-case token stored in validated configs.
    pub fn as_str(self) -> &'static str {
        match self {
            RuleOp::Eq => "eq",
            RuleOp::Neq => "neq",
            RuleOp::In => "in",
            RuleOp::Contains => "contains",
            RuleOp::NotContains => "notcontains",
            RuleOp::StartsWith => "startswith",
            RuleOp::NotStartsWith => "notstartswith",
            RuleOp::EndsWith => "endswith",
            RuleOp::NotEndsWith => "notendswith",
            RuleOp::Gt => "gt",
            RuleOp::Gte => "gte",
            RuleOp::Lt => "lt",
            RuleOp::Lte => "lte",
        }
    }

    /// `Gt`, `Gte`, `Lt`, `Lte`: always compiled as numeric comparisons.
    pub fn is_ordering(self) -> bool {
        matches!(self, RuleOp::Gt | RuleOp::Gte | RuleOp::Lt | RuleOp::Lte)
    }

    /// Negated forms (`Neq`, `Not*`).
    pub fn is_negated(self) -> bool {
        matches!(
            self,
            RuleOp::Neq | RuleOp::NotContains | RuleOp::NotStartsWith | RuleOp::NotEndsWith
        )
    }

    /// `Eq`, `Neq`, `In`: compiled numerically when the column type and values allow it.
    pub fn prefers_numeric(self) -> bool {
        matches!(self, RuleOp::Eq | RuleOp::Neq | RuleOp::In)
    }
}

impl fmt::Display for RuleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled, normalized clause for one attribute filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeClause {
    /// Host query field the clause tests.
    pub field: String,
    pub operation: RuleOp,
    /// Take the value from the user's input instead of `literal_values`.
    pub uses_input_value: bool,
    pub literal_values: Vec<String>,
    /// Test the profile of the part and/or assembly main part instead of `field`.
    pub use_profile_scope: bool,
    pub profile_scope_object_type: Option<ObjectType>,
}

impl RuntimeClause {
    /// A clause testing `field` against fixed literals.
    pub fn literal(field: impl Into<String>, operation: RuleOp, literals: &[&str]) -> Self {
        Self {
            field: field.into(),
            operation,
            uses_input_value: false,
            literal_values: literals.iter().map(|v| v.to_string()).collect(),
            use_profile_scope: false,
            profile_scope_object_type: None,
        }
    }

    /// A clause testing `field` against the user's input.
    pub fn input(field: impl Into<String>, operation: RuleOp) -> Self {
        Self {
            field: field.into(),
            operation,
            uses_input_value: true,
            literal_values: Vec::new(),
            use_profile_scope: false,
            profile_scope_object_type: None,
        }
    }

    /// Re-target this clause at the profile of `object_type` (both profiles when `None`).
    pub fn with_profile_scope(mut self, object_type: Option<ObjectType>) -> Self {
        self.use_profile_scope = true;
        self.profile_scope_object_type = object_type;
        self
    }
}

/// Classification of a filter's raw input used to pick an apply-rule branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterInput {
    /// Boolean column, value `true` or `1`.
    Truthy,
    /// Boolean column, any other value.
    Falsy,
    /// Non-Boolean column with a non-blank value.
    HasValue,
    /// Non-Boolean column with a blank value.
    Empty,
}

impl FilterInput {
    pub fn classify(value_type: ValueType, value: &str) -> Self {
        if value_type == ValueType::Boolean {
            if is_truthy(value) {
                FilterInput::Truthy
            } else {
                FilterInput::Falsy
            }
        } else if value.trim().is_empty() {
            FilterInput::Empty
        } else {
            FilterInput::HasValue
        }
    }
}

/// `true` for `"true"` or `"1"`, trimmed and case-insensitive.
pub fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("true") || value == "1"
}

/// Literal values configured on a clause.
///
/// A string yields one trimmed literal, a list its trimmed non-blank items in order without
/// duplicates, numbers and booleans their invariant text. Blank strings and `null` yield nothing.
pub fn literal_values(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(items) => {
            let mut literals: Vec<String> = Vec::with_capacity(items.len());
            for item in items {
                let text = invariant_text(item);
                let text = text.trim();
                if !text.is_empty() && !literals.iter().any(|l| l == text) {
                    literals.push(text.to_string());
                }
            }
            literals
        }
        other => {
            let text = invariant_text(other);
            let text = text.trim();
            if text.is_empty() {
                Vec::new()
            } else {
                vec![text.to_string()]
            }
        }
    }
}

/// Invariant text for one JSON scalar; containers render as compact JSON.
pub fn invariant_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                n.as_f64().map(format_number).unwrap_or_else(|| n.to_string())
            }
        }
        other => other.to_string(),
    }
}

/// Split user input on `,` and `;`, trimming and dropping blanks and exact duplicates.
pub fn split_values(input: &str) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for part in input.split([',', ';']) {
        let part = part.trim();
        if !part.is_empty() && !values.iter().any(|v| v == part) {
            values.push(part.to_string());
        }
    }
    values
}
