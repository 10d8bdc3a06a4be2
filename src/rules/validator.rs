//! Normalization of a column's `applyRule` block.

use crate::config::{ApplyRuleConfig, ClauseConfig};
use crate::diagnostics::{Diagnostics, Outcome};
use crate::rules::RuleOp;
use crate::types::ValueType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    OnTrue,
    OnFalse,
    OnValue,
}

impl Branch {
    fn name(self) -> &'static str {
        match self {
            Branch::OnTrue => "onTrue",
            Branch::OnFalse => "onFalse",
            Branch::OnValue => "onValue",
        }
    }
}

/// Checks every branch of an apply rule against the owning column's value type.
///
/// Surviving branches get a trimmed `field` and the canonical operator token. Branches with an
/// unknown operator, `onTrue`/`onFalse` on non-Boolean columns and `onValue` on Boolean columns
/// are dropped. A rule with no surviving branch is rejected as a whole (`value` is `None`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyRuleValidator;

impl ApplyRuleValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(
        &self,
        rule: &ApplyRuleConfig,
        column_key: &str,
        value_type: ValueType,
    ) -> Outcome<Option<ApplyRuleConfig>> {
        let mut diagnostics = Diagnostics::new();
        let normalized = ApplyRuleConfig {
            on_true: normalize_clause(rule.on_true.as_ref(), Branch::OnTrue, column_key, value_type, &mut diagnostics),
            on_false: normalize_clause(rule.on_false.as_ref(), Branch::OnFalse, column_key, value_type, &mut diagnostics),
            on_value: normalize_clause(rule.on_value.as_ref(), Branch::OnValue, column_key, value_type, &mut diagnostics),
        };

        if normalized.is_empty() {
            diagnostics.push(format!(
                "config column {column_key} ignored applyRule because no valid rule clauses remained."
            ));
            return Outcome::new(None, diagnostics);
        }

        Outcome::new(Some(normalized), diagnostics)
    }
}

fn normalize_clause(
    clause: Option<&ClauseConfig>,
    branch: Branch,
    column_key: &str,
    value_type: ValueType,
    diagnostics: &mut Diagnostics,
) -> Option<ClauseConfig> {
    let clause = clause?;
    let branch_name = branch.name();

    let Some(op) = RuleOp::parse(&clause.op) else {
        diagnostics.push(format!(
            "config column {column_key} ignored applyRule.{branch_name}: unsupported op '{}'.",
            clause.op
        ));
        return None;
    };

    let is_boolean = value_type == ValueType::Boolean;
    match branch {
        Branch::OnTrue | Branch::OnFalse if !is_boolean => {
            diagnostics.push(format!(
                "config column {column_key} ignored applyRule.{branch_name}: branch is valid only for Boolean columns."
            ));
            return None;
        }
        Branch::OnValue if is_boolean => {
            diagnostics.push(format!(
                "config column {column_key} ignored applyRule.onValue: branch is not used for Boolean columns."
            ));
            return None;
        }
        _ => {}
    }

    Some(ClauseConfig {
        field: clause.field.trim().to_string(),
        op: op.as_str().to_string(),
        value: clause.value.clone(),
    })
}
