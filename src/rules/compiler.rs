//! Compilation of a configured apply rule into a [`RuntimeClause`].

use crate::config::{ApplyRuleConfig, ClauseConfig};
use crate::error::RuleError;
use crate::rules::{FilterInput, RuleOp, RuntimeClause, literal_values};
use crate::selection::AttributeFilter;

/// Compiles the apply rule attached to an [`AttributeFilter`].
///
/// Returns `Ok(None)` when the filter has no rule or the rule has no branch for the filter's
/// input; such a filter contributes nothing to the query.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyRuleCompiler;

impl ApplyRuleCompiler {
    pub fn new() -> Self {
        Self
    }

    pub fn compile(&self, filter: &AttributeFilter) -> Result<Option<RuntimeClause>, RuleError> {
        let Some(rule) = filter.apply_rule.as_ref() else {
            return Ok(None);
        };
        let Some(branch) = select_branch(rule, FilterInput::classify(filter.value_type, &filter.value)) else {
            return Ok(None);
        };

        let operation = RuleOp::parse(&branch.op).ok_or_else(|| RuleError::UnsupportedOp {
            op: branch.op.clone(),
            target: filter.target_attribute.clone(),
        })?;

        let field = match branch.field.trim() {
            "" => filter.target_attribute.trim(),
            explicit => explicit,
        };
        if field.is_empty() {
            return Err(RuleError::MissingField {
                target: filter.target_attribute.clone(),
            });
        }

        if branch.value.is_null() {
            return Ok(Some(RuntimeClause::input(field, operation)));
        }

        let literals = literal_values(&branch.value);
        if literals.is_empty() {
            return Err(RuleError::EmptyLiteral {
                field: field.to_string(),
            });
        }

        Ok(Some(RuntimeClause {
            literal_values: literals,
            ..RuntimeClause::literal(field, operation, &[])
        }))
    }
}

fn select_branch(rule: &ApplyRuleConfig, input: FilterInput) -> Option<&ClauseConfig> {
    match input {
        FilterInput::Truthy => rule.on_true.as_ref(),
        FilterInput::Falsy => rule.on_false.as_ref(),
        FilterInput::HasValue => rule.on_value.as_ref(),
        FilterInput::Empty => None,
    }
}
