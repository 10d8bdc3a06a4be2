//! Built-in clauses for columns that predate apply rules.

use crate::config::{EXCLUDE_EXISTING, EXCLUDE_GRATINGS};
use crate::rules::{RuleOp, RuntimeClause, is_truthy};
use crate::selection::AttributeFilter;
use crate::types::ValueType;

/// Host field flagging objects that already exist on site.
pub const EXISTING_STOCK_FIELD: &str = "PT_INFO_BESTAND";

/// Profile prefix identifying gratings.
pub const GRATING_PROFILE_PREFIX: &str = "GIRO";

/// Result of [`LegacyRuleMapper::map`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyMapping {
    /// The filter is not a legacy column; fall through to generic handling.
    NotRecognized,
    /// A legacy column whose current value adds no condition (e.g. `exclude_existing = false`).
    NoClause,
    Clause(RuntimeClause),
}

/// Stateless mapping for `booleanMode = positiveNumber`, `exclude_existing` and `exclude_gratings`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyRuleMapper;

impl LegacyRuleMapper {
    pub fn map(filter: &AttributeFilter) -> LegacyMapping {
        let target = filter.target_attribute.trim();
        if target.is_empty() {
            return LegacyMapping::NotRecognized;
        }

        let truthy = is_truthy(&filter.value);

        if filter.value_type == ValueType::Boolean && filter.is_positive_number_mode() {
            let op = if truthy { RuleOp::Gt } else { RuleOp::Eq };
            return LegacyMapping::Clause(RuntimeClause::literal(target, op, &["0"]));
        }

        if target.eq_ignore_ascii_case(EXCLUDE_EXISTING) {
            if !truthy {
                return LegacyMapping::NoClause;
            }
            return LegacyMapping::Clause(RuntimeClause::literal(EXISTING_STOCK_FIELD, RuleOp::Neq, &["1"]));
        }

        if target.eq_ignore_ascii_case(EXCLUDE_GRATINGS) {
            if !truthy {
                return LegacyMapping::NoClause;
            }
            let clause = RuntimeClause::literal("PROFILE", RuleOp::NotStartsWith, &[GRATING_PROFILE_PREFIX])
                .with_profile_scope(filter.target_object_type);
            return LegacyMapping::Clause(clause);
        }

        LegacyMapping::NotRecognized
    }
}
