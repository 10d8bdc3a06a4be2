//! Validation and normalization of a raw [`TableConfig`].
//!
//! Invalid elements are dropped one at a time with a diagnostic. The built-in defaults replace
//! the whole config only when it is missing, has the wrong version or keeps no column at all.
//! Validating an already validated config returns it unchanged.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::defaults::{default_actions, default_config};
use super::filter_ops::FilterOp;
use super::{
    BOOLEAN_MODE_POSITIVE_NUMBER, ColumnConfig, EXCLUDE_EXISTING, EXCLUDE_GRATINGS, SUPPORTED_VERSION, TableConfig,
};
use crate::diagnostics::{Diagnostics, Outcome};
use crate::rules::ApplyRuleValidator;
use crate::source;
use crate::types::{ObjectType, ValueType};

/// Validates table configs. Stateless; one instance can be shared freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigValidator {
    apply_rules: ApplyRuleValidator,
}

impl ConfigValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `config`, or fall back to [`default_config`] when it is `None` or unusable.
    pub fn validate(&self, config: Option<&TableConfig>) -> Outcome<TableConfig> {
        let mut diagnostics = Diagnostics::new();

        let Some(config) = config else {
            note(&mut diagnostics, "config is null. Using defaults.".to_string());
            return Outcome::new(default_config(), diagnostics);
        };

        if config.version != SUPPORTED_VERSION {
            note(
                &mut diagnostics,
                format!(
                    "config version {} is not supported (expected {SUPPORTED_VERSION}). Using defaults.",
                    config.version
                ),
            );
            return Outcome::new(default_config(), diagnostics);
        }

        let mut unique_keys = HashSet::new();
        let mut columns: Vec<ColumnConfig> = config
            .columns
            .iter()
            .filter_map(|raw| self.normalize_column(raw, &mut unique_keys, &mut diagnostics))
            .collect();

        if columns.is_empty() {
            note(&mut diagnostics, "config has no valid columns. Using defaults.".to_string());
            return Outcome::new(default_config(), diagnostics);
        }

        columns.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then_with(|| a.key.to_lowercase().cmp(&b.key.to_lowercase()))
        });

        let mut actions = normalize_actions(&config.actions);
        if actions.is_empty() {
            actions = default_actions();
        }

        let phase_key = match config.phase_key.trim() {
            "" => "number".to_string(),
            key => key.to_string(),
        };

        debug!(
            columns = columns.len(),
            dropped = config.columns.len() - columns.len(),
            diagnostics = diagnostics.len(),
            "validated table config"
        );

        let normalized = TableConfig {
            version: SUPPORTED_VERSION,
            phase_key,
            actions,
            columns,
        };
        Outcome::new(normalized, diagnostics)
    }

    fn normalize_column(
        &self,
        raw: &ColumnConfig,
        unique_keys: &mut HashSet<String>,
        diagnostics: &mut Diagnostics,
    ) -> Option<ColumnConfig> {
        let key = raw.key.trim();
        if key.is_empty() {
            note(diagnostics, "config skipped column with empty key.".to_string());
            return None;
        }
        if !unique_keys.insert(key.to_lowercase()) {
            note(diagnostics, format!("config skipped duplicate column key: {key}"));
            return None;
        }
        if let Some((setting, value)) = raw.unrecognized.first() {
            note(diagnostics, format!("config skipped column {key}: unsupported {setting} '{value}'."));
            return None;
        }

        let binding = if raw.editable {
            self.normalize_editable(raw, key, diagnostics)?
        } else {
            normalize_model(raw, key, diagnostics)?
        };

        let label = match raw.label.trim() {
            "" => key.to_string(),
            label => label.to_string(),
        };

        Some(ColumnConfig {
            key: key.to_string(),
            label,
            value_type: raw.value_type,
            editable: raw.editable,
            object_type: binding.object_type,
            attribute: binding.attribute,
            target_object_type: binding.target_object_type,
            target_attribute: binding.target_attribute,
            boolean_mode: binding.boolean_mode,
            apply_rule: binding.apply_rule,
            aggregate: raw.aggregate,
            order: raw.order,
            visible_by_default: raw.visible_by_default,
            filter_ops: normalize_filter_ops(&raw.filter_ops, raw.value_type, key, diagnostics),
            unrecognized: Vec::new(),
        })
    }

    fn normalize_editable(&self, raw: &ColumnConfig, key: &str, diagnostics: &mut Diagnostics) -> Option<Binding> {
        if raw.object_type.is_some() || !raw.attribute.trim().is_empty() {
            note(
                diagnostics,
                format!("config skipped editable column {key}: editable columns cannot define objectType/attribute."),
            );
            return None;
        }

        let target_attribute = raw.target_attribute.trim();
        let mut binding = Binding::default();

        match (raw.target_object_type, target_attribute.is_empty()) {
            (None, true) => {}
            (None, false) => {
                if !is_legacy_criteria(target_attribute) {
                    note(
                        diagnostics,
                        format!(
                            "config skipped editable column {key}: unknown targetAttribute '{target_attribute}' without targetObjectType."
                        ),
                    );
                    return None;
                }
                note(
                    diagnostics,
                    format!(
                        "config column {key} uses legacy criteria targetAttribute '{target_attribute}'. \
                         Prefer explicit editable columns with targetObjectType + targetAttribute."
                    ),
                );
                binding.target_attribute = target_attribute.to_string();
            }
            (Some(_), true) => {
                note(
                    diagnostics,
                    format!(
                        "config skipped editable column {key}: targetObjectType and targetAttribute must both be defined."
                    ),
                );
                return None;
            }
            (Some(object_type), false) => {
                if !matches!(object_type, ObjectType::Part | ObjectType::Assembly) {
                    note(
                        diagnostics,
                        format!("config skipped editable column {key}: targetObjectType must be Part or Assembly."),
                    );
                    return None;
                }
                binding.target_object_type = Some(object_type);
                binding.target_attribute = target_attribute.to_string();
            }
        }

        binding.boolean_mode = normalize_boolean_mode(&raw.boolean_mode, key, raw.value_type, diagnostics);

        if let Some(rule) = raw.apply_rule.as_ref() {
            if binding.target_attribute.is_empty() {
                note(
                    diagnostics,
                    format!("config column {key} ignored applyRule because targetAttribute is required."),
                );
            } else {
                if !binding.boolean_mode.is_empty() {
                    note(
                        diagnostics,
                        format!("config column {key} uses both booleanMode and applyRule. applyRule has priority."),
                    );
                }
                let (rule, rule_diagnostics) = self.apply_rules.validate(rule, key, raw.value_type).into_parts();
                for message in rule_diagnostics {
                    note(diagnostics, message);
                }
                binding.apply_rule = rule;
            }
        }

        Some(binding)
    }
}

/// The source/target part of a normalized column.
#[derive(Default)]
struct Binding {
    object_type: Option<ObjectType>,
    attribute: String,
    target_object_type: Option<ObjectType>,
    target_attribute: String,
    boolean_mode: String,
    apply_rule: Option<super::ApplyRuleConfig>,
}

fn normalize_model(raw: &ColumnConfig, key: &str, diagnostics: &mut Diagnostics) -> Option<Binding> {
    let attribute = raw.attribute.trim();
    let Some(object_type) = raw.object_type.filter(|_| !attribute.is_empty()) else {
        note(
            diagnostics,
            format!("config skipped column {key}: objectType and attribute are required for model columns."),
        );
        return None;
    };

    if raw.target_object_type.is_some() || !raw.target_attribute.trim().is_empty() {
        note(
            diagnostics,
            format!("config skipped column {key}: model columns cannot define targetObjectType/targetAttribute."),
        );
        return None;
    }

    let resolved = match source::resolve(object_type, attribute) {
        Ok(resolved) => resolved,
        Err(reason) => {
            note(
                diagnostics,
                format!("config skipped column {key}: invalid objectType/attribute ({reason})."),
            );
            return None;
        }
    };

    if !raw.boolean_mode.trim().is_empty() {
        note(
            diagnostics,
            format!("config column {key} ignored booleanMode because only editable columns support it."),
        );
    }
    if raw.apply_rule.is_some() {
        note(
            diagnostics,
            format!("config column {key} ignored applyRule because only editable columns support it."),
        );
    }

    Some(Binding {
        object_type: Some(object_type),
        attribute: resolved.attribute,
        ..Binding::default()
    })
}

fn is_legacy_criteria(target_attribute: &str) -> bool {
    target_attribute.eq_ignore_ascii_case(EXCLUDE_GRATINGS) || target_attribute.eq_ignore_ascii_case(EXCLUDE_EXISTING)
}

fn normalize_boolean_mode(raw: &str, key: &str, value_type: ValueType, diagnostics: &mut Diagnostics) -> String {
    let mode = raw.trim();
    if mode.is_empty() {
        return String::new();
    }

    if value_type != ValueType::Boolean {
        note(
            diagnostics,
            format!(
                "config column {key} ignored booleanMode '{mode}' because column type is {value_type}, expected Boolean."
            ),
        );
        return String::new();
    }

    if mode.eq_ignore_ascii_case(BOOLEAN_MODE_POSITIVE_NUMBER) {
        return BOOLEAN_MODE_POSITIVE_NUMBER.to_string();
    }

    note(
        diagnostics,
        format!(
            "config column {key} ignored unknown booleanMode '{mode}'. Supported values: {BOOLEAN_MODE_POSITIVE_NUMBER}."
        ),
    );
    String::new()
}

fn normalize_actions(actions: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    actions
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .filter(|a| seen.insert(a.to_lowercase()))
        .map(str::to_string)
        .collect()
}

fn normalize_filter_ops(ops: &[String], value_type: ValueType, key: &str, diagnostics: &mut Diagnostics) -> Vec<String> {
    let mut result: Vec<FilterOp> = Vec::new();
    for raw in ops {
        let raw = raw.trim();
        let Some(op) = FilterOp::parse(raw) else {
            continue;
        };
        if !op.is_legal_for(value_type) {
            note(
                diagnostics,
                format!("config skipped filter op {raw} for column {key} (type={value_type})."),
            );
            continue;
        }
        if !result.contains(&op) {
            result.push(op);
        }
    }
    result.into_iter().map(|op| op.as_str().to_string()).collect()
}

fn note(diagnostics: &mut Diagnostics, message: String) {
    warn!("{message}");
    diagnostics.push(message);
}
