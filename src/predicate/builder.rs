//! Compilation of selection criteria into a [`Predicate`] tree.
//!
//! Each attribute filter goes through exactly one of three paths, in order of precedence:
//!
//! 1. a configured apply rule ([`ApplyRuleCompiler`]); once a rule is configured no other path is
//!    tried, even when it compiles to nothing or fails;
//! 2. a legacy mapping ([`LegacyRuleMapper`]);
//! 3. the generic path: string equality (or OR of equalities) on the target's template field.
//!
//! Rejected filters are reported as `"Phase <n>: ..."` diagnostics and omitted. A phase always
//! keeps its phase-number test, so a phase whose filters all fail still selects the whole phase.

use tracing::debug;

use super::{Field, NumericOp, Predicate, StringOp};
use crate::diagnostics::{Diagnostics, Outcome};
use crate::rules::{ApplyRuleCompiler, LegacyMapping, LegacyRuleMapper, RuleOp, RuntimeClause, split_values};
use crate::selection::{AttributeFilter, SelectionCriteria, normalize_selection};
use crate::source;
use crate::types::{ObjectType, ValueType, parse_number};

const ASSEMBLY_PROFILE_ATTRIBUTE: &str = "ASSEMBLY.MAINPART.PROFILE";

/// Builds predicate trees from selection criteria. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct PredicateTreeBuilder {
    compiler: ApplyRuleCompiler,
}

impl PredicateTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `selection` into `Or[And[phase == n, filters...], ...]`, ordered by phase number.
    pub fn build(&self, selection: &[SelectionCriteria]) -> Outcome<Predicate> {
        let mut diagnostics = Diagnostics::new();
        let phases = normalize_selection(selection, &mut diagnostics);

        let groups: Vec<Predicate> = phases
            .iter()
            .map(|criteria| self.build_phase(criteria, &mut diagnostics))
            .collect();

        debug!(
            phases = groups.len(),
            diagnostics = diagnostics.len(),
            "built phase predicate tree"
        );
        Outcome::new(Predicate::Or(groups), diagnostics)
    }

    fn build_phase(&self, criteria: &SelectionCriteria, diagnostics: &mut Diagnostics) -> Predicate {
        let phase = criteria.phase_number;
        let mut items = vec![Predicate::number(Field::PhaseNumber, NumericOp::Eq, f64::from(phase))];
        items.extend(
            criteria
                .attribute_filters
                .iter()
                .filter_map(|filter| self.build_filter(filter, phase, diagnostics)),
        );
        Predicate::And(items)
    }

    /// Predicate for one attribute filter, or `None` when it contributes nothing.
    pub fn build_filter(&self, filter: &AttributeFilter, phase: i32, diagnostics: &mut Diagnostics) -> Option<Predicate> {
        if filter.target_attribute.trim().is_empty() {
            return None;
        }

        if filter.apply_rule.is_some() {
            return match self.compiler.compile(filter) {
                Ok(Some(clause)) => clause_predicate(&clause, filter, phase, diagnostics),
                Ok(None) => None,
                Err(e) => {
                    diagnostics.push(format!("Phase {phase}: {e}"));
                    None
                }
            };
        }

        match LegacyRuleMapper::map(filter) {
            LegacyMapping::Clause(clause) => clause_predicate(&clause, filter, phase, diagnostics),
            LegacyMapping::NoClause => None,
            LegacyMapping::NotRecognized => generic_predicate(filter, phase, diagnostics),
        }
    }
}

fn generic_predicate(filter: &AttributeFilter, phase: i32, diagnostics: &mut Diagnostics) -> Option<Predicate> {
    let Some(object_type) = filter.target_object_type else {
        diagnostics.push(format!(
            "Phase {phase}: targetObjectType is required for '{}', filter ignored.",
            filter.target_attribute
        ));
        return None;
    };

    let attribute = filter.target_attribute.trim();
    // unknown names are passed through as host field names
    let field = source::template_field(object_type, attribute).unwrap_or_else(|| attribute.to_string());

    let values = split_values(&filter.value);
    if values.is_empty() {
        return None;
    }
    Some(text_predicate(&Field::Custom(field), RuleOp::In, &values))
}

fn clause_predicate(
    clause: &RuntimeClause,
    filter: &AttributeFilter,
    phase: i32,
    diagnostics: &mut Diagnostics,
) -> Option<Predicate> {
    let values = resolve_values(clause, &filter.value);
    if values.is_empty() {
        diagnostics.push(format!(
            "Phase {phase}: applyRule for field '{}' has no usable value.",
            clause.field
        ));
        return None;
    }

    if clause.use_profile_scope {
        if clause.operation.is_ordering() {
            diagnostics.push(format!(
                "Phase {phase}: profile-scoped rule for field '{}' cannot use op '{}'.",
                clause.field, clause.operation
            ));
            return None;
        }
        return Some(scoped_profile_predicate(clause.profile_scope_object_type, clause.operation, &values));
    }

    let field = Field::custom(clause.field.as_str());

    if clause.operation.is_ordering() {
        let Some(numbers) = parse_numeric_values(&values) else {
            diagnostics.push(format!(
                "Phase {phase}: applyRule for field '{}' expects numeric value(s), got '{}'.",
                clause.field,
                values.join(", ")
            ));
            return None;
        };
        return Some(number_predicate(&field, clause.operation, &numbers));
    }

    if clause.operation.prefers_numeric() && prefers_numeric_type(filter.value_type) {
        if let Some(numbers) = parse_numeric_values(&values) {
            return Some(number_predicate(&field, clause.operation, &numbers));
        }
    }

    Some(text_predicate(&field, clause.operation, &values))
}

/// Values a clause compares against: its literals, or the user's input.
///
/// `In` splits a single literal or the input on `,`/`;`. Other operators take the trimmed input
/// as one value.
fn resolve_values(clause: &RuntimeClause, input: &str) -> Vec<String> {
    if !clause.uses_input_value {
        if clause.operation == RuleOp::In && clause.literal_values.len() == 1 {
            return split_values(&clause.literal_values[0]);
        }
        let mut values: Vec<String> = Vec::with_capacity(clause.literal_values.len());
        for literal in &clause.literal_values {
            let literal = literal.trim();
            if !literal.is_empty() && !values.iter().any(|v| v == literal) {
                values.push(literal.to_string());
            }
        }
        return values;
    }

    let input = input.trim();
    if input.is_empty() {
        return Vec::new();
    }
    if clause.operation == RuleOp::In {
        return split_values(input);
    }
    vec![input.to_string()]
}

fn prefers_numeric_type(value_type: ValueType) -> bool {
    matches!(value_type, ValueType::Integer | ValueType::Number | ValueType::Boolean)
}

/// Parse every value as a number (`true`/`false` count as 1/0). `None` if any value fails.
fn parse_numeric_values(values: &[String]) -> Option<Vec<f64>> {
    let numbers: Option<Vec<f64>> = values
        .iter()
        .map(|v| {
            parse_number(v).or_else(|| {
                if v.eq_ignore_ascii_case("true") {
                    Some(1.0)
                } else if v.eq_ignore_ascii_case("false") {
                    Some(0.0)
                } else {
                    None
                }
            })
        })
        .collect();
    numbers.filter(|n| !n.is_empty())
}

fn number_predicate(field: &Field, op: RuleOp, values: &[f64]) -> Predicate {
    let numeric_op = match op {
        RuleOp::In => {
            let items = values
                .iter()
                .map(|v| Predicate::number(field.clone(), NumericOp::Eq, *v))
                .collect();
            return Predicate::any_of(items);
        }
        RuleOp::Neq => NumericOp::Neq,
        RuleOp::Gt => NumericOp::Gt,
        RuleOp::Gte => NumericOp::Gte,
        RuleOp::Lt => NumericOp::Lt,
        RuleOp::Lte => NumericOp::Lte,
        _ => NumericOp::Eq,
    };
    Predicate::number(field.clone(), numeric_op, values[0])
}

// Callers never pass an ordering op here.
fn text_predicate(field: &Field, op: RuleOp, values: &[String]) -> Predicate {
    let string_op = match op {
        RuleOp::In => {
            let items = values
                .iter()
                .map(|v| Predicate::text(field.clone(), StringOp::Equals, v.as_str()))
                .collect();
            return Predicate::any_of(items);
        }
        RuleOp::Neq => StringOp::NotEquals,
        RuleOp::Contains => StringOp::Contains,
        RuleOp::NotContains => StringOp::NotContains,
        RuleOp::StartsWith => StringOp::StartsWith,
        RuleOp::NotStartsWith => StringOp::NotStartsWith,
        RuleOp::EndsWith => StringOp::EndsWith,
        RuleOp::NotEndsWith => StringOp::NotEndsWith,
        _ => StringOp::Equals,
    };
    Predicate::text(field.clone(), string_op, values[0].as_str())
}

/// Apply `op` to the part profile, the assembly main-part profile, or both.
///
/// With both sources a negated operator must hold for every source (AND); any other operator
/// matches when either source does (OR).
fn scoped_profile_predicate(object_type: Option<ObjectType>, op: RuleOp, values: &[String]) -> Predicate {
    let part = || source::template_field(ObjectType::Part, "profile");
    let assembly = || source::template_field(ObjectType::Assembly, ASSEMBLY_PROFILE_ATTRIBUTE);

    let fields: Vec<String> = match object_type {
        Some(ObjectType::Part) => part().into_iter().collect(),
        Some(ObjectType::Assembly) => assembly().into_iter().collect(),
        _ => part().into_iter().chain(assembly()).collect(),
    };

    let items: Vec<Predicate> = fields
        .into_iter()
        .map(|name| text_predicate(&Field::Custom(name), op, values))
        .collect();

    if op.is_negated() {
        Predicate::all_of(items)
    } else {
        Predicate::any_of(items)
    }
}
