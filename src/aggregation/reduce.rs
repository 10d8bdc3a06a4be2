//! Reduction of per-object values into one cell.

use std::collections::HashSet;

use crate::config::AggregateFn;
use crate::types::TypedCell;

/// Separator between values of a [`AggregateFn::Distinct`] cell.
pub const DISTINCT_SEPARATOR: &str = "; ";

/// Reduce `values` (one per object, empties allowed) with `op`.
///
/// - `Count` returns `object_count` regardless of the values.
/// - `First` returns the first non-empty value.
/// - `Distinct` joins the unique (case-insensitive) text forms in first-seen order.
/// - `Min`/`Max` consider only values coercible to a number and return a Number cell.
///
/// Returns [`TypedCell::Empty`] when nothing qualifies.
pub fn reduce(values: &[TypedCell], object_count: usize, op: AggregateFn) -> TypedCell {
    match op {
        AggregateFn::Count => count_cell(object_count),
        AggregateFn::First => values.iter().find(|v| v.has_value()).cloned().unwrap_or_default(),
        AggregateFn::Distinct => distinct(values),
        AggregateFn::Min | AggregateFn::Max => {
            let mut acc: Option<f64> = None;
            for v in values.iter().filter_map(TypedCell::as_number) {
                acc = Some(match (op, acc) {
                    (AggregateFn::Min, Some(a)) => a.min(v),
                    (AggregateFn::Max, Some(a)) => a.max(v),
                    (_, _) => v,
                });
            }
            acc.map(TypedCell::Number).unwrap_or_default()
        }
    }
}

/// Integer cell for an object count.
pub fn count_cell(object_count: usize) -> TypedCell {
    TypedCell::Integer(i64::try_from(object_count).unwrap_or(i64::MAX))
}

fn distinct(values: &[TypedCell]) -> TypedCell {
    let mut seen = HashSet::new();
    let unique: Vec<String> = values
        .iter()
        .map(TypedCell::as_comparable_string)
        .filter(|s| !s.trim().is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .collect();
    TypedCell::text(unique.join(DISTINCT_SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::reduce;
    use crate::config::AggregateFn;
    use crate::types::TypedCell;

    fn sample_values() -> Vec<TypedCell> {
        vec![
            TypedCell::Empty,
            TypedCell::text("S355"),
            TypedCell::text("s355"),
            TypedCell::Integer(12),
            TypedCell::text("7.5"),
            TypedCell::text("S235"),
        ]
    }

    #[test]
    fn count_ignores_values() {
        assert_eq!(reduce(&[], 4, AggregateFn::Count), TypedCell::Integer(4));
    }

    #[test]
    fn first_skips_empty() {
        assert_eq!(reduce(&sample_values(), 6, AggregateFn::First), TypedCell::text("S355"));
        assert_eq!(reduce(&[TypedCell::Empty], 1, AggregateFn::First), TypedCell::Empty);
    }

    #[test]
    fn distinct_is_case_insensitive_and_ordered() {
        assert_eq!(
            reduce(&sample_values(), 6, AggregateFn::Distinct),
            TypedCell::text("S355; 12; 7.5; S235")
        );
    }

    #[test]
    fn min_max_ignore_non_numeric() {
        assert_eq!(reduce(&sample_values(), 6, AggregateFn::Min), TypedCell::Number(7.5));
        assert_eq!(reduce(&sample_values(), 6, AggregateFn::Max), TypedCell::Number(12.0));
        assert_eq!(reduce(&[TypedCell::text("x")], 1, AggregateFn::Max), TypedCell::Empty);
    }
}
