//! Filter Evaluator
//!
//! A row passes when every group has at least one matching condition. The
//! evaluator never fails: unparseable numbers never match and malformed
//! patterns always match.

use crate::core::condition::Condition;
use crate::core::dataset::{value_to_text, Row};
use crate::core::tree::GroupedView;
use crate::core::types::Operator;
use regex::{Regex, RegexBuilder};
use serde_json::Value;

/// Upper bound on the compiled size of a user pattern
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// A condition with its pattern compiled once per evaluation
#[derive(Debug)]
pub struct CompiledCondition<'a> {
    condition: &'a Condition,
    matcher: Matcher,
}

#[derive(Debug)]
enum Matcher {
    Inert,
    Text,
    Number(f64),
    Pattern(Regex),
    /// Pattern failed to compile; matches everything
    Vacuous,
}

impl<'a> CompiledCondition<'a> {
    pub fn new(condition: &'a Condition) -> Self {
        let matcher = if condition.is_inert() {
            Matcher::Inert
        } else {
            match condition.operator {
                Operator::GreaterThan | Operator::LessThan => {
                    Matcher::Number(coerce_number(&condition.value))
                }
                Operator::Regex => compile_pattern(&condition.value)
                    .map(Matcher::Pattern)
                    .unwrap_or(Matcher::Vacuous),
                Operator::Equals | Operator::Contains | Operator::NotContains => Matcher::Text,
            }
        };
        Self { condition, matcher }
    }

    pub fn matches(&self, row: &Row) -> bool {
        let field = self.condition.field.as_str();
        let value = self.condition.value.as_str();
        match &self.matcher {
            Matcher::Inert | Matcher::Vacuous => true,
            Matcher::Number(rhs) => {
                let lhs = row.get(field).map(value_to_number).unwrap_or(f64::NAN);
                match self.condition.operator {
                    Operator::GreaterThan => lhs > *rhs,
                    _ => lhs < *rhs,
                }
            }
            Matcher::Pattern(re) => re.is_match(&row.text(field)),
            Matcher::Text => {
                let text = row.text(field);
                match self.condition.operator {
                    Operator::Equals => text == value,
                    Operator::Contains => text.contains(value),
                    _ => !text.contains(value),
                }
            }
        }
    }
}

/// Compile a user-supplied pattern with a bounded program size
pub fn compile_pattern(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .ok()
}

/// Whether a single condition matches a row
pub fn matches(condition: &Condition, row: &Row) -> bool {
    CompiledCondition::new(condition).matches(row)
}

/// Rows satisfying every group of `view` (AND across groups, OR within)
pub fn evaluate(rows: &[Row], view: &GroupedView) -> Vec<Row> {
    let compiled = compile_view(view);
    rows.iter()
        .filter(|row| row_passes(&compiled, row))
        .cloned()
        .collect()
}

/// Number of rows `evaluate` would return
pub fn count_matches(rows: &[Row], view: &GroupedView) -> usize {
    let compiled = compile_view(view);
    rows.iter().filter(|row| row_passes(&compiled, row)).count()
}

fn compile_view(view: &GroupedView) -> Vec<Vec<CompiledCondition<'_>>> {
    view.iter()
        .map(|group| group.conditions().iter().map(CompiledCondition::new).collect())
        .collect()
}

fn row_passes(groups: &[Vec<CompiledCondition<'_>>], row: &Row) -> bool {
    groups
        .iter()
        .all(|group| group.iter().any(|condition| condition.matches(row)))
}

fn value_to_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => coerce_number(s),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => f64::NAN,
        _ => f64::NAN,
    }
}

/// Numeric coercion with script-number rules
///
/// Blank text is zero, `0x`/`0o`/`0b` prefixes are radix literals, otherwise
/// only plain decimal notation is accepted. Anything else is NaN.
pub fn coerce_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let radix = match trimmed.get(..2).map(str::to_ascii_lowercase).as_deref() {
        Some("0x") => Some(16),
        Some("0o") => Some(8),
        Some("0b") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&trimmed[2..], radix)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }

    let unsigned = trimmed.trim_start_matches(['+', '-']);
    if unsigned == "Infinity" {
        return if trimmed.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY };
    }
    let decimal = trimmed.len() - unsigned.len() <= 1
        && unsigned
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !decimal {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Map};

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => Row::new(map),
            _ => Row::new(Map::new()),
        }
    }

    fn cond(field: &str, operator: Operator, value: &str) -> Condition {
        Condition::seed(field).with_operator(operator).with_value(value)
    }

    #[test]
    fn test_inert_condition_always_matches() {
        let r = row(json!({"Name": "Ann", "Age": "x"}));
        for op in [
            Operator::Equals,
            Operator::GreaterThan,
            Operator::LessThan,
            Operator::Contains,
            Operator::NotContains,
            Operator::Regex,
        ] {
            assert!(matches(&cond("Age", op, ""), &r), "{op} should be inert");
            assert!(matches(&cond("Missing", op, ""), &r));
        }
    }

    #[test]
    fn test_equals_compares_text() {
        let r = row(json!({"Name": "Ann", "Age": 30}));
        assert!(matches(&cond("Name", Operator::Equals, "Ann"), &r));
        assert!(!matches(&cond("Name", Operator::Equals, "ann"), &r));
        assert!(matches(&cond("Age", Operator::Equals, "30"), &r));
    }

    #[test]
    fn test_whole_float_compares_without_fraction() {
        let r = row(json!({"id": 1, "Price": 30.0}));
        assert!(matches(&cond("Price", Operator::Equals, "30"), &r));
        assert!(matches(&cond("Price", Operator::Contains, "30"), &r));
        assert!(!matches(&cond("Price", Operator::Contains, ".0"), &r));
        assert!(matches(&cond("Price", Operator::Regex, "^30$"), &r));
    }

    #[test]
    fn test_numeric_comparisons() {
        let r = row(json!({"Age": "40", "Score": 7.5}));
        assert!(matches(&cond("Age", Operator::GreaterThan, "35"), &r));
        assert!(!matches(&cond("Age", Operator::GreaterThan, "40"), &r));
        assert!(matches(&cond("Age", Operator::LessThan, "100"), &r));
        assert!(matches(&cond("Score", Operator::LessThan, "8"), &r));
        // Numeric, not lexicographic
        assert!(matches(&cond("Age", Operator::GreaterThan, "9"), &r));
    }

    #[test]
    fn test_non_numeric_row_value_fails_comparison() {
        let r = row(json!({"Age": "forty"}));
        assert!(!matches(&cond("Age", Operator::GreaterThan, "35"), &r));
        assert!(!matches(&cond("Age", Operator::LessThan, "35"), &r));
        assert!(!matches(&cond("Missing", Operator::LessThan, "35"), &r));
    }

    #[test]
    fn test_non_numeric_condition_value_fails_comparison() {
        let r = row(json!({"Age": "40"}));
        assert!(!matches(&cond("Age", Operator::GreaterThan, "abc"), &r));
        assert!(!matches(&cond("Age", Operator::LessThan, "abc"), &r));
    }

    #[test]
    fn test_contains_and_not_contains() {
        let r = row(json!({"Name": "Annabel"}));
        assert!(matches(&cond("Name", Operator::Contains, "nab"), &r));
        assert!(!matches(&cond("Name", Operator::Contains, "zz"), &r));
        assert!(matches(&cond("Name", Operator::NotContains, "zz"), &r));
        assert!(!matches(&cond("Name", Operator::NotContains, "Ann"), &r));
    }

    #[test]
    fn test_regex_matches_text() {
        let r = row(json!({"Email": "ann@example.com"}));
        assert!(matches(&cond("Email", Operator::Regex, r"^\w+@example\.com$"), &r));
        assert!(!matches(&cond("Email", Operator::Regex, r"^bo@"), &r));
    }

    #[test]
    fn test_invalid_regex_is_vacuous_match() {
        let r = row(json!({"Email": "ann@example.com"}));
        assert!(matches(&cond("Email", Operator::Regex, "(unclosed"), &r));
        assert!(matches(&cond("Email", Operator::Regex, "[z-a]"), &r));
    }

    #[test]
    fn test_evaluate_and_across_or_within() {
        let rows = vec![
            row(json!({"id": 1, "Name": "Ann", "Age": "30"})),
            row(json!({"id": 2, "Name": "Bo", "Age": "40"})),
            row(json!({"id": 3, "Name": "Al", "Age": "60"})),
        ];
        let view = GroupedView::from_groups(vec![
            vec![
                cond("Name", Operator::Equals, "Ann"),
                cond("Name", Operator::Equals, "Al"),
            ],
            vec![cond("Age", Operator::LessThan, "50")],
        ]);

        let ids: Vec<String> = evaluate(&rows, &view).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["1".to_string()]);
        assert_eq!(count_matches(&rows, &view), 1);
    }

    #[test]
    fn test_empty_view_passes_everything() {
        let rows = vec![row(json!({"Name": "Ann"})), row(json!({"Name": "Bo"}))];
        assert_eq!(evaluate(&rows, &GroupedView::default()).len(), 2);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let rows = vec![
            row(json!({"id": 1, "Name": "Ann"})),
            row(json!({"id": 2, "Name": "Bo"})),
        ];
        let view = GroupedView::from_groups(vec![vec![cond("Name", Operator::Contains, "o")]]);
        assert_eq!(evaluate(&rows, &view), evaluate(&rows, &view));
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number("42"), 42.0);
        assert_eq!(coerce_number(" -3.5 "), -3.5);
        assert_eq!(coerce_number(""), 0.0);
        assert_eq!(coerce_number("1e3"), 1000.0);
        assert_eq!(coerce_number("0x10"), 16.0);
        assert_eq!(coerce_number("Infinity"), f64::INFINITY);
        assert!(coerce_number("12abc").is_nan());
        assert!(coerce_number("123,456").is_nan());
        assert!(coerce_number("inf").is_nan());
        assert!(coerce_number("NaN").is_nan());
        assert!(coerce_number("--1").is_nan());
    }
}
