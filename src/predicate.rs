//! SQL predicate construction for per-column equality rules

use std::fmt;

/// Quote an identifier for DuckDB, doubling embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal for DuckDB, doubling embedded quotes
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// How two non-null values of one logical column are compared
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnRule {
    Exact,
    IgnoreCase,
    /// Absolute difference at or below the threshold counts as equal
    Tolerance(f64),
    /// Tolerance for integer pairs, evaluated without a detour through DOUBLE
    IntegerTolerance(f64),
}

impl fmt::Display for ColumnRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRule::Exact => write!(f, "exact"),
            ColumnRule::IgnoreCase => write!(f, "ignore-case"),
            ColumnRule::Tolerance(t) => write!(f, "tolerance {}", t),
            ColumnRule::IntegerTolerance(t) => write!(f, "integer tolerance {}", t),
        }
    }
}

impl ColumnRule {
    /// Equality of two non-null operands
    fn equality(&self, left: &str, right: &str) -> String {
        match self {
            ColumnRule::Exact => format!("{} = {}", left, right),
            ColumnRule::IgnoreCase => format!("lower({}) = lower({})", left, right),
            ColumnRule::Tolerance(threshold) => format!(
                "abs(CAST({} AS DOUBLE) - CAST({} AS DOUBLE)) <= CAST({} AS DOUBLE)",
                left,
                right,
                float_literal(*threshold)
            ),
            ColumnRule::IntegerTolerance(threshold) => format!(
                "abs(CAST({} AS HUGEINT) - CAST({} AS HUGEINT)) <= CAST({} AS HUGEINT)",
                left,
                right,
                integer_threshold(*threshold)
            ),
        }
    }

    /// A predicate that is TRUE exactly when the two operands differ.
    ///
    /// The result is never NULL: null handling is decided up front so the
    /// predicate can be OR-reduced safely.
    pub fn difference(&self, left: &str, right: &str, null_equals_null: bool) -> String {
        if null_equals_null {
            format!(
                "(CASE WHEN {l} IS NULL AND {r} IS NULL THEN FALSE \
                 WHEN {l} IS NULL OR {r} IS NULL THEN TRUE \
                 ELSE NOT ({eq}) END)",
                l = left,
                r = right,
                eq = self.equality(left, right)
            )
        } else {
            format!(
                "(CASE WHEN {l} IS NULL OR {r} IS NULL THEN TRUE \
                 ELSE NOT ({eq}) END)",
                l = left,
                r = right,
                eq = self.equality(left, right)
            )
        }
    }
}

fn float_literal(value: f64) -> String {
    let rendered = value.to_string();
    if rendered.contains('.') {
        rendered
    } else {
        format!("{}.0", rendered)
    }
}

/// Largest whole difference still within `threshold`; saturates for huge thresholds
fn integer_threshold(threshold: f64) -> i128 {
    threshold.floor() as i128
}

/// Render an operand as text so pairs of unrelated types stay comparable
pub fn as_text(expr: &str) -> String {
    format!("CAST({} AS VARCHAR)", expr)
}

/// One compared column pair with its rule
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnComparison {
    pub left: String,
    pub right: String,
    pub rule: ColumnRule,
}

/// OR-reduce per-column differences; no columns means nothing can differ
pub fn any_difference(columns: &[ColumnComparison], null_equals_null: bool) -> String {
    if columns.is_empty() {
        return "FALSE".to_string();
    }
    columns
        .iter()
        .map(|c| c.rule.difference(&c.left, &c.right, null_equals_null))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Null-safe key equality between two aliased relations
pub fn key_match(keys: &[String], left_alias: &str, right_alias: &str) -> String {
    if keys.is_empty() {
        return "TRUE".to_string();
    }
    keys.iter()
        .map(|k| {
            let column = quote_ident(k);
            format!(
                "{}.{} IS NOT DISTINCT FROM {}.{}",
                left_alias, column, right_alias, column
            )
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// `alias."col"` for each column
pub fn qualified(alias: &str, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|c| format!("{}.{}", alias, quote_ident(c)))
        .collect()
}
