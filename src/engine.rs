//! Key-based three-way comparison of two deferred datasets

use crate::config::ComparisonConfig;
use crate::error::{CompareError, Result, Side};
use crate::frame::LazyFrame;
use crate::mapping::ResolvedMapping;
use crate::predicate::{
    any_difference, as_text, key_match, qualified, quote_ident, ColumnComparison,
};
use crate::result::{ComparisonResult, ComparisonSummary};
use crate::validation::ValidationService;
use std::sync::Arc;

pub struct ComparisonEngine {
    config: Arc<ComparisonConfig>,
    validator: ValidationService,
}

impl ComparisonEngine {
    pub fn new(config: Arc<ComparisonConfig>) -> Self {
        Self {
            config,
            validator: ValidationService::new(),
        }
    }

    pub fn config(&self) -> &ComparisonConfig {
        &self.config
    }

    /// Validate both inputs, then build the three partition plans and count them.
    ///
    /// Fails with a schema or primary-key violation before any matching when
    /// either input does not conform. Value mismatches are never errors.
    pub fn compare(&self, left: &LazyFrame, right: &LazyFrame) -> Result<ComparisonResult> {
        if !left.session().same_as(right.session()) {
            return Err(CompareError::invalid_input(
                "Left and right datasets must belong to the same session",
            ));
        }

        self.validate(left, right)?;

        let resolved = self.config.resolved();
        let left_std = standardize(left, resolved, Side::Left);
        let right_std = standardize(right, resolved, Side::Right);

        let keys: Vec<String> = resolved.keys().iter().map(|c| c.key_column()).collect();
        let join_on = key_match(&keys, "l", "r");
        let order_by = keys
            .iter()
            .map(|k| quote_ident(k))
            .collect::<Vec<_>>()
            .join(", ");

        let comparisons: Vec<ColumnComparison> = resolved
            .values()
            .iter()
            .map(|column| {
                let left = format!("l.{}", quote_ident(&column.left_value_column()));
                let right = format!("r.{}", quote_ident(&column.right_value_column()));
                let (left, right) = if column.compares_as_text() {
                    (as_text(&left), as_text(&right))
                } else {
                    (left, right)
                };
                ColumnComparison {
                    left,
                    right,
                    rule: self.config.rule_for(column),
                }
            })
            .collect();
        let differs = any_difference(&comparisons, self.config.null_equals_null());

        let mut projection = qualified("l", &keys);
        for column in resolved.values() {
            projection.push(format!("l.{}", quote_ident(&column.left_value_column())));
            projection.push(format!("r.{}", quote_ident(&column.right_value_column())));
        }

        let session = left.session();
        let value_differences = session.sql(format!(
            "SELECT * FROM (SELECT {projection} FROM ({left}) AS l INNER JOIN ({right}) AS r \
             ON {join_on} WHERE {differs}) AS _diff ORDER BY {order_by}",
            projection = projection.join(", "),
            left = left_std.plan(),
            right = right_std.plan(),
            join_on = join_on,
            differs = differs,
            order_by = order_by,
        ));
        let left_only_records = anti_join(&left_std, &right_std, &join_on, &order_by, "l", "r");
        let right_only_records = anti_join(&right_std, &left_std, &join_on, &order_by, "r", "l");

        log::debug!("Value differences plan: {}", value_differences.plan());

        let counts = session.count_all(&[
            left,
            right,
            &value_differences,
            &left_only_records,
            &right_only_records,
        ])?;
        let summary =
            ComparisonSummary::from_counts(counts[0], counts[1], counts[2], counts[3], counts[4]);

        log::debug!(
            "Compared {} left / {} right records: {} matching, {} different, {} left-only, {} right-only",
            summary.total_left_records,
            summary.total_right_records,
            summary.matching_records,
            summary.value_differences_count,
            summary.left_only_count,
            summary.right_only_count
        );

        Ok(ComparisonResult::new(
            summary,
            value_differences,
            left_only_records,
            right_only_records,
            Arc::clone(&self.config),
        ))
    }

    fn validate(&self, left: &LazyFrame, right: &LazyFrame) -> Result<()> {
        for (side, frame, schema) in [
            (Side::Left, left, self.config.left_schema()),
            (Side::Right, right, self.config.right_schema()),
        ] {
            let result = self.validator.validate_schema(frame, schema)?;
            if !result.is_valid {
                return Err(CompareError::SchemaViolation {
                    side,
                    errors: result.errors,
                });
            }
        }

        let resolved = self.config.resolved();
        for (side, frame, key_columns) in [
            (Side::Left, left, resolved.left_key_columns()),
            (Side::Right, right, resolved.right_key_columns()),
        ] {
            let duplicate_groups = self.validator.duplicate_key_groups(frame, &key_columns)?;
            if duplicate_groups > 0 {
                return Err(CompareError::PrimaryKeyViolation {
                    side,
                    duplicate_groups,
                    key_columns,
                });
            }
        }

        Ok(())
    }
}

/// Compare two datasets under `config`
pub fn compare(
    config: Arc<ComparisonConfig>,
    left: &LazyFrame,
    right: &LazyFrame,
) -> Result<ComparisonResult> {
    ComparisonEngine::new(config).compare(left, right)
}

/// Rename mapped columns to `PK_`/`L_`/`R_` logical names and drop the rest.
///
/// Keys whose declared types differ between sides are rendered as text so the
/// join never depends on an implicit cast succeeding.
fn standardize(frame: &LazyFrame, resolved: &ResolvedMapping, side: Side) -> LazyFrame {
    let mut columns: Vec<(String, String)> = Vec::new();
    for key in resolved.keys() {
        let physical = quote_ident(match side {
            Side::Left => &key.left_column,
            Side::Right => &key.right_column,
        });
        let expr = if key.compares_as_text() {
            as_text(&physical)
        } else {
            physical
        };
        columns.push((expr, key.key_column()));
    }
    for value in resolved.values() {
        columns.push(match side {
            Side::Left => (quote_ident(&value.left_column), value.left_value_column()),
            Side::Right => (quote_ident(&value.right_column), value.right_value_column()),
        });
    }

    let exprs: Vec<(&str, &str)> = columns
        .iter()
        .map(|(expr, alias)| (expr.as_str(), alias.as_str()))
        .collect();
    frame.select_exprs(&exprs)
}

/// Rows of `keep` whose key has no partner in `other`
fn anti_join(
    keep: &LazyFrame,
    other: &LazyFrame,
    join_on: &str,
    order_by: &str,
    keep_alias: &str,
    other_alias: &str,
) -> LazyFrame {
    keep.session().sql(format!(
        "SELECT * FROM (SELECT {keep_alias}.* FROM ({keep}) AS {keep_alias} WHERE NOT EXISTS \
         (SELECT 1 FROM ({other}) AS {other_alias} WHERE {join_on})) AS _only ORDER BY {order_by}",
        keep_alias = keep_alias,
        other_alias = other_alias,
        keep = keep.plan(),
        other = other.plan(),
        join_on = join_on,
        order_by = order_by,
    ))
}
