//! Pre-flight checks over deferred datasets
//!
//! Every check runs to completion and reports all of its findings; nothing
//! here short-circuits on the first problem or mutates its input.

use crate::dtype::DataType;
use crate::error::{CompareError, Result};
use crate::frame::{ColumnInfo, LazyFrame};
use crate::predicate::{quote_ident, quote_literal};
use crate::schema::ComparisonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of one validation check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub check: String,
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn from_errors(check: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            check: check.into(),
            is_valid: errors.is_empty(),
            errors,
        }
    }

    pub fn passed(check: impl Into<String>) -> Self {
        Self::from_errors(check, Vec::new())
    }
}

/// Inclusive bounds for a numeric column
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Data-quality checks to run together against one dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityChecks {
    pub required_columns: Vec<String>,
    pub expected_types: BTreeMap<String, DataType>,
    pub ranges: BTreeMap<String, NumericRange>,
    pub patterns: BTreeMap<String, String>,
    pub unique_columns: Vec<String>,
}

impl QualityChecks {
    pub fn is_empty(&self) -> bool {
        self.required_columns.is_empty()
            && self.expected_types.is_empty()
            && self.ranges.is_empty()
            && self.patterns.is_empty()
            && self.unique_columns.is_empty()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ValidationService;

impl ValidationService {
    pub fn new() -> Self {
        Self
    }

    /// Missing columns, type mismatches and nullability violations
    pub fn validate_schema(
        &self,
        frame: &LazyFrame,
        schema: &ComparisonSchema,
    ) -> Result<ValidationResult> {
        let actual = frame.schema()?;
        let mut errors = Vec::new();

        let missing: Vec<&str> = schema
            .columns()
            .keys()
            .filter(|name| !actual.iter().any(|c| &c.name == *name))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            errors.push(format!("Missing columns: {}", missing.join(", ")));
        }

        for definition in schema.columns().values() {
            let Some(info) = find_column(&actual, &definition.name) else {
                continue;
            };
            if !type_matches(&definition.datatype, &info.engine_type) {
                errors.push(format!(
                    "Column {}: expected {}, got {}",
                    definition.name, definition.datatype, info.engine_type
                ));
            }
        }

        let non_nullable: Vec<&str> = schema
            .columns()
            .values()
            .filter(|d| !d.nullable && find_column(&actual, &d.name).is_some())
            .map(|d| d.name.as_str())
            .collect();
        let null_counts = frame.null_counts(&non_nullable)?;
        for (column, nulls) in non_nullable.iter().zip(null_counts) {
            if nulls > 0 {
                errors.push(format!(
                    "Column {}: {} null values found but column defined as non-nullable",
                    column, nulls
                ));
            }
        }

        Ok(ValidationResult::from_errors("schema", errors))
    }

    /// Number of key tuples that occur more than once
    pub fn duplicate_key_groups(&self, frame: &LazyFrame, key_columns: &[String]) -> Result<u64> {
        if key_columns.is_empty() {
            return Ok(0);
        }
        let keys = key_columns
            .iter()
            .map(|k| quote_ident(k))
            .collect::<Vec<_>>()
            .join(", ");
        let duplicates = frame.session().sql(format!(
            "SELECT {keys} FROM ({plan}) AS _keyed GROUP BY {keys} HAVING COUNT(*) > 1",
            keys = keys,
            plan = frame.plan()
        ));
        duplicates.count()
    }

    pub fn validate_primary_key_uniqueness(
        &self,
        frame: &LazyFrame,
        key_columns: &[String],
    ) -> Result<ValidationResult> {
        let actual = frame.schema()?;
        let missing: Vec<&str> = key_columns
            .iter()
            .filter(|k| find_column(&actual, k).is_none())
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Ok(ValidationResult::from_errors(
                "primary_key",
                vec![format!("Missing primary key columns: {}", missing.join(", "))],
            ));
        }

        let groups = self.duplicate_key_groups(frame, key_columns)?;
        let errors = if groups > 0 {
            vec![format!(
                "Duplicate primary keys found on [{}]: {} duplicate group(s)",
                key_columns.join(", "),
                groups
            )]
        } else {
            Vec::new()
        };
        Ok(ValidationResult::from_errors("primary_key", errors))
    }

    /// Required columns must exist and hold at least one non-null value
    pub fn validate_completeness(
        &self,
        frame: &LazyFrame,
        required: &[String],
    ) -> Result<ValidationResult> {
        let actual = frame.schema()?;
        let mut errors = Vec::new();

        let (present, missing): (Vec<&String>, Vec<&String>) = required
            .iter()
            .partition(|c| find_column(&actual, c).is_some());
        for column in missing {
            errors.push(format!("Required column '{}' is missing", column));
        }

        let present: Vec<&str> = present.into_iter().map(String::as_str).collect();
        if !present.is_empty() {
            let total = frame.count()?;
            let nulls = frame.null_counts(&present)?;
            for (column, null_count) in present.iter().zip(nulls) {
                if null_count == total {
                    errors.push(format!("Required column '{}' contains only nulls", column));
                }
            }
        }

        Ok(ValidationResult::from_errors("completeness", errors))
    }

    pub fn validate_data_types(
        &self,
        frame: &LazyFrame,
        expected: &BTreeMap<String, DataType>,
    ) -> Result<ValidationResult> {
        let actual = frame.schema()?;
        let errors = expected
            .iter()
            .filter_map(|(column, datatype)| {
                let info = find_column(&actual, column)?;
                (!type_matches(datatype, &info.engine_type)).then(|| {
                    format!(
                        "Column {}: expected {}, got {}",
                        column, datatype, info.engine_type
                    )
                })
            })
            .collect();
        Ok(ValidationResult::from_errors("data_types", errors))
    }

    /// Counts values outside inclusive bounds; absent or non-numeric columns are skipped
    pub fn validate_numeric_ranges(
        &self,
        frame: &LazyFrame,
        ranges: &BTreeMap<String, NumericRange>,
    ) -> Result<ValidationResult> {
        let actual = frame.schema()?;
        let mut errors = Vec::new();

        for (column, range) in ranges {
            for bound in [range.min, range.max].into_iter().flatten() {
                if !bound.is_finite() {
                    return Err(CompareError::config(format!(
                        "Column {}: range bound {} is not a finite number",
                        column, bound
                    )));
                }
            }
            let Some(info) = find_column(&actual, column) else {
                continue;
            };
            if !DataType::from_engine_type(&info.engine_type).is_some_and(|t| t.is_numeric()) {
                continue;
            }
            let ident = quote_ident(column);
            if let Some(min) = range.min {
                let below = frame.filter(&format!("{} < {}", ident, min)).count()?;
                if below > 0 {
                    errors.push(format!(
                        "Column {}: {} value(s) below minimum {}",
                        column, below, min
                    ));
                }
            }
            if let Some(max) = range.max {
                let above = frame.filter(&format!("{} > {}", ident, max)).count()?;
                if above > 0 {
                    errors.push(format!(
                        "Column {}: {} value(s) above maximum {}",
                        column, above, max
                    ));
                }
            }
        }

        Ok(ValidationResult::from_errors("numeric_ranges", errors))
    }

    /// Counts non-null strings that do not contain a match for the pattern
    pub fn validate_string_patterns(
        &self,
        frame: &LazyFrame,
        patterns: &BTreeMap<String, String>,
    ) -> Result<ValidationResult> {
        let actual = frame.schema()?;
        let mut errors = Vec::new();

        for (column, pattern) in patterns {
            let Some(info) = find_column(&actual, column) else {
                continue;
            };
            if DataType::from_engine_type(&info.engine_type) != Some(DataType::String) {
                continue;
            }
            let non_matching = frame
                .filter(&format!(
                    "NOT regexp_matches({}, {})",
                    quote_ident(column),
                    quote_literal(pattern)
                ))
                .count()?;
            if non_matching > 0 {
                errors.push(format!(
                    "Column {}: {} value(s) do not match pattern '{}'",
                    column, non_matching, pattern
                ));
            }
        }

        Ok(ValidationResult::from_errors("string_patterns", errors))
    }

    /// Each listed column on its own must hold unique values
    pub fn validate_uniqueness(
        &self,
        frame: &LazyFrame,
        columns: &[String],
    ) -> Result<ValidationResult> {
        let actual = frame.schema()?;
        let mut errors = Vec::new();
        for column in columns {
            if find_column(&actual, column).is_none() {
                continue;
            }
            let groups = self.duplicate_key_groups(frame, std::slice::from_ref(column))?;
            if groups > 0 {
                errors.push(format!(
                    "Column {}: {} duplicate value group(s)",
                    column, groups
                ));
            }
        }
        Ok(ValidationResult::from_errors("uniqueness", errors))
    }

    /// One result per requested check, in a fixed order
    pub fn run_comprehensive(
        &self,
        frame: &LazyFrame,
        checks: &QualityChecks,
    ) -> Result<Vec<ValidationResult>> {
        let mut results = Vec::new();
        if !checks.required_columns.is_empty() {
            results.push(self.validate_completeness(frame, &checks.required_columns)?);
        }
        if !checks.expected_types.is_empty() {
            results.push(self.validate_data_types(frame, &checks.expected_types)?);
        }
        if !checks.ranges.is_empty() {
            results.push(self.validate_numeric_ranges(frame, &checks.ranges)?);
        }
        if !checks.patterns.is_empty() {
            results.push(self.validate_string_patterns(frame, &checks.patterns)?);
        }
        if !checks.unique_columns.is_empty() {
            results.push(self.validate_uniqueness(frame, &checks.unique_columns)?);
        }
        Ok(results)
    }
}

fn find_column<'a>(columns: &'a [ColumnInfo], name: &str) -> Option<&'a ColumnInfo> {
    columns.iter().find(|c| c.name == name)
}

fn type_matches(declared: &DataType, engine_type: &str) -> bool {
    if DataType::is_untyped_null(engine_type) {
        return true;
    }
    DataType::from_engine_type(engine_type).as_ref() == Some(declared)
}
