//! Immutable comparison configuration

use crate::dtype::DataType;
use crate::error::{CompareError, Result};
use crate::frame::LazyFrame;
use crate::mapping::{MappingResolver, ResolvedColumn, ResolvedMapping};
use crate::predicate::ColumnRule;
use crate::schema::{ColumnDefinition, ColumnMapping, ComparisonSchema};
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_IGNORE_CASE: bool = false;
pub const DEFAULT_NULL_EQUALS_NULL: bool = true;

/// Everything a comparison needs: both schemas, the mappings, the logical
/// primary key and the equality policy. Built once through
/// [`ComparisonConfigBuilder`] and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonConfig {
    left_schema: ComparisonSchema,
    right_schema: ComparisonSchema,
    column_mappings: Vec<ColumnMapping>,
    primary_key: Vec<String>,
    ignore_case: bool,
    null_equals_null: bool,
    tolerance: BTreeMap<String, f64>,
    #[serde(skip)]
    resolved: ResolvedMapping,
}

impl ComparisonConfig {
    pub fn builder(
        left_schema: ComparisonSchema,
        right_schema: ComparisonSchema,
    ) -> ComparisonConfigBuilder {
        ComparisonConfigBuilder {
            left_schema,
            right_schema,
            column_mappings: Vec::new(),
            primary_key: Vec::new(),
            ignore_case: DEFAULT_IGNORE_CASE,
            null_equals_null: DEFAULT_NULL_EQUALS_NULL,
            tolerance: BTreeMap::new(),
        }
    }

    /// Derive a config from the live schemas of two frames.
    ///
    /// Columns present under the same name on both sides are mapped to
    /// themselves when their engine types fall in the logical type set.
    /// Every inferred column is nullable except the primary key.
    pub fn infer(left: &LazyFrame, right: &LazyFrame, primary_key: &[String]) -> Result<Self> {
        let left_columns = left.schema()?;
        let right_columns = right.schema()?;

        let mut left_defs = Vec::new();
        let mut right_defs = Vec::new();
        let mut mappings = Vec::new();

        for left_column in &left_columns {
            let Some(right_column) = right_columns.iter().find(|c| c.name == left_column.name)
            else {
                log::debug!("Skipping left-only column '{}'", left_column.name);
                continue;
            };

            let left_type = DataType::from_engine_type(&left_column.engine_type);
            let right_type = DataType::from_engine_type(&right_column.engine_type);
            let (Some(left_type), Some(right_type)) = (left_type, right_type) else {
                log::debug!(
                    "Skipping column '{}' with unsupported types {} / {}",
                    left_column.name,
                    left_column.engine_type,
                    right_column.engine_type
                );
                continue;
            };

            let nullable = !primary_key.contains(&left_column.name);
            left_defs.push(
                ColumnDefinition::new(&left_column.name, &left_column.name, left_type)
                    .nullable(nullable),
            );
            right_defs.push(
                ColumnDefinition::new(&right_column.name, &right_column.name, right_type)
                    .nullable(nullable),
            );
            mappings.push(ColumnMapping::identity(&left_column.name)?);
        }

        if mappings.is_empty() {
            return Err(CompareError::config(
                "No comparable columns shared by both datasets",
            ));
        }

        for key in primary_key {
            if !mappings.iter().any(|m| m.name() == key) {
                return Err(CompareError::config(format!(
                    "Primary key column '{}' is not present with a supported type on both sides",
                    key
                )));
            }
        }

        let left_schema = ComparisonSchema::new(left_defs, primary_key.to_vec())?;
        let right_schema = ComparisonSchema::new(right_defs, primary_key.to_vec())?;

        Self::builder(left_schema, right_schema)
            .mappings(mappings)
            .primary_key(primary_key.to_vec())
            .build()
    }

    pub fn left_schema(&self) -> &ComparisonSchema {
        &self.left_schema
    }

    pub fn right_schema(&self) -> &ComparisonSchema {
        &self.right_schema
    }

    pub fn column_mappings(&self) -> &[ColumnMapping] {
        &self.column_mappings
    }

    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    pub fn null_equals_null(&self) -> bool {
        self.null_equals_null
    }

    pub fn tolerance(&self) -> &BTreeMap<String, f64> {
        &self.tolerance
    }

    pub fn resolved(&self) -> &ResolvedMapping {
        &self.resolved
    }

    /// Equality rule applied to one resolved value column
    pub fn rule_for(&self, column: &ResolvedColumn) -> ColumnRule {
        if let Some(threshold) = self.tolerance.get(&column.name) {
            if column.is_integer() {
                ColumnRule::IntegerTolerance(*threshold)
            } else {
                ColumnRule::Tolerance(*threshold)
            }
        } else if self.ignore_case
            && (column.is_string()
                || (column.compares_as_text()
                    && (column.left_type.is_string() || column.right_type.is_string())))
        {
            ColumnRule::IgnoreCase
        } else {
            ColumnRule::Exact
        }
    }

    /// Stable hash of the serialized configuration
    pub fn fingerprint(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }
}

pub struct ComparisonConfigBuilder {
    left_schema: ComparisonSchema,
    right_schema: ComparisonSchema,
    column_mappings: Vec<ColumnMapping>,
    primary_key: Vec<String>,
    ignore_case: bool,
    null_equals_null: bool,
    tolerance: BTreeMap<String, f64>,
}

impl ComparisonConfigBuilder {
    pub fn mapping(mut self, mapping: ColumnMapping) -> Self {
        self.column_mappings.push(mapping);
        self
    }

    pub fn mappings(mut self, mappings: impl IntoIterator<Item = ColumnMapping>) -> Self {
        self.column_mappings.extend(mappings);
        self
    }

    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Fold case when comparing string value columns.
    ///
    /// Primary key columns are never folded: `"A1"` and `"a1"` stay distinct
    /// records on either side.
    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    pub fn null_equals_null(mut self, null_equals_null: bool) -> Self {
        self.null_equals_null = null_equals_null;
        self
    }

    pub fn tolerance(mut self, column: impl Into<String>, threshold: f64) -> Self {
        self.tolerance.insert(column.into(), threshold);
        self
    }

    pub fn tolerances(mut self, tolerances: impl IntoIterator<Item = (String, f64)>) -> Self {
        self.tolerance.extend(tolerances);
        self
    }

    pub fn build(self) -> Result<ComparisonConfig> {
        let resolved = MappingResolver::resolve(
            &self.column_mappings,
            &self.left_schema,
            &self.right_schema,
            &self.primary_key,
        )?;

        for (column, threshold) in &self.tolerance {
            if !threshold.is_finite() || *threshold < 0.0 {
                return Err(CompareError::config(format!(
                    "Tolerance for '{}' must be a finite non-negative number, got {}",
                    column, threshold
                )));
            }
            let Some(resolved_column) = resolved.get(column) else {
                return Err(CompareError::config(format!(
                    "Tolerance given for unmapped column '{}'",
                    column
                )));
            };
            if resolved_column.is_key {
                return Err(CompareError::config(format!(
                    "Tolerance cannot apply to primary key column '{}'",
                    column
                )));
            }
            if !resolved_column.is_numeric() {
                return Err(CompareError::config(format!(
                    "Tolerance requires a numeric column, '{}' is {} / {}",
                    column, resolved_column.left_type, resolved_column.right_type
                )));
            }
        }

        Ok(ComparisonConfig {
            left_schema: self.left_schema,
            right_schema: self.right_schema,
            column_mappings: self.column_mappings,
            primary_key: self.primary_key,
            ignore_case: self.ignore_case,
            null_equals_null: self.null_equals_null,
            tolerance: self.tolerance,
            resolved,
        })
    }
}
