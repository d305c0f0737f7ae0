//! Resolution of column mappings against both declared schemas

use crate::dtype::DataType;
use crate::error::{CompareError, Result};
use crate::schema::{ColumnMapping, ComparisonSchema};
use std::collections::HashSet;

/// Prefix for standardized key columns, shared by both sides
pub const PRIMARY_KEY_PREFIX: &str = "PK_";
/// Prefix for standardized left value columns
pub const LEFT_PREFIX: &str = "L_";
/// Prefix for standardized right value columns
pub const RIGHT_PREFIX: &str = "R_";

/// A mapping whose both ends were found in their schemas
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumn {
    pub name: String,
    pub left_column: String,
    pub right_column: String,
    pub left_type: DataType,
    pub right_type: DataType,
    pub is_key: bool,
}

impl ResolvedColumn {
    pub fn key_column(&self) -> String {
        format!("{}{}", PRIMARY_KEY_PREFIX, self.name)
    }

    pub fn left_value_column(&self) -> String {
        format!("{}{}", LEFT_PREFIX, self.name)
    }

    pub fn right_value_column(&self) -> String {
        format!("{}{}", RIGHT_PREFIX, self.name)
    }

    pub fn is_numeric(&self) -> bool {
        self.left_type.is_numeric() && self.right_type.is_numeric()
    }

    pub fn is_string(&self) -> bool {
        self.left_type.is_string() && self.right_type.is_string()
    }

    pub fn is_integer(&self) -> bool {
        self.left_type == DataType::Integer && self.right_type == DataType::Integer
    }

    /// Declared types the engine cannot compare natively are compared as text
    pub fn compares_as_text(&self) -> bool {
        if self.left_type == self.right_type || self.is_numeric() {
            return false;
        }
        !matches!(
            (&self.left_type, &self.right_type),
            (DataType::Date, DataType::Datetime) | (DataType::Datetime, DataType::Date)
        )
    }
}

/// Keys in primary-key order followed by value columns in mapping order
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMapping {
    keys: Vec<ResolvedColumn>,
    values: Vec<ResolvedColumn>,
}

impl ResolvedMapping {
    pub fn keys(&self) -> &[ResolvedColumn] {
        &self.keys
    }

    pub fn values(&self) -> &[ResolvedColumn] {
        &self.values
    }

    pub fn get(&self, logical_name: &str) -> Option<&ResolvedColumn> {
        self.keys
            .iter()
            .chain(self.values.iter())
            .find(|c| c.name == logical_name)
    }

    pub fn key_names(&self) -> Vec<String> {
        self.keys.iter().map(|c| c.name.clone()).collect()
    }

    /// Physical key columns of the left dataset, in key order
    pub fn left_key_columns(&self) -> Vec<String> {
        self.keys.iter().map(|c| c.left_column.clone()).collect()
    }

    pub fn right_key_columns(&self) -> Vec<String> {
        self.keys.iter().map(|c| c.right_column.clone()).collect()
    }
}

pub struct MappingResolver;

impl MappingResolver {
    /// Check every mapping against both schemas and the logical primary key.
    ///
    /// All problems are collected before failing so a broken configuration
    /// can be fixed in one pass.
    pub fn resolve(
        mappings: &[ColumnMapping],
        left_schema: &ComparisonSchema,
        right_schema: &ComparisonSchema,
        primary_key: &[String],
    ) -> Result<ResolvedMapping> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(mappings.len());

        if primary_key.is_empty() {
            errors.push("No primary key columns defined".to_string());
        }

        for mapping in mappings {
            if !seen.insert(mapping.name()) {
                errors.push(format!(
                    "Logical column '{}' is mapped more than once",
                    mapping.name()
                ));
                continue;
            }

            let left = left_schema.column(mapping.left());
            let right = right_schema.column(mapping.right());
            if left.is_none() {
                errors.push(format!(
                    "Left column '{}' (mapped as '{}') not found in left schema",
                    mapping.left(),
                    mapping.name()
                ));
            }
            if right.is_none() {
                errors.push(format!(
                    "Right column '{}' (mapped as '{}') not found in right schema",
                    mapping.right(),
                    mapping.name()
                ));
            }

            if let (Some(left), Some(right)) = (left, right) {
                resolved.push(ResolvedColumn {
                    name: mapping.name().to_string(),
                    left_column: left.name.clone(),
                    right_column: right.name.clone(),
                    left_type: left.datatype.clone(),
                    right_type: right.datatype.clone(),
                    is_key: primary_key.iter().any(|k| k == mapping.name()),
                });
            }
        }

        let mut keys = Vec::with_capacity(primary_key.len());
        let mut key_seen = HashSet::new();
        for key in primary_key {
            if !key_seen.insert(key.as_str()) {
                errors.push(format!("Primary key column '{}' listed more than once", key));
                continue;
            }
            match resolved.iter().find(|c| &c.name == key) {
                Some(column) => keys.push(column.clone()),
                None if mappings.iter().any(|m| m.name() == key) => {
                    // Already reported as an unresolved mapping above
                }
                None => errors.push(format!(
                    "Primary key column '{}' not found in column mappings",
                    key
                )),
            }
        }

        if !errors.is_empty() {
            return Err(CompareError::mapping(errors));
        }

        let values = resolved.into_iter().filter(|c| !c.is_key).collect();
        Ok(ResolvedMapping { keys, values })
    }
}
