//! Declared per-side schemas and column mappings

use crate::dtype::DataType;
use crate::error::{CompareError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One declared column of an input dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Physical column name in the dataset
    pub name: String,
    /// Display name used in reports
    pub alias: String,
    pub datatype: DataType,
    #[serde(default)]
    pub nullable: bool,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, alias: impl Into<String>, datatype: DataType) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
            datatype,
            nullable: false,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaFile {
    columns: Vec<ColumnDefinition>,
    #[serde(default)]
    primary_key: Vec<String>,
}

/// Columns of one side, keyed by physical name, plus its primary key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaFile", into = "SchemaFile")]
pub struct ComparisonSchema {
    columns: IndexMap<String, ColumnDefinition>,
    primary_key: Vec<String>,
}

impl ComparisonSchema {
    pub fn new(columns: Vec<ColumnDefinition>, primary_key: Vec<String>) -> Result<Self> {
        if columns.is_empty() {
            return Err(CompareError::config("Schema has no columns defined"));
        }

        let mut by_name = IndexMap::with_capacity(columns.len());
        for column in columns {
            if column.name.trim().is_empty() {
                return Err(CompareError::config("Column name cannot be empty"));
            }
            if column.alias.trim().is_empty() {
                return Err(CompareError::config(format!(
                    "Column '{}' has an empty alias",
                    column.name
                )));
            }
            if by_name.contains_key(&column.name) {
                return Err(CompareError::config(format!(
                    "Column '{}' is declared more than once",
                    column.name
                )));
            }
            by_name.insert(column.name.clone(), column);
        }

        for key in &primary_key {
            if !by_name.contains_key(key) {
                return Err(CompareError::config(format!(
                    "Primary key column '{}' not defined in schema",
                    key
                )));
            }
        }

        Ok(Self {
            columns: by_name,
            primary_key,
        })
    }

    pub fn columns(&self) -> &IndexMap<String, ColumnDefinition> {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.get(name)
    }

    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    pub fn primary_key_definitions(&self) -> Vec<&ColumnDefinition> {
        self.primary_key
            .iter()
            .filter_map(|key| self.columns.get(key))
            .collect()
    }

    /// Non-key columns, in declaration order
    pub fn compare_columns(&self) -> Vec<&ColumnDefinition> {
        self.columns
            .values()
            .filter(|c| !self.primary_key.contains(&c.name))
            .collect()
    }
}

impl TryFrom<SchemaFile> for ComparisonSchema {
    type Error = CompareError;

    fn try_from(file: SchemaFile) -> Result<Self> {
        Self::new(file.columns, file.primary_key)
    }
}

impl From<ComparisonSchema> for SchemaFile {
    fn from(schema: ComparisonSchema) -> Self {
        Self {
            columns: schema.columns.into_values().collect(),
            primary_key: schema.primary_key,
        }
    }
}

/// Pairs a left column with a right column under one logical name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MappingFile", into = "MappingFile")]
pub struct ColumnMapping {
    left: String,
    right: String,
    name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MappingFile {
    left: String,
    right: String,
    name: String,
}

impl ColumnMapping {
    pub fn new(
        left: impl Into<String>,
        right: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self> {
        let mapping = Self {
            left: left.into(),
            right: right.into(),
            name: name.into(),
        };
        for (label, value) in [
            ("left", &mapping.left),
            ("right", &mapping.right),
            ("logical", &mapping.name),
        ] {
            if value.trim().is_empty() {
                return Err(CompareError::config(format!(
                    "Column mapping has an empty {} name",
                    label
                )));
            }
        }
        Ok(mapping)
    }

    /// Mapping of a column that carries the same name on both sides
    pub fn identity(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        Self::new(name.clone(), name.clone(), name)
    }

    pub fn left(&self) -> &str {
        &self.left
    }

    pub fn right(&self) -> &str {
        &self.right
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TryFrom<MappingFile> for ColumnMapping {
    type Error = CompareError;

    fn try_from(file: MappingFile) -> Result<Self> {
        Self::new(file.left, file.right, file.name)
    }
}

impl From<ColumnMapping> for MappingFile {
    fn from(mapping: ColumnMapping) -> Self {
        Self {
            left: mapping.left,
            right: mapping.right,
            name: mapping.name,
        }
    }
}
