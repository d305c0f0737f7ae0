//! Comparison settings files and environment overrides

use crate::config::{ComparisonConfig, DEFAULT_IGNORE_CASE, DEFAULT_NULL_EQUALS_NULL};
use crate::dtype::DataType;
use crate::error::{CompareError, Result};
use crate::schema::{ColumnDefinition, ColumnMapping, ComparisonSchema};
use crate::validation::QualityChecks;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const IGNORE_CASE_VAR: &str = "TABCOMPARE_IGNORE_CASE";
pub const NULL_EQUALS_NULL_VAR: &str = "TABCOMPARE_NULL_EQUALS_NULL";

fn default_null_equals_null() -> bool {
    DEFAULT_NULL_EQUALS_NULL
}

/// On-disk form of a full comparison configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSettings {
    pub left_schema: ComparisonSchema,
    pub right_schema: ComparisonSchema,
    pub column_mappings: Vec<ColumnMapping>,
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub ignore_case: bool,
    #[serde(default = "default_null_equals_null")]
    pub null_equals_null: bool,
    #[serde(default)]
    pub tolerance: BTreeMap<String, f64>,
    /// Extra data-quality checks for `validate`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_checks: Option<QualityChecks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_checks: Option<QualityChecks>,
}

impl ComparisonSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CompareError::invalid_input(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            CompareError::config(format!("Invalid config file '{}': {}", path.display(), e))
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Apply `TABCOMPARE_*` overrides from explicit `(key, value)` pairs
    pub fn apply_env_overrides<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if key == IGNORE_CASE_VAR {
                self.ignore_case = parse_bool(&key, &value)?;
                log::debug!("{} overrides ignore_case={}", key, self.ignore_case);
            } else if key == NULL_EQUALS_NULL_VAR {
                self.null_equals_null = parse_bool(&key, &value)?;
                log::debug!("{} overrides null_equals_null={}", key, self.null_equals_null);
            }
        }
        Ok(())
    }

    /// Build the immutable config, re-running every invariant check
    pub fn into_config(self) -> Result<ComparisonConfig> {
        ComparisonConfig::builder(self.left_schema, self.right_schema)
            .mappings(self.column_mappings)
            .primary_key(self.primary_key)
            .ignore_case(self.ignore_case)
            .null_equals_null(self.null_equals_null)
            .tolerances(self.tolerance)
            .build()
    }

    pub fn from_config(config: &ComparisonConfig) -> Self {
        Self {
            left_schema: config.left_schema().clone(),
            right_schema: config.right_schema().clone(),
            column_mappings: config.column_mappings().to_vec(),
            primary_key: config.primary_key().to_vec(),
            ignore_case: config.ignore_case(),
            null_equals_null: config.null_equals_null(),
            tolerance: config.tolerance().clone(),
            left_checks: None,
            right_checks: None,
        }
    }

    /// Starter file written by `init-config`
    pub fn template() -> Result<Self> {
        let left_schema = ComparisonSchema::new(
            vec![
                ColumnDefinition::new("customer_id", "Customer ID", DataType::Integer),
                ColumnDefinition::new("order_date", "Order Date", DataType::Date),
                ColumnDefinition::new("amount", "Order Amount", DataType::Float),
                ColumnDefinition::new("status", "Order Status", DataType::String).nullable(true),
            ],
            vec!["customer_id".to_string(), "order_date".to_string()],
        )?;
        let right_schema = ComparisonSchema::new(
            vec![
                ColumnDefinition::new("cust_id", "Customer ID", DataType::Integer),
                ColumnDefinition::new("order_dt", "Order Date", DataType::Date),
                ColumnDefinition::new("total_amount", "Order Amount", DataType::Float),
                ColumnDefinition::new("order_status", "Order Status", DataType::String)
                    .nullable(true),
            ],
            vec!["cust_id".to_string(), "order_dt".to_string()],
        )?;

        Ok(Self {
            left_schema,
            right_schema,
            column_mappings: vec![
                ColumnMapping::new("customer_id", "cust_id", "customer_id")?,
                ColumnMapping::new("order_date", "order_dt", "order_date")?,
                ColumnMapping::new("amount", "total_amount", "amount")?,
                ColumnMapping::new("status", "order_status", "status")?,
            ],
            primary_key: vec!["customer_id".to_string(), "order_date".to_string()],
            ignore_case: DEFAULT_IGNORE_CASE,
            null_equals_null: DEFAULT_NULL_EQUALS_NULL,
            tolerance: BTreeMap::from([("amount".to_string(), 0.01)]),
            left_checks: None,
            right_checks: None,
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CompareError::config(format!(
            "{} must be a boolean (true/false), got '{}'",
            key, value
        ))),
    }
}
