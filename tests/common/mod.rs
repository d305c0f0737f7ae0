//! Common test utilities and helpers

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabcompare::{
    ColumnDefinition, ColumnMapping, ComparisonConfig, ComparisonSchema, DataType, LazyFrame,
    Result, Session,
};
use tempfile::TempDir;

/// Test fixture with a scratch directory and one DuckDB session
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub session: Session,
}

impl TestFixture {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
            session: Session::new()?,
        })
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    /// Run setup SQL against the fixture session
    pub fn seed(&self, sql: &str) -> Result<()> {
        self.session.execute_batch(sql)
    }

    pub fn table(&self, name: &str) -> LazyFrame {
        self.session.table(name)
    }

    /// Create a test CSV file with sample data
    pub fn create_csv(&self, name: &str, data: &[Vec<&str>]) -> Result<PathBuf> {
        let mut content = String::new();
        for row in data {
            content.push_str(&row.join(","));
            content.push('\n');
        }
        self.create_csv_raw(name, &content)
    }

    /// Create a test CSV file with raw string content
    pub fn create_csv_raw(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.path(name);
        fs::write(&path, content)?;
        Ok(path)
    }

    pub fn create_json(&self, name: &str, data: &serde_json::Value) -> Result<PathBuf> {
        let path = self.path(name);
        fs::write(&path, serde_json::to_string_pretty(data)?)?;
        Ok(path)
    }
}

/// Helper for running CLI commands in tests
pub struct CliTestRunner {
    fixture: TestFixture,
}

impl CliTestRunner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            fixture: TestFixture::new()?,
        })
    }

    pub fn fixture(&self) -> &TestFixture {
        &self.fixture
    }

    /// Run a tabcompare command and return its exit status
    pub fn run_command(&self, args: &[&str]) -> Result<i32> {
        use clap::Parser;
        use tabcompare::cli::Cli;
        use tabcompare::commands::execute_command;

        let mut cmd_args = vec!["tabcompare", "--quiet"];
        cmd_args.extend(args);

        let cli = Cli::try_parse_from(cmd_args)
            .map_err(|e| tabcompare::CompareError::invalid_input(e.to_string()))?;
        execute_command(cli.command, true)
    }

    /// Run a command and expect it to succeed, returning the exit status
    pub fn expect_success(&self, args: &[&str]) -> i32 {
        self.run_command(args).expect("Command should succeed")
    }

    /// Run a command and expect it to fail
    pub fn expect_failure(&self, args: &[&str]) -> tabcompare::CompareError {
        self.run_command(args).expect_err("Command should fail")
    }
}

/// Two-column schema: integer key plus one value column
pub fn keyed_schema(key: &str, value: &str, datatype: DataType) -> ComparisonSchema {
    ComparisonSchema::new(
        vec![
            ColumnDefinition::new(key, "ID", DataType::Integer),
            ColumnDefinition::new(value, value, datatype).nullable(true),
        ],
        vec![key.to_string()],
    )
    .expect("valid schema")
}

/// Config comparing tables `l(id, <value>)` and `r(id, <value>)`
pub fn simple_config(
    value: &str,
    datatype: DataType,
    configure: impl FnOnce(
        tabcompare::config::ComparisonConfigBuilder,
    ) -> tabcompare::config::ComparisonConfigBuilder,
) -> Arc<ComparisonConfig> {
    let builder = ComparisonConfig::builder(
        keyed_schema("id", value, datatype.clone()),
        keyed_schema("id", value, datatype),
    )
    .mapping(ColumnMapping::identity("id").expect("mapping"))
    .mapping(ColumnMapping::identity(value).expect("mapping"))
    .primary_key(["id"]);
    Arc::new(configure(builder).build().expect("valid config"))
}

/// Sample data generators for testing
pub mod sample_data {
    /// Orders as exported by the legacy system
    pub fn legacy_orders() -> Vec<Vec<&'static str>> {
        vec![
            vec!["order_id", "customer", "status", "amount"],
            vec!["1", "Alice", "Pending", "100.00"],
            vec!["2", "Bob", "Shipped", "250.50"],
            vec!["3", "Carol", "Delivered", "75.25"],
            vec!["4", "Dave", "Pending", "12.00"],
        ]
    }

    /// Same orders after migration: renamed columns, one changed, one dropped, one added
    pub fn migrated_orders() -> Vec<Vec<&'static str>> {
        vec![
            vec!["id", "customer_name", "order_status", "total"],
            vec!["1", "Alice", "pending", "100.004"],
            vec!["2", "Bob", "Shipped", "255.50"],
            vec!["3", "Carol", "Delivered", "75.25"],
            vec!["5", "Eve", "Pending", "40.00"],
        ]
    }

    /// Settings file mapping the legacy columns onto the migrated ones
    pub fn orders_settings() -> serde_json::Value {
        serde_json::json!({
            "left_schema": {
                "columns": [
                    {"name": "order_id", "alias": "Order", "datatype": "integer"},
                    {"name": "customer", "alias": "Customer", "datatype": "string"},
                    {"name": "status", "alias": "Status", "datatype": "string"},
                    {"name": "amount", "alias": "Amount", "datatype": "float"}
                ],
                "primary_key": ["order_id"]
            },
            "right_schema": {
                "columns": [
                    {"name": "id", "alias": "Order", "datatype": "integer"},
                    {"name": "customer_name", "alias": "Customer", "datatype": "string"},
                    {"name": "order_status", "alias": "Status", "datatype": "string"},
                    {"name": "total", "alias": "Amount", "datatype": "float"}
                ],
                "primary_key": ["id"]
            },
            "column_mappings": [
                {"left": "order_id", "right": "id", "name": "order_id"},
                {"left": "customer", "right": "customer_name", "name": "customer"},
                {"left": "status", "right": "order_status", "name": "status"},
                {"left": "amount", "right": "total", "name": "amount"}
            ],
            "primary_key": ["order_id"]
        })
    }
}
