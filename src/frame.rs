//! Deferred tabular datasets backed by an in-process DuckDB connection
//!
//! A [`LazyFrame`] is a SQL plan bound to a [`Session`]. Building or composing
//! frames never touches data; only the forcing methods (`schema`, `count`,
//! `collect`, `copy_to`, ...) execute anything.

use crate::error::{CompareError, Result};
use crate::predicate::{quote_ident, quote_literal};
use duckdb::types::{TimeUnit, Value};
use duckdb::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Tuning knobs applied to every new session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub memory_limit: Option<String>,
    pub threads: Option<usize>,
    pub preserve_insertion_order: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            memory_limit: None,
            threads: None,
            preserve_insertion_order: true,
        }
    }
}

impl SessionConfig {
    pub const MEMORY_LIMIT_VAR: &'static str = "TABCOMPARE_MEMORY_LIMIT";
    pub const THREADS_VAR: &'static str = "TABCOMPARE_THREADS";

    /// Build a config from explicit `(key, value)` pairs, e.g. `std::env::vars()`
    pub fn from_env_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = Self::default();
        for (key, value) in vars {
            if key == Self::MEMORY_LIMIT_VAR {
                config.memory_limit = Some(value);
            } else if key == Self::THREADS_VAR {
                let threads: usize = value.trim().parse().map_err(|_| {
                    CompareError::config(format!(
                        "{} must be a positive integer, got '{}'",
                        Self::THREADS_VAR,
                        value
                    ))
                })?;
                if threads == 0 {
                    return Err(CompareError::config(format!(
                        "{} must be greater than 0",
                        Self::THREADS_VAR
                    )));
                }
                config.threads = Some(threads);
            }
        }
        Ok(config)
    }
}

/// Supported on-disk formats for scanning and copying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Tsv,
    Parquet,
    Json,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            "parquet" => Some(Self::Parquet),
            "json" | "jsonl" | "ndjson" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            "parquet" => Ok(Self::Parquet),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "Invalid format: {}. Use 'parquet', 'csv', 'tsv' or 'json'",
                s
            )),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Parquet => "parquet",
            Self::Json => "json",
        }
    }

    fn scan_function(&self, path: &str) -> String {
        let path = quote_literal(path);
        match self {
            Self::Csv => format!("read_csv_auto({})", path),
            Self::Tsv => format!("read_csv_auto({}, delim = '\\t')", path),
            Self::Parquet => format!("read_parquet({})", path),
            Self::Json => format!("read_json_auto({})", path),
        }
    }

    fn copy_options(&self) -> &'static str {
        match self {
            Self::Csv => "(FORMAT CSV, HEADER)",
            Self::Tsv => "(FORMAT CSV, HEADER, DELIMITER '\\t')",
            Self::Parquet => "(FORMAT PARQUET)",
            Self::Json => "(FORMAT JSON)",
        }
    }
}

/// Shared handle to one DuckDB connection
#[derive(Clone)]
pub struct Session {
    connection: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &Arc::as_ptr(&self.connection))
            .finish()
    }
}

impl Session {
    /// Open an in-memory session with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(&SessionConfig::default())
    }

    pub fn with_config(config: &SessionConfig) -> Result<Self> {
        let connection = Connection::open_in_memory()?;

        connection.execute("SET enable_progress_bar=false", [])?;
        connection.execute(
            &format!(
                "SET preserve_insertion_order={}",
                config.preserve_insertion_order
            ),
            [],
        )?;
        if let Some(limit) = &config.memory_limit {
            connection.execute(&format!("SET memory_limit={}", quote_literal(limit)), [])?;
        }
        if let Some(threads) = config.threads {
            connection.execute(&format!("SET threads={}", threads), [])?;
        }

        log::debug!("Opened DuckDB session with {:?}", config);

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| CompareError::data_processing("DuckDB session lock poisoned"))
    }

    /// True when both handles refer to the same connection
    pub fn same_as(&self, other: &Session) -> bool {
        Arc::ptr_eq(&self.connection, &other.connection)
    }

    /// Run setup statements (CREATE TABLE, INSERT, ATTACH, ...)
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.lock()?.execute_batch(sql)?;
        Ok(())
    }

    /// Frame over an arbitrary SELECT query
    pub fn sql(&self, query: impl Into<String>) -> LazyFrame {
        LazyFrame {
            session: self.clone(),
            plan: query.into(),
        }
    }

    /// Frame over a table or view in this session
    pub fn table(&self, name: &str) -> LazyFrame {
        self.sql(format!("SELECT * FROM {}", quote_ident(name)))
    }

    /// Frame scanning a file; the file is read only when the frame is forced
    pub fn scan(&self, path: &Path) -> Result<LazyFrame> {
        if !path.exists() {
            return Err(CompareError::invalid_input(format!(
                "File not found: {}",
                path.display()
            )));
        }
        let format = FileFormat::from_path(path).ok_or_else(|| {
            CompareError::invalid_input(format!(
                "Unsupported file format: {} (expected csv, tsv, parquet, json or jsonl)",
                path.display()
            ))
        })?;

        let path_str = path.to_string_lossy();
        Ok(self.sql(format!("SELECT * FROM {}", format.scan_function(&path_str))))
    }

    /// Count several frames in a single query
    pub fn count_all(&self, frames: &[&LazyFrame]) -> Result<Vec<u64>> {
        if frames.is_empty() {
            return Ok(Vec::new());
        }
        for frame in frames {
            if !frame.session.same_as(self) {
                return Err(CompareError::invalid_input(
                    "All frames counted together must belong to the same session",
                ));
            }
        }

        let selects = frames
            .iter()
            .map(|frame| format!("(SELECT COUNT(*) FROM ({}) AS _counted)", frame.plan))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("SELECT {}", selects);

        let connection = self.lock()?;
        let mut stmt = connection.prepare(&sql)?;
        let counts = stmt.query_row([], |row| {
            let mut counts = Vec::with_capacity(frames.len());
            for i in 0..frames.len() {
                counts.push(row.get::<_, i64>(i)?);
            }
            Ok(counts)
        })?;

        Ok(counts.into_iter().map(|c| c.max(0) as u64).collect())
    }
}

/// Column name and engine type as reported by DESCRIBE
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub engine_type: String,
}

/// Materialized rows of a frame
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBatch {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RecordBatch {
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column, in row order
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }
}

/// A not-yet-executed query plan
#[derive(Debug, Clone)]
pub struct LazyFrame {
    session: Session,
    plan: String,
}

impl LazyFrame {
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The SQL text of this plan
    pub fn plan(&self) -> &str {
        &self.plan
    }

    fn derive(&self, plan: String) -> LazyFrame {
        LazyFrame {
            session: self.session.clone(),
            plan,
        }
    }

    pub fn select(&self, columns: &[&str]) -> LazyFrame {
        let projection = columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        self.derive(format!("SELECT {} FROM ({}) AS _src", projection, self.plan))
    }

    /// Project `(source, alias)` pairs
    pub fn select_aliased(&self, columns: &[(&str, &str)]) -> LazyFrame {
        let exprs: Vec<(String, &str)> = columns
            .iter()
            .map(|(source, alias)| (quote_ident(source), *alias))
            .collect();
        self.select_exprs(&exprs)
    }

    /// Project `(sql expression, alias)` pairs
    pub fn select_exprs<E: AsRef<str>>(&self, columns: &[(E, &str)]) -> LazyFrame {
        let projection = columns
            .iter()
            .map(|(expr, alias)| format!("{} AS {}", expr.as_ref(), quote_ident(alias)))
            .collect::<Vec<_>>()
            .join(", ");
        self.derive(format!("SELECT {} FROM ({}) AS _src", projection, self.plan))
    }

    /// Keep rows satisfying a SQL predicate over this frame's columns
    pub fn filter(&self, predicate: &str) -> LazyFrame {
        self.derive(format!(
            "SELECT * FROM ({}) AS _src WHERE {}",
            self.plan, predicate
        ))
    }

    pub fn limit(&self, n: usize) -> LazyFrame {
        self.derive(format!("SELECT * FROM ({}) AS _src LIMIT {}", self.plan, n))
    }

    /// Column names and engine types, in order
    pub fn schema(&self) -> Result<Vec<ColumnInfo>> {
        let sql = format!("DESCRIBE SELECT * FROM ({}) AS _described", self.plan);
        let connection = self.session.lock()?;
        let mut stmt = connection.prepare(&sql).map_err(|e| {
            CompareError::data_processing(format!("Failed to describe plan: {}", e))
        })?;

        let rows = stmt.query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get::<_, String>(0)?,
                engine_type: row.get::<_, String>(1)?,
            })
        })?;

        let mut columns = Vec::new();
        for row in rows {
            columns.push(row?);
        }
        Ok(columns)
    }

    pub fn column_names(&self) -> Result<Vec<String>> {
        Ok(self.schema()?.into_iter().map(|c| c.name).collect())
    }

    pub fn count(&self) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM ({}) AS _counted", self.plan);
        let connection = self.session.lock()?;
        let count: i64 = connection.prepare(&sql)?.query_row([], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// Null count per requested column, computed in one scan
    pub fn null_counts(&self, columns: &[&str]) -> Result<Vec<u64>> {
        if columns.is_empty() {
            return Ok(Vec::new());
        }
        let aggregates = columns
            .iter()
            .map(|c| format!("COUNT(*) - COUNT({})", quote_ident(c)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("SELECT {} FROM ({}) AS _scanned", aggregates, self.plan);

        let connection = self.session.lock()?;
        let mut stmt = connection.prepare(&sql)?;
        let counts = stmt.query_row([], |row| {
            let mut counts = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                counts.push(row.get::<_, i64>(i)?);
            }
            Ok(counts)
        })?;
        Ok(counts.into_iter().map(|c| c.max(0) as u64).collect())
    }

    /// Execute the plan and materialize every row
    pub fn collect(&self) -> Result<RecordBatch> {
        let columns = self.column_names()?;
        if columns.is_empty() {
            return Ok(RecordBatch {
                columns,
                rows: Vec::new(),
            });
        }

        let column_count = columns.len();
        let connection = self.session.lock()?;
        let mut stmt = connection.prepare(&self.plan).map_err(|e| {
            CompareError::data_processing(format!("Failed to prepare plan: {}", e))
        })?;

        let rows = stmt.query_map([], |row| {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(row.get::<_, Value>(i)?);
            }
            Ok(values)
        })?;

        let mut data = Vec::new();
        for row in rows {
            data.push(row?);
        }

        Ok(RecordBatch {
            columns,
            rows: data,
        })
    }

    pub fn head(&self, n: usize) -> Result<RecordBatch> {
        self.limit(n).collect()
    }

    /// Stream the plan straight to a file without materializing it here
    pub fn copy_to(&self, path: &Path, format: FileFormat) -> Result<()> {
        let sql = format!(
            "COPY ({}) TO {} {}",
            self.plan,
            quote_literal(&path.to_string_lossy()),
            format.copy_options()
        );
        self.session.lock()?.execute_batch(&sql)?;
        Ok(())
    }
}

/// Render a single engine value for human-readable output
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::TinyInt(i) => i.to_string(),
        Value::SmallInt(i) => i.to_string(),
        Value::Int(i) => i.to_string(),
        Value::BigInt(i) => i.to_string(),
        Value::HugeInt(i) => i.to_string(),
        Value::UTinyInt(i) => i.to_string(),
        Value::USmallInt(i) => i.to_string(),
        Value::UInt(i) => i.to_string(),
        Value::UBigInt(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Double(f) => f.to_string(),
        Value::Decimal(d) => d.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<blob:{} bytes>", b.len()),
        Value::Date32(days) => chrono::NaiveDate::from_ymd_opt(1970, 1, 1)
            .and_then(|epoch| epoch.checked_add_signed(chrono::Duration::days(i64::from(*days))))
            .map(|d| d.to_string())
            .unwrap_or_else(|| format!("<date:{}>", days)),
        Value::Timestamp(unit, raw) => {
            let micros = match unit {
                TimeUnit::Second => raw.saturating_mul(1_000_000),
                TimeUnit::Millisecond => raw.saturating_mul(1_000),
                TimeUnit::Microsecond => *raw,
                TimeUnit::Nanosecond => raw / 1_000,
            };
            chrono::DateTime::from_timestamp_micros(micros)
                .map(|ts| ts.naive_utc().to_string())
                .unwrap_or_else(|| format!("<timestamp:{}>", raw))
        }
        Value::List(items) => {
            let rendered: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", rendered.join(", "))
        }
        Value::Enum(s) => s.clone(),
        other => format!("{:?}", other),
    }
}
