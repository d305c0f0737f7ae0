//! Command-line interface for tabcompare

use crate::frame::FileFormat;
use crate::report::ReportKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tabcompare")]
#[command(about = "Schema-driven, key-based comparison of two tabular datasets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level: off, error, warn, info, debug, trace
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Hide progress spinners and informational logging
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare two datasets by primary key
    Compare {
        /// Left dataset (csv, tsv, parquet, json, jsonl)
        #[arg(long)]
        left: PathBuf,

        /// Right dataset (csv, tsv, parquet, json, jsonl)
        #[arg(long)]
        right: PathBuf,

        /// Comparison settings file (JSON)
        #[arg(long, conflicts_with = "primary_key", required_unless_present = "primary_key")]
        config: Option<PathBuf>,

        /// Primary key columns; infers the configuration from shared columns
        #[arg(long, value_delimiter = ',')]
        primary_key: Vec<String>,

        /// Compare string columns case-insensitively
        #[arg(long)]
        ignore_case: bool,

        /// Treat two nulls as a difference
        #[arg(long)]
        null_not_equal: bool,

        /// Numeric tolerance as COLUMN=VALUE (repeatable)
        #[arg(long, value_parser = parse_tolerance)]
        tolerance: Vec<(String, f64)>,

        /// Report type: "summary", "detailed", or "none"
        #[arg(long, default_value = "summary", value_parser = ReportKind::parse)]
        report: ReportKind,

        /// Sample rows per partition in the detailed report
        #[arg(long, default_value_t = crate::DEFAULT_MAX_SAMPLES, value_parser = validate_max_samples)]
        max_samples: usize,

        /// Directory to export result partitions and summary into
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Export format: "parquet", "csv", "tsv", or "json"
        #[arg(long, default_value = "parquet", value_parser = FileFormat::parse)]
        format: FileFormat,

        /// Exit with status 1 when any difference is found
        #[arg(long)]
        fail_on_diff: bool,
    },

    /// Run pre-flight validation without comparing
    Validate {
        /// Left dataset
        #[arg(long)]
        left: PathBuf,

        /// Right dataset
        #[arg(long)]
        right: PathBuf,

        /// Comparison settings file (JSON)
        #[arg(long)]
        config: PathBuf,
    },

    /// Write a template settings file
    InitConfig {
        /// Where to write the template
        #[arg(long, default_value = "tabcompare.json")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Parse `COLUMN=VALUE` into a tolerance entry
fn parse_tolerance(s: &str) -> Result<(String, f64), String> {
    let (column, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid tolerance: '{}'. Expected COLUMN=VALUE", s))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(format!("Invalid tolerance: '{}'. Column name is empty", s));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("Invalid tolerance value: '{}'", value))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!(
            "Tolerance must be a non-negative number, got {}",
            value
        ));
    }
    Ok((column.to_string(), value))
}

/// Validate that the sample count is greater than 0
fn validate_max_samples(s: &str) -> Result<usize, String> {
    let samples: usize = s
        .parse()
        .map_err(|_| format!("Invalid sample count: '{}'. Must be a positive integer.", s))?;

    if samples == 0 {
        return Err("Sample count must be greater than 0".to_string());
    }

    Ok(samples)
}
