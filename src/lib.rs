//! # tabcompare
//!
//! A schema-driven comparison engine for deferred tabular datasets. Two
//! datasets are matched on a primary key and every record lands in exactly
//! one of: matching, value differences, left-only or right-only.

pub mod cli;
pub mod commands;
pub mod config;
pub mod dtype;
pub mod engine;
pub mod error;
pub mod export;
pub mod frame;
pub mod instrument;
pub mod mapping;
pub mod predicate;
pub mod progress;
pub mod report;
pub mod result;
pub mod schema;
pub mod settings;
pub mod validation;

pub use config::ComparisonConfig;
pub use dtype::DataType;
pub use engine::{compare, ComparisonEngine};
pub use error::{CompareError, Result, Side};
pub use frame::{LazyFrame, Session};
pub use result::{ComparisonResult, ComparisonSummary};
pub use schema::{ColumnDefinition, ColumnMapping, ComparisonSchema};
pub use validation::{ValidationResult, ValidationService};

/// Default number of sample rows per partition in detailed reports
pub const DEFAULT_MAX_SAMPLES: usize = 10;
