//! Command implementations for tabcompare CLI

use crate::cli::Commands;
use crate::config::ComparisonConfig;
use crate::engine::ComparisonEngine;
use crate::error::{CompareError, Result, Side, EXIT_DIFFERENCES_FOUND, EXIT_SUCCESS};
use crate::export::ResultExporter;
use crate::frame::{FileFormat, LazyFrame, Session, SessionConfig};
use crate::instrument::timed;
use crate::progress::StageReporter;
use crate::report::{render_validation, ComparisonReport, ReportKind};
use crate::settings::ComparisonSettings;
use crate::validation::{ValidationResult, ValidationService};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options of the `compare` subcommand
#[derive(Debug, Clone)]
pub struct CompareOptions {
    pub left: PathBuf,
    pub right: PathBuf,
    pub config: Option<PathBuf>,
    pub primary_key: Vec<String>,
    pub ignore_case: bool,
    pub null_not_equal: bool,
    pub tolerance: Vec<(String, f64)>,
    pub report: ReportKind,
    pub max_samples: usize,
    pub export_dir: Option<PathBuf>,
    pub format: FileFormat,
    pub fail_on_diff: bool,
}

/// Execute a command, returning the process exit status on success
pub fn execute_command(command: Commands, quiet: bool) -> Result<i32> {
    match command {
        Commands::Compare {
            left,
            right,
            config,
            primary_key,
            ignore_case,
            null_not_equal,
            tolerance,
            report,
            max_samples,
            export_dir,
            format,
            fail_on_diff,
        } => compare_command(
            CompareOptions {
                left,
                right,
                config,
                primary_key,
                ignore_case,
                null_not_equal,
                tolerance,
                report,
                max_samples,
                export_dir,
                format,
                fail_on_diff,
            },
            quiet,
        ),
        Commands::Validate {
            left,
            right,
            config,
        } => validate_command(&left, &right, &config, quiet),
        Commands::InitConfig { output, force } => init_config_command(&output, force),
    }
}

fn open_session() -> Result<Session> {
    let config = SessionConfig::from_env_vars(std::env::vars())?;
    Session::with_config(&config)
}

fn load_datasets(session: &Session, left: &Path, right: &Path) -> Result<(LazyFrame, LazyFrame)> {
    let left_frame = session.scan(left)?;
    let right_frame = session.scan(right)?;
    log::debug!("Scanning {} and {}", left.display(), right.display());
    Ok((left_frame, right_frame))
}

/// Settings from file or inferred from the data, with env and flag overrides
fn resolve_settings(
    options: &CompareOptions,
    left: &LazyFrame,
    right: &LazyFrame,
) -> Result<ComparisonSettings> {
    let mut settings = match &options.config {
        Some(path) => ComparisonSettings::load(path)?,
        None => {
            let inferred = ComparisonConfig::infer(left, right, &options.primary_key)?;
            log::info!(
                "Inferred {} mapped column(s) from shared column names",
                inferred.column_mappings().len()
            );
            ComparisonSettings::from_config(&inferred)
        }
    };

    settings.apply_env_overrides(std::env::vars())?;
    if options.ignore_case {
        settings.ignore_case = true;
    }
    if options.null_not_equal {
        settings.null_equals_null = false;
    }
    for (column, threshold) in &options.tolerance {
        settings.tolerance.insert(column.clone(), *threshold);
    }
    Ok(settings)
}

/// Compare two datasets and report the outcome
pub fn compare_command(options: CompareOptions, quiet: bool) -> Result<i32> {
    let mut progress = StageReporter::new(!quiet);

    progress.start("Loading datasets...");
    let session = open_session()?;
    let (left, right) = load_datasets(&session, &options.left, &options.right)?;
    let config = Arc::new(resolve_settings(&options, &left, &right)?.into_config()?);
    progress.finish("✅ Configuration ready");

    progress.start("Comparing datasets...");
    let engine = ComparisonEngine::new(Arc::clone(&config));
    let result = match timed("compare", || engine.compare(&left, &right)) {
        Ok(result) => result,
        Err(e) => {
            progress.abandon();
            return Err(e);
        }
    };
    progress.finish("✅ Comparison complete");

    log::info!("Comparison run {}", result.run_id());

    match options.report {
        ReportKind::Summary => println!("{}", ComparisonReport::new(&result).summary_report()),
        ReportKind::Detailed => println!(
            "{}",
            ComparisonReport::new(&result).detailed_report(options.max_samples)?
        ),
        ReportKind::None => {}
    }

    if let Some(dir) = &options.export_dir {
        progress.start("Exporting results...");
        let artifacts = ResultExporter::export(&result, dir, options.format)?;
        progress.finish("✅ Export complete");
        println!("📁 Exported to {}", dir.display());
        for (i, (name, path)) in artifacts.iter().enumerate() {
            let prefix = if i == artifacts.len() - 1 { "└─" } else { "├─" };
            println!("{} {}: {}", prefix, name, path.display());
        }
    }

    if options.fail_on_diff && result.summary().has_differences() {
        return Ok(EXIT_DIFFERENCES_FOUND);
    }
    Ok(EXIT_SUCCESS)
}

/// Run every pre-flight check on both sides and print the outcome
pub fn validate_command(left: &Path, right: &Path, config_path: &Path, quiet: bool) -> Result<i32> {
    let mut progress = StageReporter::new(!quiet);

    progress.start("Validating datasets...");
    let mut settings = ComparisonSettings::load(config_path)?;
    settings.apply_env_overrides(std::env::vars())?;
    let left_checks = settings.left_checks.clone().unwrap_or_default();
    let right_checks = settings.right_checks.clone().unwrap_or_default();
    let config = settings.into_config()?;

    let session = open_session()?;
    let (left_frame, right_frame) = load_datasets(&session, left, right)?;
    let service = ValidationService::new();

    let resolved = config.resolved();
    let sides = [
        (
            Side::Left,
            &left_frame,
            config.left_schema(),
            resolved.left_key_columns(),
            &left_checks,
        ),
        (
            Side::Right,
            &right_frame,
            config.right_schema(),
            resolved.right_key_columns(),
            &right_checks,
        ),
    ];

    let mut outcomes: Vec<(Side, Vec<ValidationResult>)> = Vec::new();
    for (side, frame, schema, keys, checks) in sides {
        let results = timed("validation", || -> Result<Vec<ValidationResult>> {
            let mut results = vec![
                service.validate_schema(frame, schema)?,
                service.validate_primary_key_uniqueness(frame, &keys)?,
            ];
            results.extend(service.run_comprehensive(frame, checks)?);
            Ok(results)
        })?;
        outcomes.push((side, results));
    }
    progress.finish("✅ Validation complete");

    for (side, results) in &outcomes {
        println!("{}", render_validation(&format!("{} dataset", side), results));
    }

    // Schema problems outrank key problems, matching the order compare checks them
    for (side, results) in &outcomes {
        if let Some(schema) = results.iter().find(|r| r.check == "schema" && !r.is_valid) {
            return Err(CompareError::SchemaViolation {
                side: *side,
                errors: schema.errors.clone(),
            });
        }
    }
    for (side, frame, keys) in [
        (Side::Left, &left_frame, resolved.left_key_columns()),
        (Side::Right, &right_frame, resolved.right_key_columns()),
    ] {
        let failed = outcomes.iter().any(|(s, results)| {
            *s == side
                && results
                    .iter()
                    .any(|r| r.check == "primary_key" && !r.is_valid)
        });
        if failed {
            return Err(CompareError::PrimaryKeyViolation {
                side,
                duplicate_groups: service.duplicate_key_groups(frame, &keys)?,
                key_columns: keys,
            });
        }
    }

    let quality_failures = outcomes
        .iter()
        .flat_map(|(_, results)| results.iter())
        .filter(|r| !r.is_valid)
        .count();
    if quality_failures > 0 {
        return Err(CompareError::invalid_input(format!(
            "{} data quality check(s) failed",
            quality_failures
        )));
    }

    println!("✅ Both datasets passed validation");
    Ok(EXIT_SUCCESS)
}

/// Write a template settings file
fn init_config_command(output: &Path, force: bool) -> Result<i32> {
    if output.exists() && !force {
        return Err(CompareError::invalid_input(format!(
            "{} already exists (use --force to overwrite)",
            output.display()
        )));
    }
    ComparisonSettings::template()?.save(output)?;
    println!("✅ Wrote template configuration to {}", output.display());
    Ok(EXIT_SUCCESS)
}
