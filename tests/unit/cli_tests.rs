//! Unit tests for CLI argument parsing

use clap::Parser;
use std::path::PathBuf;
use tabcompare::cli::{Cli, Commands};
use tabcompare::frame::FileFormat;
use tabcompare::report::ReportKind;

#[test]
fn test_compare_defaults() {
    let cli = Cli::try_parse_from([
        "tabcompare",
        "compare",
        "--left",
        "left.csv",
        "--right",
        "right.parquet",
        "--config",
        "settings.json",
    ])
    .unwrap();

    assert!(!cli.verbose);
    assert!(!cli.quiet);
    match cli.command {
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
        } => {
            assert_eq!(left, PathBuf::from("left.csv"));
            assert_eq!(right, PathBuf::from("right.parquet"));
            assert_eq!(config, Some(PathBuf::from("settings.json")));
            assert!(primary_key.is_empty());
            assert!(!ignore_case);
            assert!(!null_not_equal);
            assert!(tolerance.is_empty());
            assert_eq!(report, ReportKind::Summary);
            assert_eq!(max_samples, tabcompare::DEFAULT_MAX_SAMPLES);
            assert!(export_dir.is_none());
            assert_eq!(format, FileFormat::Parquet);
            assert!(!fail_on_diff);
        }
        _ => panic!("Expected Compare command"),
    }
}

#[test]
fn test_compare_all_flags() {
    let cli = Cli::try_parse_from([
        "tabcompare",
        "--verbose",
        "compare",
        "--left",
        "l.csv",
        "--right",
        "r.csv",
        "--primary-key",
        "id",
        "--primary-key",
        "region",
        "--ignore-case",
        "--null-not-equal",
        "--tolerance",
        "amount=0.01",
        "--tolerance",
        "qty=1",
        "--report",
        "none",
        "--max-samples",
        "3",
        "--export-dir",
        "out",
        "--format",
        "csv",
        "--fail-on-diff",
    ])
    .unwrap();

    assert!(cli.verbose);
    match cli.command {
        Commands::Compare {
            primary_key,
            ignore_case,
            null_not_equal,
            tolerance,
            report,
            max_samples,
            export_dir,
            format,
            fail_on_diff,
            ..
        } => {
            assert_eq!(primary_key, vec!["id", "region"]);
            assert!(ignore_case);
            assert!(null_not_equal);
            assert_eq!(
                tolerance,
                vec![("amount".to_string(), 0.01), ("qty".to_string(), 1.0)]
            );
            assert_eq!(report, ReportKind::None);
            assert_eq!(max_samples, 3);
            assert_eq!(export_dir, Some(PathBuf::from("out")));
            assert_eq!(format, FileFormat::Csv);
            assert!(fail_on_diff);
        }
        _ => panic!("Expected Compare command"),
    }
}

#[test]
fn test_invalid_values_rejected() {
    let base = ["tabcompare", "compare", "--left", "l.csv", "--right", "r.csv", "--primary-key", "id"];

    for extra in [
        vec!["--report", "verbose"],
        vec!["--format", "xlsx"],
        vec!["--max-samples", "0"],
        vec!["--tolerance", "amount"],
        vec!["--tolerance", "amount=-0.5"],
    ] {
        let mut args: Vec<&str> = base.to_vec();
        args.extend(extra.iter());
        assert!(Cli::try_parse_from(args.clone()).is_err(), "{:?} should fail", extra);
    }
}

#[test]
fn test_validate_and_init_config() {
    let cli = Cli::try_parse_from([
        "tabcompare",
        "validate",
        "--left",
        "l.csv",
        "--right",
        "r.csv",
        "--config",
        "c.json",
    ])
    .unwrap();
    assert!(matches!(cli.command, Commands::Validate { .. }));

    let missing_config =
        Cli::try_parse_from(["tabcompare", "validate", "--left", "l.csv", "--right", "r.csv"]);
    assert!(missing_config.is_err());

    let cli = Cli::try_parse_from(["tabcompare", "-q", "init-config"]).unwrap();
    assert!(cli.quiet);
    match cli.command {
        Commands::InitConfig { output, force } => {
            assert_eq!(output, PathBuf::from("tabcompare.json"));
            assert!(!force);
        }
        _ => panic!("Expected InitConfig command"),
    }
}

#[test]
fn test_global_log_level() {
    let cli = Cli::try_parse_from(["tabcompare", "init-config", "--log-level", "debug"]).unwrap();
    assert_eq!(cli.log_level.as_deref(), Some("debug"));
}
