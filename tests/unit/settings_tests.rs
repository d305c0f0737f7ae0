//! Unit tests for settings files, config building and session tuning

use crate::common::{sample_data, TestFixture};
use tabcompare::config::ComparisonConfig;
use tabcompare::frame::SessionConfig;
use tabcompare::settings::{ComparisonSettings, IGNORE_CASE_VAR, NULL_EQUALS_NULL_VAR};
use tabcompare::CompareError;

#[test]
fn test_orders_settings_load_into_config() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .create_json("orders.json", &sample_data::orders_settings())
        .unwrap();

    let config = ComparisonSettings::load(&path).unwrap().into_config().unwrap();
    assert_eq!(config.primary_key(), ["order_id"]);
    assert!(!config.ignore_case());
    assert!(config.null_equals_null());

    let resolved = config.resolved();
    assert_eq!(resolved.left_key_columns(), vec!["order_id"]);
    assert_eq!(resolved.right_key_columns(), vec!["id"]);
    let values: Vec<&str> = resolved.values().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(values, vec!["customer", "status", "amount"]);
}

#[test]
fn test_unknown_mapped_column_is_mapping_error() {
    let fixture = TestFixture::new().unwrap();
    let mut settings = sample_data::orders_settings();
    settings["column_mappings"][1]["right"] = serde_json::json!("client");
    let path = fixture.create_json("broken.json", &settings).unwrap();

    let err = ComparisonSettings::load(&path)
        .unwrap()
        .into_config()
        .unwrap_err();
    match err {
        CompareError::Mapping { errors } => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].contains("'client'"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_unparameterized_list_is_config_error() {
    let fixture = TestFixture::new().unwrap();
    let mut settings = sample_data::orders_settings();
    settings["left_schema"]["columns"][1]["datatype"] = serde_json::json!("list");
    let path = fixture.create_json("list.json", &settings).unwrap();

    let err = ComparisonSettings::load(&path).unwrap_err();
    assert!(matches!(err, CompareError::Config { .. }));
    assert_eq!(err.exit_code(), tabcompare::error::EXIT_CONFIGURATION);
}

#[test]
fn test_env_overrides_flow_into_config() {
    let mut settings: ComparisonSettings =
        serde_json::from_value(sample_data::orders_settings()).unwrap();
    settings
        .apply_env_overrides(vec![
            (IGNORE_CASE_VAR.to_string(), "true".to_string()),
            (NULL_EQUALS_NULL_VAR.to_string(), "false".to_string()),
        ])
        .unwrap();

    let config = settings.into_config().unwrap();
    assert!(config.ignore_case());
    assert!(!config.null_equals_null());
}

#[test]
fn test_settings_from_inferred_config_round_trip() {
    let fixture = TestFixture::new().unwrap();
    fixture
        .seed(
            "CREATE TABLE l (id BIGINT, name VARCHAR, score DOUBLE);
             CREATE TABLE r (id BIGINT, name VARCHAR, score DOUBLE, extra VARCHAR);",
        )
        .unwrap();

    let inferred =
        ComparisonConfig::infer(&fixture.table("l"), &fixture.table("r"), &["id".to_string()])
            .unwrap();
    let settings = ComparisonSettings::from_config(&inferred);
    let path = fixture.path("inferred.json");
    settings.save(&path).unwrap();

    let reloaded = ComparisonSettings::load(&path).unwrap().into_config().unwrap();
    assert_eq!(
        reloaded.fingerprint().unwrap(),
        inferred.fingerprint().unwrap()
    );
}

#[test]
fn test_session_config_env() {
    let config = SessionConfig::from_env_vars(vec![(
        SessionConfig::THREADS_VAR.to_string(),
        "0".to_string(),
    )]);
    assert!(config.is_err());

    let config = SessionConfig::from_env_vars(Vec::new()).unwrap();
    assert_eq!(config, SessionConfig::default());
}
