//! Behavioral properties of the comparison engine

use crate::common::{simple_config, TestFixture};
use duckdb::types::Value;
use std::collections::BTreeSet;
use tabcompare::{compare, DataType};

fn key_set(frame: &tabcompare::LazyFrame) -> BTreeSet<i64> {
    let batch = frame.collect().unwrap();
    batch
        .column("PK_id")
        .unwrap()
        .into_iter()
        .map(|v| match v {
            Value::BigInt(i) => *i,
            other => panic!("unexpected key value {other:?}"),
        })
        .collect()
}

#[test]
fn test_partition_completeness() {
    let fixture = TestFixture::new().unwrap();
    fixture
        .seed(
            "CREATE TABLE l (id BIGINT, v DOUBLE);
             CREATE TABLE r (id BIGINT, v DOUBLE);
             INSERT INTO l SELECT i, i * 1.5 FROM range(0, 200) t(i);
             INSERT INTO r SELECT i, CASE WHEN i % 7 = 0 THEN i * 2.0 ELSE i * 1.5 END
                 FROM range(50, 260) t(i);",
        )
        .unwrap();

    let config = simple_config("v", DataType::Float, |b| b);
    let result = compare(config, &fixture.table("l"), &fixture.table("r")).unwrap();

    let left_keys: BTreeSet<i64> = (0..200).collect();
    let right_keys: BTreeSet<i64> = (50..260).collect();
    let diffs = key_set(result.value_differences());
    let left_only = key_set(result.left_only_records());
    let right_only = key_set(result.right_only_records());

    // Every key lands in exactly one partition per side
    assert!(diffs.is_disjoint(&left_only));
    assert!(diffs.is_disjoint(&right_only));
    assert!(diffs.iter().all(|k| left_keys.contains(k) && right_keys.contains(k)));
    assert_eq!(left_only, left_keys.difference(&right_keys).copied().collect());
    assert_eq!(right_only, right_keys.difference(&left_keys).copied().collect());

    let expected_diffs: BTreeSet<i64> = (50..200).filter(|i| i % 7 == 0 && *i != 0).collect();
    assert_eq!(diffs, expected_diffs);

    let summary = result.summary();
    assert_eq!(summary.total_left_records, 200);
    assert_eq!(summary.total_right_records, 210);
    assert_eq!(summary.left_only_count, 50);
    assert_eq!(summary.right_only_count, 60);
    assert_eq!(summary.value_differences_count, expected_diffs.len() as u64);
    assert_eq!(
        summary.matching_records + summary.value_differences_count + summary.left_only_count,
        summary.total_left_records
    );
    assert_eq!(
        summary.matching_records + summary.value_differences_count + summary.right_only_count,
        summary.total_right_records
    );
}

#[test]
fn test_tolerance_boundary_is_inclusive() {
    let fixture = TestFixture::new().unwrap();
    fixture
        .seed(
            "CREATE TABLE l (id BIGINT, v DOUBLE);
             CREATE TABLE r (id BIGINT, v DOUBLE);
             INSERT INTO l VALUES (1, 10.0), (2, 10.0), (3, 10.0);
             INSERT INTO r VALUES (1, 10.25), (2, 10.2578125), (3, 9.75);",
        )
        .unwrap();

    // 0.25 and 0.0078125 are exactly representable, so the boundary is exact
    let config = simple_config("v", DataType::Float, |b| b.tolerance("v", 0.25));
    let result = compare(config, &fixture.table("l"), &fixture.table("r")).unwrap();

    assert_eq!(key_set(result.value_differences()), BTreeSet::from([2]));
    assert_eq!(result.summary().matching_records, 2);
}

#[test]
fn test_tolerance_on_integer_columns() {
    let fixture = TestFixture::new().unwrap();
    fixture
        .seed(
            "CREATE TABLE l (id BIGINT, qty INTEGER);
             CREATE TABLE r (id BIGINT, qty INTEGER);
             INSERT INTO l VALUES (1, 10), (2, 10);
             INSERT INTO r VALUES (1, 12), (2, 13);",
        )
        .unwrap();

    let config = simple_config("qty", DataType::Integer, |b| b.tolerance("qty", 2.0));
    let result = compare(config, &fixture.table("l"), &fixture.table("r")).unwrap();
    assert_eq!(key_set(result.value_differences()), BTreeSet::from([2]));
}

#[test]
fn test_integer_tolerance_beyond_double_precision() {
    let fixture = TestFixture::new().unwrap();
    fixture
        .seed(
            "CREATE TABLE l (id BIGINT, n BIGINT);
             CREATE TABLE r (id BIGINT, n BIGINT);
             INSERT INTO l VALUES (1, 9007199254740993), (2, 9007199254740993), (3, 9223372036854775807);
             INSERT INTO r VALUES (1, 9007199254740992), (2, 9007199254740993), (3, 9223372036854775806);",
        )
        .unwrap();

    let exact = simple_config("n", DataType::Integer, |b| b.tolerance("n", 0.0));
    let result = compare(exact, &fixture.table("l"), &fixture.table("r")).unwrap();
    assert_eq!(key_set(result.value_differences()), BTreeSet::from([1, 3]));

    let within_one = simple_config("n", DataType::Integer, |b| b.tolerance("n", 1.0));
    let result = compare(within_one, &fixture.table("l"), &fixture.table("r")).unwrap();
    assert!(result.value_differences().collect().unwrap().is_empty());
    assert_eq!(result.summary().matching_records, 3);
}

#[test]
fn test_null_equality_toggle() {
    let fixture = TestFixture::new().unwrap();
    fixture
        .seed(
            "CREATE TABLE l (id BIGINT, note VARCHAR);
             CREATE TABLE r (id BIGINT, note VARCHAR);
             INSERT INTO l VALUES (1, NULL), (2, NULL), (3, 'x');
             INSERT INTO r VALUES (1, NULL), (2, 'y'), (3, 'x');",
        )
        .unwrap();

    let lenient = simple_config("note", DataType::String, |b| b);
    let result = compare(lenient, &fixture.table("l"), &fixture.table("r")).unwrap();
    assert_eq!(key_set(result.value_differences()), BTreeSet::from([2]));

    let strict = simple_config("note", DataType::String, |b| b.null_equals_null(false));
    let result = compare(strict, &fixture.table("l"), &fixture.table("r")).unwrap();
    assert_eq!(key_set(result.value_differences()), BTreeSet::from([1, 2]));
    assert_eq!(result.summary().matching_records, 1);
}

#[test]
fn test_case_insensitivity() {
    let fixture = TestFixture::new().unwrap();
    fixture
        .seed(
            "CREATE TABLE l (id BIGINT, status VARCHAR);
             CREATE TABLE r (id BIGINT, status VARCHAR);
             INSERT INTO l VALUES (1, 'Pending');
             INSERT INTO r VALUES (1, 'pending');",
        )
        .unwrap();

    let sensitive = simple_config("status", DataType::String, |b| b);
    let result = compare(sensitive, &fixture.table("l"), &fixture.table("r")).unwrap();
    assert_eq!(result.summary().value_differences_count, 1);

    // Original casing survives in the output
    let diffs = result.value_differences().collect().unwrap();
    assert_eq!(diffs.rows[0][1], Value::Text("Pending".to_string()));
    assert_eq!(diffs.rows[0][2], Value::Text("pending".to_string()));

    let insensitive = simple_config("status", DataType::String, |b| b.ignore_case(true));
    let result = compare(insensitive, &fixture.table("l"), &fixture.table("r")).unwrap();
    assert_eq!(result.summary().value_differences_count, 0);
    assert_eq!(result.summary().matching_records, 1);
}

#[test]
fn test_any_column_difference_flags_record() {
    let fixture = TestFixture::new().unwrap();
    fixture
        .seed(
            "CREATE TABLE l (id BIGINT, a VARCHAR, b DOUBLE, c BOOLEAN);
             CREATE TABLE r (id BIGINT, a VARCHAR, b DOUBLE, c BOOLEAN);
             INSERT INTO l VALUES (1, 'x', 1.0, true), (2, 'x', 1.0, true), (3, 'x', 1.0, true);
             INSERT INTO r VALUES (1, 'x', 1.0, true), (2, 'x', 1.0, false), (3, 'z', 9.0, false);",
        )
        .unwrap();

    let left = fixture.table("l");
    let right = fixture.table("r");
    let config = tabcompare::ComparisonConfig::infer(&left, &right, &["id".to_string()]).unwrap();
    let result = compare(std::sync::Arc::new(config), &left, &right).unwrap();

    assert_eq!(key_set(result.value_differences()), BTreeSet::from([2, 3]));
    let columns = result.value_differences().column_names().unwrap();
    assert_eq!(
        columns,
        vec!["PK_id", "L_a", "R_a", "L_b", "R_b", "L_c", "R_c"]
    );
}

#[test]
fn test_idempotent_summaries_and_restartable_plans() {
    let fixture = TestFixture::new().unwrap();
    fixture
        .seed(
            "CREATE TABLE l (id BIGINT, v DOUBLE);
             CREATE TABLE r (id BIGINT, v DOUBLE);
             INSERT INTO l VALUES (1, 1.0), (2, 2.0), (3, 3.0);
             INSERT INTO r VALUES (2, 2.5), (3, 3.0), (4, 4.0);",
        )
        .unwrap();

    let config = simple_config("v", DataType::Float, |b| b);
    let first = compare(config.clone(), &fixture.table("l"), &fixture.table("r")).unwrap();
    let second = compare(config, &fixture.table("l"), &fixture.table("r")).unwrap();

    assert_eq!(first.summary().counts(), second.summary().counts());
    assert_ne!(first.run_id(), second.run_id());

    let once = first.value_differences().collect().unwrap();
    let twice = first.value_differences().collect().unwrap();
    assert_eq!(once, twice);
}
