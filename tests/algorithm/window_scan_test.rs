use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Float64Array, Int64Array, StringArray, TimestampNanosecondArray,
    UInt64Array,
};
use arrow::record_batch::RecordBatch;
use arrow::datatypes::{DataType, TimeUnit};
use chrono::{Duration, NaiveDateTime};
use clinical_timeline::schema::{ENCOUNTER_BLOCK, RECORDED_DTTM};
use clinical_timeline::{Error, ScanConfig, scan_batches};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::utils::{
    VentRow, at, batch_of, full_row, strings, timestamp_column, timestamps, ventilator_batch,
};

fn scan(rows: &[VentRow<'_>], window_hours: f64) -> Vec<(String, NaiveDateTime)> {
    let batch = ventilator_batch(rows, None);
    let output = scan_batches(&[batch], &ScanConfig::new(window_hours)).expect("scan succeeds");
    let encounters = strings(&output, ENCOUNTER_BLOCK);
    let times = timestamps(&output, RECORDED_DTTM);
    encounters
        .into_iter()
        .map(|e| e.expect("non-null encounter"))
        .zip(times)
        .collect()
}

/// Single-encounter batch at nanosecond precision
///
/// Each row is `(nanos, has device and mode, has FiO2 and PEEP)`.
fn nanosecond_batch(rows: &[(i64, bool, bool)]) -> RecordBatch {
    batch_of(vec![
        (
            ENCOUNTER_BLOCK,
            Arc::new(StringArray::from(vec!["E1"; rows.len()])) as ArrayRef,
        ),
        (
            RECORDED_DTTM,
            Arc::new(TimestampNanosecondArray::from(
                rows.iter().map(|r| r.0).collect::<Vec<_>>(),
            )),
        ),
        (
            "device_category",
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.1.then_some("IMV")).collect::<Vec<_>>(),
            )),
        ),
        (
            "mode_category",
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.1.then_some("AC/VC")).collect::<Vec<_>>(),
            )),
        ),
        (
            "fio2_set",
            Arc::new(Float64Array::from(
                rows.iter().map(|r| r.2.then_some(0.4)).collect::<Vec<_>>(),
            )),
        ),
        (
            "peep_set",
            Arc::new(Float64Array::from(
                rows.iter().map(|r| r.2.then_some(5.0)).collect::<Vec<_>>(),
            )),
        ),
    ])
}

fn output_nanos(batch: &RecordBatch) -> Vec<i64> {
    batch
        .column_by_name(RECORDED_DTTM)
        .and_then(|c| c.as_any().downcast_ref::<TimestampNanosecondArray>())
        .expect("nanosecond output column")
        .values()
        .to_vec()
}

fn nanos_at(t: NaiveDateTime) -> i64 {
    t.and_utc().timestamp_nanos_opt().expect("in nanosecond range")
}

/// Quadratic reference: every distinct timestamp checked against every row
fn naive_scan(rows: &[VentRow<'_>], window_hours: f64) -> Vec<(String, NaiveDateTime)> {
    let half = Duration::microseconds((window_hours * 3_600_000_000.0).round() as i64);
    let mut result: Vec<(String, NaiveDateTime)> = rows
        .iter()
        .filter(|(enc, t, ..)| {
            let window: Vec<&VentRow<'_>> = rows
                .iter()
                .filter(|r| r.0 == *enc && r.1 >= *t - half && r.1 <= *t + half)
                .collect();
            window.iter().any(|r| r.2 == Some("IMV"))
                && window.iter().any(|r| r.3.is_some())
                && window.iter().any(|r| r.4.is_some_and(|v| !v.is_nan()))
                && window.iter().any(|r| r.5.is_some_and(|v| !v.is_nan()))
        })
        .map(|(enc, t, ..)| ((*enc).to_string(), *t))
        .collect();
    result.sort();
    result.dedup();
    result
}

#[test]
fn signals_split_across_rows_qualify_both_rows() {
    let rows = [
        ("E1", at(1, 8, 0), Some("IMV"), None, None, None),
        ("E1", at(1, 8, 30), None, Some("AC/VC"), Some(0.5), Some(8.0)),
    ];
    assert_eq!(
        scan(&rows, 1.0),
        vec![
            ("E1".to_string(), at(1, 8, 0)),
            ("E1".to_string(), at(1, 8, 30)),
        ]
    );
}

#[test]
fn window_edges_are_inclusive() {
    let rows = [
        ("E1", at(1, 8, 0), Some("IMV"), Some("PS"), None, None),
        ("E1", at(1, 9, 0), None, None, Some(0.3), Some(5.0)),
        ("E1", at(1, 10, 1), Some("IMV"), Some("PS"), None, None),
    ];
    let result = scan(&rows, 1.0);
    assert_eq!(
        result,
        vec![
            ("E1".to_string(), at(1, 8, 0)),
            ("E1".to_string(), at(1, 9, 0)),
        ]
    );
}

#[test]
fn non_imv_devices_never_qualify() {
    let rows = [
        ("E1", at(1, 8, 0), Some("NIPPV"), Some("CPAP"), Some(0.4), Some(5.0)),
        ("E1", at(1, 8, 10), Some("imv"), Some("CPAP"), Some(0.4), Some(5.0)),
    ];
    assert!(scan(&rows, 1.0).is_empty());
}

#[test]
fn zero_window_only_combines_rows_at_the_same_time() {
    let rows = [
        ("E1", at(1, 8, 0), Some("IMV"), Some("AC/VC"), None, None),
        ("E1", at(1, 8, 0), None, None, Some(0.4), Some(5.0)),
        ("E1", at(1, 9, 0), Some("IMV"), Some("AC/VC"), None, None),
        ("E1", at(1, 9, 1), None, None, Some(0.4), Some(5.0)),
    ];
    assert_eq!(scan(&rows, 0.0), vec![("E1".to_string(), at(1, 8, 0))]);
}

#[test]
fn duplicate_timestamps_yield_one_row() {
    let rows = [full_row("E1", at(1, 8, 0)), full_row("E1", at(1, 8, 0))];
    assert_eq!(scan(&rows, 1.0).len(), 1);
}

#[test]
fn nan_settings_count_as_missing() {
    let rows = [("E1", at(1, 8, 0), Some("IMV"), Some("AC/VC"), Some(f64::NAN), Some(5.0))];
    assert!(scan(&rows, 1.0).is_empty());
}

#[test]
fn input_order_does_not_change_output() {
    let rows = [
        full_row("B", at(1, 12, 0)),
        ("A", at(1, 7, 0), Some("IMV"), None, None, None),
        ("A", at(1, 7, 20), None, Some("SIMV"), Some(0.6), Some(10.0)),
        full_row("C", at(2, 1, 0)),
    ];
    let mut reversed = rows;
    reversed.reverse();
    assert_eq!(scan(&rows, 1.0), scan(&reversed, 1.0));
}

#[test]
fn widening_the_window_never_loses_timepoints() {
    let rows = [
        ("E1", at(1, 6, 0), Some("IMV"), None, None, None),
        ("E1", at(1, 7, 30), None, Some("AC/VC"), None, None),
        ("E1", at(1, 8, 0), None, None, Some(0.4), None),
        ("E1", at(1, 7, 45), Some("IMV"), None, None, None),
        ("E1", at(1, 8, 45), None, None, None, Some(5.0)),
    ];
    let narrow = scan(&rows, 1.0);
    let wide = scan(&rows, 3.0);
    assert_eq!(
        narrow,
        vec![
            ("E1".to_string(), at(1, 7, 45)),
            ("E1".to_string(), at(1, 8, 0)),
        ]
    );
    assert!(narrow.iter().all(|row| wide.contains(row)));
    assert_eq!(wide.len(), 5);
}

#[test]
fn timezone_and_encounter_type_are_preserved() {
    let batch = batch_of(vec![
        (
            ENCOUNTER_BLOCK,
            Arc::new(Int64Array::from(vec![42_i64, 42])) as ArrayRef,
        ),
        (
            RECORDED_DTTM,
            timestamp_column(vec![Some(at(1, 8, 0)), Some(at(1, 8, 15))], Some("UTC")),
        ),
        (
            "device_category",
            Arc::new(StringArray::from(vec![Some("IMV"), None])),
        ),
        (
            "mode_category",
            Arc::new(StringArray::from(vec![None, Some("AC/VC")])),
        ),
        ("fio2_set", Arc::new(Float64Array::from(vec![None, Some(0.5)]))),
        ("peep_set", Arc::new(Float64Array::from(vec![Some(5.0), None]))),
    ]);

    let output = scan_batches(&[batch], &ScanConfig::default()).expect("scan succeeds");
    let schema = output.schema();
    assert_eq!(output.num_rows(), 2);
    assert_eq!(
        schema.field_with_name(ENCOUNTER_BLOCK).expect("column").data_type(),
        &DataType::Int64
    );
    assert_eq!(
        schema.field_with_name(RECORDED_DTTM).expect("column").data_type(),
        &DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
    );
}

#[test]
fn empty_result_keeps_the_output_schema() {
    let rows = [("E1", at(1, 8, 0), Some("IMV"), None, None, None)];
    let output =
        scan_batches(&[ventilator_batch(&rows, None)], &ScanConfig::default()).expect("scan");
    assert_eq!(output.num_rows(), 0);
    assert_eq!(output.num_columns(), 2);
}

#[test]
fn missing_column_is_reported_before_scanning() {
    let good = ventilator_batch(&[full_row("E1", at(1, 8, 0))], None);
    let bad = batch_of(vec![
        (
            ENCOUNTER_BLOCK,
            Arc::new(StringArray::from(vec!["E2"])) as ArrayRef,
        ),
        (RECORDED_DTTM, timestamp_column(vec![Some(at(1, 9, 0))], None)),
    ]);

    let err = scan_batches(&[good, bad], &ScanConfig::default()).expect_err("schema error");
    assert!(matches!(err, Error::ColumnNotFound { .. }));
    assert!(err.is_schema_error());
}

#[test]
fn text_timestamps_are_a_type_error() {
    let batch = batch_of(vec![
        (
            ENCOUNTER_BLOCK,
            Arc::new(StringArray::from(vec!["E1"])) as ArrayRef,
        ),
        (RECORDED_DTTM, Arc::new(StringArray::from(vec!["2024-01-01 08:00"]))),
        ("device_category", Arc::new(StringArray::from(vec!["IMV"]))),
        ("mode_category", Arc::new(StringArray::from(vec!["AC/VC"]))),
        ("fio2_set", Arc::new(Float64Array::from(vec![0.4]))),
        ("peep_set", Arc::new(Float64Array::from(vec![5.0]))),
    ]);
    let err = scan_batches(&[batch], &ScanConfig::default()).expect_err("type error");
    assert!(matches!(err, Error::InvalidDataType { .. }));
}

#[test]
fn rows_with_null_timestamps_are_skipped() {
    let batch = batch_of(vec![
        (
            ENCOUNTER_BLOCK,
            Arc::new(StringArray::from(vec!["E1", "E1"])) as ArrayRef,
        ),
        (RECORDED_DTTM, timestamp_column(vec![None, Some(at(1, 8, 0))], None)),
        ("device_category", Arc::new(StringArray::from(vec![Some("IMV"), None]))),
        ("mode_category", Arc::new(StringArray::from(vec!["AC/VC", "AC/VC"]))),
        ("fio2_set", Arc::new(Float64Array::from(vec![0.4, 0.4]))),
        ("peep_set", Arc::new(Float64Array::from(vec![5.0, 5.0]))),
    ]);
    let output = scan_batches(&[batch], &ScanConfig::default()).expect("scan");
    assert_eq!(output.num_rows(), 0);
}

#[test]
fn matches_quadratic_reference_on_random_tables() {
    const DEVICES: [Option<&str>; 3] = [Some("IMV"), Some("NIPPV"), None];
    const MODES: [Option<&str>; 2] = [Some("AC/VC"), None];
    const ENCOUNTERS: [&str; 4] = ["E1", "E2", "E3", "E4"];
    let mut rng = StdRng::seed_from_u64(20_240_101);

    for _ in 0..25 {
        let n = rng.random_range(0..120);
        let rows: Vec<VentRow<'_>> = (0..n)
            .map(|_| {
                let minutes = rng.random_range(0..(3 * 24 * 60));
                let t = at(1, 0, 0) + Duration::minutes(minutes);
                (
                    ENCOUNTERS[rng.random_range(0..ENCOUNTERS.len())],
                    t,
                    DEVICES[rng.random_range(0..DEVICES.len())],
                    MODES[rng.random_range(0..MODES.len())],
                    rng.random_bool(0.5).then_some(0.4),
                    rng.random_bool(0.5).then_some(5.0),
                )
            })
            .collect();
        let window_hours = f64::from(rng.random_range(0..5_u32)) * 0.5;

        assert_eq!(scan(&rows, window_hours), naive_scan(&rows, window_hours));
    }
}

#[test]
fn isolated_complete_row_qualifies_at_any_window() {
    let rows = [
        full_row("E1", at(1, 8, 0)),
        ("E1", at(1, 20, 0), Some("IMV"), None, None, None),
    ];
    for window_hours in [0.0, 0.25, 1.0, 6.0] {
        assert!(scan(&rows, window_hours).contains(&("E1".to_string(), at(1, 8, 0))));
    }
}

#[test]
fn nanosecond_timestamps_are_kept_distinct() {
    let base = nanos_at(at(1, 8, 0));
    let batch = nanosecond_batch(&[(base + 100, true, true), (base + 900, true, true)]);
    let output = scan_batches(&[batch], &ScanConfig::default()).expect("scan");

    assert_eq!(
        output.schema().field_with_name(RECORDED_DTTM).expect("column").data_type(),
        &DataType::Timestamp(TimeUnit::Nanosecond, None)
    );
    assert_eq!(output_nanos(&output), vec![base + 100, base + 900]);
}

#[test]
fn window_edge_is_exact_at_nanosecond_precision() {
    const HOUR_NANOS: i64 = 3_600_000_000_000;
    let base = nanos_at(at(1, 8, 0));

    let outside = nanosecond_batch(&[(base, true, false), (base + HOUR_NANOS + 500, false, true)]);
    let output = scan_batches(&[outside], &ScanConfig::new(1.0)).expect("scan");
    assert_eq!(output.num_rows(), 0);

    let on_edge = nanosecond_batch(&[(base, true, false), (base + HOUR_NANOS, false, true)]);
    let output = scan_batches(&[on_edge], &ScanConfig::new(1.0)).expect("scan");
    assert_eq!(output_nanos(&output), vec![base, base + HOUR_NANOS]);
}

#[test]
fn unsigned_encounter_ids_are_never_dropped() {
    let batch_with = |id: u64| {
        batch_of(vec![
            (
                ENCOUNTER_BLOCK,
                Arc::new(UInt64Array::from(vec![id])) as ArrayRef,
            ),
            (RECORDED_DTTM, timestamp_column(vec![Some(at(1, 8, 0))], None)),
            ("device_category", Arc::new(StringArray::from(vec!["IMV"]))),
            ("mode_category", Arc::new(StringArray::from(vec!["AC/VC"]))),
            ("fio2_set", Arc::new(Float64Array::from(vec![0.4]))),
            ("peep_set", Arc::new(Float64Array::from(vec![5.0]))),
        ])
    };

    let output = scan_batches(&[batch_with(17)], &ScanConfig::default()).expect("scan");
    assert_eq!(output.num_rows(), 1);
    assert_eq!(
        output.schema().field_with_name(ENCOUNTER_BLOCK).expect("column").data_type(),
        &DataType::UInt64
    );

    let err = scan_batches(&[batch_with(u64::MAX)], &ScanConfig::default())
        .expect_err("id beyond i64 range");
    assert!(matches!(err, Error::Arrow(_)));
}

#[test]
fn mixed_encounter_types_fail_before_scanning() {
    let text = ventilator_batch(&[full_row("E1", at(1, 8, 0))], None);
    let ints = batch_of(vec![
        (
            ENCOUNTER_BLOCK,
            Arc::new(Int64Array::from(vec![2_i64])) as ArrayRef,
        ),
        (RECORDED_DTTM, timestamp_column(vec![Some(at(1, 9, 0))], None)),
        ("device_category", Arc::new(StringArray::from(vec!["IMV"]))),
        ("mode_category", Arc::new(StringArray::from(vec!["AC/VC"]))),
        ("fio2_set", Arc::new(Float64Array::from(vec![0.4]))),
        ("peep_set", Arc::new(Float64Array::from(vec![5.0]))),
    ]);

    let err = scan_batches(&[text, ints], &ScanConfig::default()).expect_err("type error");
    assert!(matches!(err, Error::InvalidDataType { ref column, .. } if column == ENCOUNTER_BLOCK));
}
