use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array};
use arrow::record_batch::RecordBatch;
use clinical_timeline::config::DEFAULT_BATCH_SIZE;
use clinical_timeline::schema::{
    ADT_COLUMNS, ENCOUNTER_BLOCK, ICU_RANK, RECORDED_DTTM, VENTILATOR_COLUMNS,
};
use clinical_timeline::{
    ScanConfig, StitchConfig, read_parquet_async, read_table_async, scan_batches, stitch_batches,
    write_parquet,
};
use tempfile::tempdir;

use crate::utils::{adt_batch, at, full_row, ints, strings, timestamps, ventilator_batch};

fn with_extra_column(batch: &RecordBatch) -> RecordBatch {
    let mut columns: Vec<(String, ArrayRef)> = batch
        .schema()
        .fields()
        .iter()
        .zip(batch.columns())
        .map(|(field, array)| (field.name().clone(), Arc::clone(array)))
        .collect();
    let extra: ArrayRef = Arc::new(Int64Array::from_iter_values(0..batch.num_rows() as i64));
    columns.push(("device_name".to_string(), extra));
    RecordBatch::try_from_iter(columns).expect("valid batch")
}

#[tokio::test]
async fn projection_drops_unrequested_columns() -> clinical_timeline::Result<()> {
    let temp = tempdir()?;
    let dir = temp.path();
    let path = dir.join("ventilator.parquet");
    let batch = with_extra_column(&ventilator_batch(&[full_row("E1", at(1, 8, 0))], None));
    write_parquet(&path, &batch, DEFAULT_BATCH_SIZE)?;

    let batches = read_parquet_async(&path, Some(&VENTILATOR_COLUMNS[..]), None).await?;
    let schema = batches[0].schema();
    assert_eq!(schema.fields().len(), VENTILATOR_COLUMNS.len());
    assert!(schema.field_with_name("device_name").is_err());

    Ok(())
}

#[tokio::test]
async fn directory_tables_are_read_in_path_order() -> clinical_timeline::Result<()> {
    let temp = tempdir()?;
    let dir = temp.path();
    let second = ventilator_batch(&[full_row("E2", at(1, 9, 0))], None);
    let first = ventilator_batch(&[full_row("E1", at(1, 8, 0))], None);
    write_parquet(&dir.join("part-1.parquet"), &second, DEFAULT_BATCH_SIZE)?;
    write_parquet(&dir.join("part-0.parquet"), &first, DEFAULT_BATCH_SIZE)?;
    std::fs::write(dir.join("README.txt"), "not a table")?;

    let batches = read_table_async(dir, &VENTILATOR_COLUMNS, DEFAULT_BATCH_SIZE).await?;
    let encounters: Vec<Option<String>> = batches
        .iter()
        .flat_map(|batch| strings(batch, ENCOUNTER_BLOCK))
        .collect();
    assert_eq!(
        encounters,
        vec![Some("E1".to_string()), Some("E2".to_string())]
    );

    Ok(())
}

#[tokio::test]
async fn derived_tables_survive_a_parquet_round_trip() -> clinical_timeline::Result<()> {
    let temp = tempdir()?;
    let dir = temp.path();

    let ventilator = ventilator_batch(
        &[full_row("E1", at(1, 8, 0)), full_row("E1", at(1, 8, 30))],
        Some("UTC"),
    );
    let adt = adt_batch(
        &[
            ("E1", at(1, 7, 0), at(1, 10, 0), "icu", Some("medical_icu")),
            ("E1", at(2, 7, 0), at(2, 10, 0), "icu", Some("cardiac_icu")),
        ],
        Some("UTC"),
    );
    let ventilator_path = dir.join("input/ventilator.parquet");
    let adt_path = dir.join("input/adt.parquet");
    write_parquet(&ventilator_path, &ventilator, DEFAULT_BATCH_SIZE)?;
    write_parquet(&adt_path, &adt, DEFAULT_BATCH_SIZE)?;

    let (vent_batches, adt_batches) = tokio::try_join!(
        read_table_async(&ventilator_path, &VENTILATOR_COLUMNS, DEFAULT_BATCH_SIZE),
        read_table_async(&adt_path, &ADT_COLUMNS, DEFAULT_BATCH_SIZE),
    )?;

    let intubation = scan_batches(&vent_batches, &ScanConfig::default())?;
    let stays = stitch_batches(&adt_batches, &StitchConfig::default())?;
    let intubation_path = dir.join("output/intubation.parquet");
    let stays_path = dir.join("output/icu_stays.parquet");
    write_parquet(&intubation_path, &intubation, DEFAULT_BATCH_SIZE)?;
    write_parquet(&stays_path, &stays, DEFAULT_BATCH_SIZE)?;

    let reread = read_parquet_async(&intubation_path, None, None).await?;
    assert_eq!(reread[0].schema().fields(), intubation.schema().fields());
    assert_eq!(
        timestamps(&reread[0], RECORDED_DTTM),
        vec![at(1, 8, 0), at(1, 8, 30)]
    );

    let reread = read_parquet_async(&stays_path, None, None).await?;
    assert_eq!(ints(&reread[0], ICU_RANK), vec![1, 2]);

    Ok(())
}

#[tokio::test]
async fn missing_input_is_an_io_error() {
    let temp = tempdir().expect("temp dir");
    let dir = temp.path();
    let path = dir.join("nope.parquet");
    let err = read_table_async(&path, &ADT_COLUMNS, DEFAULT_BATCH_SIZE)
        .await
        .expect_err("missing file");
    assert!(matches!(err, clinical_timeline::Error::Io(_)));
}
