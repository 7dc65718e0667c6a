//! Run repository storage (JSON run records, Parquet metric series)
//!
//! **Write Pattern**:
//! - A run is persisted when it is closed: one JSON file for the run
//!   record (status, flags, params) and one Parquet file for its metrics
//! - Resuming a run loads both back; closing it again rewrites both
//!
//! ## Layout
//!
//! ```text
//! <repo>/
//!   runs/
//!     <hash>.json      RunRecord (serde_json)
//!     <hash>.parquet   metrics: name, context, step, value, timestamp_ms
//! ```

use crate::experiment::{Context, MetricRecord, RunRecord};
use crate::{Error, Result};
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use chrono::DateTime;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Directory (under the repository root) holding run files
pub const RUNS_DIR: &str = "runs";

/// Arrow schema of a persisted metric series
#[must_use]
pub fn metrics_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("name", DataType::Utf8, false),
        Field::new("context", DataType::Utf8, false),
        Field::new("step", DataType::UInt64, false),
        Field::new("value", DataType::Float64, false),
        Field::new("timestamp_ms", DataType::Int64, false),
    ]))
}

/// Convert metric samples into one record batch
///
/// # Errors
/// Returns error if a context cannot be serialized or the batch is invalid
pub fn metrics_to_batch(metrics: &[MetricRecord]) -> Result<RecordBatch> {
    let contexts = metrics
        .iter()
        .map(|m| serde_json::to_string(m.context()))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(metrics.iter().map(MetricRecord::name))),
        Arc::new(StringArray::from_iter_values(contexts)),
        Arc::new(UInt64Array::from_iter_values(metrics.iter().map(MetricRecord::step))),
        Arc::new(Float64Array::from_iter_values(metrics.iter().map(MetricRecord::value))),
        Arc::new(Int64Array::from_iter_values(
            metrics.iter().map(|m| m.timestamp().timestamp_millis()),
        )),
    ];

    Ok(RecordBatch::try_new(metrics_schema(), columns)?)
}

/// Convert a record batch back into metric samples of `run_hash`
///
/// # Errors
/// Returns error if a column is missing, mistyped, or holds an invalid
/// context or timestamp
pub fn batch_to_metrics(run_hash: &str, batch: &RecordBatch) -> Result<Vec<MetricRecord>> {
    let names = column::<StringArray>(batch, "name")?;
    let contexts = column::<StringArray>(batch, "context")?;
    let steps = column::<UInt64Array>(batch, "step")?;
    let values = column::<Float64Array>(batch, "value")?;
    let timestamps = column::<Int64Array>(batch, "timestamp_ms")?;

    (0..batch.num_rows())
        .map(|row| -> Result<MetricRecord> {
            let context: Context = serde_json::from_str(contexts.value(row))?;
            let timestamp = DateTime::from_timestamp_millis(timestamps.value(row)).ok_or_else(|| {
                Error::StorageError(format!("Invalid metric timestamp in row {row}"))
            })?;
            Ok(
                MetricRecord::builder(run_hash, names.value(row), steps.value(row), values.value(row))
                    .context(context)
                    .timestamp(timestamp)
                    .build(),
            )
        })
        .collect()
}

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|array| array.as_any().downcast_ref::<T>())
        .ok_or_else(|| Error::StorageError(format!("Metric column '{name}' missing or mistyped")))
}

/// Write metric samples to a Parquet file
///
/// # Errors
/// Returns error if the file cannot be created or written
pub fn write_metrics<P: AsRef<Path>>(path: P, metrics: &[MetricRecord]) -> Result<()> {
    use parquet::arrow::ArrowWriter;

    let batch = metrics_to_batch(metrics)?;
    let file = File::create(path.as_ref())?;

    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)
        .map_err(|e| Error::StorageError(format!("Failed to create Parquet writer: {e}")))?;
    writer
        .write(&batch)
        .map_err(|e| Error::StorageError(format!("Failed to write metric batch: {e}")))?;
    writer
        .close()
        .map_err(|e| Error::StorageError(format!("Failed to finish Parquet file: {e}")))?;

    Ok(())
}

/// Read metric samples of `run_hash` from a Parquet file
///
/// # Errors
/// Returns error if file cannot be read or parsed
pub fn read_metrics<P: AsRef<Path>>(path: P, run_hash: &str) -> Result<Vec<MetricRecord>> {
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    let file = File::open(path.as_ref())
        .map_err(|e| Error::StorageError(format!("Failed to open Parquet file: {e}")))?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| Error::StorageError(format!("Failed to parse Parquet file: {e}")))?;

    let reader = builder
        .build()
        .map_err(|e| Error::StorageError(format!("Failed to create Parquet reader: {e}")))?;

    let mut metrics = Vec::new();
    for batch in reader {
        let batch =
            batch.map_err(|e| Error::StorageError(format!("Failed to read record batch: {e}")))?;
        metrics.extend(batch_to_metrics(run_hash, &batch)?);
    }

    Ok(metrics)
}

/// Paths of the record and metric files of one run
#[must_use]
pub fn run_paths(location: &Path, run_hash: &str) -> (PathBuf, PathBuf) {
    let dir = location.join(RUNS_DIR);
    (
        dir.join(format!("{run_hash}.json")),
        dir.join(format!("{run_hash}.parquet")),
    )
}

/// Persist a run record and its metrics under `location`
///
/// # Errors
/// Returns error if the run directory or files cannot be written
pub fn save_run(location: &Path, run: &RunRecord, metrics: &[MetricRecord]) -> Result<()> {
    fs::create_dir_all(location.join(RUNS_DIR))?;
    let (record_path, metrics_path) = run_paths(location, run.run_hash());

    let mut writer = BufWriter::new(File::create(&record_path)?);
    serde_json::to_writer_pretty(&mut writer, run)?;
    writer.flush()?;
    write_metrics(&metrics_path, metrics)?;

    debug!(run = run.run_hash(), samples = metrics.len(), "run persisted");
    Ok(())
}

/// Load every persisted run under `location`, ordered by hash
///
/// A repository without a runs directory is empty, not an error.
///
/// # Errors
/// Returns error if a run record or metric file is unreadable
pub fn load_runs(location: &Path) -> Result<Vec<(RunRecord, Vec<MetricRecord>)>> {
    let dir = location.join(RUNS_DIR);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut record_paths: Vec<PathBuf> = fs::read_dir(&dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    record_paths.retain(|path| path.extension().is_some_and(|ext| ext == "json"));
    record_paths.sort();

    let mut runs = Vec::with_capacity(record_paths.len());
    for record_path in record_paths {
        let run: RunRecord = serde_json::from_reader(BufReader::new(File::open(&record_path)?))?;
        let metrics_path = record_path.with_extension("parquet");
        let metrics = if metrics_path.exists() {
            read_metrics(&metrics_path, run.run_hash())?
        } else {
            Vec::new()
        };
        runs.push((run, metrics));
    }

    Ok(runs)
}
