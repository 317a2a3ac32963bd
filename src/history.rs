use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: anyhow::Error,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub records: Vec<Value>,
    pub failures: Vec<FileFailure>,
}

/// Reads every file in order and concatenates their records. A file that
/// cannot be read or decoded is recorded as a failure and skipped.
pub fn load_history(paths: &[PathBuf]) -> LoadReport {
    let mut report = LoadReport::default();
    for path in paths {
        match load_history_file(path) {
            Ok(records) => {
                log::debug!("loaded {} records from {}", records.len(), path.display());
                report.records.extend(records);
            }
            Err(error) => {
                log::warn!("skipping {}: {error:#}", path.display());
                report.failures.push(FileFailure {
                    path: path.clone(),
                    error,
                });
            }
        }
    }
    report
}

pub fn load_history_file(path: &Path) -> Result<Vec<Value>> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    parse_records(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}

/// Decodes one export document. Records are kept as raw JSON so a single odd
/// entry never rejects the whole file.
pub fn parse_records(raw: &str) -> Result<Vec<Value>> {
    let records: Vec<Value> = serde_json::from_str(raw)?;
    Ok(records)
}

pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime> {
    let parsed = PrimitiveDateTime::parse(raw.trim(), TIMESTAMP_FORMAT)
        .with_context(|| format!("invalid timestamp {raw:?}"))?;
    Ok(parsed.assume_utc())
}

pub fn parse_date(raw: &str) -> Result<Date> {
    Date::parse(raw.trim(), DATE_FORMAT).with_context(|| format!("invalid date {raw:?}"))
}

pub fn record_timestamp(record: &Value) -> Option<OffsetDateTime> {
    let raw = record.get("ts")?.as_str()?;
    parse_timestamp(raw).ok()
}
