//! Dataset Loader - reads the telemetry CSV into raw records

use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use super::record::TelemetryRecord;
use crate::logic::error::{PipelineError, PipelineResult, Stage};

// ============================================================================
// COLUMN SCHEMA
// ============================================================================

/// Required numeric columns, each with its accepted header spellings
const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("ram_usage_mb", &["ram_usage_mb"]),
    ("swap_usage_mb", &["swap_usage_mb"]),
    ("cpu_usage", &["cpu_usage"]),
    ("page_fault_delta", &["page_fault_delta", "page_faults_delta"]),
];

/// Header positions resolved against one source table
#[derive(Debug, Clone)]
struct ColumnMap {
    ram: usize,
    swap: usize,
    cpu: usize,
    delta: usize,
    timestamp: Option<usize>,
    hostname: Option<usize>,
    os: Option<usize>,
    machine_id: Option<usize>,
}

fn normalize_header(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

fn find_column(headers: &[String], aliases: &[&str]) -> Option<usize> {
    headers.iter().position(|h| aliases.contains(&h.as_str()))
}

impl ColumnMap {
    fn resolve(path: &Path, raw_headers: &StringRecord) -> PipelineResult<Self> {
        let headers: Vec<String> = raw_headers.iter().map(normalize_header).collect();

        let mut found = Vec::with_capacity(REQUIRED_COLUMNS.len());
        let mut missing = Vec::new();
        for (name, aliases) in REQUIRED_COLUMNS {
            match find_column(&headers, aliases) {
                Some(idx) => found.push(idx),
                None => missing.push(name.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(PipelineError::SchemaMismatch {
                path: path.to_path_buf(),
                missing,
            });
        }

        Ok(Self {
            ram: found[0],
            swap: found[1],
            cpu: found[2],
            delta: found[3],
            timestamp: find_column(&headers, &["timestamp"]),
            hostname: find_column(&headers, &["hostname", "host"]),
            os: find_column(&headers, &["os"]),
            machine_id: find_column(&headers, &["machine_id"]),
        })
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Load the source table, discarding the first `warmup_rows` data rows.
pub fn load_records(path: &Path, warmup_rows: usize) -> PipelineResult<Vec<TelemetryRecord>> {
    let file = File::open(path).map_err(|source| PipelineError::SourceNotFound {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::csv(Stage::Load, e))?
        .clone();
    let columns = ColumnMap::resolve(path, &headers)?;

    let mut records = Vec::new();
    for (offset, row) in reader.records().enumerate().skip(warmup_rows) {
        let row = row.map_err(|e| PipelineError::csv(Stage::Load, e))?;
        // Header occupies line 1
        let line = row
            .position()
            .map(|p| p.line())
            .unwrap_or(offset as u64 + 2);
        records.push(parse_row(&row, &columns, &headers, line)?);
    }

    log::info!(
        "Loaded {} telemetry rows from {} ({} warm-up rows skipped)",
        records.len(),
        path.display(),
        warmup_rows
    );

    Ok(records)
}

fn parse_row(
    row: &StringRecord,
    columns: &ColumnMap,
    headers: &StringRecord,
    line: u64,
) -> PipelineResult<TelemetryRecord> {
    let number = |idx: usize| -> PipelineResult<f64> {
        let raw = row.get(idx).unwrap_or("");
        // "inf" and "NaN" parse as f64 but cannot be split on or persisted
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| PipelineError::MalformedRow {
                line,
                column: headers.get(idx).unwrap_or("?").to_string(),
                value: raw.to_string(),
            })
    };
    let text = |idx: Option<usize>| -> Option<String> {
        idx.and_then(|i| row.get(i))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Ok(TelemetryRecord {
        line,
        ram_usage_mb: number(columns.ram)?,
        swap_usage_mb: number(columns.swap)?,
        cpu_usage: number(columns.cpu)?,
        page_fault_delta: number(columns.delta)?,
        timestamp: text(columns.timestamp),
        hostname: text(columns.hostname),
        os: text(columns.os),
        machine_id: text(columns.machine_id),
    })
}
