//! Record normalizer — reads the raw CSV and coerces typed columns.
//!
//! RULE: a malformed cell never aborts the run. Unparsable timestamps and
//! amounts become missing; only an absent required column is fatal.
//! Short rows are padded with empty cells; cells past the last header are
//! dropped.

use crate::{
    error::{ScanError, ScanResult},
    types::{
        RawTable, Transaction, TransactionTable, CUSTOMER_ID, ID_TRANSACTION, REQUIRED_COLUMNS,
        SITE_ID, TRANS_AMOUNT, TRANS_DATETIME,
    },
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Cells that failed coercion during normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoercionTally {
    pub missing_datetimes: usize,
    pub missing_amounts: usize,
}

/// Read a CSV table with a header row from any reader.
/// Every row comes back exactly as wide as the header.
pub fn read_csv<R: Read>(reader: R) -> ScanResult<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(ScanError::EmptyInput);
    }

    let width = headers.len();
    let (mut short, mut long) = (0usize, 0usize);
    let mut table = RawTable::new(headers);
    for record in reader.records() {
        let record = record?;
        let mut cells: Vec<String> = record.iter().take(width).map(str::to_string).collect();
        if record.len() < width {
            short += 1;
            cells.resize(width, String::new());
        } else if record.len() > width {
            long += 1;
        }
        table.rows.push(cells);
    }

    if short > 0 {
        log::warn!("{short} rows were short; missing cells read as empty");
    }
    if long > 0 {
        log::warn!("{long} rows had cells past the last header; extra cells dropped");
    }
    Ok(table)
}

/// Read a CSV table from disk.
pub fn load_csv<P: AsRef<Path>>(path: P) -> ScanResult<RawTable> {
    let file = File::open(path.as_ref())?;
    let table = read_csv(file)?;
    log::info!(
        "Loaded {} rows x {} columns from {}",
        table.len(),
        table.headers.len(),
        path.as_ref().display()
    );
    Ok(table)
}

/// Check the schema, then coerce every row.
pub fn normalize(raw: RawTable) -> ScanResult<(TransactionTable, CoercionTally)> {
    for column in REQUIRED_COLUMNS {
        if raw.column_index(column).is_none() {
            return Err(ScanError::MissingColumn {
                column: column.to_string(),
            });
        }
    }
    let col = |name: &str| raw.column_index(name).unwrap_or_default();
    let (id_col, customer_col, site_col) = (col(ID_TRANSACTION), col(CUSTOMER_ID), col(SITE_ID));
    let (datetime_col, amount_col) = (col(TRANS_DATETIME), col(TRANS_AMOUNT));

    let mut tally = CoercionTally::default();
    let rows: Vec<Transaction> = raw
        .rows
        .into_iter()
        .enumerate()
        .map(|(row_index, cells)| {
            let trans_datetime = parse_datetime(cell(&cells, datetime_col));
            let trans_amount = parse_amount(cell(&cells, amount_col));
            if trans_datetime.is_none() {
                tally.missing_datetimes += 1;
            }
            if trans_amount.is_none() {
                tally.missing_amounts += 1;
            }
            Transaction {
                row_index,
                id_transaction: cell(&cells, id_col).to_string(),
                customer_id: cell(&cells, customer_col).to_string(),
                site_id: cell(&cells, site_col).to_string(),
                trans_datetime,
                trans_amount,
                trans_date: trans_datetime.map(|at| at.date()),
                cells,
            }
        })
        .collect();

    if tally.missing_datetimes > 0 {
        log::warn!(
            "{} rows have an unparsable {TRANS_DATETIME}; excluded from date grouping",
            tally.missing_datetimes
        );
    }
    if tally.missing_amounts > 0 {
        log::warn!(
            "{} rows have an unparsable {TRANS_AMOUNT}; excluded from amount sums",
            tally.missing_amounts
        );
    }

    let table = TransactionTable {
        headers: raw.headers,
        rows,
        datetime_col,
        amount_col,
    };
    Ok((table, tally))
}

// read_csv pads rows; hand-built tables may still be short.
fn cell(cells: &[String], index: usize) -> &str {
    cells.get(index).map(String::as_str).unwrap_or_default()
}

/// Parse a timestamp cell. Offsets are normalized to UTC; a bare date
/// means midnight.
pub fn parse_datetime(cell: &str) -> Option<NaiveDateTime> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    for format in DATETIME_FORMATS {
        if let Ok(at) = NaiveDateTime::parse_from_str(cell, format) {
            return Some(at);
        }
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(cell) {
        return Some(at.naive_utc());
    }
    NaiveDate::parse_from_str(cell, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse an amount cell. NaN and infinities count as missing.
pub fn parse_amount(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
