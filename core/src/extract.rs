//! SQLite extraction — dumps a relational table to CSV before a scan.
//!
//! RULE: only this module talks to a database. The scan itself never reads
//! anything but the flat table.

use crate::{
    error::{ScanError, ScanResult},
    sink,
    types::RawTable,
};
use rusqlite::{types::ValueRef, Connection, OpenFlags};
use std::io::Write;
use std::path::Path;

pub const DEFAULT_TABLE: &str = "transactions";

/// Open a database read-only.
pub fn open(path: &Path) -> ScanResult<Connection> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    Ok(conn)
}

/// Read every column of `table` into memory, in rowid order.
pub fn read_table(conn: &Connection, table: &str) -> ScanResult<RawTable> {
    if !is_identifier(table) {
        return Err(ScanError::InvalidTableName {
            name: table.to_string(),
        });
    }

    let mut stmt = conn.prepare(&format!("SELECT * FROM \"{table}\""))?;
    let headers: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = headers.len();

    let mut raw = RawTable::new(headers);
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(width);
        for i in 0..width {
            cells.push(render(row.get_ref(i)?));
        }
        raw.rows.push(cells);
    }
    Ok(raw)
}

/// Dump `table` as CSV with a header row. Returns the number of data rows.
pub fn extract_table<W: Write>(conn: &Connection, table: &str, writer: W) -> ScanResult<usize> {
    let raw = read_table(conn, table)?;
    sink::write_raw_table(&raw, writer)?;
    log::info!("Extracted {} rows from table {table}", raw.len());
    Ok(raw.len())
}

fn render(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
