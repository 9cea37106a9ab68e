//! CSV output sink.
//!
//! RULE: only this module writes files. An empty artifact is still written,
//! header row only.

use crate::{
    artifact::Artifact,
    error::ScanResult,
    types::RawTable,
};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write one artifact as CSV to any writer.
pub fn write_artifact<W: Write>(artifact: &Artifact, writer: W) -> ScanResult<()> {
    write_rows(&artifact.headers, &artifact.rows, writer)
}

/// Write every artifact into `dir` under its fixed file name.
pub fn write_artifacts(dir: &Path, artifacts: &[&Artifact]) -> ScanResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = dir.join(artifact.kind.file_name());
        write_artifact(artifact, File::create(&path)?)?;
        log::debug!("wrote {} rows to {}", artifact.len(), path.display());
        written.push(path);
    }
    Ok(written)
}

/// Write a raw table (generated or extracted data) as CSV.
pub fn write_raw_table<W: Write>(table: &RawTable, writer: W) -> ScanResult<()> {
    write_rows(&table.headers, &table.rows, writer)
}

fn write_rows<W: Write>(headers: &[String], rows: &[Vec<String>], writer: W) -> ScanResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
