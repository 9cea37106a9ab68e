//! The scan engine — runs every detector over one normalized table.
//!
//! EXECUTION ORDER (fixed, matches artifact numbering):
//!   1. High transaction days
//!   2. High income days (re-expanded to raw rows)
//!   3. High-value transactions
//!   4. Site income outliers
//!   5. Site transaction outliers
//!   6. Fast repeat purchases
//!   7. Multi-site same-day activity
//!
//! RULES:
//!   - Load and normalize first. A schema error stops the run before any
//!     artifact is written.
//!   - Detectors run in registration order over the same read-only table.
//!   - Artifacts are written only after every detector has finished.

use crate::{
    artifact::{Artifact, ArtifactKind},
    config::{ScanConfig, Thresholds},
    detector::{standard_detectors, Detection, Detector},
    error::ScanResult,
    normalizer::{self, CoercionTally},
    sink,
    stats::Calibration,
    types::{RawTable, TransactionTable},
};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub struct ScanEngine {
    pub thresholds: Thresholds,
    detectors: Vec<Box<dyn Detector>>,
}

/// Per-artifact outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSummary {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub rows: usize,
    pub calibration: Vec<Calibration>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub thresholds: Thresholds,
    pub input_rows: usize,
    pub missing_datetimes: usize,
    pub missing_amounts: usize,
    pub artifacts: Vec<ArtifactSummary>,
}

impl ScanEngine {
    /// An engine with no detectors registered.
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            detectors: Vec::new(),
        }
    }

    /// Build an engine with all seven detectors registered.
    /// Call this instead of new() + manual register() calls.
    pub fn build(thresholds: Thresholds) -> Self {
        let detectors = standard_detectors(&thresholds);
        Self {
            thresholds,
            detectors,
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::build(config.thresholds.clone())
    }

    /// Register a detector. Call in artifact order.
    pub fn register(&mut self, detector: Box<dyn Detector>) {
        self.detectors.push(detector);
    }

    pub fn detector_count(&self) -> usize {
        self.detectors.len()
    }

    /// Run every detector over an already-normalized table.
    pub fn detect(&self, table: &TransactionTable) -> Vec<Detection> {
        self.detectors
            .iter()
            .map(|detector| {
                let detection = detector.detect(table);
                for calibration in &detection.calibration {
                    log::info!("{}: {calibration}", detector.kind().name());
                }
                log::info!(
                    "{}: {} rows flagged",
                    detector.kind().name(),
                    detection.artifact.len()
                );
                detection
            })
            .collect()
    }

    /// Normalize, detect, and write every artifact into `output_dir`.
    pub fn run(&self, raw: RawTable, output_dir: &Path) -> ScanResult<ScanReport> {
        let input_rows = raw.len();
        let (table, tally): (TransactionTable, CoercionTally) =
            normalizer::normalize(raw).map_err(|e| e.in_stage("normalize"))?;
        log::info!("Normalized {input_rows} rows");

        let detections = self.detect(&table);
        let artifacts: Vec<&Artifact> = detections.iter().map(|d| &d.artifact).collect();
        let paths = sink::write_artifacts(output_dir, &artifacts).map_err(|e| e.in_stage("write"))?;
        log::info!(
            "Wrote {} artifacts to {}",
            paths.len(),
            output_dir.display()
        );

        let artifacts = detections
            .into_iter()
            .zip(paths)
            .map(|(detection, path)| ArtifactSummary {
                kind: detection.artifact.kind,
                path,
                rows: detection.artifact.len(),
                calibration: detection.calibration,
            })
            .collect();

        Ok(ScanReport {
            thresholds: self.thresholds.clone(),
            input_rows,
            missing_datetimes: tally.missing_datetimes,
            missing_amounts: tally.missing_amounts,
            artifacts,
        })
    }

    /// Load a CSV from disk, then `run`.
    pub fn run_file(&self, input: &Path, output_dir: &Path) -> ScanResult<ScanReport> {
        let raw = normalizer::load_csv(input).map_err(|e| e.in_stage("load"))?;
        self.run(raw, output_dir)
    }
}
