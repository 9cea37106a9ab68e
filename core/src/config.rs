use crate::error::{ScanError, ScanResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

// ── Default thresholds ───────────────────────────────────────────────────────
// Chosen from the summary statistics of the reference dataset, not derived
// at run time. Every comparison is strict except the purchase gap.

pub const HIGH_TRANSACTION_DAY_COUNT: usize = 9_700; // avg 9,585, std 95
pub const HIGH_INCOME_DAY_SUM: f64 = 565_000.0; // avg $552k, std $11k
pub const HIGH_VALUE_DAILY_SPENDING: f64 = 200.0;
pub const HIGH_VALUE_DAILY_TRANSACTIONS: usize = 3;
pub const BUSY_SITE_DAILY_COUNT: usize = 15; // avg 9, std 3.6
pub const HIGH_INCOME_SITE_DAILY_SUM: f64 = 1_000.0; // avg $522, std $275
pub const FAST_PURCHASE_MAX_GAP_SECS: u64 = 300; // inclusive
pub const MULTI_SITE_DAILY_SITES: usize = 3;

/// Largest purchase gap a duration can hold (millisecond precision).
pub const MAX_GAP_SECS: u64 = (i64::MAX / 1_000) as u64;

/// Detector thresholds, addressable by metric name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Thresholds {
    pub transaction_count: usize,
    pub sum_daily_income: f64,
    pub daily_spending: f64,
    pub daily_transactions: usize,
    pub site_count: usize,
    pub daily_income: f64,
    pub time_diff_seconds: u64,
    pub unique_sites: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            transaction_count: HIGH_TRANSACTION_DAY_COUNT,
            sum_daily_income: HIGH_INCOME_DAY_SUM,
            daily_spending: HIGH_VALUE_DAILY_SPENDING,
            daily_transactions: HIGH_VALUE_DAILY_TRANSACTIONS,
            site_count: BUSY_SITE_DAILY_COUNT,
            daily_income: HIGH_INCOME_SITE_DAILY_SUM,
            time_diff_seconds: FAST_PURCHASE_MAX_GAP_SECS,
            unique_sites: MULTI_SITE_DAILY_SITES,
        }
    }
}

impl Thresholds {
    pub const METRICS: [&'static str; 8] = [
        "transaction_count",
        "sum_daily_income",
        "daily_spending",
        "daily_transactions",
        "site_count",
        "daily_income",
        "time_diff_seconds",
        "unique_sites",
    ];

    /// Apply `{metric_name: value}` overrides on top of these thresholds.
    pub fn with_overrides(mut self, overrides: &HashMap<String, f64>) -> ScanResult<Self> {
        // Sorted so the first reported error is stable.
        let sorted: BTreeMap<&String, &f64> = overrides.iter().collect();
        for (name, value) in sorted {
            self.set(name, *value)?;
        }
        Ok(self)
    }

    /// Set one threshold by metric name.
    pub fn set(&mut self, name: &str, value: f64) -> ScanResult<()> {
        match name {
            "transaction_count" => self.transaction_count = as_count(name, value)?,
            "sum_daily_income" => self.sum_daily_income = as_amount(name, value)?,
            "daily_spending" => self.daily_spending = as_amount(name, value)?,
            "daily_transactions" => self.daily_transactions = as_count(name, value)?,
            "site_count" => self.site_count = as_count(name, value)?,
            "daily_income" => self.daily_income = as_amount(name, value)?,
            "time_diff_seconds" => self.time_diff_seconds = as_gap_secs(name, value)?,
            "unique_sites" => self.unique_sites = as_count(name, value)?,
            _ => {
                return Err(ScanError::UnknownThreshold {
                    name: name.to_string(),
                })
            }
        }
        log::debug!("threshold {name} set to {value}");
        Ok(())
    }

    /// Reject values that deserialize fine but cannot drive a detector.
    pub fn validate(&self) -> ScanResult<()> {
        if self.time_diff_seconds > MAX_GAP_SECS {
            return Err(ScanError::InvalidThreshold {
                name: "time_diff_seconds".to_string(),
                value: self.time_diff_seconds as f64,
            });
        }
        Ok(())
    }
}

fn as_gap_secs(name: &str, value: f64) -> ScanResult<u64> {
    if value > MAX_GAP_SECS as f64 {
        return Err(ScanError::InvalidThreshold {
            name: name.to_string(),
            value,
        });
    }
    Ok(as_count(name, value)? as u64)
}

fn as_count(name: &str, value: f64) -> ScanResult<usize> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(value as usize)
    } else {
        Err(ScanError::InvalidThreshold {
            name: name.to_string(),
            value,
        })
    }
}

fn as_amount(name: &str, value: f64) -> ScanResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ScanError::InvalidThreshold {
            name: name.to_string(),
            value,
        })
    }
}

/// Everything a scan needs besides the input table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub output_dir: PathBuf,
    pub thresholds: Thresholds,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            thresholds: Thresholds::default(),
        }
    }
}

impl ScanConfig {
    /// Load from a JSON file. Omitted fields keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> ScanResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: ScanConfig = serde_json::from_str(&content)?;
        config.thresholds.validate()?;
        log::info!("Configuration loaded from {}", path.display());
        Ok(config)
    }
}
