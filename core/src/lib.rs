//! fraudscan-core: batch detection of unusual payment activity.
//!
//! A flat transaction table goes in; seven flagged tables come out, one per
//! detection rule. See `engine` for the run order.

pub mod aggregate;
pub mod artifact;
pub mod config;
pub mod detector;
pub mod engine;
pub mod error;
pub mod extract;
pub mod normalizer;
pub mod rng;
pub mod sink;
pub mod stats;
pub mod synth;
pub mod types;

pub use config::{ScanConfig, Thresholds};
pub use engine::{ScanEngine, ScanReport};
pub use error::{ScanError, ScanResult};
