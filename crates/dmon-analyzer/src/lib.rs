//! Offline validation of GPU utilization limits.
//!
//! A run reads a finished `nvidia-smi dmon` capture with [`telemetry::LogParser`],
//! evaluates a [`phase::PhasePlan`] over the accepted samples and renders the
//! outcome through a [`report::ReportEncoder`]. Nothing here fails because the
//! telemetry is bad: missing logs, foreign rows and short captures are all
//! reported as data.

pub mod config;
pub mod error;
pub mod phase;
pub mod report;
pub mod telemetry;

pub use error::ConfigError;
