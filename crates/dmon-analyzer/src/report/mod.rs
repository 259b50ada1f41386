//! Report assembly and output encoders.

pub mod json;
pub mod text;

use serde::Serialize;

use crate::phase::BlockSummary;
use crate::phase::PhaseResult;
use crate::phase::PhaseStatus;
use crate::phase::Tolerance;
use crate::telemetry::DeviceFilter;
use crate::telemetry::LogCondition;
use crate::telemetry::ParseStats;
use crate::telemetry::ParsedLog;

/// Everything known about one `analyze` run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub source: String,
    pub device: DeviceFilter,
    pub condition: LogCondition,
    pub stats: ParseStats,
    pub sample_count: usize,
    pub tolerance: Tolerance,
    pub phases: Vec<PhaseResult>,
}

impl AnalysisReport {
    pub fn new(
        source: impl Into<String>,
        device: DeviceFilter,
        parsed: &ParsedLog,
        tolerance: Tolerance,
        phases: Vec<PhaseResult>,
    ) -> Self {
        Self {
            source: source.into(),
            device,
            condition: parsed.condition.clone(),
            stats: parsed.stats,
            sample_count: parsed.log.len(),
            tolerance,
            phases,
        }
    }

    pub fn count(&self, status: PhaseStatus) -> usize {
        self.phases.iter().filter(|p| p.status == status).count()
    }

    pub fn has_warnings(&self) -> bool {
        self.count(PhaseStatus::Warn) > 0
    }
}

/// Block averages for one `windows` run.
#[derive(Debug, Clone, Serialize)]
pub struct WindowReport {
    pub source: String,
    pub device: DeviceFilter,
    pub condition: LogCondition,
    pub sample_count: usize,
    pub window: usize,
    pub blocks: Vec<BlockSummary>,
}

/// Trait for rendering reports into an output format
pub trait ReportEncoder {
    fn encode_analysis(&self, report: &AnalysisReport) -> String;

    fn encode_windows(&self, report: &WindowReport) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Factory function to create encoders based on format
pub fn create_encoder(format: ReportFormat) -> Box<dyn ReportEncoder> {
    match format {
        ReportFormat::Text => Box::new(text::TextEncoder::new()),
        ReportFormat::Json => Box::new(json::JsonEncoder::new()),
    }
}


#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::phase::PhasePlan;
    use crate::telemetry::TelemetryLog;

    #[test]
    fn report_counts_statuses() {
        let report = fixtures::sample_report();

        assert_eq!(report.sample_count, 40);
        assert_eq!(report.count(PhaseStatus::Pass), 1);
        assert_eq!(report.count(PhaseStatus::Warn), 1);
        assert_eq!(report.count(PhaseStatus::InsufficientData), 1);
        assert!(report.has_warnings());
    }

    #[test]
    fn insufficient_data_is_not_a_warning() {
        let parsed = ParsedLog {
            log: TelemetryLog::default(),
            condition: LogCondition::LogUnavailable {
                reason: "dmon.log: not found".to_string(),
            },
            stats: ParseStats::default(),
        };
        let plan = PhasePlan::builtin();
        let report = AnalysisReport::new(
            "dmon.log",
            DeviceFilter::device("0"),
            &parsed,
            plan.tolerance,
            plan.evaluate(&parsed.log),
        );

        assert_eq!(report.count(PhaseStatus::InsufficientData), 2);
        assert!(!report.has_warnings());
    }

    #[test]
    fn pass_and_insufficient_mix_is_not_a_warning() {
        let mut report = fixtures::sample_report();
        report.phases.retain(|p| p.status != PhaseStatus::Warn);

        assert_eq!(report.count(PhaseStatus::Pass), 1);
        assert_eq!(report.count(PhaseStatus::InsufficientData), 1);
        assert!(!report.has_warnings());
    }

    #[test]
    fn warn_only_report_has_warnings() {
        let mut report = fixtures::sample_report();
        report.phases.retain(|p| p.status == PhaseStatus::Warn);

        assert_eq!(report.phases.len(), 1);
        assert!(report.has_warnings());
    }

    #[test]
    fn factory_picks_encoder() {
        let report = fixtures::sample_report();

        let text = create_encoder(ReportFormat::Text).encode_analysis(&report);
        let json = create_encoder(ReportFormat::Json).encode_analysis(&report);

        assert!(text.starts_with("Telemetry: dmon.log"));
        assert!(json.trim_start().starts_with('{'));
    }
}
