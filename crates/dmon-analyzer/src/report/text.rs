use super::AnalysisReport;
use super::ReportEncoder;
use super::WindowReport;
use crate::phase::PhaseResult;
use crate::phase::PhaseStatus;
use crate::telemetry::DeviceFilter;
use crate::telemetry::LogCondition;

/// Human-readable console report.
pub struct TextEncoder;

impl TextEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextEncoder {
    fn default() -> Self {
        Self::new()
    }
}

fn condition_line(condition: &LogCondition, device: &DeviceFilter) -> Option<String> {
    match condition {
        LogCondition::Available => None,
        LogCondition::LogUnavailable { reason } => {
            Some(format!("Error: log unavailable ({reason})"))
        }
        LogCondition::NoMatchingSamples => Some(format!("Error: no samples matched {device}")),
    }
}

fn phase_lines(result: &PhaseResult, available: usize, tolerance: f64) -> Vec<String> {
    match (result.status, result.actual_average) {
        (PhaseStatus::InsufficientData, _) | (_, None) => {
            if result.start_index >= available || result.end_index > available {
                vec![format!(
                    "[{}] Not enough samples ({} < {})",
                    result.name, available, result.end_index
                )]
            } else {
                vec![format!(
                    "[{}] No data in range {}-{}",
                    result.name, result.start_index, result.end_index
                )]
            }
        }
        (status, Some(average)) => {
            let verdict = if status == PhaseStatus::Pass {
                "  -> PASS: Within tolerance".to_string()
            } else {
                format!(
                    "  -> WARN: Deviation {:.2} > {}",
                    result.deviation.unwrap_or(f64::NAN),
                    tolerance
                )
            };
            vec![
                format!(
                    "[{}] Target: {}% | Actual Avg: {:.2}% | Samples: {}",
                    result.name, result.target_percent, average, result.sample_count
                ),
                verdict,
            ]
        }
    }
}

impl ReportEncoder for TextEncoder {
    fn encode_analysis(&self, report: &AnalysisReport) -> String {
        let mut lines = vec![format!("Telemetry: {} ({})", report.source, report.device)];
        lines.extend(condition_line(&report.condition, &report.device));
        lines.push(format!(
            "Total samples collected: {} ({} lines, {} headers, {} skipped, {} other devices)",
            report.sample_count,
            report.stats.total_lines,
            report.stats.header_lines,
            report.stats.skipped_lines,
            report.stats.foreign_device_lines,
        ));
        lines.push(format!("Tolerance: +/-{} pp", report.tolerance));

        for result in &report.phases {
            lines.extend(phase_lines(
                result,
                report.sample_count,
                report.tolerance.points(),
            ));
        }

        lines.push(format!(
            "Summary: {} pass, {} warn, {} insufficient",
            report.count(PhaseStatus::Pass),
            report.count(PhaseStatus::Warn),
            report.count(PhaseStatus::InsufficientData),
        ));
        lines.join("\n") + "\n"
    }

    fn encode_windows(&self, report: &WindowReport) -> String {
        let mut lines = vec![format!("Telemetry: {} ({})", report.source, report.device)];
        lines.extend(condition_line(&report.condition, &report.device));
        lines.push(format!("Total samples: {}", report.sample_count));

        for block in &report.blocks {
            let values = block
                .values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!(
                "Samples {}-{}: Avg={:.1}% | Values=[{}]",
                block.start_index, block.end_index, block.average, values
            ));
        }
        lines.join("\n") + "\n"
    }
}
