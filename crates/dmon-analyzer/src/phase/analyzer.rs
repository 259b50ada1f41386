use derive_more::Display;
use serde::Serialize;

use super::plan::Phase;
use super::plan::PhasePlan;
use super::plan::Tolerance;
use crate::telemetry::TelemetryLog;

/// Classification of one phase. Advisory only: nothing here fails a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseStatus {
    #[display("PASS")]
    Pass,
    #[display("WARN")]
    Warn,
    #[display("INSUFFICIENT_DATA")]
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseResult {
    pub name: String,
    pub start_index: usize,
    pub end_index: usize,
    pub target_percent: u32,
    /// `None` when the window held no samples.
    pub actual_average: Option<f64>,
    /// `|actual_average - target_percent|`
    pub deviation: Option<f64>,
    pub sample_count: usize,
    pub status: PhaseStatus,
}

impl PhaseResult {
    fn insufficient(phase: &Phase) -> Self {
        Self {
            name: phase.name.clone(),
            start_index: phase.start_index,
            end_index: phase.end_index,
            target_percent: phase.target_percent,
            actual_average: None,
            deviation: None,
            sample_count: 0,
            status: PhaseStatus::InsufficientData,
        }
    }
}

/// Plain arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[u32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: u64 = values.iter().map(|v| u64::from(*v)).sum();
    Some(sum as f64 / values.len() as f64)
}

/// Evaluate a single phase over `readings`.
///
/// A window that starts at or past the end of the data, ends past it, or
/// selects nothing yields [`PhaseStatus::InsufficientData`].
pub fn evaluate_phase(readings: &[u32], phase: &Phase, tolerance: Tolerance) -> PhaseResult {
    let len = readings.len();
    if phase.start_index >= len || phase.end_index > len {
        return PhaseResult::insufficient(phase);
    }

    let Some(window) = readings.get(phase.start_index..phase.end_index) else {
        return PhaseResult::insufficient(phase);
    };
    let Some(average) = mean(window) else {
        return PhaseResult::insufficient(phase);
    };

    let deviation = (average - f64::from(phase.target_percent)).abs();
    let status = if deviation <= tolerance.points() {
        PhaseStatus::Pass
    } else {
        PhaseStatus::Warn
    };

    PhaseResult {
        name: phase.name.clone(),
        start_index: phase.start_index,
        end_index: phase.end_index,
        target_percent: phase.target_percent,
        actual_average: Some(average),
        deviation: Some(deviation),
        sample_count: window.len(),
        status,
    }
}

/// Evaluate every phase in order. Phases may overlap or leave gaps.
pub fn analyze(log: &TelemetryLog, phases: &[Phase], tolerance: Tolerance) -> Vec<PhaseResult> {
    let readings = log.readings();
    phases
        .iter()
        .map(|phase| {
            let result = evaluate_phase(&readings, phase, tolerance);
            match result.status {
                PhaseStatus::Pass => tracing::debug!(
                    phase = %result.name,
                    average = result.actual_average,
                    "phase within tolerance"
                ),
                PhaseStatus::Warn => tracing::info!(
                    phase = %result.name,
                    target = result.target_percent,
                    average = result.actual_average,
                    "phase deviates from target"
                ),
                PhaseStatus::InsufficientData => tracing::info!(
                    phase = %result.name,
                    available = readings.len(),
                    end = result.end_index,
                    "not enough samples for phase"
                ),
            }
            result
        })
        .collect()
}

impl PhasePlan {
    pub fn evaluate(&self, log: &TelemetryLog) -> Vec<PhaseResult> {
        analyze(log, &self.phases, self.tolerance)
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;
    use test_log::test;

    use super::*;

    fn tolerance(points: f64) -> Tolerance {
        Tolerance::new(points).unwrap()
    }

    #[test]
    fn average_near_target_passes() {
        let readings = [28, 32, 30, 29, 31];
        let result = evaluate_phase(
            &readings,
            &Phase::new("30%", 0, 5, 30),
            Tolerance::DEFAULT,
        );

        assert_eq!(result.actual_average, Some(30.0));
        assert_eq!(result.sample_count, 5);
        assert_eq!(result.status, PhaseStatus::Pass);
    }

    #[test]
    fn unthrottled_phase_warns() {
        let readings = [95, 98, 97];
        let result = evaluate_phase(
            &readings,
            &Phase::new("30%", 0, 3, 30),
            Tolerance::DEFAULT,
        );

        assert_eq!(result.deviation, Some(67.0));
        assert_eq!(result.status, PhaseStatus::Warn);
    }

    #[test]
    fn window_past_end_is_insufficient() {
        let readings = vec![50; 40];
        let result = evaluate_phase(
            &readings,
            &Phase::new("Step 2 (80%)", 55, 75, 80),
            Tolerance::DEFAULT,
        );

        assert_eq!(result.status, PhaseStatus::InsufficientData);
        assert_eq!(result.sample_count, 0);
        assert_eq!(result.actual_average, None);
    }

    #[test]
    fn end_one_past_len_is_insufficient() {
        let readings = vec![50; 10];
        let result = evaluate_phase(&readings, &Phase::new("p", 0, 11, 50), Tolerance::DEFAULT);

        assert_eq!(result.status, PhaseStatus::InsufficientData);
    }

    #[test]
    fn empty_and_inverted_windows_are_insufficient() {
        let readings = vec![50; 10];

        for phase in [Phase::new("empty", 3, 3, 50), Phase::new("inverted", 6, 2, 50)] {
            let result = evaluate_phase(&readings, &phase, Tolerance::DEFAULT);
            assert_eq!(result.status, PhaseStatus::InsufficientData, "{}", phase.name);
        }
    }

    #[test]
    fn empty_log_is_insufficient() {
        let result = evaluate_phase(&[], &Phase::new("p", 0, 0, 0), Tolerance::DEFAULT);

        assert_eq!(result.status, PhaseStatus::InsufficientData);
    }

    #[test]
    fn uniform_log_matches_target_exactly() {
        for (value, count) in [(0, 1), (37, 13), (100, 250)] {
            let readings = vec![value; count];
            let phase = Phase::new("uniform", 0, count, value);

            for points in [0.0, 0.5, 15.0] {
                let result = evaluate_phase(&readings, &phase, tolerance(points));
                assert_eq!(result.actual_average, Some(f64::from(value)));
                assert_eq!(result.status, PhaseStatus::Pass);
            }
        }
    }

    #[test]
    fn deviation_equal_to_tolerance_passes() {
        let readings = [45, 45];
        let phase = Phase::new("edge", 0, 2, 30);

        assert_eq!(
            evaluate_phase(&readings, &phase, tolerance(15.0)).status,
            PhaseStatus::Pass
        );
        assert_eq!(
            evaluate_phase(&readings, &phase, tolerance(14.99)).status,
            PhaseStatus::Warn
        );
    }

    #[test]
    fn analyze_keeps_phase_order_and_evaluates_all() {
        let log = TelemetryLog::from_readings((0..40).map(|i| if i < 20 { 30 } else { 80 }));
        let phases = vec![
            Phase::new("late", 55, 75, 80),
            Phase::new("high", 20, 40, 80),
            Phase::new("overlap", 10, 30, 30),
            Phase::new("low", 0, 20, 30),
        ];

        let results = analyze(&log, &phases, Tolerance::DEFAULT);
        let summary: Vec<(&str, PhaseStatus)> = results
            .iter()
            .map(|r| (r.name.as_str(), r.status))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("late", PhaseStatus::InsufficientData),
                ("high", PhaseStatus::Pass),
                ("overlap", PhaseStatus::Warn),
                ("low", PhaseStatus::Pass),
            ]
        );
        assert_eq!(results[2].actual_average, Some(55.0));
    }

    #[test]
    fn plan_evaluate_uses_plan_tolerance() {
        let log = TelemetryLog::from_readings([40, 40, 40]);
        let plan = PhasePlan::new(vec![Phase::new("p", 0, 3, 30)], tolerance(5.0));

        assert_eq!(plan.evaluate(&log)[0].status, PhaseStatus::Warn);
    }

    #[test]
    fn status_display_and_serialization() {
        assert_eq!(PhaseStatus::InsufficientData.to_string(), "INSUFFICIENT_DATA");
        assert_eq!(
            serde_json::to_string(&PhaseStatus::Warn).unwrap(),
            "\"WARN\""
        );
    }
}
