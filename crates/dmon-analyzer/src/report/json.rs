use serde::Serialize;

use super::AnalysisReport;
use super::ReportEncoder;
use super::WindowReport;

/// JSON encoder for reports
pub struct JsonEncoder;

impl JsonEncoder {
    pub fn new() -> Self {
        Self
    }

    fn encode<T: Serialize>(value: &T) -> String {
        match serde_json::to_string_pretty(value) {
            Ok(json) => json + "\n",
            Err(e) => {
                tracing::error!("failed to serialize report: {e}");
                serde_json::json!({ "error": e.to_string() }).to_string() + "\n"
            }
        }
    }
}

impl Default for JsonEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder for JsonEncoder {
    fn encode_analysis(&self, report: &AnalysisReport) -> String {
        Self::encode(report)
    }

    fn encode_windows(&self, report: &WindowReport) -> String {
        Self::encode(report)
    }
}
