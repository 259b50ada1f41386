use std::path::Path;

use derive_more::Display;
use serde::Serialize;

use super::layout::DeviceFilter;
use super::layout::FieldLayout;
use super::layout::HeaderRule;

/// One accepted data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TelemetrySample {
    /// `None` only in device-less mode when the device column is absent or non-numeric.
    pub device_index: Option<u32>,
    pub utilization_percent: u32,
}

/// Accepted samples in file order.
///
/// Dropped rows leave no gap, so indices count accepted samples rather than
/// seconds since the capture started.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TelemetryLog {
    samples: Vec<TelemetrySample>,
}

impl TelemetryLog {
    pub fn from_readings(readings: impl IntoIterator<Item = u32>) -> Self {
        Self {
            samples: readings
                .into_iter()
                .map(|utilization_percent| TelemetrySample {
                    device_index: None,
                    utilization_percent,
                })
                .collect(),
        }
    }

    pub fn samples(&self) -> &[TelemetrySample] {
        &self.samples
    }

    pub fn readings(&self) -> Vec<u32> {
        self.samples.iter().map(|s| s.utilization_percent).collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Outcome of reading a log, independent of the samples themselves.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogCondition {
    #[display("ok")]
    Available,
    /// The log could not be opened or read.
    #[display("log unavailable: {reason}")]
    LogUnavailable { reason: String },
    /// The log was read but no row matched the device and layout.
    #[display("no matching samples")]
    NoMatchingSamples,
}

/// Aggregate line counts for one parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub total_lines: usize,
    pub header_lines: usize,
    pub blank_lines: usize,
    /// too few fields, or a utilization value that is not an integer in 0..=100
    pub skipped_lines: usize,
    pub foreign_device_lines: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedLog {
    pub log: TelemetryLog,
    pub condition: LogCondition,
    pub stats: ParseStats,
}

enum LineKind {
    Blank,
    Header,
    ForeignDevice,
    Malformed,
    Sample(TelemetrySample),
}

/// Turns dmon text into a [`TelemetryLog`] for one device.
#[derive(Debug, Clone, Default)]
pub struct LogParser {
    layout: FieldLayout,
    headers: HeaderRule,
    device: DeviceFilter,
}

impl LogParser {
    pub fn new(layout: FieldLayout, device: DeviceFilter) -> Self {
        Self {
            layout,
            headers: HeaderRule::default(),
            device,
        }
    }

    pub fn with_header_rule(mut self, headers: HeaderRule) -> Self {
        self.headers = headers;
        self
    }

    pub fn layout(&self) -> FieldLayout {
        self.layout
    }

    pub fn device(&self) -> &DeviceFilter {
        &self.device
    }

    /// Parse already-split lines. Never fails; rejected rows are only counted.
    pub fn parse_lines<'a, I>(&self, lines: I) -> ParsedLog
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut samples = Vec::new();
        let mut stats = ParseStats::default();

        for line in lines {
            stats.total_lines += 1;
            match self.classify(line) {
                LineKind::Blank => stats.blank_lines += 1,
                LineKind::Header => stats.header_lines += 1,
                LineKind::ForeignDevice => stats.foreign_device_lines += 1,
                LineKind::Malformed => stats.skipped_lines += 1,
                LineKind::Sample(sample) => samples.push(sample),
            }
        }

        tracing::debug!(
            total = stats.total_lines,
            headers = stats.header_lines,
            skipped = stats.skipped_lines,
            foreign = stats.foreign_device_lines,
            accepted = samples.len(),
            "parsed telemetry lines"
        );

        let condition = if samples.is_empty() {
            LogCondition::NoMatchingSamples
        } else {
            LogCondition::Available
        };

        ParsedLog {
            log: TelemetryLog { samples },
            condition,
            stats,
        }
    }

    pub fn parse_str(&self, text: &str) -> ParsedLog {
        self.parse_lines(text.lines())
    }

    /// Read and parse a whole log file.
    ///
    /// An unreadable path yields an empty log with [`LogCondition::LogUnavailable`]
    /// instead of an error. Invalid UTF-8 is replaced, so corrupt bytes only
    /// cost the rows they appear in.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> ParsedLog {
        let path = path.as_ref();
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "telemetry log unavailable");
                return ParsedLog {
                    log: TelemetryLog::default(),
                    condition: LogCondition::LogUnavailable {
                        reason: format!("{}: {}", path.display(), e),
                    },
                    stats: ParseStats::default(),
                };
            }
        };

        let parsed = self.parse_str(&String::from_utf8_lossy(&bytes));
        if parsed.condition == LogCondition::NoMatchingSamples {
            tracing::warn!(
                path = %path.display(),
                device = %self.device,
                "no samples matched the requested device and layout"
            );
        }
        parsed
    }

    fn classify(&self, line: &str) -> LineKind {
        let line = line.trim();
        if line.is_empty() {
            return LineKind::Blank;
        }
        if self.headers.is_header(line) {
            return LineKind::Header;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let device_field = fields.get(self.layout.device_field).copied();
        if !self.device.matches(device_field) {
            return LineKind::ForeignDevice;
        }

        let Some(utilization_percent) = fields
            .get(self.layout.utilization_field)
            .and_then(|field| field.parse::<u32>().ok())
            .filter(|util| *util <= 100)
        else {
            return LineKind::Malformed;
        };

        LineKind::Sample(TelemetrySample {
            device_index: device_field.and_then(|field| field.parse().ok()),
            utilization_percent,
        })
    }
}
