//! Column layout and line classification rules for dmon-style telemetry.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// Positions of the device and utilization columns in a data line.
///
/// `nvidia-smi dmon` output has been captured with different metric groups
/// enabled, which moves the `sm` column around. The layout is therefore a
/// parameter of the parser instead of a property of the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLayout {
    pub device_field: usize,
    pub utilization_field: usize,
}

impl FieldLayout {
    /// `gpu pwr gtemp mtemp sm mem enc dec ...`
    pub const POWER_FIRST: Self = Self {
        device_field: 0,
        utilization_field: 4,
    };

    /// `gpu sm mem enc dec ...`
    pub const SM_FIRST: Self = Self {
        device_field: 0,
        utilization_field: 1,
    };

    pub fn new(device_field: usize, utilization_field: usize) -> Self {
        Self {
            device_field,
            utilization_field,
        }
    }

    pub fn with_device_field(mut self, device_field: usize) -> Self {
        self.device_field = device_field;
        self
    }

    pub fn with_utilization_field(mut self, utilization_field: usize) -> Self {
        self.utilization_field = utilization_field;
        self
    }
}

impl Default for FieldLayout {
    fn default() -> Self {
        Self::POWER_FIRST
    }
}

/// Named layouts accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LayoutPreset {
    /// utilization in column 4 (`gpu pwr gtemp mtemp sm`)
    #[default]
    PowerFirst,
    /// utilization in column 1 (`gpu sm mem`)
    SmFirst,
}

impl From<LayoutPreset> for FieldLayout {
    fn from(preset: LayoutPreset) -> Self {
        match preset {
            LayoutPreset::PowerFirst => FieldLayout::POWER_FIRST,
            LayoutPreset::SmFirst => FieldLayout::SM_FIRST,
        }
    }
}

/// Rule for recognizing comment and column-header rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRule {
    pub comment_marker: char,
    pub header_token: String,
}

impl HeaderRule {
    pub fn new(comment_marker: char, header_token: impl Into<String>) -> Self {
        Self {
            comment_marker,
            header_token: header_token.into(),
        }
    }

    /// Whether `line` (already trimmed) is a comment or header row.
    ///
    /// The token check is a plain substring match, so any row mentioning the
    /// token anywhere is treated as a header.
    pub fn is_header(&self, line: &str) -> bool {
        line.starts_with(self.comment_marker)
            || (!self.header_token.is_empty() && line.contains(self.header_token.as_str()))
    }
}

impl Default for HeaderRule {
    fn default() -> Self {
        Self::new('#', "sm")
    }
}

/// Which device's rows to keep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceFilter {
    /// Keep rows whose device column equals this string exactly.
    Device(String),
    /// Keep every data row regardless of its device column.
    Any,
}

impl DeviceFilter {
    pub fn device(id: impl Into<String>) -> Self {
        Self::Device(id.into())
    }

    pub fn matches(&self, field: Option<&str>) -> bool {
        match self {
            DeviceFilter::Device(id) => field == Some(id.as_str()),
            DeviceFilter::Any => true,
        }
    }
}

impl Default for DeviceFilter {
    fn default() -> Self {
        Self::Device("0".to_string())
    }
}

impl fmt::Display for DeviceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceFilter::Device(id) => write!(f, "GPU {id}"),
            DeviceFilter::Any => write!(f, "all devices"),
        }
    }
}

impl FromStr for DeviceFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "*" | "all" | "any" => Ok(DeviceFilter::Any),
            id => Ok(DeviceFilter::Device(id.to_string())),
        }
    }
}
