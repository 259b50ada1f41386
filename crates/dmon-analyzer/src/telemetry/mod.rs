//! Parsing of `nvidia-smi dmon` style utilization logs.

pub mod layout;
pub mod parser;

pub use layout::DeviceFilter;
pub use layout::FieldLayout;
pub use layout::HeaderRule;
pub use layout::LayoutPreset;
pub use parser::LogCondition;
pub use parser::LogParser;
pub use parser::ParseStats;
pub use parser::ParsedLog;
pub use parser::TelemetryLog;
pub use parser::TelemetrySample;
