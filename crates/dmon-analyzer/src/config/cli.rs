use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use tracing::level_filters::LevelFilter;
use utils::version;

use crate::error::ConfigError;
use crate::phase::Phase;
use crate::phase::PhasePlan;
use crate::phase::Tolerance;
use crate::phase::WindowSize;
use crate::report::ReportFormat;
use crate::telemetry::DeviceFilter;
use crate::telemetry::FieldLayout;
use crate::telemetry::HeaderRule;
use crate::telemetry::LayoutPreset;
use crate::telemetry::LogParser;

/// Check GPU utilization limits against a captured `nvidia-smi dmon` log.
#[derive(Parser, Debug)]
#[command(about, long_about, version = &**version::VERSION)]
pub struct Cli {
    /// More log output on stderr (repeat for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default level for the subscriber; `RUST_LOG` still takes precedence.
    pub fn log_level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (true, _) => LevelFilter::WARN,
            (false, 0) => LevelFilter::INFO,
            (false, 1) => LevelFilter::DEBUG,
            (false, _) => LevelFilter::TRACE,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare per-phase average utilization against targets
    Analyze(AnalyzeArgs),
    /// Print fixed-size block averages to help place phase windows
    Windows(WindowsArgs),
}

/// Options shared by every command that reads a dmon log.
#[derive(Args, Debug, Clone)]
pub struct ParseArgs {
    /// Path to the captured `nvidia-smi dmon` output
    pub log: PathBuf,

    /// Device column value to keep (compared as a string); `all`, `any` or `*` keeps every device
    #[arg(long, env = "DMON_DEVICE", default_value = "0")]
    pub device: DeviceFilter,

    /// Same as `--device all`
    #[arg(long)]
    pub all_devices: bool,

    /// Column layout of the capture
    #[arg(long, value_enum, default_value_t = LayoutPreset::PowerFirst)]
    pub layout: LayoutPreset,

    /// Override the device column index of the layout
    #[arg(long)]
    pub device_field: Option<usize>,

    /// Override the utilization column index of the layout
    #[arg(long)]
    pub util_field: Option<usize>,

    /// Rows containing this token are treated as column headers
    #[arg(long, default_value = "sm")]
    pub header_token: String,

    /// Rows starting with this character are comments
    #[arg(long, default_value_t = '#')]
    pub comment_marker: char,
}

impl ParseArgs {
    pub fn device_filter(&self) -> DeviceFilter {
        if self.all_devices {
            DeviceFilter::Any
        } else {
            self.device.clone()
        }
    }

    pub fn layout(&self) -> FieldLayout {
        let mut layout = FieldLayout::from(self.layout);
        if let Some(field) = self.device_field {
            layout = layout.with_device_field(field);
        }
        if let Some(field) = self.util_field {
            layout = layout.with_utilization_field(field);
        }
        layout
    }

    pub fn parser(&self) -> LogParser {
        LogParser::new(self.layout(), self.device_filter())
            .with_header_rule(HeaderRule::new(self.comment_marker, self.header_token.clone()))
    }
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub parse: ParseArgs,

    /// YAML phase plan; the built-in two-step plan is used when no phases are given
    #[arg(long, env = "DMON_PLAN")]
    pub plan: Option<PathBuf>,

    /// Extra phase as NAME:START:END:TARGET (repeatable)
    #[arg(long = "phase", value_name = "NAME:START:END:TARGET")]
    pub phases: Vec<Phase>,

    /// Allowed deviation in percentage points, overrides the plan
    #[arg(long)]
    pub tolerance: Option<Tolerance>,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Exit with a failure status when any phase is WARN
    #[arg(long)]
    pub fail_on_warn: bool,
}

impl AnalyzeArgs {
    /// Resolve the plan file, inline phases and tolerance override.
    pub fn phase_plan(&self) -> Result<PhasePlan, ConfigError> {
        let mut plan = match (&self.plan, self.phases.is_empty()) {
            (Some(path), _) => PhasePlan::load(path)?,
            (None, true) => PhasePlan::builtin(),
            (None, false) => PhasePlan::new(Vec::new(), Tolerance::DEFAULT),
        };
        plan.phases.extend(self.phases.iter().cloned());
        if let Some(tolerance) = self.tolerance {
            plan.tolerance = tolerance;
        }
        plan.validate()?;
        Ok(plan)
    }
}

#[derive(Args, Debug, Clone)]
pub struct WindowsArgs {
    #[command(flatten)]
    pub parse: ParseArgs,

    /// Samples per block
    #[arg(long, default_value_t = 10)]
    pub window: usize,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

impl WindowsArgs {
    pub fn window_size(&self) -> Result<WindowSize, ConfigError> {
        WindowSize::new(self.window)
    }
}
