use std::collections::BTreeSet;
use std::process::ExitCode;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use dmon_analyzer::config::AnalyzeArgs;
use dmon_analyzer::config::Cli;
use dmon_analyzer::config::Commands;
use dmon_analyzer::config::WindowsArgs;
use dmon_analyzer::phase::block_averages;
use dmon_analyzer::report::create_encoder;
use dmon_analyzer::report::AnalysisReport;
use dmon_analyzer::report::WindowReport;
use dmon_analyzer::telemetry::DeviceFilter;
use dmon_analyzer::telemetry::ParsedLog;
use utils::version;

/// Sets up global panic hooks.
fn setup_global_hooks() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        tracing::error!("Thread panicked: {}", panic_info);
    }));
}

fn main() -> Result<ExitCode> {
    setup_global_hooks();

    let cli = Cli::parse();
    utils::logging::init(cli.log_level());

    tracing::debug!("dmon-analyzer {}", &**version::VERSION);

    match cli.command {
        Commands::Analyze(args) => run_analyze(args),
        Commands::Windows(args) => run_windows(args),
    }
}

fn run_analyze(args: AnalyzeArgs) -> Result<ExitCode> {
    let plan = args.phase_plan().context("invalid phase plan")?;
    let parser = args.parse.parser();

    tracing::info!(
        log = %args.parse.log.display(),
        device = %parser.device(),
        device_field = parser.layout().device_field,
        util_field = parser.layout().utilization_field,
        phases = plan.phases.len(),
        tolerance = plan.tolerance.points(),
        "analyzing telemetry"
    );

    let parsed = parser.parse_file(&args.parse.log);
    log_merged_devices(parser.device(), &parsed);
    let results = plan.evaluate(&parsed.log);
    let report = AnalysisReport::new(
        args.parse.log.display().to_string(),
        parser.device().clone(),
        &parsed,
        plan.tolerance,
        results,
    );

    print!("{}", create_encoder(args.format).encode_analysis(&report));

    if args.fail_on_warn && report.has_warnings() {
        tracing::warn!("failing because at least one phase deviates from its target");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_windows(args: WindowsArgs) -> Result<ExitCode> {
    let window = args.window_size().context("invalid window size")?;
    let parser = args.parse.parser();

    let parsed = parser.parse_file(&args.parse.log);
    log_merged_devices(parser.device(), &parsed);
    let report = WindowReport {
        source: args.parse.log.display().to_string(),
        device: parser.device().clone(),
        condition: parsed.condition.clone(),
        sample_count: parsed.log.len(),
        window: window.get(),
        blocks: block_averages(&parsed.log.readings(), window),
    };

    print!("{}", create_encoder(args.format).encode_windows(&report));
    Ok(ExitCode::SUCCESS)
}

/// Samples from every device end up in one series when no device is selected.
fn log_merged_devices(filter: &DeviceFilter, parsed: &ParsedLog) {
    if *filter != DeviceFilter::Any {
        return;
    }
    let devices: BTreeSet<u32> = parsed
        .log
        .samples()
        .iter()
        .filter_map(|s| s.device_index)
        .collect();
    if devices.len() > 1 {
        tracing::warn!(?devices, "samples from several devices were merged into one series");
    } else {
        tracing::debug!(?devices, "devices in merged series");
    }
}
