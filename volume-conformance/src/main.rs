use anyhow::Context;
use clap::Parser;
use effect_backend::{EffectFactory, VOLUME_TYPE_UUID};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use volume_conformance::{discover_instances, CaseFilter, RunnerConfig, Suite, VerifyOptions};

/// Volume effect parameter conformance runner
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON runner configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Case filter, e.g. '*SetAndGetLevel*-*mute1'
    #[arg(long)]
    filter: Option<String>,

    /// Print the selected case ids and exit
    #[arg(long)]
    list: bool,

    /// Write a JSON report here
    #[arg(long)]
    report: Option<PathBuf>,

    /// Per-call timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Also check that rejected sets leave the stored value unchanged
    #[arg(long)]
    check_unchanged_after_reject: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    let mut config = match &args.config {
        Some(path) => RunnerConfig::load(path)?,
        None => RunnerConfig::default(),
    };

    // Command line wins over the file
    if let Some(filter) = args.filter {
        config.filter = Some(filter);
    }
    if let Some(report) = args.report {
        config.report_path = Some(report);
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    config.check_unchanged_after_reject |= args.check_unchanged_after_reject;
    config.validate()?;

    let filter = match &config.filter {
        Some(pattern) => {
            CaseFilter::parse(pattern).with_context(|| format!("invalid filter '{}'", pattern))?
        }
        None => CaseFilter::all(),
    };

    let factory: Arc<dyn EffectFactory> = Arc::new(config.build_factory());
    let instances = discover_instances(&[factory], VOLUME_TYPE_UUID);
    let options = VerifyOptions {
        check_unchanged_after_reject: config.check_unchanged_after_reject,
    };
    let suite = Suite::new(&instances, options).with_filter(filter);

    if args.list {
        for case in suite.selected() {
            println!("{}", case.id());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let report = suite.run();
    for failure in report.failures() {
        eprintln!(
            "FAILED {}: {}",
            failure.id,
            failure.diagnostic.as_deref().unwrap_or("no diagnostic")
        );
    }
    println!("{}", report.summary());

    if let Some(path) = &config.report_path {
        report
            .write_json(path)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
    }

    Ok(if report.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
