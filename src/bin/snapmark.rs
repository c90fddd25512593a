use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use snapmark::{FrameSource, SnapshotConfig, SnapshotParams, SnapshotPipeline, SnapshotRequest};

#[derive(Parser, Debug)]
#[command(name = "snapmark", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one snapshot request and print the result JSON.
    Run(RunArgs),
    /// Print the ffmpeg filter chain a clip request would use, without encoding.
    FilterChain(RunArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Request JSON: snapshot parameters plus a `source` path or URI.
    #[arg(long)]
    request: PathBuf,

    /// Process configuration JSON (folders, default font, limits).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the request's `source`.
    #[arg(long)]
    source: Option<String>,
}

#[derive(serde::Deserialize, Debug)]
struct RequestFile {
    #[serde(default)]
    source: Option<String>,
    #[serde(flatten)]
    params: SnapshotParams,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::FilterChain(args) => cmd_filter_chain(args),
    };
    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load(args: &RunArgs) -> anyhow::Result<(SnapshotConfig, Arc<dyn FrameSource>, SnapshotParams)> {
    let config = match &args.config {
        Some(path) => SnapshotConfig::from_path(path)?,
        None => SnapshotConfig::default(),
    };

    let f = std::fs::File::open(&args.request)
        .with_context(|| format!("open request '{}'", args.request.display()))?;
    let file: RequestFile = serde_json::from_reader(std::io::BufReader::new(f))
        .with_context(|| format!("parse request '{}'", args.request.display()))?;

    let source = args
        .source
        .clone()
        .or(file.source)
        .context("request has no `source` and --source was not given")?;
    Ok((config, snapmark::source_from_spec(&source), file.params))
}

fn cmd_run(args: RunArgs) -> anyhow::Result<bool> {
    let (config, source, params) = load(&args)?;
    let pipeline = SnapshotPipeline::new(config);
    let result = pipeline.run(&SnapshotRequest::new(source, params));

    tracing::info!(summary = %result.summary(), "done");
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(result.success)
}

fn cmd_filter_chain(args: RunArgs) -> anyhow::Result<bool> {
    let (config, source, params) = load(&args)?;
    let pipeline = SnapshotPipeline::new(config);
    let plan = pipeline.plan_clip(&SnapshotRequest::new(source, params))?;
    for w in &plan.warnings {
        eprintln!("warning: {w}");
    }
    println!("{}", plan.video.chain);
    Ok(true)
}
