use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use lob_pipeline::{
    load_stock_info, plan_jobs, AppConfig, AssetPipeline, BatchRunner, CsvSink, CsvSinkConfig,
    DirectoryLocator,
};
use lob_types::ids::AssetCode;
use tracing_subscriber::EnvFilter;

/// Decode tick archives and aggregate them into snapshots and bars.
#[derive(Parser, Debug)]
#[command(name = "lob-pipeline", version, about)]
struct Cli {
    /// Application config (JSON).
    #[arg(long, default_value = "config/config.json")]
    config: PathBuf,

    /// Stock universe (JSON map keyed by asset code).
    #[arg(long, default_value = "config/stock_info.json")]
    stock_info: PathBuf,

    /// Output directory; overrides the config.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Worker threads; overrides the config.
    #[arg(long)]
    threads: Option<usize>,

    /// Only process these assets (repeatable).
    #[arg(long = "asset")]
    assets: Vec<AssetCode>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(output) = cli.output {
        config.output_dir = output;
    }
    if let Some(threads) = cli.threads {
        config.threads = Some(threads);
    }
    config.validate()?;

    let universe = load_stock_info(&cli.stock_info)
        .with_context(|| format!("loading {}", cli.stock_info.display()))?;
    let jobs = plan_jobs(&universe, config.end_period()?, &cli.assets)?;
    tracing::info!(
        assets = jobs.len(),
        snapshot_dir = %config.snapshot_dir.display(),
        output_dir = %config.output_dir.display(),
        "Loaded stock universe"
    );

    let pipeline = AssetPipeline::new(
        DirectoryLocator::new(&config.snapshot_dir),
        config.compression,
        config.engine.clone(),
    )?;
    let sink = CsvSink::new(CsvSinkConfig {
        output_dir: config.output_dir.clone(),
        tail_rows: config.tail_rows,
    });

    let summary = BatchRunner::new(config.thread_count()).run(&pipeline, &sink, &jobs)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if summary.failed() > 0 {
        anyhow::bail!("{} of {} assets failed", summary.failed(), summary.assets.len());
    }
    Ok(())
}
