//! Writes a synthetic tick archive for local smoke runs.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use lob_types::ids::{AssetCode, PeriodId};
use simulation::{write_asset_archive, GeneratorConfig, TickGenerator};
use tick_codec::Compression;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gen-archive", about = "Generate a synthetic tick archive")]
struct Cli {
    /// Archive root; period folders are created below it
    #[arg(long, value_name = "DIR")]
    root: PathBuf,

    /// Asset codes to generate (repeatable)
    #[arg(long = "asset", value_name = "CODE", required = true)]
    assets: Vec<AssetCode>,

    /// First period
    #[arg(long, value_name = "YYYY-MM", value_parser = PeriodId::parse_year_month)]
    from: PeriodId,

    /// Last period (inclusive)
    #[arg(long, value_name = "YYYY-MM", value_parser = PeriodId::parse_year_month)]
    to: PeriodId,

    /// Trading days per period
    #[arg(long, default_value_t = 5)]
    days: u8,

    /// Exchange prefix of the file names
    #[arg(long, default_value = "sh")]
    prefix: String,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// zlib or zstd
    #[arg(long, default_value = "zlib", value_parser = parse_compression)]
    compression: Compression,
}

fn parse_compression(text: &str) -> Result<Compression> {
    match text {
        "zlib" => Ok(Compression::Zlib),
        "zstd" => Ok(Compression::Zstd),
        other => bail!("unknown compression {:?}", other),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let periods = PeriodId::range_inclusive(cli.from, cli.to);
    if periods.is_empty() {
        bail!("empty period range {}..{}", cli.from, cli.to);
    }

    for (i, asset) in cli.assets.iter().enumerate() {
        let mut generator = TickGenerator::new(GeneratorConfig::default(), cli.seed + i as u64);
        let paths = write_asset_archive(
            &cli.root,
            &cli.prefix,
            asset,
            &periods,
            cli.days,
            &mut generator,
            cli.compression,
        )
        .with_context(|| format!("writing archive for {}", asset))?;
        info!(asset = %asset, files = paths.len(), "Archive written");
    }
    Ok(())
}
