//! Draws the validation-accuracy curves of two runs on one chart and serves
//! it locally.
//!
//!   plot --ours run.json --reference reference.json

mod chart;
mod server;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use log::info;

use mnist_sgd::LogArchive;

use chart::Series;

#[derive(Debug, Parser)]
#[command(name = "plot", version)]
struct Args {
    /// Metric log written by `mnist-sgd --logfile` (`.npz` or JSON).
    #[arg(long)]
    ours: PathBuf,

    /// Metric log of the run to compare against.
    #[arg(long)]
    reference: PathBuf,

    #[arg(long, default_value = "127.0.0.1:7878")]
    addr: String,

    /// Only serve the chart, do not launch a browser.
    #[arg(long)]
    no_open: bool,
}

fn load(path: &Path) -> anyhow::Result<LogArchive> {
    let archive = LogArchive::load(path)
        .with_context(|| format!("failed to read metric log {}", path.display()))?;
    info!(
        "{}: {} log points, test accuracy {}",
        path.display(),
        archive.steps.len(),
        archive.test_accuracy
    );
    Ok(archive)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let ours = load(&args.ours)?;
    let reference = load(&args.reference)?;

    let svg = chart::build_svg_accuracy_chart(&[
        Series { name: "mnist-sgd", color: "#dc2626", archive: &ours },
        Series { name: "reference", color: "#1e40af", archive: &reference },
    ]);
    let page = chart::page("Online validation accuracy", &svg);

    server::serve(&args.addr, &page, !args.no_open)
}
