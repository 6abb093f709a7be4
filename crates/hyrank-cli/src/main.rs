//! hyrank: consensus feature ranking for high-yield direction models.
//! Entry point for the command-line binary.

mod config;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use hyrank_data::{build_dataset, direction_target, PanelLoader};
use hyrank_ranker::{write_outputs, ConsensusRanker, RankingReport};

use crate::config::ConfigFormat;

#[derive(Parser)]
#[command(name = "hyrank", version, about = "Consensus feature ranking for HY direction models")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score, combine and prune the features of a panel
    Rank {
        /// Feature panel (CSV, first column a date or row label)
        #[arg(long)]
        data: PathBuf,
        /// Configuration file (TOML, YAML or JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output directory (overrides output.dir)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Number of features to keep (overrides selection.top_k)
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Write the default configuration to a file
    InitConfig {
        #[arg(long, default_value = config::DEFAULT_CONFIG_FILE)]
        path: PathBuf,
        #[arg(long, value_enum, default_value_t = ConfigFormat::Toml)]
        format: ConfigFormat,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Show the direction target derived from a reference return column
    Target {
        #[arg(long)]
        data: PathBuf,
        /// Reference return column, e.g. HYG_ret
        #[arg(long)]
        reference: String,
        #[arg(long, default_value_t = 1)]
        horizon: usize,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hyrank=debug,info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Rank { data, config, out, top_k } => {
            run_rank(&data, config.as_deref(), out, top_k)
        }
        Command::InitConfig { path, format, force } => init_config(&path, format, force),
        Command::Target { data, reference, horizon, config } => {
            show_target(&data, &reference, horizon, config.as_deref())
        }
    }
}

fn run_rank(
    data: &Path,
    config_path: Option<&Path>,
    out: Option<PathBuf>,
    top_k: Option<usize>,
) -> anyhow::Result<()> {
    let (mut config, source) = config::load(config_path)?;
    if let Some(k) = top_k {
        config.selection.top_k = k;
        config.validate().context("invalid --top-k")?;
    }
    info!(?source, top_k = config.selection.top_k, "Ranking {}", data.display());

    let panel = PanelLoader::new(&config.data)
        .load(data)
        .with_context(|| format!("failed to load panel {}", data.display()))?;
    let dataset = build_dataset(&panel, &config.target, &config.data)?;

    let ranker = ConsensusRanker::new(config.clone())?;
    let outcome = ranker.run(&dataset.features, &dataset.target)?;

    let report = RankingReport::new(&outcome, &config, dataset.features.n_rows())?;
    let out_dir = out.unwrap_or_else(|| PathBuf::from(&config.output.dir));
    let paths = write_outputs(&report, &out_dir, config.output.write_json)?;

    println!("Selected {} features (run {}):", report.final_features.len(), report.run_id);
    for (i, name) in report.final_features.iter().enumerate() {
        println!("{:>3}. {name}", i + 1);
    }
    println!("Consensus table: {}", paths.consensus_csv.display());
    Ok(())
}

fn init_config(path: &Path, format: ConfigFormat, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (pass --force to overwrite)", path.display());
    }
    let text = config::render(&hyrank_common::RankingConfig::default(), format)?;
    std::fs::write(path, text).with_context(|| format!("cannot write {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn show_target(
    data: &Path,
    reference: &str,
    horizon: usize,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let (config, _) = config::load(config_path)?;
    let panel = PanelLoader::new(&config.data).load(data)?;
    let series = panel
        .column(reference)
        .with_context(|| format!("column '{reference}' not found in {}", data.display()))?;
    let target = direction_target(series, horizon)?;

    println!("row,{reference},target");
    for ((label, value), t) in panel.row_labels().iter().zip(series).zip(&target) {
        match t {
            Some(t) => println!("{label},{value},{t}"),
            None => println!("{label},{value},"),
        }
    }
    let dropped = target.iter().filter(|t| t.is_none()).count();
    let ups = target.iter().flatten().filter(|&&t| t == 1).count();
    println!(
        "# horizon {horizon}: {} usable rows ({ups} up), {dropped} trailing rows dropped",
        target.len() - dropped
    );
    Ok(())
}
