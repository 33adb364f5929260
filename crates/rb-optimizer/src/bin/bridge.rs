use anyhow::Context;
use clap::Parser;
use rb_optimizer::{run_session, HttpCostService, RandomSearchOptimizer};
use rb_types::{SessionConfig, CONFIG_FILE};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Drive an optimization session against a remote evaluation service.
#[derive(Parser)]
#[command(name = "rb-bridge", version, about)]
struct Cli {
    /// Session directory holding config.json
    #[arg(required_unless_present = "config")]
    root_dir: Option<PathBuf>,

    /// Configuration file (defaults to <ROOT_DIR>/config.json); its root_dir
    /// receives evaluations.csv and report.json
    #[arg(short, long, env = "RB_BRIDGE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fixed seed for the candidate sampler (defaults to wall-clock time)
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config_path = match (&cli.config, &cli.root_dir) {
        (Some(path), _) => path.clone(),
        (None, Some(root_dir)) => root_dir.join(CONFIG_FILE),
        (None, None) => anyhow::bail!("either ROOT_DIR or --config is required"),
    };

    let config = SessionConfig::from_file(&config_path)
        .with_context(|| format!("load config {}", config_path.display()))?;
    tracing::info!(
        "Loaded config with {} parameters, endpoint {}",
        config.rbfopt.parameters.len(),
        config.endpoint
    );
    if let Some(root_dir) = cli.root_dir.as_ref().filter(|dir| **dir != config.root_dir) {
        tracing::warn!(
            "ROOT_DIR {} differs from configured root_dir {}; using the latter",
            root_dir.display(),
            config.root_dir.display()
        );
    }

    let timeout = config.request_timeout_secs.map(Duration::from_secs);
    let service = HttpCostService::new(&config.endpoint, timeout)?;

    let mut optimizer = RandomSearchOptimizer::new();
    if let Some(seed) = cli.seed {
        optimizer = optimizer.with_seed(seed);
    }

    let output = run_session(&config.rbfopt, service, &mut optimizer, &config.root_dir)
        .context("optimization session")?;

    for pv in output.report.optimum() {
        println!("{pv}");
    }
    println!("cost={}", output.report.cost());

    Ok(())
}
