use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use log::{LevelFilter, info};
use std::path::PathBuf;

use flooding_mesh_simulator::control::{ControlCommand, Runner, SimulatorConfig, parse_script};

/// Headless flooding mesh simulator.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Scene file: JSON array of node records.
    scene: PathBuf,

    /// Configuration file (defaults to config.toml next to the scene).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Command script to run instead of the inject/steps shorthand.
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Number of steps to run.
    #[arg(long, default_value_t = 10)]
    steps: u64,

    /// Number of messages injected before stepping.
    #[arg(long, default_value_t = 1)]
    inject: u32,
}

fn commands_from_args(args: &Args) -> Result<Vec<ControlCommand>> {
    if let Some(script_path) = &args.script {
        let script = std::fs::read_to_string(script_path)
            .with_context(|| format!("Failed to read script: {}", script_path.display()))?;
        return parse_script(&script)
            .map_err(|(line, e)| anyhow::anyhow!("{}:{}: {}", script_path.display(), line, e));
    }

    let mut commands: Vec<ControlCommand> = (0..args.inject).map(|_| ControlCommand::Inject).collect();
    commands.push(ControlCommand::Step(args.steps));
    Ok(commands)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| SimulatorConfig::config_path_from_scene(&args.scene));
    let loaded = SimulatorConfig::load_if_exists(&config_path).map_err(anyhow::Error::msg)?;
    let config_found = loaded.is_some();
    let config = loaded.unwrap_or_default();

    // Logging setup
    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter(Some("flooding_mesh_simulator"), config.log_level.to_level_filter())
        .parse_default_env()
        .init();

    info!("Starting up");
    if config_found {
        info!("Loaded config from {}", config_path.display());
    } else {
        info!("No config file at {}, using defaults", config_path.display());
    }

    let commands = commands_from_args(&args)?;
    let mut runner = Runner::new(&args.scene, config)?;
    runner.run(&commands)?;
    runner.log_summary();

    Ok(())
}
