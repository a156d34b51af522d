use std::path::PathBuf;

use clap::Parser;
use slotgrid_layout::{EngineConfig, LayoutSnapshot};

use crate::error::{DemoError, Result};
use crate::script::{SessionReport, Session, Step, parse_script};

#[derive(Debug, Parser)]
#[command(
    name = "slotgrid-demo",
    about = "Replay a scripted editing session against the slotgrid layout engine",
    version
)]
pub struct Cli {
    /// Layout pattern, e.g. `1-2-3`.
    #[arg(long, default_value = "1-2")]
    pub pattern: String,

    /// Comma-separated initial slot widths.
    #[arg(long, value_delimiter = ',')]
    pub widths: Vec<f64>,

    /// Resume from a snapshot JSON file instead of --pattern/--widths.
    #[arg(long, conflicts_with_all = ["pattern", "widths"])]
    pub snapshot: Option<PathBuf>,

    /// Engine config TOML. Without it, SLOTGRID_* environment variables apply.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Step script file, one step per line.
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Inline step; repeatable and run after --script.
    #[arg(long = "step", short = 's')]
    pub steps: Vec<String>,

    /// Stop at the first rejected step.
    #[arg(long)]
    pub strict: bool,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pub pretty: bool,

    /// Verbose logging on stderr.
    #[arg(long, short)]
    pub verbose: bool,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    slotgrid_core::logging::init_from_env(cli.verbose).map_err(|error| DemoError::Logging {
        message: error.to_string(),
    })?;
    let report = run(&cli)?;
    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}

pub fn run(cli: &Cli) -> Result<SessionReport> {
    let config = load_config(cli)?;
    let steps = load_steps(cli)?;

    let mut session = match &cli.snapshot {
        Some(path) => {
            let snapshot: LayoutSnapshot<String> =
                serde_json::from_str(&std::fs::read_to_string(path)?)?;
            Session::from_snapshot(config, snapshot)?
        }
        None => Session::new(config, &cli.pattern, &cli.widths)?,
    };
    tracing::info!(steps = steps.len(), strict = cli.strict, "replaying session");
    session.run(&steps, cli.strict)?;
    Ok(session.finish())
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    match &cli.config {
        Some(path) => Ok(EngineConfig::from_toml_str(&std::fs::read_to_string(path)?)?),
        None => Ok(EngineConfig::from_env()),
    }
}

fn load_steps(cli: &Cli) -> Result<Vec<(usize, Step)>> {
    let mut steps = match &cli.script {
        Some(path) => parse_script(&std::fs::read_to_string(path)?)?,
        None => Vec::new(),
    };
    let offset = steps.last().map_or(0, |(line, _)| *line);
    for (index, step) in cli.steps.iter().enumerate() {
        let line = offset + index + 1;
        let parsed = step
            .parse::<Step>()
            .map_err(|message| DemoError::invalid_step(line, message))?;
        steps.push((line, parsed));
    }
    Ok(steps)
}
