//! CLI subcommand handlers.

use crate::Commands;
use crate::HistoryKind;
use buildrisk_core::audit::SqlitePredictionLog;
use buildrisk_core::config::resolve_path;
use buildrisk_core::{RiskConfig, RiskEngine, Scenario};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

/// Input of `buildrisk simulate`.
#[derive(Debug, Deserialize)]
struct SimulationRequest {
    base: Value,
    #[serde(default)]
    scenarios: Vec<Scenario>,
}

/// Handle a CLI subcommand.
pub fn handle_command(
    command: Commands,
    config: RiskConfig,
    workspace: &Path,
) -> anyhow::Result<()> {
    match command {
        Commands::Delay { file, ensemble } => {
            let engine = load_engine(config, workspace)?;
            print_json(&engine.predict_delay(&read_json(&file)?, ensemble)?)
        }
        Commands::Batch { file, ensemble } => {
            let engine = load_engine(config, workspace)?;
            let items = match read_json(&file)? {
                Value::Array(items) => items,
                _ => anyhow::bail!("{} must contain a JSON array of projects", file.display()),
            };
            let outcomes = engine.predict_delay_batch(&items, ensemble);
            let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
            if failed > 0 {
                warn!(failed, total = outcomes.len(), "Some batch items could not be scored");
            }
            print_json(&outcomes)
        }
        Commands::Cost { file } => {
            let engine = load_engine(config, workspace)?;
            print_json(&engine.predict_cost_overrun(&read_json(&file)?)?)
        }
        Commands::Simulate { file } => {
            let engine = load_engine(config, workspace)?;
            let request: SimulationRequest = serde_json::from_value(read_json(&file)?)?;
            if request.scenarios.is_empty() {
                anyhow::bail!("No scenarios in {}", file.display());
            }
            print_json(&engine.simulate_cost_overrun(&request.base, &request.scenarios)?)
        }
        Commands::Drift { file } => {
            let engine = load_engine(config, workspace)?;
            let features = engine.derive_features(&read_json(&file)?)?;
            print_json(&engine.drift_signals(&features))
        }
        Commands::Validate { file } => {
            let engine = load_engine(config, workspace)?;
            print_json(&engine.validate(&read_json(&file)?)?)
        }
        Commands::History { kind, limit } => {
            let log = open_log(&config, workspace)?;
            match kind {
                HistoryKind::Cost => print_json(&log.recent_cost(limit)?),
                HistoryKind::Delay => print_json(&log.recent_delays(limit)?),
            }
        }
        Commands::Stats => {
            let log = open_log(&config, workspace)?;
            print_json(&serde_json::json!({
                "cost": log.cost_stats()?,
                "delay": log.delay_stats()?,
            }))
        }
    }
}

fn load_engine(config: RiskConfig, workspace: &Path) -> anyhow::Result<RiskEngine> {
    let engine = RiskEngine::load(config, workspace)
        .map_err(|e| anyhow::anyhow!("Failed to load models: {}", e))?;
    let context = engine.context();
    info!(
        delay_version = %context.delay().version,
        cost_version = %context.cost().version,
        ensemble = context.has_ensemble(),
        "Models loaded"
    );
    Ok(engine)
}

fn open_log(config: &RiskConfig, workspace: &Path) -> anyhow::Result<SqlitePredictionLog> {
    let path = resolve_path(workspace, &config.audit.db_path);
    info!(path = %path.display(), "Opening prediction log");
    if !path.exists() {
        anyhow::bail!("No prediction log at {}", path.display());
    }
    Ok(SqlitePredictionLog::open(&path)?)
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&text)
        .map_err(|e| anyhow::anyhow!("{} is not valid JSON: {}", path.display(), e))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
