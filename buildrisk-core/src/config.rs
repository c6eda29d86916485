//! Configuration for the risk engine.
//!
//! Uses `figment` for layered configuration: defaults -> user config -> workspace config ->
//! environment -> explicit overrides. Files are read from the user config directory and
//! `.buildrisk/config.toml` in the workspace.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Where the model artifacts live.
    #[serde(default)]
    pub artifacts: ArtifactConfig,
    /// Cost-overrun bucketing and alerting thresholds.
    #[serde(default)]
    pub cost: CostConfig,
    /// Drift monitoring.
    #[serde(default)]
    pub drift: DriftConfig,
    /// Validation gate bounds.
    #[serde(default)]
    pub validation: ValidationConfig,
    /// Prediction log.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Batch prediction.
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Artifact directory layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    #[serde(default = "default_artifact_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_delay_file")]
    pub delay_file: String,
    /// Optional; prediction degrades to the single regressor when absent.
    #[serde(default = "default_ensemble_file")]
    pub ensemble_file: String,
    #[serde(default = "default_cost_file")]
    pub cost_file: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: default_artifact_dir(),
            delay_file: default_delay_file(),
            ensemble_file: default_ensemble_file(),
            cost_file: default_cost_file(),
        }
    }
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_delay_file() -> String {
    "delay_models.json".to_string()
}

fn default_ensemble_file() -> String {
    "delay_ensemble.json".to_string()
}

fn default_cost_file() -> String {
    "cost_overrun.json".to_string()
}

/// Cost-overrun thresholds, in percent unless noted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostConfig {
    #[serde(default = "default_risk_medium")]
    pub risk_medium_threshold: f64,
    #[serde(default = "default_risk_high")]
    pub risk_high_threshold: f64,
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold_percent: f64,
    /// Progress ratio below which the liquidity alert fires.
    #[serde(default = "default_liquidity_cutoff")]
    pub liquidity_progress_cutoff: f64,
    /// Received/sold ratio below which the collections alert fires.
    #[serde(default = "default_collection_floor")]
    pub collection_efficiency_floor: f64,
    #[serde(default = "default_top_contributors")]
    pub top_contributors: usize,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            risk_medium_threshold: default_risk_medium(),
            risk_high_threshold: default_risk_high(),
            alert_threshold_percent: default_alert_threshold(),
            liquidity_progress_cutoff: default_liquidity_cutoff(),
            collection_efficiency_floor: default_collection_floor(),
            top_contributors: default_top_contributors(),
        }
    }
}

fn default_risk_medium() -> f64 {
    10.0
}

fn default_risk_high() -> f64 {
    25.0
}

fn default_alert_threshold() -> f64 {
    25.0
}

fn default_liquidity_cutoff() -> f64 {
    0.4
}

fn default_collection_floor() -> f64 {
    0.5
}

fn default_top_contributors() -> usize {
    5
}

/// Drift monitoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_zscore_threshold")]
    pub zscore_threshold: f64,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            zscore_threshold: default_zscore_threshold(),
        }
    }
}

fn default_zscore_threshold() -> f64 {
    3.0
}

/// Inclusive numeric bounds for a single field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Validation gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_required_fields")]
    pub required_fields: Vec<String>,
    #[serde(default = "default_bounds")]
    pub bounds: BTreeMap<String, Bounds>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            required_fields: default_required_fields(),
            bounds: default_bounds(),
        }
    }
}

fn default_required_fields() -> Vec<String> {
    [
        "final_project_cost",
        "totalunits",
        "bookedunits",
        "totalsellingamount",
        "totalreceivedamount",
        "planned_duration_days",
        "promotertype",
        "final_project_type",
        "districttype",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_bounds() -> BTreeMap<String, Bounds> {
    // progress_ratio tops out at 1.2 to tolerate reporting overshoot
    [
        ("final_project_cost", Bounds::new(1e5, 5e11)),
        ("progress_ratio", Bounds::new(0.0, 1.2)),
        ("land_utilization", Bounds::new(0.0, 2.0)),
        ("totalunits", Bounds::new(1.0, 2e5)),
        ("bookedunits", Bounds::new(0.0, 2e5)),
        ("planned_duration_days", Bounds::new(30.0, 10_000.0)),
    ]
    .into_iter()
    .map(|(name, bounds)| (name.to_string(), bounds))
    .collect()
}

/// Prediction log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_audit_db")]
    pub db_path: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            db_path: default_audit_db(),
        }
    }
}

fn default_audit_db() -> PathBuf {
    PathBuf::from("data/predictions.db")
}

/// Batch prediction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Fan batch items out over the rayon pool.
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

fn default_true() -> bool {
    true
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `BUILDRISK_`)
/// 3. Workspace-local config (`.buildrisk/config.toml`)
/// 4. User config (`~/.config/buildrisk/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&RiskConfig>,
) -> Result<RiskConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(RiskConfig::default()));

    if let Some(config_dir) = directories::ProjectDirs::from("dev", "buildrisk", "buildrisk") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".buildrisk").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // BUILDRISK_COST__RISK_HIGH_THRESHOLD, BUILDRISK_ARTIFACTS__DIR, ...
    figment = figment.merge(Env::prefixed("BUILDRISK_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}

/// Resolve a possibly relative path against the workspace directory.
pub fn resolve_path(workspace: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.join(path)
    }
}
