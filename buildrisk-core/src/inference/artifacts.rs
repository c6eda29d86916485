//! On-disk model artifacts.
//!
//! Three JSON documents live in the artifact directory: the delay cascade models, an optional
//! delay ensemble, and the cost-overrun models with their reference statistics. Each file is
//! fingerprinted with SHA-256 when it is read.

use super::estimator::Estimator;
use crate::config::ArtifactConfig;
use crate::drift::ReferenceStatistics;
use crate::error::RiskError;
use crate::features::catalogue;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Gate classifier and log-day regressor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayArtifacts {
    pub version: String,
    pub classifier: Estimator,
    pub regressor: Estimator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleMember {
    pub weight: f64,
    pub estimator: Estimator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleArtifacts {
    pub members: Vec<EnsembleMember>,
}

/// Held-out metrics recorded at training time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub r2: f64,
    pub mae: f64,
}

/// Point and quantile cost-overrun regressors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostArtifacts {
    pub version: String,
    pub model_name: String,
    pub feature_columns: Vec<String>,
    #[serde(default)]
    pub metrics: BTreeMap<String, ModelMetrics>,
    #[serde(default)]
    pub reference_stats: ReferenceStatistics,
    pub point_model: Estimator,
    pub quantile_lower: Estimator,
    pub quantile_upper: Estimator,
}

impl CostArtifacts {
    /// Every declared column must be a known feature, and every estimator may only read
    /// declared columns.
    pub fn check_columns(&self) -> Result<(), RiskError> {
        if let Some(unknown) = self
            .feature_columns
            .iter()
            .find(|c| !catalogue::is_known_feature(c))
        {
            return Err(RiskError::artifact(format!(
                "cost feature column '{unknown}' is not a derived feature"
            )));
        }
        for est in [&self.point_model, &self.quantile_lower, &self.quantile_upper] {
            if let Some(col) = est
                .preprocessor
                .input_columns()
                .find(|c| !self.feature_columns.iter().any(|f| f == c))
            {
                return Err(RiskError::artifact(format!(
                    "estimator '{}' reads undeclared column '{col}'",
                    est.name
                )));
            }
        }
        Ok(())
    }
}

/// SHA-256 fingerprint of one loaded artifact file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDigest {
    pub file: String,
    pub sha256: String,
}

/// Everything read from an artifact store, before validation.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    pub delay: DelayArtifacts,
    pub ensemble: Option<EnsembleArtifacts>,
    pub cost: CostArtifacts,
    pub digests: Vec<ArtifactDigest>,
}

/// Source of model artifacts. Loading happens once per process.
pub trait ArtifactStore {
    fn load(&self) -> Result<ArtifactBundle, RiskError>;
}

/// Reads artifacts from a directory laid out per [`ArtifactConfig`].
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    dir: PathBuf,
    delay_file: String,
    ensemble_file: String,
    cost_file: String,
}

impl FsArtifactStore {
    pub fn new(dir: impl Into<PathBuf>, config: &ArtifactConfig) -> Self {
        Self {
            dir: dir.into(),
            delay_file: config.delay_file.clone(),
            ensemble_file: config.ensemble_file.clone(),
            cost_file: config.cost_file.clone(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read<T: serde::de::DeserializeOwned>(
        &self,
        file: &str,
    ) -> Result<(T, ArtifactDigest), RiskError> {
        let path = self.dir.join(file);
        let bytes = std::fs::read(&path).map_err(|e| {
            RiskError::artifact(format!("cannot read {}: {e}", path.display()))
        })?;
        let digest = ArtifactDigest {
            file: file.to_string(),
            sha256: hash_bytes(&bytes),
        };
        let parsed = serde_json::from_slice(&bytes).map_err(|e| {
            RiskError::artifact(format!("cannot parse {}: {e}", path.display()))
        })?;
        debug!(file, sha256 = %digest.sha256, "Loaded artifact");
        Ok((parsed, digest))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn load(&self) -> Result<ArtifactBundle, RiskError> {
        let mut digests = Vec::new();

        let (delay, digest) = self.read::<DelayArtifacts>(&self.delay_file)?;
        digests.push(digest);

        let ensemble = if self.dir.join(&self.ensemble_file).exists() {
            let (ensemble, digest) = self.read::<EnsembleArtifacts>(&self.ensemble_file)?;
            digests.push(digest);
            Some(ensemble)
        } else {
            info!(
                file = %self.ensemble_file,
                "No delay ensemble artifact; ensemble requests use the single regressor"
            );
            None
        };

        let (cost, digest) = self.read::<CostArtifacts>(&self.cost_file)?;
        digests.push(digest);

        Ok(ArtifactBundle {
            delay,
            ensemble,
            cost,
            digests,
        })
    }
}

/// Compute SHA-256 hash of arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator(column: &str) -> serde_json::Value {
        serde_json::json!({
            "name": format!("on_{column}"),
            "preprocessor": {"numeric": [{"name": column}]},
            "model": {"kind": "linear", "intercept": 0.0, "coefficients": [1.0]}
        })
    }

    fn write_fixture(dir: &Path, cost_column: &str) {
        let delay = serde_json::json!({
            "version": "d1",
            "classifier": estimator("risk_score"),
            "regressor": estimator("duration_ratio"),
        });
        let cost = serde_json::json!({
            "version": "c1",
            "model_name": "linear",
            "feature_columns": [cost_column],
            "metrics": {"linear": {"r2": 0.8, "mae": 3.1}},
            "reference_stats": {"risk_score": {"mean": 40.0, "std": 10.0}},
            "point_model": estimator(cost_column),
            "quantile_lower": estimator(cost_column),
            "quantile_upper": estimator(cost_column),
        });
        std::fs::write(dir.join("delay_models.json"), delay.to_string()).unwrap();
        std::fs::write(dir.join("cost_overrun.json"), cost.to_string()).unwrap();
    }

    #[test]
    fn test_load_without_ensemble() {
        let dir = tempfile::TempDir::new().unwrap();
        write_fixture(dir.path(), "cost_per_unit");

        let store = FsArtifactStore::new(dir.path(), &ArtifactConfig::default());
        let bundle = store.load().unwrap();
        assert!(bundle.ensemble.is_none());
        assert_eq!(bundle.delay.version, "d1");
        assert_eq!(bundle.cost.metrics["linear"].mae, 3.1);
        assert_eq!(bundle.digests.len(), 2);
        assert_eq!(bundle.digests[0].sha256.len(), 64);
        assert!(bundle.cost.check_columns().is_ok());
    }

    #[test]
    fn test_missing_file_is_artifact_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path(), &ArtifactConfig::default());
        assert!(matches!(store.load(), Err(RiskError::ArtifactLoad(_))));
    }

    #[test]
    fn test_corrupt_file_is_artifact_error() {
        let dir = tempfile::TempDir::new().unwrap();
        write_fixture(dir.path(), "cost_per_unit");
        std::fs::write(dir.path().join("delay_ensemble.json"), "{not json").unwrap();
        let store = FsArtifactStore::new(dir.path(), &ArtifactConfig::default());
        let err = store.load().unwrap_err();
        assert!(err.to_string().contains("delay_ensemble.json"));
    }

    #[test]
    fn test_unknown_cost_column_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        write_fixture(dir.path(), "moon_phase");
        let bundle = FsArtifactStore::new(dir.path(), &ArtifactConfig::default())
            .load()
            .unwrap();
        assert!(matches!(
            bundle.cost.check_columns(),
            Err(RiskError::ArtifactLoad(_))
        ));
    }

    #[test]
    fn test_digest_is_stable() {
        assert_eq!(hash_bytes(b"abc"), hash_bytes(b"abc"));
        assert_eq!(
            hash_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
