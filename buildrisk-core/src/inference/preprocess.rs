//! Column selection, scaling and one-hot encoding ahead of a model.

use crate::error::RiskError;
use crate::features::FeatureVector;
use crate::features::catalogue;
use serde::{Deserialize, Serialize};

/// A numeric input, standardized as `(x - center) / scale`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericColumn {
    pub name: String,
    #[serde(default)]
    pub center: f64,
    #[serde(default = "unit_scale")]
    pub scale: f64,
}

fn unit_scale() -> f64 {
    1.0
}

/// A label input, one-hot encoded over the categories seen at training time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    pub categories: Vec<String>,
}

/// Turns a feature vector into the dense row a model was trained on.
///
/// Output layout: numeric columns in order, then each categorical's one-hot block. Unknown
/// categories encode as all zeros.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preprocessor {
    #[serde(default)]
    pub numeric: Vec<NumericColumn>,
    #[serde(default)]
    pub categorical: Vec<CategoricalColumn>,
}

impl Preprocessor {
    /// Load-time checks.
    pub fn check(&self) -> Result<(), RiskError> {
        for col in &self.numeric {
            if !catalogue::is_numeric_feature(&col.name) {
                return Err(RiskError::artifact(format!(
                    "preprocessor references unknown numeric feature '{}'",
                    col.name
                )));
            }
            if !col.scale.is_finite() || col.scale == 0.0 || !col.center.is_finite() {
                return Err(RiskError::artifact(format!(
                    "preprocessor column '{}' has an unusable center/scale ({}, {})",
                    col.name, col.center, col.scale
                )));
            }
        }
        for col in &self.categorical {
            if !catalogue::is_label_feature(&col.name) {
                return Err(RiskError::artifact(format!(
                    "preprocessor references unknown categorical feature '{}'",
                    col.name
                )));
            }
        }
        Ok(())
    }

    /// Number of output columns.
    pub fn width(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|c| c.categories.len())
                .sum::<usize>()
    }

    /// The source feature of every output column, in output order.
    pub fn output_sources(&self) -> Vec<&str> {
        let mut sources: Vec<&str> = self.numeric.iter().map(|c| c.name.as_str()).collect();
        for col in &self.categorical {
            sources.extend(std::iter::repeat_n(col.name.as_str(), col.categories.len()));
        }
        sources
    }

    /// Feature names this preprocessor reads.
    pub fn input_columns(&self) -> impl Iterator<Item = &str> {
        self.numeric
            .iter()
            .map(|c| c.name.as_str())
            .chain(self.categorical.iter().map(|c| c.name.as_str()))
    }

    pub fn transform(&self, features: &FeatureVector) -> Result<Vec<f64>, RiskError> {
        let mut row = Vec::with_capacity(self.width());

        for col in &self.numeric {
            let value = features.get(&col.name).ok_or_else(|| {
                RiskError::inference(format!("feature vector has no column '{}'", col.name))
            })?;
            row.push((value - col.center) / col.scale);
        }

        for col in &self.categorical {
            let label = features.get_label(&col.name).ok_or_else(|| {
                RiskError::inference(format!("feature vector has no label '{}'", col.name))
            })?;
            row.extend(
                col.categories
                    .iter()
                    .map(|cat| if cat == label { 1.0 } else { 0.0 }),
            );
        }

        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> FeatureVector {
        FeatureVector::from_parts(
            [
                ("final_project_cost".to_string(), 200.0),
                ("progress_ratio".to_string(), 0.5),
            ],
            [("promotertype".to_string(), "COMPANY".to_string())],
        )
    }

    fn preprocessor() -> Preprocessor {
        Preprocessor {
            numeric: vec![
                NumericColumn {
                    name: "final_project_cost".into(),
                    center: 100.0,
                    scale: 50.0,
                },
                NumericColumn {
                    name: "progress_ratio".into(),
                    center: 0.0,
                    scale: 1.0,
                },
            ],
            categorical: vec![CategoricalColumn {
                name: "promotertype".into(),
                categories: vec!["INDIVIDUAL".into(), "COMPANY".into(), "TRUST".into()],
            }],
        }
    }

    #[test]
    fn test_transform_layout() {
        let row = preprocessor().transform(&features()).unwrap();
        assert_eq!(row, vec![2.0, 0.5, 0.0, 1.0, 0.0]);
        assert_eq!(preprocessor().width(), 5);
    }

    #[test]
    fn test_unknown_category_encodes_as_zeros() {
        let fv = FeatureVector::from_parts(
            [
                ("final_project_cost".to_string(), 100.0),
                ("progress_ratio".to_string(), 0.0),
            ],
            [("promotertype".to_string(), "SOCIETY".to_string())],
        );
        let row = preprocessor().transform(&fv).unwrap();
        assert_eq!(&row[2..], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_missing_column_is_inference_error() {
        let fv = FeatureVector::from_parts(
            [("final_project_cost".to_string(), 1.0)],
            [("promotertype".to_string(), "COMPANY".to_string())],
        );
        let err = preprocessor().transform(&fv).unwrap_err();
        assert!(matches!(err, RiskError::Inference(_)));
        assert!(err.to_string().contains("progress_ratio"));
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let mut numerics: Vec<(String, f64)> = vec![
            ("final_project_cost".into(), 200.0),
            ("progress_ratio".into(), 0.5),
        ];
        numerics.push(("risk_score".into(), 99.0));
        let fv = FeatureVector::from_parts(
            numerics,
            [("promotertype".to_string(), "TRUST".to_string())],
        );
        assert_eq!(preprocessor().transform(&fv).unwrap().len(), 5);
    }

    #[test]
    fn test_output_sources() {
        let p = preprocessor();
        assert_eq!(
            p.output_sources(),
            vec![
                "final_project_cost",
                "progress_ratio",
                "promotertype",
                "promotertype",
                "promotertype"
            ]
        );
    }

    #[test]
    fn test_check_rejects_zero_scale_and_unknown_names() {
        let mut p = preprocessor();
        p.numeric[0].scale = 0.0;
        assert!(matches!(p.check(), Err(RiskError::ArtifactLoad(_))));

        let mut p = preprocessor();
        p.numeric[1].name = "shoe_size".into();
        assert!(p.check().is_err());

        assert!(preprocessor().check().is_ok());
    }
}
