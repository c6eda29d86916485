//! Feature derivation shared by every model.
//!
//! The deriver produces the full superset of features; each model's preprocessor selects the
//! columns it was trained on and ignores the rest.

pub mod binning;
pub mod catalogue;
pub mod derive;

pub use derive::{FeatureDeriver, FeatureVector, sanitize};
