#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/normair/normair/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod design;
pub mod error;
pub mod forest;
pub mod kind;
pub mod metrics;
pub mod model;
pub mod resample;
pub mod selection;

pub use design::DesignMatrix;
pub use error::{ModelError, Result};
pub use forest::{ForestConfig, RandomForest, RandomForestModel};
pub use kind::ModelKind;
pub use metrics::TimeSeriesMetrics;
pub use model::{ScoringModel, build_model};
pub use selection::FeatureSelection;
