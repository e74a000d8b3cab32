#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/normair/normair/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod engine;
pub mod error;
pub mod holdout;
pub mod pipeline;

// Re-export sub-crates
pub use normair_features as features;
pub use normair_model as model;
pub use normair_output as output;

pub use config::{NormalizationConfig, ResampleScope, RngMode};
pub use engine::{NormalizationEngine, NormalizedSeries, PreparedRun, average_draws};
pub use error::{NormalizeError, Result};
pub use holdout::{HoldoutReport, HoldoutSplit, evaluate, year_split};
pub use pipeline::{PipelineReport, Progress, SensorFailure, SensorPipeline, SensorSummary, sensor_ids};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
