#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/normair/normair/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod builder;
pub mod calendar;
pub mod error;
pub mod harmonics;
pub mod matrix;
pub mod schema;
pub mod sensors;
pub mod timestamps;
pub mod weather;

pub use builder::{FeatureBuilder, FeatureConfig, select_numeric_columns};
pub use error::{FeatureError, Result};
pub use harmonics::{HarmonicSpec, HarmonicUnit};
pub use matrix::{FeatureMatrix, TimeSeries};
pub use weather::EventVocabulary;
