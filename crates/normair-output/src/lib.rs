#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/normair/normair/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod metrics_table;

pub use export::{ExportError, ExportFormat, Exporter, NormalizedRecord};
pub use metrics_table::{MetricsRow, MetricsTable};
