pub mod classify;
pub mod collector;
pub mod config;
pub mod pipeline;
pub mod summary;
pub mod types;
pub mod walker;

pub use classify::{Reason, RunContext, TierClassifier};
pub use collector::MetricsCollector;
pub use config::{Config, Thresholds};
pub use pipeline::ScanPipeline;
pub use summary::{aggregate, ReportSummary};
pub use types::*;
