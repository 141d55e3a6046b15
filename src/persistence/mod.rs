pub mod config;
pub mod decay;
pub mod metrics;
pub mod signal;
pub mod strategy;

pub use config::{SaveConfig, SaveOption};
pub use decay::{DecayQueue, DecayReport, is_decay_candidate};
pub use metrics::{CategoryMetrics, SaveMetrics, SaveMetricsCollector, SaveMetricsReport};
pub use signal::{DiskWriteListener, DiskWriteSignal};
pub use strategy::{CategorySummary, SaveStrategy, SaveSummary, StandardSaveStrategy};
