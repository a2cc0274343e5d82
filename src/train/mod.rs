pub mod epoch_stats;
pub mod metric_log;
pub mod step;
pub mod train_config;
pub mod trainer;
pub mod validator;

pub use epoch_stats::EpochSummary;
pub use metric_log::{CompletedLog, LogArchive, MetricEntry, MetricLog};
pub use step::train_step;
pub use train_config::TrainConfig;
pub use trainer::{Phase, TrainReport, Trainer};
pub use validator::{evaluate, Accuracy};
