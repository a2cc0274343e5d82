use serde::{Deserialize, Serialize};

/// What one epoch did, reported by the trainer once the epoch's last batch
/// has been applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochSummary {
    /// 0-based epoch index.
    pub epoch: usize,
    /// Rate the optimizer used for every batch of this epoch.
    pub learning_rate: f64,
    pub batches: usize,
    /// Mean of the per-batch losses.
    pub mean_loss: f64,
    /// Wall-clock duration of the epoch in milliseconds.
    pub elapsed_ms: u64,
}
