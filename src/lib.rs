pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod data;
pub mod train;
pub mod error;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::{GradientSet, Network, NetworkSpec, Tape};
pub use loss::cross_entropy::SoftmaxCrossEntropy;
pub use optim::{ExponentialDecay, Sgd};
pub use data::{Batch, BatchSource, Batches, Dataset};
pub use train::{evaluate, train_step, Accuracy, CompletedLog, LogArchive, TrainConfig, TrainReport, Trainer};
pub use error::{Error, Result};
