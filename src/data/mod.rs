pub mod batches;
pub mod dataset;
pub mod loader;
pub mod splitter;

pub use batches::{Batch, BatchSource, Batches, Take};
pub use dataset::Dataset;
pub use splitter::{split, DatasetSplits, SplitPlan};
