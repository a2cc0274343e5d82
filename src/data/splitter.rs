use log::info;

use crate::data::batches::Batches;
use crate::data::dataset::Dataset;
use crate::error::{Error, Result};

/// How the training file is carved up and batched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitPlan {
    pub batch_size: usize,
    pub test_batch_size: usize,
    /// Examples taken from the tail of the training file for validation.
    pub validation_samples: usize,
}

/// The three batched sequences handed to the trainer.
#[derive(Debug, Clone)]
pub struct DatasetSplits {
    pub train: Batches,
    pub validation: Batches,
    pub test: Batches,
}

/// Holds out the last `plan.validation_samples` examples of `pool` for
/// validation and batches everything.
///
/// Train and validation are disjoint; the test set is used as given.
pub fn split(pool: Dataset, test: Dataset, plan: &SplitPlan) -> Result<DatasetSplits> {
    if plan.validation_samples == 0 {
        return Err(Error::InvalidConfig("validation split must hold at least one example".into()));
    }
    if plan.validation_samples >= pool.len() {
        return Err(Error::InvalidConfig(format!(
            "validation split of {} examples leaves nothing to train on ({} in total)",
            plan.validation_samples,
            pool.len()
        )));
    }
    if test.is_empty() {
        return Err(Error::InvalidConfig("test set is empty".into()));
    }
    if test.feature_len() != pool.feature_len() {
        return Err(Error::ShapeMismatch {
            what: "test examples",
            got: (test.len(), test.feature_len()),
            expected: (test.len(), pool.feature_len()),
        });
    }
    if test.num_classes() != pool.num_classes() {
        return Err(Error::InvalidConfig(format!(
            "test set has {} classes, training set has {}",
            test.num_classes(),
            pool.num_classes()
        )));
    }

    let (train, validation) = pool.split_tail(plan.validation_samples);
    info!(
        "Split: {} train / {} validation / {} test examples",
        train.len(),
        validation.len(),
        test.len()
    );

    Ok(DatasetSplits {
        train: Batches::new(train, plan.batch_size)?,
        validation: Batches::new(validation, plan.batch_size)?,
        test: Batches::new(test, plan.test_batch_size)?,
    })
}
