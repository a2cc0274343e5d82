use rand::seq::SliceRandom;
use rand::Rng;

use crate::data::dataset::Dataset;
use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// One mini-batch.  `inputs` has one row per entry of `labels`.
#[derive(Debug, Clone)]
pub struct Batch {
    inputs: Matrix,
    labels: Vec<usize>,
}

impl Batch {
    pub fn new(inputs: Matrix, labels: Vec<usize>) -> Result<Batch> {
        if inputs.rows != labels.len() {
            return Err(Error::BatchLength { inputs: inputs.rows, labels: labels.len() });
        }
        Ok(Batch { inputs, labels })
    }

    pub fn inputs(&self) -> &Matrix {
        &self.inputs
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// A finite, replayable sequence of batches.
///
/// Reading a batch never consumes or mutates the sequence, so the same
/// source can be walked any number of times.
pub trait BatchSource {
    fn num_batches(&self) -> usize;

    /// # Panics
    /// Panics if `index >= num_batches()`.
    fn batch(&self, index: usize) -> Batch;

    /// View over the first `n` batches.
    fn take(&self, n: usize) -> Take<'_, Self>
    where
        Self: Sized,
    {
        Take { source: self, n: n.min(self.num_batches()) }
    }
}

/// Bounded prefix of another source, see `BatchSource::take`.
pub struct Take<'a, S: ?Sized> {
    source: &'a S,
    n: usize,
}

impl<S: BatchSource + ?Sized> BatchSource for Take<'_, S> {
    fn num_batches(&self) -> usize {
        self.n
    }

    fn batch(&self, index: usize) -> Batch {
        assert!(index < self.n, "batch {} out of range for prefix of {}", index, self.n);
        self.source.batch(index)
    }
}

/// A dataset cut into batches of `batch_size` examples (the last one may be
/// shorter), visited in `order`.
///
/// The order starts as the dataset order and only changes through
/// `reshuffle`.
#[derive(Debug, Clone)]
pub struct Batches {
    dataset: Dataset,
    batch_size: usize,
    order: Vec<usize>,
}

impl Batches {
    pub fn new(dataset: Dataset, batch_size: usize) -> Result<Batches> {
        if batch_size == 0 {
            return Err(Error::InvalidConfig("batch size must be at least 1".into()));
        }
        let order = (0..dataset.len()).collect();
        Ok(Batches { dataset, batch_size, order })
    }

    /// Draws a fresh visiting order for the next pass.
    pub fn reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.order.shuffle(rng);
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn num_examples(&self) -> usize {
        self.dataset.len()
    }
}

impl BatchSource for Batches {
    fn num_batches(&self) -> usize {
        (self.dataset.len() + self.batch_size - 1) / self.batch_size
    }

    fn batch(&self, index: usize) -> Batch {
        let start = index * self.batch_size;
        let end = (start + self.batch_size).min(self.order.len());
        assert!(start < end, "batch {} out of range", index);

        let indices = &self.order[start..end];
        let labels = indices.iter().map(|&i| self.dataset.labels()[i]).collect();
        Batch {
            inputs: self.dataset.inputs().select_rows(indices),
            labels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn batches(n: usize, batch_size: usize) -> Batches {
        let rows: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64]).collect();
        let ds = Dataset::new(Matrix::from_rows(&rows), vec![0; n], 2).unwrap();
        Batches::new(ds, batch_size).unwrap()
    }

    #[test]
    fn last_batch_holds_the_remainder() {
        let b = batches(10, 4);
        assert_eq!(b.num_batches(), 3);
        let sizes: Vec<_> = (0..3).map(|i| b.batch(i).len()).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
        for i in 0..3 {
            let batch = b.batch(i);
            assert_eq!(batch.inputs().rows, batch.labels().len());
        }
    }

    #[test]
    fn replaying_gives_identical_batches() {
        let b = batches(7, 3);
        let first: Vec<_> = (0..b.num_batches()).map(|i| b.batch(i).inputs().data.clone()).collect();
        let second: Vec<_> = (0..b.num_batches()).map(|i| b.batch(i).inputs().data.clone()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn reshuffle_permutes_without_losing_examples() {
        let mut b = batches(50, 8);
        b.reshuffle(&mut StdRng::seed_from_u64(9));
        let mut seen: Vec<f64> = (0..b.num_batches())
            .flat_map(|i| b.batch(i).inputs().data.clone())
            .collect();
        assert_ne!(seen, (0..50).map(f64::from).collect::<Vec<_>>());
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(seen, (0..50).map(f64::from).collect::<Vec<_>>());
    }

    #[test]
    fn take_bounds_the_prefix() {
        let b = batches(10, 2);
        let prefix = b.take(3);
        assert_eq!(prefix.num_batches(), 3);
        assert_eq!(prefix.batch(2).inputs().data, vec![4.0, 5.0]);
        assert_eq!(b.take(100).num_batches(), 5);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let ds = Dataset::new(Matrix::zeros(1, 1), vec![0], 2).unwrap();
        assert!(Batches::new(ds, 0).is_err());
    }

    #[test]
    fn batch_new_checks_lengths() {
        assert!(Batch::new(Matrix::zeros(3, 2), vec![0, 1]).is_err());
    }
}
