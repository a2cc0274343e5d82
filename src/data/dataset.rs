use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Owned, indexable set of labelled examples: one input row per example and
/// one class index per row.
#[derive(Debug, Clone)]
pub struct Dataset {
    inputs: Matrix,
    labels: Vec<usize>,
    num_classes: usize,
}

impl Dataset {
    pub fn new(inputs: Matrix, labels: Vec<usize>, num_classes: usize) -> Result<Dataset> {
        if inputs.rows != labels.len() {
            return Err(Error::BatchLength { inputs: inputs.rows, labels: labels.len() });
        }
        if let Some(&label) = labels.iter().find(|&&l| l >= num_classes) {
            return Err(Error::LabelOutOfRange { label, classes: num_classes });
        }
        Ok(Dataset { inputs, labels, num_classes })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn feature_len(&self) -> usize {
        self.inputs.cols
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn inputs(&self) -> &Matrix {
        &self.inputs
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Splits off the last `n` examples, returning `(head, tail)`.
    pub fn split_tail(self, n: usize) -> (Dataset, Dataset) {
        let n = n.min(self.len());
        let at = self.len() - n;
        let cols = self.inputs.cols;

        let mut head_data = self.inputs.data;
        let tail_data = head_data.split_off(at * cols);
        let mut head_labels = self.labels;
        let tail_labels = head_labels.split_off(at);

        let head = Dataset {
            inputs: Matrix::from_vec(at, cols, head_data),
            labels: head_labels,
            num_classes: self.num_classes,
        };
        let tail = Dataset {
            inputs: Matrix::from_vec(n, cols, tail_data),
            labels: tail_labels,
            num_classes: self.num_classes,
        };
        (head, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy(n: usize) -> Dataset {
        let rows: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64, -(i as f64)]).collect();
        Dataset::new(Matrix::from_rows(&rows), (0..n).map(|i| i % 3).collect(), 3).unwrap()
    }

    #[test]
    fn split_tail_preserves_every_example() {
        let (head, tail) = toy(10).split_tail(4);
        assert_eq!(head.len(), 6);
        assert_eq!(tail.len(), 4);
        assert_eq!(tail.inputs().row(0), &[6.0, -6.0]);
        assert_eq!(tail.labels(), &[0, 1, 2, 0]);
        assert_eq!(head.inputs().rows, 6);
    }

    #[test]
    fn rejects_out_of_range_labels() {
        let err = Dataset::new(Matrix::zeros(2, 1), vec![0, 5], 3).unwrap_err();
        assert!(matches!(err, Error::LabelOutOfRange { label: 5, classes: 3 }));
    }

    #[test]
    fn rejects_length_mismatch() {
        assert!(Dataset::new(Matrix::zeros(2, 1), vec![0], 3).is_err());
    }
}
