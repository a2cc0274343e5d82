use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Softmax cross-entropy computed straight from logits against integer class
/// labels (no one-hot encoding).
pub struct SoftmaxCrossEntropy;

impl SoftmaxCrossEntropy {
    /// Per-example loss `logsumexp(z) - z[label]`.
    pub fn per_example(logits: &Matrix, labels: &[usize]) -> Result<Vec<f64>> {
        check_labels(logits, labels)?;
        Ok(labels
            .iter()
            .enumerate()
            .map(|(r, &label)| {
                let row = logits.row(r);
                log_sum_exp(row) - row[label]
            })
            .collect())
    }

    /// Batch loss: arithmetic mean of `per_example`.
    pub fn mean(logits: &Matrix, labels: &[usize]) -> Result<f64> {
        let losses = Self::per_example(logits, labels)?;
        Ok(losses.iter().sum::<f64>() / losses.len() as f64)
    }

    /// Gradient of `mean` with respect to the logits:
    ///   ∂L/∂z = (softmax(z) - onehot(label)) / batch
    pub fn gradient(logits: &Matrix, labels: &[usize]) -> Result<Matrix> {
        check_labels(logits, labels)?;
        let mut grad = softmax(logits);
        let inv_batch = 1.0 / labels.len() as f64;
        for (r, &label) in labels.iter().enumerate() {
            grad.data[r * grad.cols + label] -= 1.0;
        }
        Ok(grad.map(|g| g * inv_batch))
    }
}

/// Row-wise softmax, shifted by the row maximum for stability.
pub fn softmax(logits: &Matrix) -> Matrix {
    let mut out = logits.clone();
    for row in out.data.chunks_exact_mut(logits.cols.max(1)) {
        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mut sum = 0.0;
        for x in row.iter_mut() {
            *x = (*x - max).exp();
            sum += *x;
        }
        for x in row.iter_mut() {
            *x /= sum;
        }
    }
    out
}

fn log_sum_exp(row: &[f64]) -> f64 {
    let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    max + row.iter().map(|x| (x - max).exp()).sum::<f64>().ln()
}

fn check_labels(logits: &Matrix, labels: &[usize]) -> Result<()> {
    if labels.len() != logits.rows || labels.is_empty() {
        return Err(Error::BatchLength { inputs: logits.rows, labels: labels.len() });
    }
    match labels.iter().find(|&&l| l >= logits.cols) {
        Some(&label) => Err(Error::LabelOutOfRange { label, classes: logits.cols }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_reference_values() {
        let m = Matrix::from_rows(&[
            vec![1.0, 0.0, 2.0, -1.0],
            vec![2.0, 4.0, 6.0, 8.0],
            vec![3.0, 2.0, 1.0, 0.0],
        ]);
        let expected = [
            0.23688282, 0.08714432, 0.64391426, 0.0320586,
            0.00214401, 0.0158422, 0.11705891, 0.86495488,
            0.64391426, 0.23688282, 0.08714432, 0.0320586,
        ];
        for (got, want) in softmax(&m).data.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "{} vs {}", got, want);
        }
    }

    #[test]
    fn mean_loss_reference_value() {
        let logits = Matrix::from_vec(5, 10, vec![
            9.12342578, 0.63358697, 8.06560308, 3.9013097, 2.62197487, 6.23334865,
            6.41026575, 2.81146893, 7.77734698, 4.55262309, 9.60435717, 7.04164476,
            0.23223837, 0.46014417, 2.03215742, 5.46875653, 9.3033918, 7.62148293,
            8.93237563, 8.01205415, 3.71256154, 7.27356444, 3.56967595, 3.91320274,
            5.17653227, 2.23887074, 7.590534, 2.15816133, 6.53402656, 8.40739104,
            7.24587216, 6.99176605, 0.6429947, 5.22698447, 8.62558009, 9.86430273,
            4.34014201, 5.79361825, 4.93217826, 7.08567487, 3.46292678, 3.58536139,
            9.04794016, 8.42519859, 3.06082975, 8.43025028, 6.01086521, 6.6900385,
            7.73285345, 3.04084278,
        ]);
        let loss = SoftmaxCrossEntropy::mean(&logits, &[0, 1, 2, 3, 4]).unwrap();
        assert!((loss - 4.318751335144043).abs() < 1e-4, "loss = {}", loss);
    }

    #[test]
    fn uniform_logits_cost_log_of_class_count() {
        let logits = Matrix::zeros(3, 4);
        let loss = SoftmaxCrossEntropy::mean(&logits, &[0, 3, 1]).unwrap();
        assert!((loss - 4.0f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn gradient_rows_sum_to_zero_and_scale_with_batch() {
        let logits = Matrix::from_rows(&[vec![1.0, 2.0, 0.5], vec![-1.0, 0.0, 3.0]]);
        let grad = SoftmaxCrossEntropy::gradient(&logits, &[2, 0]).unwrap();
        for r in 0..2 {
            assert!(grad.row(r).iter().sum::<f64>().abs() < 1e-12);
        }
        let p = softmax(&logits);
        assert!((grad.get(0, 2) - (p.get(0, 2) - 1.0) / 2.0).abs() < 1e-12);
        assert!((grad.get(1, 1) - p.get(1, 1) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn label_outside_class_range_is_rejected() {
        let err = SoftmaxCrossEntropy::mean(&Matrix::zeros(2, 3), &[0, 3]).unwrap_err();
        assert!(matches!(err, Error::LabelOutOfRange { label: 3, classes: 3 }));
    }

    #[test]
    fn label_count_must_match_batch() {
        let err = SoftmaxCrossEntropy::gradient(&Matrix::zeros(2, 3), &[0]).unwrap_err();
        assert!(matches!(err, Error::BatchLength { inputs: 2, labels: 1 }));
    }
}
