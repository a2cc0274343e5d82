use crate::data::batches::BatchSource;
use crate::error::{Error, Result};
use crate::network::network::Network;

/// Correct-prediction counts over one pass of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accuracy {
    pub correct: usize,
    pub total: usize,
}

impl Accuracy {
    /// `correct / total`, divided once over the whole pass.
    pub fn value(&self) -> f64 {
        self.correct as f64 / self.total as f64
    }
}

/// Classification accuracy of `network` over every batch of `source`.
///
/// Inference only: no tape is recorded and the network is borrowed
/// immutably.  A label outside the network's class range is an error.
pub fn evaluate<S: BatchSource + ?Sized>(network: &Network, source: &S) -> Result<Accuracy> {
    let classes = network.num_classes();
    let mut correct = 0;
    let mut total = 0;
    for index in 0..source.num_batches() {
        let batch = source.batch(index);
        if let Some(&label) = batch.labels().iter().find(|&&l| l >= classes) {
            return Err(Error::LabelOutOfRange { label, classes });
        }
        let predictions = network.predict(batch.inputs())?;
        correct += predictions
            .iter()
            .zip(batch.labels())
            .filter(|(predicted, label)| predicted == label)
            .count();
        total += batch.len();
    }
    if total == 0 {
        return Err(Error::EmptySequence);
    }
    Ok(Accuracy { correct, total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::data::batches::Batches;
    use crate::data::dataset::Dataset;
    use crate::layers::dense::Layer;
    use crate::math::matrix::Matrix;

    // Predicts class 0 when x0 > x1, class 1 otherwise.
    fn comparator() -> Network {
        Network::new(vec![Layer::from_parameters(
            Matrix::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0]]),
            Matrix::zeros(1, 2),
            ActivationFunction::Identity,
        )
        .unwrap()])
        .unwrap()
    }

    fn sequence(batch_size: usize) -> Batches {
        // Seven examples; the last two are labelled wrong for the comparator.
        let rows = vec![
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![2.0, 1.0],
            vec![1.0, 3.0],
            vec![5.0, 4.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
        ];
        let labels = vec![0, 1, 0, 1, 0, 0, 1];
        let ds = Dataset::new(Matrix::from_rows(&rows), labels, 2).unwrap();
        Batches::new(ds, batch_size).unwrap()
    }

    #[test]
    fn counts_every_example_including_short_batch() {
        let acc = evaluate(&comparator(), &sequence(3)).unwrap();
        assert_eq!(acc, Accuracy { correct: 5, total: 7 });
        assert!((acc.value() - 5.0 / 7.0).abs() < 1e-15);
    }

    #[test]
    fn batching_does_not_change_the_result() {
        let net = comparator();
        assert_eq!(evaluate(&net, &sequence(1)).unwrap(), evaluate(&net, &sequence(7)).unwrap());
    }

    #[test]
    fn repeated_evaluation_is_identical() {
        let net = comparator();
        let seq = sequence(2);
        let a = evaluate(&net, &seq).unwrap();
        let b = evaluate(&net, &seq).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.value().to_bits(), b.value().to_bits());
    }

    #[test]
    fn bounded_prefix_only_reads_its_batches() {
        let acc = evaluate(&comparator(), &sequence(2).take(2)).unwrap();
        assert_eq!(acc, Accuracy { correct: 4, total: 4 });
    }

    #[test]
    fn empty_sequence_is_an_error() {
        let ds = Dataset::new(Matrix::zeros(0, 2), vec![], 2).unwrap();
        let seq = Batches::new(ds, 4).unwrap();
        assert!(matches!(evaluate(&comparator(), &seq), Err(Error::EmptySequence)));
    }

    #[test]
    fn label_outside_the_output_layer_is_an_error() {
        // Three-class labels against a two-logit network.
        let ds = Dataset::new(Matrix::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0]]), vec![0, 2], 3).unwrap();
        let seq = Batches::new(ds, 2).unwrap();
        assert!(matches!(
            evaluate(&comparator(), &seq),
            Err(Error::LabelOutOfRange { label: 2, classes: 2 })
        ));
    }
}
