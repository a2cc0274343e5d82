use log::trace;

use crate::data::batches::Batch;
use crate::error::Result;
use crate::loss::cross_entropy::SoftmaxCrossEntropy;
use crate::network::network::Network;
use crate::optim::sgd::Sgd;

/// One optimisation step on `batch`; returns the loss before the update.
///
/// Forward pass on a tape, mean softmax cross-entropy, reverse pass, then
/// one SGD update of every parameter.
pub fn train_step(network: &mut Network, optimizer: &Sgd, batch: &Batch) -> Result<f64> {
    let tape = network.record(batch.inputs())?;
    let loss = SoftmaxCrossEntropy::mean(tape.logits(), batch.labels())?;
    let output_grad = SoftmaxCrossEntropy::gradient(tape.logits(), batch.labels())?;
    let grads = tape.backward(network, output_grad)?;
    optimizer.step(network, grads)?;
    trace!("step on {} examples, loss {}", batch.len(), loss);
    Ok(loss)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::error::Error;
    use crate::layers::dense::Layer;
    use crate::math::matrix::Matrix;

    fn identity_net() -> Network {
        Network::new(vec![Layer::from_parameters(
            Matrix::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0]]),
            Matrix::zeros(1, 2),
            ActivationFunction::Identity,
        )
        .unwrap()])
        .unwrap()
    }

    fn toy_batch() -> Batch {
        Batch::new(Matrix::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0]]), vec![0, 1]).unwrap()
    }

    #[test]
    fn returns_pre_update_loss_and_lowers_it() {
        let mut net = identity_net();
        let sgd = Sgd::new(0.5);
        let first = train_step(&mut net, &sgd, &toy_batch()).unwrap();
        assert!((first - (1.0 + (-1.0f64).exp()).ln()).abs() < 1e-12);
        let second = train_step(&mut net, &sgd, &toy_batch()).unwrap();
        assert!(second < first);
    }

    #[test]
    fn out_of_range_label_aborts_without_update() {
        let mut net = identity_net();
        let before = net.clone();
        let batch = Batch::new(Matrix::zeros(1, 2), vec![2]).unwrap();
        let err = train_step(&mut net, &Sgd::new(0.5), &batch).unwrap_err();
        assert!(matches!(err, Error::LabelOutOfRange { label: 2, classes: 2 }));
        assert_eq!(net.parameters(), before.parameters());
    }
}
