use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::layers::dense::Layer;
use crate::math::matrix::Matrix;
use crate::network::tape::Tape;

/// Feed-forward stack of dense layers producing per-class logits.
///
/// The parameter set is `[W0, b0, W1, b1, …]` in layer order.  Only the
/// optimizer writes to it, through `parameters_mut`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
}

impl Network {
    /// Chains `layers`, checking that each layer consumes what the previous
    /// one produces.
    pub fn new(layers: Vec<Layer>) -> Result<Network> {
        if layers.is_empty() {
            return Err(Error::InvalidConfig("a network needs at least one layer".into()));
        }
        for pair in layers.windows(2) {
            if pair[1].input_size() != pair[0].size() {
                return Err(Error::ShapeMismatch {
                    what: "layer weights",
                    got: pair[1].weights.shape(),
                    expected: (pair[0].size(), pair[1].size()),
                });
            }
        }
        Ok(Network { layers })
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].input_size()
    }

    pub fn num_classes(&self) -> usize {
        self.layers[self.layers.len() - 1].size()
    }

    /// Inference-mode forward pass: logits only, nothing recorded.
    pub fn evaluate(&self, inputs: &Matrix) -> Result<Matrix> {
        let mut current = inputs.clone();
        for layer in &self.layers {
            let z = layer.pre_activation(&current)?;
            current = layer.activate(&z);
        }
        Ok(current)
    }

    /// Predicted class index per example.
    pub fn predict(&self, inputs: &Matrix) -> Result<Vec<usize>> {
        Ok(self.evaluate(inputs)?.argmax_rows())
    }

    /// Training-mode forward pass: records what the backward pass needs.
    pub fn record(&self, inputs: &Matrix) -> Result<Tape> {
        let mut tape = Tape::with_capacity(self.layers.len());
        let mut current = inputs.clone();
        for layer in &self.layers {
            let z = layer.pre_activation(&current)?;
            let a = layer.activate(&z);
            tape.push(current, z);
            current = a;
        }
        tape.set_output(current);
        Ok(tape)
    }

    pub fn parameters(&self) -> Vec<&Matrix> {
        self.layers
            .iter()
            .flat_map(|layer| [&layer.weights, &layer.biases])
            .collect()
    }

    pub fn parameters_mut(&mut self) -> Vec<&mut Matrix> {
        self.layers
            .iter_mut()
            .flat_map(|layer| [&mut layer.weights, &mut layer.biases])
            .collect()
    }
}
