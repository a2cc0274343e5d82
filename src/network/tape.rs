use crate::error::{Error, Result};
use crate::math::matrix::Matrix;
use crate::network::network::Network;

/// Forward pass of one batch, recorded for reverse-mode differentiation.
///
/// Holds, per layer, the input it received and its pre-activation.  Replaying
/// the records in reverse with `backward` yields one gradient per parameter.
#[derive(Debug)]
pub struct Tape {
    inputs: Vec<Matrix>,
    pre_activations: Vec<Matrix>,
    output: Matrix,
}

/// Gradients in parameter-set order (`[dW0, db0, dW1, db1, …]`).
#[derive(Debug, Clone)]
pub struct GradientSet(Vec<Matrix>);

impl Tape {
    pub(crate) fn with_capacity(layers: usize) -> Tape {
        Tape {
            inputs: Vec::with_capacity(layers),
            pre_activations: Vec::with_capacity(layers),
            output: Matrix::default(),
        }
    }

    pub(crate) fn push(&mut self, input: Matrix, pre_activation: Matrix) {
        self.inputs.push(input);
        self.pre_activations.push(pre_activation);
    }

    pub(crate) fn set_output(&mut self, output: Matrix) {
        self.output = output;
    }

    pub fn logits(&self) -> &Matrix {
        &self.output
    }

    /// Back-propagates `output_grad` (`∂L/∂logits`) through `network`, which
    /// must be the network that recorded this tape and must not have been
    /// updated since.
    pub fn backward(self, network: &Network, output_grad: Matrix) -> Result<GradientSet> {
        if output_grad.shape() != self.output.shape() {
            return Err(Error::ShapeMismatch {
                what: "logits gradient",
                got: output_grad.shape(),
                expected: self.output.shape(),
            });
        }
        if self.inputs.len() != network.layers.len() {
            return Err(Error::ParameterCount {
                got: 2 * self.inputs.len(),
                expected: 2 * network.layers.len(),
            });
        }

        let mut grads = Vec::with_capacity(2 * network.layers.len());
        let mut delta = output_grad;
        let records = self.inputs.iter().zip(&self.pre_activations);
        for (layer, (input, z)) in network.layers.iter().zip(records).rev() {
            let layer_grads = layer.backward(&delta, z, input);
            // Pushed reversed; flipped once at the end.
            grads.push(layer_grads.biases);
            grads.push(layer_grads.weights);
            delta = layer_grads.input_delta;
        }
        grads.reverse();
        Ok(GradientSet(grads))
    }
}

impl GradientSet {
    pub fn new(grads: Vec<Matrix>) -> GradientSet {
        GradientSet(grads)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Matrix> {
        self.0.iter()
    }
}
