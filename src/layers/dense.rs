use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{activation::activation::ActivationFunction, error::{Error, Result}, math::matrix::Matrix};

/// Fully connected layer: `a = f(x · W + b)` for a batch `x` of row vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    /// Shape `(input_size, size)`.
    pub weights: Matrix,
    /// Shape `(1, size)`.
    pub biases: Matrix,
    pub activator: ActivationFunction,
}

/// Gradients of one layer plus the error signal for the layer below.
pub struct LayerGradients {
    pub weights: Matrix,
    pub biases: Matrix,
    /// `∂L/∂x` for this layer's input, i.e. `∂L/∂a` of the previous layer.
    pub input_delta: Matrix,
}

impl Layer {
    /// Kernel drawn uniformly from `[-init_range, init_range]`, zero biases.
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        init_range: f64,
        rng: &mut R,
    ) -> Layer {
        Layer {
            weights: Matrix::uniform(input_size, size, init_range, rng),
            biases: Matrix::zeros(1, size),
            activator: activation,
        }
    }

    /// Builds a layer from known parameters.
    pub fn from_parameters(weights: Matrix, biases: Matrix, activation: ActivationFunction) -> Result<Layer> {
        if biases.shape() != (1, weights.cols) {
            return Err(Error::ShapeMismatch {
                what: "layer biases",
                got: biases.shape(),
                expected: (1, weights.cols),
            });
        }
        Ok(Layer { weights, biases, activator: activation })
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    pub fn size(&self) -> usize {
        self.weights.cols
    }

    /// Pre-activation `z = x · W + b`.
    pub fn pre_activation(&self, input: &Matrix) -> Result<Matrix> {
        if input.cols != self.input_size() {
            return Err(Error::ShapeMismatch {
                what: "layer input",
                got: input.shape(),
                expected: (input.rows, self.input_size()),
            });
        }
        Ok((input * &self.weights).add_row(&self.biases))
    }

    pub fn activate(&self, z: &Matrix) -> Matrix {
        z.map(|x| self.activator.function(x))
    }

    /// Backward pass through this layer.
    ///
    /// `output_delta` is `∂L/∂a` for this layer, `z` and `input` are the
    /// values recorded during the forward pass of the same batch.
    pub fn backward(&self, output_delta: &Matrix, z: &Matrix, input: &Matrix) -> LayerGradients {
        // δ = ∂L/∂a ⊙ f'(z)
        let act_derivative = z.map(|x| self.activator.derivative(x));
        let layer_delta = output_delta.hadamard(&act_derivative);

        LayerGradients {
            weights: &input.transpose() * &layer_delta,
            biases: layer_delta.column_sums(),
            input_delta: &layer_delta * &self.weights.transpose(),
        }
    }
}
