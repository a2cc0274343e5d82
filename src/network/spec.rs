use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::layers::dense::Layer;
use crate::network::network::Network;

/// Describes the fixed MLP topology:
/// `input → Dense(h, activation) for h in hidden_layers → Dense(num_classes)`.
///
/// The output layer has no activation; it emits logits for the
/// softmax cross-entropy loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub input_size: usize,
    pub hidden_layers: Vec<usize>,
    pub num_classes: usize,
    /// Activation of the hidden layers.
    pub activation: ActivationFunction,
    /// Kernels are drawn from `[-init_range, init_range]`; biases start at zero.
    pub init_range: f64,
}

impl NetworkSpec {
    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 {
            return Err(Error::InvalidConfig("input_size must be at least 1".into()));
        }
        if self.num_classes < 2 {
            return Err(Error::InvalidConfig(format!(
                "num_classes must be at least 2, got {}",
                self.num_classes
            )));
        }
        if self.hidden_layers.iter().any(|&h| h == 0) {
            return Err(Error::InvalidConfig("hidden layer sizes must be at least 1".into()));
        }
        if !(self.init_range.is_finite() && self.init_range >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "init_range must be finite and non-negative, got {}",
                self.init_range
            )));
        }
        Ok(())
    }

    /// Builds a freshly initialised network.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Network> {
        self.validate()?;

        let mut layers = Vec::with_capacity(self.hidden_layers.len() + 1);
        let mut input_size = self.input_size;
        for &size in &self.hidden_layers {
            layers.push(Layer::new(size, input_size, self.activation, self.init_range, rng));
            input_size = size;
        }
        layers.push(Layer::new(
            self.num_classes,
            input_size,
            ActivationFunction::Identity,
            self.init_range,
            rng,
        ));

        log::debug!(
            "built network {} -> {:?} -> {}",
            self.input_size, self.hidden_layers, self.num_classes
        );
        Network::new(layers)
    }
}
