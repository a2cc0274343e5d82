use std::fs;
use std::path::Path;

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::activation::activation::ActivationFunction;
use crate::data::splitter::SplitPlan;
use crate::error::{Error, Result};
use crate::network::spec::NetworkSpec;

/// Hyperparameters of a training run.
///
/// Every field has a default, so a JSON config file only needs to name the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub test_batch_size: usize,
    pub learning_rate: f64,
    /// Per-epoch multiplier: `lr(e) = learning_rate * decay_factor ^ e`.
    pub decay_factor: f64,
    pub log_every_n_steps: u64,
    /// Training batches re-evaluated at each log point.
    pub num_online_val_steps: usize,
    /// Batches of `batch_size` held out from the tail of the training file.
    pub validation_batches: usize,
    pub hidden_layers: Vec<usize>,
    pub leaky_relu_alpha: f64,
    pub init_range: f64,
    pub num_classes: usize,
    pub seed: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            epochs: 10,
            batch_size: 64,
            test_batch_size: 64,
            learning_rate: 0.05,
            decay_factor: 0.775,
            log_every_n_steps: 100,
            num_online_val_steps: 20,
            validation_batches: 20,
            hidden_layers: vec![50, 25],
            leaky_relu_alpha: 0.1,
            init_range: 0.1,
            num_classes: 10,
            seed: None,
        }
    }
}

impl TrainConfig {
    pub fn load_json(path: &Path) -> Result<TrainConfig> {
        info!("Reading training config from {}", path.display());
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("epochs", self.epochs),
            ("batch_size", self.batch_size),
            ("test_batch_size", self.test_batch_size),
            ("num_online_val_steps", self.num_online_val_steps),
            ("validation_batches", self.validation_batches),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(Error::InvalidConfig(format!("{} must be at least 1", name)));
            }
        }
        if self.log_every_n_steps == 0 {
            return Err(Error::InvalidConfig("log_every_n_steps must be at least 1".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.decay_factor.is_finite() && self.decay_factor > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "decay_factor must be positive, got {}",
                self.decay_factor
            )));
        }
        if !self.leaky_relu_alpha.is_finite() {
            return Err(Error::InvalidConfig("leaky_relu_alpha must be finite".into()));
        }
        Ok(())
    }

    /// Model topology for inputs of `input_size` features.
    pub fn network_spec(&self, input_size: usize) -> NetworkSpec {
        NetworkSpec {
            input_size,
            hidden_layers: self.hidden_layers.clone(),
            num_classes: self.num_classes,
            activation: ActivationFunction::LeakyReLU { alpha: self.leaky_relu_alpha },
            init_range: self.init_range,
        }
    }

    pub fn split_plan(&self) -> SplitPlan {
        SplitPlan {
            batch_size: self.batch_size,
            test_batch_size: self.test_batch_size,
            validation_samples: self.validation_batches * self.batch_size,
        }
    }

    /// Seeded when `seed` is set, otherwise drawn from OS entropy.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "epochs": 3, "seed": 7 }}"#).unwrap();
        let config = TrainConfig::load_json(file.path()).unwrap();
        assert_eq!(config.epochs, 3);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.hidden_layers, vec![50, 25]);
        config.validate().unwrap();
    }

    #[test]
    fn validation_split_is_whole_batches() {
        let plan = TrainConfig::default().split_plan();
        assert_eq!(plan.validation_samples, 20 * 64);
    }

    #[test]
    fn zero_logging_cadence_is_rejected() {
        let config = TrainConfig { log_every_n_steps: 0, ..TrainConfig::default() };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn non_positive_rates_are_rejected() {
        let config = TrainConfig { learning_rate: 0.0, ..TrainConfig::default() };
        assert!(config.validate().is_err());
        let config = TrainConfig { decay_factor: -1.0, ..TrainConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn network_spec_uses_leaky_relu() {
        let spec = TrainConfig::default().network_spec(784);
        assert_eq!(spec.activation, ActivationFunction::LeakyReLU { alpha: 0.1 });
        assert_eq!(spec.num_classes, 10);
    }
}
