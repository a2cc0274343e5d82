use crate::{error::{Error, Result}, network::{GradientSet, Network}};

/// Plain stochastic gradient descent: `p ← p - learning_rate * g`.
///
/// The learning rate is the only state.  The trainer overwrites it at every
/// epoch boundary through `set_learning_rate`.
#[derive(Debug, Clone)]
pub struct Sgd {
    learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) {
        self.learning_rate = learning_rate;
    }

    /// Applies one update to every parameter of `network`, in parameter-set
    /// order.
    ///
    /// Every gradient is checked against its parameter before anything is
    /// written, so on error the network is left untouched.
    pub fn step(&self, network: &mut Network, grads: GradientSet) -> Result<()> {
        let mut params = network.parameters_mut();
        if params.len() != grads.len() {
            return Err(Error::ParameterCount { got: grads.len(), expected: params.len() });
        }
        for (param, grad) in params.iter().zip(grads.iter()) {
            if param.shape() != grad.shape() {
                return Err(Error::ShapeMismatch {
                    what: "gradient",
                    got: grad.shape(),
                    expected: param.shape(),
                });
            }
        }

        for (param, grad) in params.iter_mut().zip(grads.iter()) {
            param.scaled_sub_assign(self.learning_rate, grad);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::layers::dense::Layer;
    use crate::math::matrix::Matrix;

    fn net() -> Network {
        Network::new(vec![Layer::from_parameters(
            Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]),
            Matrix::from_vec(1, 2, vec![0.5, -0.5]),
            ActivationFunction::Identity,
        )
        .unwrap()])
        .unwrap()
    }

    #[test]
    fn step_moves_against_the_gradient() {
        let mut network = net();
        let grads = GradientSet::new(vec![
            Matrix::from_rows(&[vec![10.0, 0.0], vec![0.0, -10.0]]),
            Matrix::from_vec(1, 2, vec![1.0, 1.0]),
        ]);
        Sgd::new(0.1).step(&mut network, grads).unwrap();
        let layer = &network.layers[0];
        assert_eq!(layer.weights.data, vec![0.0, 2.0, 3.0, 5.0]);
        assert_eq!(layer.biases.data, vec![0.4, -0.6]);
    }

    #[test]
    fn new_rate_only_affects_later_steps() {
        let mut network = net();
        let mut sgd = Sgd::new(1.0);
        let grads = GradientSet::new(vec![Matrix::zeros(2, 2), Matrix::from_vec(1, 2, vec![1.0, 0.0])]);
        sgd.set_learning_rate(0.5);
        sgd.step(&mut network, grads).unwrap();
        assert_eq!(network.layers[0].biases.data, vec![0.0, -0.5]);
        assert_eq!(sgd.learning_rate(), 0.5);
    }

    #[test]
    fn mismatched_gradient_leaves_parameters_untouched() {
        let mut network = net();
        let before = network.clone();
        let grads = GradientSet::new(vec![Matrix::from_vec(2, 2, vec![1.0; 4]), Matrix::zeros(1, 3)]);
        let err = Sgd::new(0.1).step(&mut network, grads).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { what: "gradient", .. }));
        assert_eq!(network.parameters(), before.parameters());
    }

    #[test]
    fn missing_gradient_is_an_error() {
        let mut network = net();
        let grads = GradientSet::new(vec![Matrix::zeros(2, 2)]);
        assert!(matches!(
            Sgd::new(0.1).step(&mut network, grads),
            Err(Error::ParameterCount { got: 1, expected: 2 })
        ));
    }
}
