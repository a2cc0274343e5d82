use crate::error::{Error, Result};

/// `rate(epoch) = base_rate * decay_factor ^ epoch`.
///
/// Always evaluated from the base rate, never from the previous epoch's
/// value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialDecay {
    base_rate: f64,
    decay_factor: f64,
}

impl ExponentialDecay {
    pub fn new(base_rate: f64, decay_factor: f64) -> Result<ExponentialDecay> {
        if !(base_rate.is_finite() && base_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be positive and finite, got {}",
                base_rate
            )));
        }
        if !(decay_factor.is_finite() && decay_factor > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "decay factor must be positive and finite, got {}",
                decay_factor
            )));
        }
        Ok(ExponentialDecay { base_rate, decay_factor })
    }

    pub fn rate_at(&self, epoch: usize) -> f64 {
        self.base_rate * self.decay_factor.powi(epoch as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_form_rates() {
        let schedule = ExponentialDecay::new(0.05, 0.775).unwrap();
        assert_eq!(schedule.rate_at(0), 0.05);
        assert_eq!(schedule.rate_at(1), 0.05 * 0.775);
        assert_eq!(schedule.rate_at(9), 0.05 * 0.775f64.powi(9));
        assert!((schedule.rate_at(9) - 0.00504296).abs() < 1e-8);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(ExponentialDecay::new(0.0, 0.5).is_err());
        assert!(ExponentialDecay::new(0.1, -0.5).is_err());
        assert!(ExponentialDecay::new(f64::NAN, 0.5).is_err());
    }
}
