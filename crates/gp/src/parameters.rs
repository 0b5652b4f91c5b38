use crate::errors::{GpError, Result};
use gaussproc_linalg::{Jitter, JITTER_MAX_ATTEMPTS, JITTER_SEED};
use linfa::{Float, ParamGuard};

/// A set of validated GP regression parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct GpValidParams<F: Float> {
    /// First weight added to the diagonal of the training covariance matrix
    /// when its Cholesky factorization fails
    pub(crate) jitter_seed: F,
    /// Maximum number of factorization attempts, the weight being doubled each time
    pub(crate) max_jitter_attempts: usize,
}

impl<F: Float> Default for GpValidParams<F> {
    fn default() -> GpValidParams<F> {
        GpValidParams {
            jitter_seed: F::cast(JITTER_SEED),
            max_jitter_attempts: JITTER_MAX_ATTEMPTS,
        }
    }
}

impl<F: Float> GpValidParams<F> {
    /// Get first jitter weight
    pub fn jitter_seed(&self) -> F {
        self.jitter_seed
    }

    /// Get maximum number of factorization attempts
    pub fn max_jitter_attempts(&self) -> usize {
        self.max_jitter_attempts
    }

    /// Diagonal regularization schedule used to factor the training covariance matrix
    pub fn jitter(&self) -> Jitter<F> {
        Jitter::new(self.jitter_seed, self.max_jitter_attempts)
    }
}

#[derive(Clone, Debug, Default)]
/// The set of parameters used to regress a gaussian process on training data
pub struct GpParams<F: Float>(GpValidParams<F>);

impl<F: Float> GpParams<F> {
    /// A constructor for GP regression parameters given default values
    pub fn new() -> GpParams<F> {
        Self(GpValidParams::default())
    }

    /// A constructor for GP regression parameters from validated parameters
    pub fn new_from_valid(params: &GpValidParams<F>) -> Self {
        Self(params.clone())
    }

    /// Set the first weight added to the diagonal of the training covariance
    /// matrix when the factorization fails.
    pub fn jitter_seed(mut self, jitter_seed: F) -> Self {
        self.0.jitter_seed = jitter_seed;
        self
    }

    /// Set the maximum number of factorization attempts before giving up
    /// with a not positive semidefinite error.
    pub fn max_jitter_attempts(mut self, max_jitter_attempts: usize) -> Self {
        self.0.max_jitter_attempts = max_jitter_attempts;
        self
    }
}

impl<F: Float> From<GpValidParams<F>> for GpParams<F> {
    fn from(valid: GpValidParams<F>) -> Self {
        GpParams(valid)
    }
}

impl<F: Float> ParamGuard for GpParams<F> {
    type Checked = GpValidParams<F>;
    type Error = GpError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let seed = self.0.jitter_seed;
        if !seed.is_finite() || seed <= F::zero() {
            return Err(GpError::InvalidValueError(format!(
                "`jitter_seed` should be a positive finite value, got {}",
                seed
            )));
        }
        if self.0.max_jitter_attempts == 0 {
            return Err(GpError::InvalidValueError(
                "`max_jitter_attempts` cannot be 0!".to_string(),
            ));
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = GpParams::<f64>::new().check().unwrap();
        assert_eq!(params.jitter_seed(), 1e-10);
        assert_eq!(params.max_jitter_attempts(), 60);
        assert_eq!(params.jitter(), Jitter::default());
    }

    #[test]
    fn test_invalid_params() {
        assert!(matches!(
            GpParams::<f64>::new().jitter_seed(0.).check(),
            Err(GpError::InvalidValueError(_))
        ));
        assert!(matches!(
            GpParams::<f64>::new().jitter_seed(f64::NAN).check(),
            Err(GpError::InvalidValueError(_))
        ));
        assert!(matches!(
            GpParams::<f64>::new().max_jitter_attempts(0).check(),
            Err(GpError::InvalidValueError(_))
        ));
        let valid = GpParams::new()
            .jitter_seed(1e-8)
            .max_jitter_attempts(5)
            .check()
            .unwrap();
        assert_eq!(valid.jitter(), Jitter::new(1e-8, 5));
        assert_eq!(GpParams::new_from_valid(&valid).check().unwrap(), valid);
    }
}
