//! Cholesky factorization of covariance matrices regularized by a growing jitter.
//!
//! Covariance matrices built from kernels are symmetric positive semidefinite
//! in exact arithmetic but are frequently singular or slightly indefinite in
//! floating point (duplicated points, very smooth kernels, ...). The factorization
//! is therefore attempted on `M + w.I` where the weight `w` starts at a small seed
//! and is doubled after each failure, up to a bounded number of attempts.

use crate::errors::{LinalgError, Result};
#[cfg(feature = "blas")]
use linfa::dataset::{WithLapack, WithoutLapack};
use linfa::Float;
#[cfg(not(feature = "blas"))]
use linfa_linalg::cholesky::*;
use log::{debug, warn};
use ndarray::{Array2, ArrayBase, Data, Ix2};
#[cfg(feature = "blas")]
use ndarray_linalg::{cholesky::*, UPLO};

/// Default first weight added to the diagonal
pub const JITTER_SEED: f64 = 1e-10;
/// Default number of weights tried, each one twice the previous
pub const JITTER_MAX_ATTEMPTS: usize = 60;
/// Weight from which a successful factorization is reported as a warning
const JITTER_WARN_WEIGHT: f64 = 1e-6;

/// Diagonal regularization schedule used by [regularized_cholesky]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Jitter<F: Float> {
    seed: F,
    max_attempts: usize,
}

impl<F: Float> Default for Jitter<F> {
    fn default() -> Self {
        Jitter {
            seed: F::cast(JITTER_SEED),
            max_attempts: JITTER_MAX_ATTEMPTS,
        }
    }
}

impl<F: Float> Jitter<F> {
    /// Constructor given the first weight and the maximum number of attempts
    pub fn new(seed: F, max_attempts: usize) -> Self {
        Jitter { seed, max_attempts }
    }

    /// Set the first weight added to the diagonal
    pub fn with_seed(mut self, seed: F) -> Self {
        self.seed = seed;
        self
    }

    /// Set the maximum number of factorization attempts
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// First weight added to the diagonal
    pub fn seed(&self) -> F {
        self.seed
    }

    /// Maximum number of factorization attempts
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Successive diagonal weights: seed, 2.seed, 4.seed, ...
    pub fn weights(&self) -> impl Iterator<Item = F> {
        let two = F::cast(2.);
        std::iter::successors(Some(self.seed), move |w| Some(*w * two)).take(self.max_attempts)
    }
}

/// Compute the lower triangular factor `L` such that `L.L^t = m + w.I` where `w`
/// is the smallest weight of the `jitter` schedule for which the factorization succeeds.
///
/// Fails with [LinalgError::NotPositiveSemidefinite] when every weight of the
/// schedule has been tried without success and with [LinalgError::InvalidDimension]
/// when `m` is not square.
pub fn regularized_cholesky<F: Float>(
    jitter: &Jitter<F>,
    m: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Result<Array2<F>> {
    if m.nrows() != m.ncols() {
        return Err(LinalgError::InvalidDimension(format!(
            "cannot factor a non-square ({}, {}) matrix",
            m.nrows(),
            m.ncols()
        )));
    }
    if m.iter().any(|v| !v.is_finite()) {
        return Err(LinalgError::NotPositiveSemidefinite(
            "matrix has non-finite entries".to_string(),
        ));
    }
    for (attempt, weight) in jitter.weights().enumerate() {
        let mut regularized = m.to_owned();
        regularized.diag_mut().mapv_inplace(|v| v + weight);
        if let Some(chol) = try_cholesky(&regularized) {
            if attempt > 0 {
                debug!(
                    "Cholesky of ({}, {}) matrix succeeded with jitter {} after {} attempts",
                    m.nrows(),
                    m.ncols(),
                    weight,
                    attempt + 1
                );
            }
            if weight >= F::cast(JITTER_WARN_WEIGHT) {
                warn!("Ill-conditioned covariance matrix: jitter {weight} added to its diagonal");
            }
            return Ok(chol);
        }
    }
    Err(LinalgError::NotPositiveSemidefinite(format!(
        "cholesky factorization of ({}, {}) matrix failed after {} attempts with jitter from {}",
        m.nrows(),
        m.ncols(),
        jitter.max_attempts(),
        jitter.seed()
    )))
}

#[cfg(not(feature = "blas"))]
fn try_cholesky<F: Float>(m: &Array2<F>) -> Option<Array2<F>> {
    m.cholesky()
        .ok()
        .filter(|l| l.iter().all(|v| v.is_finite()))
        .map(lower_triangular)
}

#[cfg(feature = "blas")]
fn try_cholesky<F: Float>(m: &Array2<F>) -> Option<Array2<F>> {
    m.to_owned()
        .with_lapack()
        .cholesky(UPLO::Lower)
        .ok()
        .map(|l| l.without_lapack())
        .filter(|l| l.iter().all(|v| v.is_finite()))
        .map(lower_triangular)
}

/// Zero the strict upper triangle left over by the backend
fn lower_triangular<F: Float>(mut l: Array2<F>) -> Array2<F> {
    for ((i, j), v) in l.indexed_iter_mut() {
        if j > i {
            *v = F::zero();
        }
    }
    l
}

/// Log-determinant of `L.L^t` given its Cholesky factor `L`: `2 * sum(ln(L_ii))`
pub fn log_det_from_cholesky<F: Float>(l: &ArrayBase<impl Data<Elem = F>, Ix2>) -> F {
    l.diag().mapv(|v| v.ln()).sum() * F::cast(2.)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array};
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use rand_xoshiro::Xoshiro256Plus;

    fn random_spd(n: usize, seed: u64) -> Array2<f64> {
        let mut rng = Xoshiro256Plus::seed_from_u64(seed);
        let a = Array::random_using((n, n), Uniform::new(-1f64, 1.), &mut rng);
        a.dot(&a.t()) + Array2::<f64>::eye(n)
    }

    #[test]
    fn test_jitter_weights() {
        let jitter = Jitter::new(1e-10, 4);
        let weights: Vec<f64> = jitter.weights().collect();
        assert_eq!(weights.len(), 4);
        assert_abs_diff_eq!(weights[0], 1e-10);
        assert_abs_diff_eq!(weights[3], 8e-10);
    }

    #[test]
    fn test_default_jitter() {
        let jitter = Jitter::<f64>::default();
        assert_eq!(jitter.seed(), JITTER_SEED);
        assert_eq!(jitter.max_attempts(), JITTER_MAX_ATTEMPTS);
    }

    #[test]
    fn test_regularized_cholesky_reconstruction() {
        for (n, seed) in [(1, 0), (3, 1), (10, 2), (25, 3)] {
            let c = random_spd(n, seed);
            let l = regularized_cholesky(&Jitter::default(), &c).expect("factorization");
            assert_abs_diff_eq!(l.dot(&l.t()), c, epsilon = 1e-4);
            for i in 0..n {
                for j in (i + 1)..n {
                    assert_eq!(l[[i, j]], 0.);
                }
            }
        }
    }

    #[test]
    fn test_regularized_cholesky_singular() {
        // rank one matrix: only factorizable thanks to the jitter
        let c = Array2::<f64>::ones((4, 4));
        let l = regularized_cholesky(&Jitter::default(), &c).expect("factorization");
        assert_abs_diff_eq!(l.dot(&l.t()), c, epsilon = 1e-4);
    }

    #[test]
    fn test_regularized_cholesky_exhausted() {
        let c = array![[1., 2.], [2., 1.]];
        let res = regularized_cholesky(&Jitter::default().with_max_attempts(3), &c);
        assert!(matches!(res, Err(LinalgError::NotPositiveSemidefinite(_))));

        let c = array![[-1e12]];
        let res = regularized_cholesky(&Jitter::default(), &c);
        assert!(matches!(res, Err(LinalgError::NotPositiveSemidefinite(_))));
    }

    #[test]
    fn test_regularized_cholesky_non_finite() {
        let c = array![[1., f64::NAN], [f64::NAN, 1.]];
        let res = regularized_cholesky(&Jitter::default(), &c);
        assert!(matches!(res, Err(LinalgError::NotPositiveSemidefinite(_))));
    }

    #[test]
    fn test_regularized_cholesky_not_square() {
        let c = Array2::<f64>::ones((2, 3));
        let res = regularized_cholesky(&Jitter::default(), &c);
        assert!(matches!(res, Err(LinalgError::InvalidDimension(_))));
    }

    #[test]
    fn test_log_det_from_cholesky() {
        let c = array![[4., 2.], [2., 3.]];
        let l = regularized_cholesky(&Jitter::default(), &c).unwrap();
        assert_abs_diff_eq!(log_det_from_cholesky(&l), 8f64.ln(), epsilon = 1e-8);
    }
}
