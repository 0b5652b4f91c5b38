//! Multivariate normal distribution `N(mean, cov)`.
//!
//! Quantities derived from the covariance matrix (Cholesky root, inverses,
//! log-determinant) are computed on first use then cached for the lifetime
//! of the distribution.

use crate::errors::{fmt_point, GpError, Result};
use gaussproc_linalg::{
    back_solve_vec, forward_solve, forward_solve_vec, log_det_from_cholesky,
    regularized_cholesky, Jitter,
};
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
use ndarray_rand::rand::{thread_rng, Rng};
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_rand::RandomExt;
use once_cell::sync::OnceCell;
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Derived quantities of the covariance matrix, each set at most once
#[derive(Clone, Debug)]
struct Derived<F: Float> {
    root: OnceCell<Array2<F>>,
    root_inverse: OnceCell<Array2<F>>,
    cov_inverse: OnceCell<Array2<F>>,
    log_det: OnceCell<F>,
}

impl<F: Float> Default for Derived<F> {
    fn default() -> Self {
        Derived {
            root: OnceCell::new(),
            root_inverse: OnceCell::new(),
            cov_inverse: OnceCell::new(),
            log_det: OnceCell::new(),
        }
    }
}

/// Multivariate normal distribution given its mean vector and its covariance matrix
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(serialize = "F: Serialize", deserialize = "F: Deserialize<'de>"))
)]
pub struct MultivariateNormal<F: Float> {
    mean: Array1<F>,
    cov: Array2<F>,
    #[cfg_attr(feature = "serializable", serde(skip))]
    jitter: Jitter<F>,
    #[cfg_attr(feature = "serializable", serde(skip))]
    derived: Derived<F>,
}

impl<F: Float> PartialEq for MultivariateNormal<F> {
    fn eq(&self, other: &Self) -> bool {
        self.mean == other.mean && self.cov == other.cov
    }
}

impl<F: Float> fmt::Display for MultivariateNormal<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MVN(mean={}, cov={})", self.mean, self.cov)
    }
}

impl<F: Float> MultivariateNormal<F> {
    /// Constructor given the (n,) mean and the (n, n) covariance matrix
    ///
    /// Fails with [GpError::InvalidDimension] when `cov` is not square
    /// or when its size does not match the mean one.
    pub fn new(mean: Array1<F>, cov: Array2<F>) -> Result<Self> {
        if cov.nrows() != cov.ncols() {
            return Err(GpError::InvalidDimension(format!(
                "covariance matrix should be square, got ({}, {})",
                cov.nrows(),
                cov.ncols()
            )));
        }
        if mean.len() != cov.nrows() {
            return Err(GpError::InvalidDimension(format!(
                "mean of size {} does not match ({}, {}) covariance matrix",
                mean.len(),
                cov.nrows(),
                cov.ncols()
            )));
        }
        Ok(MultivariateNormal {
            mean,
            cov,
            jitter: Jitter::default(),
            derived: Derived::default(),
        })
    }

    /// Constructor given the mean and the principal axes of the distribution
    /// as `(direction, variance)` pairs.
    ///
    /// The covariance matrix is `P.diag(variances).P^t` where the columns of `P`
    /// are the given directions.
    pub fn from_axes(mean: Array1<F>, axes: &[(Array1<F>, F)]) -> Result<Self> {
        let dim = mean.len();
        if axes.len() != dim {
            return Err(GpError::InvalidDimension(format!(
                "expected {} axes, got {}",
                dim,
                axes.len()
            )));
        }
        if let Some((direction, _)) = axes.iter().find(|(d, _)| d.len() != dim) {
            return Err(GpError::InvalidDimension(format!(
                "axis direction of size {}, expected {}",
                direction.len(),
                dim
            )));
        }
        let mut directions = Array2::<F>::zeros((dim, dim));
        for (mut column, (direction, _)) in directions.columns_mut().into_iter().zip(axes) {
            column.assign(direction);
        }
        let variances = axes.iter().map(|(_, v)| *v).collect::<Array1<F>>();
        let scaled = &directions * &variances;
        let cov = scaled.dot(&directions.t());
        Self::new(mean, cov)
    }

    /// Estimate mean and covariance from n samples of dimension d given as a (n, d) matrix.
    ///
    /// The mean is computed with Welford's running algorithm, the covariance is the
    /// unbiased estimate (divided by `n - 1`, or 1 for a single sample).
    /// Fails with [GpError::InvalidValueError] when there is no sample.
    pub fn estimate_from_data(samples: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Self> {
        let (n, dim) = samples.dim();
        if n == 0 {
            return Err(GpError::InvalidValueError(
                "cannot estimate a distribution without samples".to_string(),
            ));
        }
        let mut mean = Array1::<F>::zeros(dim);
        let mut comoment = Array2::<F>::zeros((dim, dim));
        for (k, x) in samples.rows().into_iter().enumerate() {
            let before = &x - &mean;
            mean.scaled_add(F::one() / F::cast(k + 1), &before);
            let after = &x - &mean;
            let before = before.insert_axis(Axis(1));
            let after = after.insert_axis(Axis(0));
            comoment = comoment + before.dot(&after);
        }
        let divisor = if n > 1 { F::cast(n - 1) } else { F::one() };
        let cov = comoment.mapv(|v| v / divisor);
        // symmetrize from the lower triangle against rounding
        let cov = Array2::from_shape_fn((dim, dim), |(i, j)| {
            if j <= i {
                cov[[i, j]]
            } else {
                cov[[j, i]]
            }
        });
        Self::new(mean, cov)
    }

    /// Set the diagonal regularization used to factor the covariance matrix
    pub fn with_jitter(mut self, jitter: Jitter<F>) -> Self {
        self.jitter = jitter;
        self.derived = Derived::default();
        self
    }

    /// Dimension of the distribution
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Mean vector
    pub fn mean(&self) -> &Array1<F> {
        &self.mean
    }

    /// Covariance matrix
    pub fn cov(&self) -> &Array2<F> {
        &self.cov
    }

    /// Variances, i.e. diagonal of the covariance matrix
    pub fn variances(&self) -> Array1<F> {
        self.cov.diag().to_owned()
    }

    /// Lower triangular Cholesky factor `L` of the (regularized) covariance matrix
    pub fn root(&self) -> Result<&Array2<F>> {
        self.derived.root.get_or_try_init(|| {
            Ok(regularized_cholesky(&self.jitter, &self.cov)?)
        })
    }

    /// Inverse of the Cholesky factor `L^-1`
    pub fn root_inverse(&self) -> Result<&Array2<F>> {
        self.derived.root_inverse.get_or_try_init(|| {
            let root = self.root()?;
            Ok(forward_solve(root, &Array2::eye(self.dim()))?)
        })
    }

    /// Inverse of the covariance matrix `L^-t.L^-1`
    pub fn cov_inverse(&self) -> Result<&Array2<F>> {
        self.derived.cov_inverse.get_or_try_init(|| {
            let root_inverse = self.root_inverse()?;
            Ok(root_inverse.t().dot(root_inverse))
        })
    }

    /// Log-determinant of the covariance matrix
    pub fn log_det(&self) -> Result<F> {
        self.derived.log_det.get_or_try_init(|| {
            Ok(log_det_from_cholesky(self.root()?))
        })
        .copied()
    }

    /// Logarithm of the density normalization factor `-(log_det + dim.ln(2pi)) / 2`
    pub fn log_norm_factor(&self) -> Result<F> {
        let two_pi = F::cast(2. * std::f64::consts::PI);
        Ok(-F::cast(0.5) * (self.log_det()? + F::cast(self.dim()) * two_pi.ln()))
    }

    fn check_point(&self, x: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Result<()> {
        if x.len() != self.dim() {
            return Err(GpError::InvalidDimension(format!(
                "point {} should have {} components",
                fmt_point(x.iter()),
                self.dim()
            )));
        }
        Ok(())
    }

    /// Squared mahalanobis distance `(x - mean)^t.cov^-1.(x - mean)`
    pub fn mahalanobis_squared(&self, x: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Result<F> {
        self.check_point(x)?;
        let beta = forward_solve_vec(self.root()?, &(x - &self.mean))?;
        Ok(beta.dot(&beta))
    }

    /// Logarithm of the probability density at `x`
    pub fn log_density(&self, x: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Result<F> {
        let m2 = self.mahalanobis_squared(x)?;
        Ok(self.log_norm_factor()? - F::cast(0.5) * m2)
    }

    /// Probability density at `x`
    pub fn density(&self, x: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Result<F> {
        Ok(self.log_density(x)?.exp())
    }

    /// Draw a sample using the thread local random generator
    pub fn sample(&self) -> Result<Array1<F>> {
        self.sample_using(&mut thread_rng())
    }

    /// Draw a sample `mean + L.u` with `u ~ N(0, I)` using the given random generator
    pub fn sample_using<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Array1<F>> {
        let u = Array1::<f64>::random_using(self.dim(), StandardNormal, rng).mapv(F::cast);
        Ok(&self.mean + &self.root()?.dot(&u))
    }

    /// Draw n samples using the thread local random generator, returned as a (n, dim) matrix
    pub fn sample_n(&self, n: usize) -> Result<Array2<F>> {
        self.sample_n_using(n, &mut thread_rng())
    }

    /// Draw n samples using the given random generator, returned as a (n, dim) matrix
    pub fn sample_n_using<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Array2<F>> {
        let u = Array2::<f64>::random_using((n, self.dim()), StandardNormal, rng).mapv(F::cast);
        Ok(u.dot(&self.root()?.t()) + &self.mean)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.dim() {
            return Err(GpError::IndexError(format!(
                "index {} out of range for a distribution of dimension {}",
                index,
                self.dim()
            )));
        }
        Ok(())
    }

    /// Marginal distribution of the components at `indices`, in the given order
    pub fn marginal(&self, indices: &[usize]) -> Result<Self> {
        indices.iter().try_for_each(|&i| self.check_index(i))?;
        let mean = self.mean.select(Axis(0), indices);
        let cov = self
            .cov
            .select(Axis(0), indices)
            .select(Axis(1), indices);
        Ok(Self::new(mean, cov)?.with_jitter(self.jitter))
    }

    /// Distribution of the unobserved components (ascending order) given
    /// the `(index, value)` observations of the other ones.
    ///
    /// Fails with [GpError::IndexError] when an observed index is out of range or repeated.
    pub fn conditional(&self, observations: &[(usize, F)]) -> Result<Self> {
        let mut observed = vec![false; self.dim()];
        for &(i, _) in observations {
            self.check_index(i)?;
            if observed[i] {
                return Err(GpError::IndexError(format!(
                    "index {} observed more than once",
                    i
                )));
            }
            observed[i] = true;
        }
        let obs_idx = observations.iter().map(|(i, _)| *i).collect::<Vec<_>>();
        let unobs_idx = (0..self.dim())
            .filter(|&i| !observed[i])
            .collect::<Vec<_>>();
        if obs_idx.is_empty() {
            return Ok(self.clone());
        }

        let values = observations.iter().map(|(_, v)| *v).collect::<Array1<F>>();
        let mean_o = self.mean.select(Axis(0), &obs_idx);
        let mean_u = self.mean.select(Axis(0), &unobs_idx);
        let cov_o = self.cov.select(Axis(0), &obs_idx).select(Axis(1), &obs_idx);
        let cov_u = self
            .cov
            .select(Axis(0), &unobs_idx)
            .select(Axis(1), &unobs_idx);
        let cov_uo = self
            .cov
            .select(Axis(0), &unobs_idx)
            .select(Axis(1), &obs_idx);

        let root_o = regularized_cholesky(&self.jitter, &cov_o)?;
        let beta = forward_solve_vec(&root_o, &(&values - &mean_o))?;
        let weights = back_solve_vec(&root_o.t(), &beta)?;
        let mean = mean_u + cov_uo.dot(&weights);
        let w = forward_solve(&root_o, &cov_uo.t())?;
        let cov = cov_u - w.t().dot(&w);
        Ok(Self::new(mean, cov)?.with_jitter(self.jitter))
    }
}
