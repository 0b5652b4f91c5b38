//! Gaussian process regression on noisy observations.
//!
//! Given training points `X`, observed values `y` and independent noise variances `s2`,
//! the posterior process is computed from the Cholesky factor `L` of
//! `K = k(X, X) + diag(s2)`:
//! * mean: `m(x) + k(x, X).alpha` where `alpha = K^-1.(y - m(X))`,
//! * kernel: `k(x, y) - (L^-1.k(X, x)).(L^-1.k(X, y))`.
//!
//! Both share the factorization: no matrix is recomputed when the posterior is queried.

use crate::algorithm::GaussianProcess;
use crate::covariance::build_covariance_matrix;
use crate::errors::{GpError, Result};
use crate::kernels::Kernel;
use crate::mean_models::MeanFunction;
use crate::mvn::MultivariateNormal;
use crate::parameters::{GpParams, GpValidParams};

use gaussproc_linalg::{
    back_solve_vec, forward_solve, forward_solve_vec, log_det_from_cholesky,
    regularized_cholesky,
};
use linfa::{Float, ParamGuard};
use log::debug;
use ndarray::{Array1, Array2, ArrayView1};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// An observation `value` of the process at `point` corrupted by a `noise`.
///
/// Only the variance of the noise (the `(0, 0)` entry of its covariance matrix) is used
/// by the regression: observation noises are independent scalar gaussian noises.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingPoint<F: Float> {
    point: Array1<F>,
    value: F,
    noise: MultivariateNormal<F>,
}

impl<F: Float> TrainingPoint<F> {
    /// Constructor, fails with [GpError::InvalidDimension] when `noise` is zero-dimensional
    pub fn new(point: Array1<F>, value: F, noise: MultivariateNormal<F>) -> Result<Self> {
        if noise.dim() == 0 {
            return Err(GpError::InvalidDimension(
                "noise distribution should have at least one dimension".to_string(),
            ));
        }
        Ok(TrainingPoint {
            point,
            value,
            noise,
        })
    }

    /// Observation with a centered gaussian noise of variance `noise_variance`
    pub fn with_noise_variance(point: Array1<F>, value: F, noise_variance: F) -> Result<Self> {
        let noise =
            MultivariateNormal::new(Array1::zeros(1), Array2::from_elem((1, 1), noise_variance))?;
        Self::new(point, value, noise)
    }

    /// Observed point
    pub fn point(&self) -> &Array1<F> {
        &self.point
    }

    /// Observed value
    pub fn value(&self) -> F {
        self.value
    }

    /// Noise distribution
    pub fn noise(&self) -> &MultivariateNormal<F> {
        &self.noise
    }

    /// Noise variance used by the regression
    pub fn noise_variance(&self) -> F {
        self.noise.cov()[[0, 0]]
    }
}

/// A set of n training observations: (n, nx) points, (n,) values and (n,) noise variances
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingData<F: Float> {
    points: Array2<F>,
    values: Array1<F>,
    noise_variances: Array1<F>,
}

impl<F: Float> TrainingData<F> {
    /// Constructor given n points as a (n, nx) matrix, their n observed values
    /// and the n variances of the observation noises.
    ///
    /// Fails with [GpError::InvalidDimension] when sizes do not match.
    pub fn new(points: Array2<F>, values: Array1<F>, noise_variances: Array1<F>) -> Result<Self> {
        if values.len() != points.nrows() || noise_variances.len() != points.nrows() {
            return Err(GpError::InvalidDimension(format!(
                "training data should have as many values and noise variances as points, \
                 got {} points, {} values, {} noise variances",
                points.nrows(),
                values.len(),
                noise_variances.len()
            )));
        }
        Ok(TrainingData {
            points,
            values,
            noise_variances,
        })
    }

    /// Constructor for exact observations
    pub fn noise_free(points: Array2<F>, values: Array1<F>) -> Result<Self> {
        let noise_variances = Array1::zeros(values.len());
        Self::new(points, values, noise_variances)
    }

    /// Constructor from `(point, value, noise)` triplets
    ///
    /// Fails with [GpError::InvalidDimension] when points do not share the same dimension.
    pub fn from_triplets(triplets: impl IntoIterator<Item = TrainingPoint<F>>) -> Result<Self> {
        let triplets = triplets.into_iter().collect::<Vec<_>>();
        let nx = triplets.first().map_or(0, |t| t.point.len());
        let mut points = Array2::zeros((0, nx));
        for triplet in triplets.iter() {
            points
                .push_row(triplet.point.view())
                .map_err(|_| {
                    GpError::InvalidDimension(format!(
                        "training point of dimension {}, expected {}",
                        triplet.point.len(),
                        nx
                    ))
                })?;
        }
        let values = triplets.iter().map(|t| t.value).collect();
        let noise_variances = triplets.iter().map(|t| t.noise_variance()).collect();
        Self::new(points, values, noise_variances)
    }

    /// Training points as a (n, nx) matrix
    pub fn points(&self) -> &Array2<F> {
        &self.points
    }

    /// Observed values
    pub fn values(&self) -> &Array1<F> {
        &self.values
    }

    /// Observation noise variances
    pub fn noise_variances(&self) -> &Array1<F> {
        &self.noise_variances
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there is no observation
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Factorization of the training covariance matrix shared by the posterior mean and kernel
#[derive(Debug)]
struct PosteriorState<F: Float, K> {
    /// Prior kernel
    kernel: K,
    /// Training points
    points: Array2<F>,
    /// Inverse of the Cholesky factor of the training covariance matrix
    root_inverse: Array2<F>,
    /// `K^-1.(y - m(X))`
    alpha: Array1<F>,
}

impl<F: Float, K: Kernel<F>> PosteriorState<F, K> {
    /// Points of the training dimension in the prior kernel domain
    fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        x.len() == self.points.ncols() && self.kernel.is_defined_at(x)
    }

    /// `k(X, x)` for a point in the kernel domain
    fn covariance_vector(&self, x: ArrayView1<F>) -> Array1<F> {
        self.points
            .rows()
            .into_iter()
            .map(|p| self.kernel.value(p, x))
            .collect()
    }
}

/// Posterior mean function `m(x) + k(x, X).alpha`
#[derive(Debug)]
pub struct PosteriorMean<F: Float, M, K> {
    prior_mean: M,
    state: Arc<PosteriorState<F, K>>,
}

impl<F: Float, M: Clone, K> Clone for PosteriorMean<F, M, K> {
    fn clone(&self) -> Self {
        PosteriorMean {
            prior_mean: self.prior_mean.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<F: Float, M: MeanFunction<F>, K: Kernel<F>> MeanFunction<F> for PosteriorMean<F, M, K> {
    fn value(&self, x: ArrayView1<F>) -> F {
        self.prior_mean.value(x) + self.state.covariance_vector(x).dot(&self.state.alpha)
    }

    fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        self.prior_mean.is_defined_at(x) && self.state.is_defined_at(x)
    }
}

impl<F: Float, M: fmt::Display, K> fmt::Display for PosteriorMean<F, M, K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Posterior({}, n_train={})",
            self.prior_mean,
            self.state.points.nrows()
        )
    }
}

/// Posterior kernel `k(x, y) - (L^-1.k(X, x)).(L^-1.k(X, y))`
#[derive(Debug)]
pub struct PosteriorKernel<F: Float, K> {
    state: Arc<PosteriorState<F, K>>,
}

impl<F: Float, K> Clone for PosteriorKernel<F, K> {
    fn clone(&self) -> Self {
        PosteriorKernel {
            state: Arc::clone(&self.state),
        }
    }
}

impl<F: Float, K: Kernel<F>> Kernel<F> for PosteriorKernel<F, K> {
    fn value(&self, x: ArrayView1<F>, y: ArrayView1<F>) -> F {
        let vx = self.state.root_inverse.dot(&self.state.covariance_vector(x));
        let vy = self.state.root_inverse.dot(&self.state.covariance_vector(y));
        self.state.kernel.value(x, y) - vx.dot(&vy)
    }

    fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        self.state.is_defined_at(x)
    }
}

impl<F: Float, K: fmt::Display> fmt::Display for PosteriorKernel<F, K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Posterior({}, n_train={})",
            self.state.kernel,
            self.state.points.nrows()
        )
    }
}

/// Posterior gaussian process type resulting from a regression
pub type PosteriorProcess<F, M, K> =
    GaussianProcess<F, PosteriorMean<F, M, K>, PosteriorKernel<F, K>>;

/// Result of a gaussian process regression
pub struct Regression<F: Float, M: MeanFunction<F>, K: Kernel<F>> {
    /// Posterior process given the training data
    pub posterior: PosteriorProcess<F, M, K>,
    /// Log marginal likelihood of the training data under the prior process
    pub log_marginal_likelihood: F,
}

/// Cholesky factor of the training covariance matrix and whitened residuals
struct TrainingFactorization<F: Float> {
    root: Array2<F>,
    beta: Array1<F>,
}

impl<F: Float> TrainingFactorization<F> {
    /// `-(beta^t.beta + log_det(K) + n.ln(2pi)) / 2`
    fn log_marginal_likelihood(&self) -> F {
        let n = F::cast(self.beta.len());
        let two_pi = F::cast(2. * std::f64::consts::PI);
        -F::cast(0.5)
            * (self.beta.dot(&self.beta) + log_det_from_cholesky(&self.root) + n * two_pi.ln())
    }
}

impl<F: Float, M: MeanFunction<F>, K: Kernel<F>> GaussianProcess<F, M, K> {
    fn factorize(
        &self,
        params: &GpValidParams<F>,
        data: &TrainingData<F>,
    ) -> Result<TrainingFactorization<F>> {
        if data.is_empty() {
            return Err(GpError::InvalidValueError(
                "regression requires at least one training point".to_string(),
            ));
        }
        self.check_points(data.points())?;
        let mut cov = build_covariance_matrix(data.points(), &self.kernel)?;
        let mut diag = cov.diag_mut();
        diag += data.noise_variances();
        let root = regularized_cholesky(&params.jitter(), &cov)?;
        let residuals = data.values() - &self.mean.values(data.points().view())?;
        let beta = forward_solve_vec(&root, &residuals)?;
        Ok(TrainingFactorization { root, beta })
    }

    /// Log marginal likelihood `ln p(y | X)` of the training data under this process
    /// using default [GpParams].
    pub fn log_marginal_likelihood(&self, data: &TrainingData<F>) -> Result<F> {
        self.log_marginal_likelihood_with(&GpParams::new().check()?, data)
    }

    /// Log marginal likelihood `ln p(y | X)` of the training data under this process
    pub fn log_marginal_likelihood_with(
        &self,
        params: &GpValidParams<F>,
        data: &TrainingData<F>,
    ) -> Result<F> {
        Ok(self.factorize(params, data)?.log_marginal_likelihood())
    }
}

impl<F: Float, M: MeanFunction<F> + Clone, K: Kernel<F> + Clone> GaussianProcess<F, M, K> {
    /// Posterior process given the training data and log marginal likelihood of
    /// the data under this process using default [GpParams].
    ///
    /// Fails with [GpError::InvalidValueError] when there is no training data,
    /// [GpError::OutOfDomain] when a training point is outside of the process domain
    /// and [GpError::NotPositiveSemidefinite] when the training covariance matrix
    /// cannot be factored.
    pub fn regress(&self, data: &TrainingData<F>) -> Result<Regression<F, M, K>> {
        self.regress_with(&GpParams::new().check()?, data)
    }

    /// Posterior process given the training data and log marginal likelihood of
    /// the data under this process.
    pub fn regress_with(
        &self,
        params: &GpValidParams<F>,
        data: &TrainingData<F>,
    ) -> Result<Regression<F, M, K>> {
        let now = Instant::now();
        debug!(
            "GP regression on {} training points of dimension {}",
            data.len(),
            data.points().ncols()
        );
        let factorization = self.factorize(params, data)?;
        let alpha = back_solve_vec(&factorization.root.t(), &factorization.beta)?;
        let n = data.len();
        let root_inverse = forward_solve(&factorization.root, &Array2::eye(n))?;
        let log_marginal_likelihood = factorization.log_marginal_likelihood();

        let state = Arc::new(PosteriorState {
            kernel: self.kernel.clone(),
            points: data.points().to_owned(),
            root_inverse,
            alpha,
        });
        let posterior = GaussianProcess::new(
            PosteriorMean {
                prior_mean: self.mean.clone(),
                state: Arc::clone(&state),
            },
            PosteriorKernel { state },
        );
        debug!("log marginal likelihood = {}", log_marginal_likelihood);
        debug!("elapsed regression = {:?}", now.elapsed().as_millis());
        Ok(Regression {
            posterior,
            log_marginal_likelihood,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::BoxDomain;
    use crate::kernels::{ConstantKernel, Matern52, SquaredExponential, WhiteNoise};
    use crate::mean_models::{ConstantMean, ZeroMean};
    use approx::assert_abs_diff_eq;
    use ndarray::{arr1, array, Array, Axis};

    fn training_data() -> TrainingData<f64> {
        let xt = array![[0.0], [1.0], [2.0], [3.0], [4.0]];
        let yt = xt.column(0).mapv(f64::sin);
        TrainingData::new(xt, yt, Array1::from_elem(5, 1e-6)).unwrap()
    }

    #[test]
    fn test_training_data() {
        assert!(matches!(
            TrainingData::new(array![[0.], [1.]], array![1.], array![0., 0.]),
            Err(GpError::InvalidDimension(_))
        ));
        assert!(matches!(
            TrainingData::new(array![[0.], [1.]], array![1., 2.], array![0.]),
            Err(GpError::InvalidDimension(_))
        ));

        let noise = MultivariateNormal::new(array![0., 0.], array![[0.5, 0.1], [0.1, 3.]]).unwrap();
        let triplets = vec![
            TrainingPoint::new(array![0., 1.], 1., noise.clone()).unwrap(),
            TrainingPoint::with_noise_variance(array![2., 3.], 2., 0.25).unwrap(),
        ];
        let data = TrainingData::from_triplets(triplets).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.points(), &array![[0., 1.], [2., 3.]]);
        // only the first variance of the noise distribution is used
        assert_eq!(data.noise_variances(), &array![0.5, 0.25]);

        let bad = vec![
            TrainingPoint::with_noise_variance(array![0., 1.], 1., 0.).unwrap(),
            TrainingPoint::with_noise_variance(array![2.], 2., 0.).unwrap(),
        ];
        assert!(matches!(
            TrainingData::from_triplets(bad),
            Err(GpError::InvalidDimension(_))
        ));
        assert!(matches!(
            TrainingPoint::new(
                array![0.],
                1.,
                MultivariateNormal::new(Array1::zeros(0), Array2::zeros((0, 0))).unwrap()
            ),
            Err(GpError::InvalidDimension(_))
        ));
    }

    #[test]
    fn test_regression_interpolates() {
        let gp = GaussianProcess::zero_mean(SquaredExponential::new(1., 1.));
        let data = training_data();
        let regression = gp.regress(&data).unwrap();
        let posterior = regression.posterior;
        let (values, variances) = posterior.predict_valvar(data.points()).unwrap();
        assert_abs_diff_eq!(values, data.values().clone(), epsilon = 1e-3);
        assert_abs_diff_eq!(variances, Array1::zeros(5), epsilon = 1e-3);

        // far from training data the prior is recovered
        let far = array![[50.]];
        assert_abs_diff_eq!(posterior.predict(&far).unwrap()[0], 0., epsilon = 1e-10);
        assert_abs_diff_eq!(posterior.predict_var(&far).unwrap()[0], 1., epsilon = 1e-10);
    }

    #[test]
    fn test_regression_with_prior_mean() {
        let kernel = Matern52::new(1., 1.);
        let data = TrainingData::noise_free(array![[0.], [1.]], array![10., 11.]).unwrap();
        let gp = GaussianProcess::new(ConstantMean(10.5), kernel);
        let posterior = gp.regress(&data).unwrap().posterior;
        let values = posterior.predict(&array![[0.], [1.], [100.]]).unwrap();
        assert_abs_diff_eq!(values, array![10., 11., 10.5], epsilon = 1e-4);
    }

    #[test]
    fn test_posterior_marginal_is_conditional() {
        let kernel = SquaredExponential::new(1.5, 0.7);
        let gp = GaussianProcess::zero_mean(kernel);
        let data = TrainingData::noise_free(array![[0.], [1.]], array![0.3, -0.4]).unwrap();
        let posterior = gp.regress(&data).unwrap().posterior;
        let x = array![[0.5], [2.]];
        let post = posterior.marginal(&x).unwrap();

        let all = array![[0.], [1.], [0.5], [2.]];
        let joint = gp.marginal(&all).unwrap();
        let cond = joint.conditional(&[(0, 0.3), (1, -0.4)]).unwrap();
        assert_abs_diff_eq!(post.mean(), cond.mean(), epsilon = 1e-6);
        assert_abs_diff_eq!(post.cov(), cond.cov(), epsilon = 1e-6);
        assert_eq!(post.cov(), &post.cov().t());
    }

    #[test]
    fn test_log_marginal_likelihood() {
        let gp =
            GaussianProcess::zero_mean(SquaredExponential::new(1., 1.).add(WhiteNoise::new(0.1)));
        let data = training_data();
        let regression = gp.regress(&data).unwrap();
        let lml = gp.log_marginal_likelihood(&data).unwrap();
        assert_eq!(regression.log_marginal_likelihood, lml);

        // single observation: ln N(y; 0, 1 + s2)
        let gp = GaussianProcess::zero_mean(SquaredExponential::new(1., 1.));
        let data = TrainingData::new(array![[0.]], array![0.5], array![1.]).unwrap();
        let expected = MultivariateNormal::new(array![0.], array![[2.]])
            .unwrap()
            .log_density(&arr1(&[0.5]))
            .unwrap();
        assert_abs_diff_eq!(
            gp.log_marginal_likelihood(&data).unwrap(),
            expected,
            epsilon = 1e-8
        );
    }

    #[test]
    fn test_lml_prefers_suited_kernel() {
        let xt = Array::linspace(0., 10., 20).insert_axis(Axis(1));
        let yt = xt.column(0).mapv(|x: f64| (x / 2.).sin());
        let data = TrainingData::new(xt, yt, Array1::from_elem(20, 1e-4)).unwrap();
        let smooth = GaussianProcess::zero_mean(SquaredExponential::new(1., 2.));
        let rough = GaussianProcess::zero_mean(SquaredExponential::new(1., 0.05));
        assert!(
            smooth.log_marginal_likelihood(&data).unwrap()
                > rough.log_marginal_likelihood(&data).unwrap()
        );
    }

    #[test]
    fn test_regression_errors() {
        let domain = BoxDomain::new(&array![[0., 3.]]).unwrap();
        let gp = GaussianProcess::zero_mean(SquaredExponential::<f64>::default().restrict(domain));
        let empty = TrainingData::noise_free(Array2::zeros((0, 1)), Array1::zeros(0)).unwrap();
        assert!(matches!(
            gp.regress(&empty),
            Err(GpError::InvalidValueError(_))
        ));
        assert!(matches!(
            gp.log_marginal_likelihood(&empty),
            Err(GpError::InvalidValueError(_))
        ));
        assert!(matches!(
            gp.regress(&training_data()),
            Err(GpError::OutOfDomain(_))
        ));

        let params = GpParams::new().max_jitter_attempts(1).check().unwrap();
        let data = TrainingData::noise_free(array![[1.]], array![0.]).unwrap();
        let gp = GaussianProcess::new(ZeroMean, ConstantKernel(-1.));
        assert!(matches!(
            gp.regress_with(&params, &data),
            Err(GpError::NotPositiveSemidefinite(_))
        ));

        let gp = GaussianProcess::zero_mean(SquaredExponential::new(1., 1.));
        let posterior = gp.regress(&data).unwrap().posterior;
        assert!(matches!(
            posterior.predict(&array![[1., 2.]]),
            Err(GpError::OutOfDomain(_))
        ));
    }

    #[test]
    fn test_display() {
        let gp = GaussianProcess::new(ConstantMean(1.), SquaredExponential::new(1., 2.));
        let data = TrainingData::noise_free(array![[0.]], array![1.]).unwrap();
        let posterior = gp.regress(&data).unwrap().posterior;
        assert_eq!(
            posterior.to_string(),
            "GP(mean=Posterior(Constant(1), n_train=1), \
             kernel=Posterior(SquaredExponential(sigma=1, length_scale=2), n_train=1))"
        );
    }
}
