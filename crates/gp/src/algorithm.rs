use crate::covariance::build_covariance_matrix;
use crate::errors::{fmt_point, GpError, Result};
use crate::kernels::Kernel;
use crate::mean_models::{MeanFunction, ZeroMean};
use crate::mvn::MultivariateNormal;

use linfa::prelude::{Float, PredictInplace};
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, Axis, Data, Ix1, Ix2};
use ndarray_rand::rand::Rng;
use std::fmt;
use std::marker::PhantomData;

/// A gaussian process, i.e. a distribution over functions defined by a mean function
/// and a kernel (covariance function).
///
/// Any finite sequence of points `x_1, ..., x_n` in the process domain (the intersection
/// of the mean and kernel domains) is distributed as the multivariate normal
/// `N([m(x_i)], [k(x_i, x_j)])`: this is the process [GaussianProcess::marginal].
///
/// The process is immutable: regression on training data
/// (see [GaussianProcess::regress]) returns a new posterior process.
///
/// # Example
///
/// ```
/// use gaussproc_gp::{GaussianProcess, SquaredExponential, ZeroMean};
/// use ndarray::array;
///
/// let gp = GaussianProcess::zero_mean(SquaredExponential::new(1., 0.5f64.sqrt()));
/// let mvn = gp.marginal(&array![[2.], [4.], [10.]]).expect("marginal distribution");
/// assert_eq!(mvn.dim(), 3);
/// assert_eq!(mvn.mean(), &array![0., 0., 0.]);
/// ```
pub struct GaussianProcess<F: Float, M: MeanFunction<F>, K: Kernel<F>> {
    /// Mean function
    pub(crate) mean: M,
    /// Covariance function
    pub(crate) kernel: K,
    phantom: PhantomData<F>,
}

impl<F: Float, K: Kernel<F>> GaussianProcess<F, ZeroMean, K> {
    /// Zero mean gaussian process constructor
    pub fn zero_mean(kernel: K) -> Self {
        GaussianProcess::new(ZeroMean, kernel)
    }
}

impl<F: Float, M: MeanFunction<F> + Clone, K: Kernel<F> + Clone> Clone
    for GaussianProcess<F, M, K>
{
    fn clone(&self) -> Self {
        Self {
            mean: self.mean.clone(),
            kernel: self.kernel.clone(),
            phantom: PhantomData,
        }
    }
}

impl<F: Float, M: MeanFunction<F> + fmt::Debug, K: Kernel<F> + fmt::Debug> fmt::Debug
    for GaussianProcess<F, M, K>
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("GaussianProcess")
            .field("mean", &self.mean)
            .field("kernel", &self.kernel)
            .finish()
    }
}

impl<F: Float, M: MeanFunction<F> + fmt::Display, K: Kernel<F> + fmt::Display> fmt::Display
    for GaussianProcess<F, M, K>
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "GP(mean={}, kernel={})", self.mean, self.kernel)
    }
}

impl<F: Float, M: MeanFunction<F>, K: Kernel<F>> GaussianProcess<F, M, K> {
    /// Gaussian process constructor given its mean function and its kernel
    pub fn new(mean: M, kernel: K) -> Self {
        GaussianProcess {
            mean,
            kernel,
            phantom: PhantomData,
        }
    }

    /// Mean function
    pub fn mean(&self) -> &M {
        &self.mean
    }

    /// Covariance function
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Whether `x` lies in both the mean and the kernel domains
    pub fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        self.mean.is_defined_at(x) && self.kernel.is_defined_at(x)
    }

    /// Check every point (row) of `x` lies in the process domain, in row order
    pub(crate) fn check_points(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<()> {
        match x.rows().into_iter().find(|xi| !self.is_defined_at(xi.view())) {
            Some(xi) => Err(GpError::OutOfDomain(format!(
                "point {} is outside of the gaussian process domain",
                fmt_point(xi.iter())
            ))),
            None => Ok(()),
        }
    }

    /// Joint distribution of the process values at n given `x` points of nx components
    /// specified as a (n, nx) matrix, in the order of the points.
    ///
    /// Fails with [GpError::OutOfDomain] naming the first point outside of the process domain.
    pub fn marginal(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<MultivariateNormal<F>> {
        self.check_points(x)?;
        let mean = self.mean.values(x.view())?;
        let cov = build_covariance_matrix(x, &self.kernel)?;
        MultivariateNormal::new(mean, cov)
    }

    /// Distribution of the process value at the single point `x`
    pub fn marginal_at(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Result<MultivariateNormal<F>> {
        self.marginal(&x.view().insert_axis(Axis(0)))
    }

    /// Draw process values at the n given `x` points specified as a (n, nx) matrix
    pub fn sample(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        self.marginal(x)?.sample()
    }

    /// Draw process values at the n given `x` points using the given random generator
    pub fn sample_using<R: Rng + ?Sized>(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        rng: &mut R,
    ) -> Result<Array1<F>> {
        self.marginal(x)?.sample_using(rng)
    }

    /// Draw `n_traj` trajectories of the process at the n given `x` points.
    /// Returns a (n_traj, n) matrix, one trajectory per row.
    pub fn sample_n(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        n_traj: usize,
    ) -> Result<Array2<F>> {
        self.marginal(x)?.sample_n(n_traj)
    }

    /// Draw `n_traj` trajectories of the process at the n given `x` points using
    /// the given random generator. Returns a (n_traj, n) matrix.
    pub fn sample_n_using<R: Rng + ?Sized>(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        n_traj: usize,
        rng: &mut R,
    ) -> Result<Array2<F>> {
        self.marginal(x)?.sample_n_using(n_traj, rng)
    }

    /// Predict output values at n given `x` points of nx components specified as a (n, nx) matrix.
    /// Returns n scalar output values as a vector (n,).
    pub fn predict(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        self.check_points(x)?;
        self.mean.values(x.view())
    }

    /// Predict variance values at n given `x` points of nx components specified as a (n, nx)
    /// matrix.
    /// Returns n variance values as (n,) column vector.
    pub fn predict_var(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        self.check_points(x)?;
        // Variance might be slightly negative for posterior processes depending on
        // machine precision: set to zero in that case
        Ok(x.rows()
            .into_iter()
            .map(|xi| self.kernel.value(xi, xi).max(F::zero()))
            .collect())
    }

    /// Predict both output values and variance at n given `x` points of nx components
    pub fn predict_valvar(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<(Array1<F>, Array1<F>)> {
        Ok((self.predict(x)?, self.predict_var(x)?))
    }
}

impl<F, D, M, K> PredictInplace<ArrayBase<D, Ix2>, Array1<F>> for GaussianProcess<F, M, K>
where
    F: Float,
    D: Data<Elem = F>,
    M: MeanFunction<F>,
    K: Kernel<F>,
{
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<F>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        let values = self.predict(x).expect("GP Prediction");
        *y = values;
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<F> {
        Array1::zeros((x.nrows(),))
    }
}

/// Gausssian Process adaptator to implement `linfa::Predict` trait for variance prediction.
pub struct GpVariancePredictor<'a, F, M, K>(pub &'a GaussianProcess<F, M, K>)
where
    F: Float,
    M: MeanFunction<F>,
    K: Kernel<F>;

impl<F, D, M, K> PredictInplace<ArrayBase<D, Ix2>, Array1<F>> for GpVariancePredictor<'_, F, M, K>
where
    F: Float,
    D: Data<Elem = F>,
    M: MeanFunction<F>,
    K: Kernel<F>,
{
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<F>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        let values = self.0.predict_var(x).expect("GP Prediction");
        *y = values;
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<F> {
        Array1::zeros(x.nrows())
    }
}
