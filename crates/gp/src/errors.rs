use gaussproc_linalg::LinalgError;
use thiserror::Error;

/// A result type for GP regression algorithm
pub type Result<T> = std::result::Result<T, GpError>;

/// An error when using kernels, [`MultivariateNormal`](crate::MultivariateNormal)
/// or [`GaussianProcess`](crate::GaussianProcess)
#[derive(Error, Debug)]
pub enum GpError {
    /// When a point lies outside the domain of a kernel, a mean or a process
    #[error("OutOfDomain error: {0}")]
    OutOfDomain(String),
    /// When sizes of vectors, matrices or points do not agree
    #[error("InvalidDimension error: {0}")]
    InvalidDimension(String),
    /// When an index is outside of the valid range
    #[error("Index error: {0}")]
    IndexError(String),
    /// When a covariance matrix cannot be factored even with the maximum jitter
    #[error("NotPositiveSemidefinite error: {0}")]
    NotPositiveSemidefinite(String),
    /// When linear algebra computation fails
    #[error(transparent)]
    LinalgError(LinalgError),
    /// When error due to a bad value
    #[error("InvalidValue error: {0}")]
    InvalidValueError(String),
}

impl From<LinalgError> for GpError {
    fn from(err: LinalgError) -> Self {
        match err {
            LinalgError::NotPositiveSemidefinite(msg) => GpError::NotPositiveSemidefinite(msg),
            LinalgError::InvalidDimension(msg) => GpError::InvalidDimension(msg),
            err => GpError::LinalgError(err),
        }
    }
}

/// Format a point as `[x1, x2, ...]` for error messages
pub(crate) fn fmt_point<F: std::fmt::Display>(x: impl IntoIterator<Item = F>) -> String {
    let components = x.into_iter().map(|v| v.to_string()).collect::<Vec<_>>();
    format!("[{}]", components.join(", "))
}
