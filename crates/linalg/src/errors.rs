use thiserror::Error;

/// A result type for covariance linear algebra
pub type Result<T> = std::result::Result<T, LinalgError>;

/// An error when factoring or solving with covariance matrices
#[derive(Error, Debug)]
pub enum LinalgError {
    /// When the jitter search is exhausted without a successful factorization
    #[error("Not positive semidefinite: {0}")]
    NotPositiveSemidefinite(String),
    /// When matrix and right-hand side shapes do not agree
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    /// When the pure Rust backend fails
    #[error(transparent)]
    Backend(#[from] linfa_linalg::LinalgError),
    /// When the BLAS/LAPACK backend fails
    #[cfg(feature = "blas")]
    #[error("Linalg BLAS error: {0}")]
    BlasBackend(#[from] ndarray_linalg::error::LinalgError),
}
