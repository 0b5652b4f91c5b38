//! This library implements the linear algebra needed to work with
//! [covariance matrices](https://en.wikipedia.org/wiki/Covariance_matrix) in
//! gaussian process regression: a
//! [Cholesky factorization](https://en.wikipedia.org/wiki/Cholesky_decomposition)
//! regularized by a diagonal jitter, and forward/back substitutions with the resulting
//! triangular factors.
//!
//! Covariance matrices are often ill-conditioned. [regularized_cholesky] adds a small
//! weight to the diagonal, doubling it until the factorization succeeds, within a bounded
//! number of attempts given by a [Jitter] schedule.
//!
//! Factorization is O(n^3), each solve O(n^2) per right-hand side column.
//!
//! Example:
//! ```
//! use gaussproc_linalg::{regularized_cholesky, forward_solve_vec, back_solve_vec, Jitter};
//! use ndarray::array;
//!
//! let cov = array![[2f64, 1.], [1., 2.]];
//! let l = regularized_cholesky(&Jitter::default(), &cov).unwrap();
//! let b = array![1., 3.];
//! // cov^-1.b using two triangular solves
//! let x = back_solve_vec(&l.t(), &forward_solve_vec(&l, &b).unwrap()).unwrap();
//! assert!((cov.dot(&x) - &b).iter().all(|v| v.abs() < 1e-6));
//! ```
//!
//! # Features
//!
//! ## blas
//!
//! The `blas` feature enables the use of BLAS/LAPACK linear algebra backend available
//! with [`ndarray-linalg`](https://github.com/rust-ndarray/ndarray-linalg) instead of
//! the pure Rust [`linfa-linalg`](https://github.com/rust-ml/linfa-linalg).
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod cholesky;
mod errors;
mod triangular;

pub use cholesky::*;
pub use errors::*;
pub use triangular::*;
