//! Gaussian process toolbox.
//!
//! This crate gathers:
//! * [linalg]: regularized Cholesky factorization and triangular solves used
//!   to factor covariance matrices,
//! * [gp]: domains, mean functions, composable kernels, multivariate normal
//!   distribution and gaussian process regression.
//!
//! # Example
//!
//! ```
//! use gaussproc::gp::{GaussianProcess, Kernel, Matern52, TrainingData};
//! use ndarray::array;
//!
//! let gp = GaussianProcess::zero_mean(Matern52::new(1., 2.).scale(0.5));
//! let data = TrainingData::new(array![[0.], [1.]], array![0.2, 0.4], array![1e-4, 1e-4])
//!     .expect("training data");
//! let regression = gp.regress(&data).expect("GP regression");
//! println!("lml = {}", regression.log_marginal_likelihood);
//! let marginal = regression.posterior.marginal_at(&array![0.5]).expect("marginal");
//! println!("posterior at 0.5: {}", marginal);
//! ```
#![warn(missing_docs)]

pub use gaussproc_gp as gp;
pub use gaussproc_linalg as linalg;
