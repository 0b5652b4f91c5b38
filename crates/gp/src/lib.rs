//! This library implements
//! [Gaussian Process](https://en.wikipedia.org/wiki/Gaussian_process) regression
//! with composable kernels.
//!
//! A gaussian process is defined by a mean function (see [mean_models]) and a kernel
//! (see [kernels]), both defined on a domain of points (see [domains]).
//! Kernels are combined by sum, product, scaling, input transformation and domain restriction.
//!
//! The process implemented by [GaussianProcess] gives access to:
//! * its finite dimensional marginals as [MultivariateNormal] distributions,
//! * samples of its trajectories,
//! * regression on noisy training data ([TrainingData]) resulting in a posterior process
//!   and the log marginal likelihood of the data, parameterized by [GpParams].
//!
//! # Example
//!
//! ```
//! use gaussproc_gp::{GaussianProcess, TrainingData};
//! use gaussproc_gp::kernels::{Kernel, SquaredExponential, WhiteNoise};
//! use ndarray::array;
//!
//! let kernel = SquaredExponential::new(1., 1.).add(WhiteNoise::new(0.01));
//! let gp = GaussianProcess::zero_mean(kernel);
//!
//! let xt = array![[0.], [1.], [2.], [3.]];
//! let yt = xt.column(0).mapv(f64::sin);
//! let data = TrainingData::noise_free(xt, yt).expect("valid training data");
//! let regression = gp.regress(&data).expect("GP regression");
//!
//! let ypred = regression.posterior.predict(&array![[1.5]]).expect("GP prediction");
//! assert!((ypred[0] - 1.5f64.sin()).abs() < 0.1);
//! ```
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod algorithm;
pub mod covariance;
pub mod domains;
mod errors;
pub mod kernels;
pub mod mean_models;
mod mvn;
mod parameters;
mod regression;

pub use algorithm::*;
pub use covariance::*;
pub use domains::*;
pub use errors::*;
pub use kernels::*;
pub use mean_models::*;
pub use mvn::*;
pub use parameters::*;
pub use regression::*;
