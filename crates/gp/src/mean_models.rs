//! A module for mean functions of gaussian processes.
//!
//! A mean function maps a point to a real value on its domain of definition.
//! The following models are implemented:
//! * zero,
//! * constant,
//! * linear (affine),
//! * user defined function.
//!
//! Any mean can be restricted to a smaller domain with [MeanFunction::restrict].

use crate::domains::Domain;
use crate::errors::{fmt_point, GpError, Result};
use linfa::Float;
use ndarray::{Array1, ArrayView1, ArrayView2};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A trait for mean functions used as prior mean of a gaussian process
pub trait MeanFunction<F: Float> {
    /// Value of the mean at point `x`, domain is not checked
    fn value(&self, x: ArrayView1<F>) -> F;

    /// Whether the mean is defined at `x`, everywhere by default
    fn is_defined_at(&self, _x: ArrayView1<F>) -> bool {
        true
    }

    /// Value of the mean at point `x`
    ///
    /// Fails with [GpError::OutOfDomain] when `x` is outside of the mean domain.
    fn evaluate(&self, x: ArrayView1<F>) -> Result<F> {
        if !self.is_defined_at(x) {
            return Err(GpError::OutOfDomain(format!(
                "point {} is outside of the mean function domain",
                fmt_point(x.iter())
            )));
        }
        Ok(self.value(x))
    }

    /// Values of the mean at the n points given as a (n, nx) matrix, in row order
    fn values(&self, x: ArrayView2<F>) -> Result<Array1<F>> {
        x.rows()
            .into_iter()
            .map(|xi| self.evaluate(xi))
            .collect::<Result<Vec<_>>>()
            .map(Array1::from)
    }

    /// Same mean function only defined on the intersection of its domain with `domain`
    fn restrict<D: Domain<F>>(self, domain: D) -> RestrictedMean<Self, D>
    where
        Self: Sized,
    {
        RestrictedMean { mean: self, domain }
    }
}

impl<F: Float, M: MeanFunction<F> + ?Sized> MeanFunction<F> for &M {
    fn value(&self, x: ArrayView1<F>) -> F {
        (**self).value(x)
    }
    fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        (**self).is_defined_at(x)
    }
}

impl<F: Float, M: MeanFunction<F> + ?Sized> MeanFunction<F> for Arc<M> {
    fn value(&self, x: ArrayView1<F>) -> F {
        (**self).value(x)
    }
    fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        (**self).is_defined_at(x)
    }
}

/// The null function as mean of the GP
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct ZeroMean;

impl<F: Float> MeanFunction<F> for ZeroMean {
    fn value(&self, _x: ArrayView1<F>) -> F {
        F::zero()
    }
}

impl fmt::Display for ZeroMean {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Zero")
    }
}

/// A constant function as mean of the GP
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct ConstantMean<F: Float>(pub F);

impl<F: Float> MeanFunction<F> for ConstantMean<F> {
    fn value(&self, _x: ArrayView1<F>) -> F {
        self.0
    }
}

impl<F: Float> fmt::Display for ConstantMean<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Constant({})", self.0)
    }
}

/// An affine function as mean of the GP: `m(x) = intercept + weights.x`
///
/// Only defined at points with as many components as weights.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct LinearMean<F: Float> {
    intercept: F,
    weights: Array1<F>,
}

impl<F: Float> LinearMean<F> {
    /// Constructor given the constant term and the (nx,) weights
    pub fn new(intercept: F, weights: Array1<F>) -> Self {
        LinearMean { intercept, weights }
    }

    /// Constant term
    pub fn intercept(&self) -> F {
        self.intercept
    }

    /// Linear coefficients
    pub fn weights(&self) -> &Array1<F> {
        &self.weights
    }
}

impl<F: Float> MeanFunction<F> for LinearMean<F> {
    fn value(&self, x: ArrayView1<F>) -> F {
        self.intercept + self.weights.dot(&x)
    }

    fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        x.len() == self.weights.len()
    }
}

impl<F: Float> fmt::Display for LinearMean<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Linear({}, {})", self.intercept, self.weights)
    }
}

/// A user defined function as mean of the GP
#[derive(Clone, Copy)]
pub struct FnMean<P>(P);

impl<P> FnMean<P> {
    /// Constructor given the function
    pub fn new<F: Float>(function: P) -> Self
    where
        P: Fn(ArrayView1<F>) -> F,
    {
        FnMean(function)
    }
}

impl<F: Float, P: Fn(ArrayView1<F>) -> F> MeanFunction<F> for FnMean<P> {
    fn value(&self, x: ArrayView1<F>) -> F {
        (self.0)(x)
    }
}

impl<P> fmt::Display for FnMean<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Function")
    }
}

/// A mean function restricted to a domain, see [MeanFunction::restrict]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RestrictedMean<M, D> {
    mean: M,
    domain: D,
}

impl<F: Float, M: MeanFunction<F>, D: Domain<F>> MeanFunction<F> for RestrictedMean<M, D> {
    fn value(&self, x: ArrayView1<F>) -> F {
        self.mean.value(x)
    }

    fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        self.domain.is_defined_at(x) && self.mean.is_defined_at(x)
    }
}

impl<M: fmt::Display, D> fmt::Display for RestrictedMean<M, D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Restricted({})", self.mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::BoxDomain;
    use approx::assert_abs_diff_eq;
    use ndarray::{arr1, array};

    #[test]
    fn test_constant_and_zero_means() {
        let x = array![[1., 2.], [3., 4.], [5., 6.]];
        assert_abs_diff_eq!(ZeroMean.values(x.view()).unwrap(), Array1::zeros(3));
        assert_abs_diff_eq!(
            ConstantMean(3.1).values(x.view()).unwrap(),
            Array1::from_elem(3, 3.1)
        );
    }

    #[test]
    fn test_linear_mean() {
        let mean = LinearMean::new(1., array![2., -1.]);
        assert_abs_diff_eq!(mean.evaluate(arr1(&[3., 4.]).view()).unwrap(), 3.);
        assert!(matches!(
            mean.evaluate(arr1(&[3.]).view()),
            Err(GpError::OutOfDomain(_))
        ));
    }

    #[test]
    fn test_fn_mean() {
        let mean = FnMean::new(|x: ArrayView1<f64>| x.sum().sin());
        let x = array![[0.], [std::f64::consts::FRAC_PI_2]];
        assert_abs_diff_eq!(mean.values(x.view()).unwrap(), array![0., 1.], epsilon = 1e-12);
    }

    #[test]
    fn test_restricted_mean() {
        let domain = BoxDomain::new(&array![[0., 1.]]).unwrap();
        let mean = ConstantMean(2.).restrict(domain);
        assert_abs_diff_eq!(mean.evaluate(arr1(&[0.5]).view()).unwrap(), 2.);
        match mean.values(array![[0.5], [1.5]].view()) {
            Err(GpError::OutOfDomain(msg)) => assert!(msg.contains("[1.5]")),
            other => panic!("expected out of domain error, got {other:?}"),
        }
    }
}
