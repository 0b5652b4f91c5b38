//! A module for kernels, i.e. positive definite covariance functions of two points,
//! used to model the covariance of a gaussian process.
//!
//! The following stationary kernels are implemented, `r` being the euclidean
//! distance between the two points, `sigma^2` the variance and `l` the length scale:
//! * squared exponential (exponentiated quadratic): `sigma^2 exp(-r^2 / (2 l^2))`,
//! * absolute exponential: `sigma^2 exp(-r / l)`,
//! * matern 3/2: `sigma^2 (1 + sqrt(3) r / l) exp(-sqrt(3) r / l)`,
//! * matern 5/2: `sigma^2 (1 + sqrt(5) r / l + 5 r^2 / (3 l^2)) exp(-sqrt(5) r / l)`,
//! * white noise: `sigma^2` when points are equal, 0 otherwise,
//! * constant.
//!
//! Kernels are combined lazily with [Kernel::add], [Kernel::multiply], [Kernel::scale],
//! [Kernel::compose_with] and [Kernel::restrict]: no evaluation happens until
//! a covariance is actually computed.

use crate::domains::Domain;
use crate::errors::{fmt_point, GpError, Result};
use linfa::Float;
use ndarray::{Array1, ArrayView1, Zip};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A trait for symmetric positive (semi)definite kernels `k(x, y)` defined on a domain.
///
/// Symmetry `k(x, y) == k(y, x)` is assumed, not checked.
pub trait Kernel<F: Float> {
    /// Kernel value at `(x, y)`, neither domain nor dimensions are checked
    fn value(&self, x: ArrayView1<F>, y: ArrayView1<F>) -> F;

    /// Whether the kernel is defined at `x`, everywhere by default
    fn is_defined_at(&self, _x: ArrayView1<F>) -> bool {
        true
    }

    /// Kernel value at `(x, y)`
    ///
    /// Fails with [GpError::OutOfDomain] naming the first point, `x` then `y`,
    /// which is outside of the kernel domain, or with [GpError::InvalidDimension]
    /// when points do not have the same number of components.
    fn evaluate(&self, x: ArrayView1<F>, y: ArrayView1<F>) -> Result<F> {
        check_defined_at(self, x)?;
        check_defined_at(self, y)?;
        if x.len() != y.len() {
            return Err(GpError::InvalidDimension(format!(
                "kernel evaluated at points of different dimensions {} and {}",
                x.len(),
                y.len()
            )));
        }
        Ok(self.value(x, y))
    }

    /// Domain of the kernel
    fn domain(&self) -> KernelDomain<'_, Self>
    where
        Self: Sized,
    {
        KernelDomain(self)
    }

    /// Kernel `k(x, y) = self(x, y) + other(x, y)` defined on the intersection of both domains
    fn add<K: Kernel<F>>(self, other: K) -> Sum<Self, K>
    where
        Self: Sized,
    {
        Sum(self, other)
    }

    /// Kernel `k(x, y) = self(x, y) * other(x, y)` defined on the intersection of both domains
    fn multiply<K: Kernel<F>>(self, other: K) -> Product<Self, K>
    where
        Self: Sized,
    {
        Product(self, other)
    }

    /// Kernel `k(x, y) = factor * self(x, y)` on the domain of `self`
    fn scale(self, factor: F) -> Scaled<Self, F>
    where
        Self: Sized,
    {
        Scaled {
            kernel: self,
            factor,
        }
    }

    /// Kernel `k(x, y) = self(t(x), t(y))`.
    ///
    /// Defined at points of the domain of `self` which are mapped by `t`
    /// into the domain of `self`.
    fn compose_with<T>(self, transform: T) -> Composed<Self, T>
    where
        Self: Sized,
        T: Fn(ArrayView1<F>) -> Array1<F>,
    {
        Composed {
            kernel: self,
            transform,
        }
    }

    /// Same kernel only defined on the intersection of its domain with `domain`
    fn restrict<D: Domain<F>>(self, domain: D) -> RestrictedKernel<Self, D>
    where
        Self: Sized,
    {
        RestrictedKernel {
            kernel: self,
            domain,
        }
    }
}

pub(crate) fn check_defined_at<F: Float, K: Kernel<F> + ?Sized>(
    kernel: &K,
    x: ArrayView1<F>,
) -> Result<()> {
    if kernel.is_defined_at(x) {
        Ok(())
    } else {
        Err(GpError::OutOfDomain(format!(
            "point {} is outside of the kernel domain",
            fmt_point(x.iter())
        )))
    }
}

impl<F: Float, K: Kernel<F> + ?Sized> Kernel<F> for &K {
    fn value(&self, x: ArrayView1<F>, y: ArrayView1<F>) -> F {
        (**self).value(x, y)
    }
    fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        (**self).is_defined_at(x)
    }
}

impl<F: Float, K: Kernel<F> + ?Sized> Kernel<F> for Arc<K> {
    fn value(&self, x: ArrayView1<F>, y: ArrayView1<F>) -> F {
        (**self).value(x, y)
    }
    fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        (**self).is_defined_at(x)
    }
}

impl<F: Float, K: Kernel<F> + ?Sized> Kernel<F> for Box<K> {
    fn value(&self, x: ArrayView1<F>, y: ArrayView1<F>) -> F {
        (**self).value(x, y)
    }
    fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        (**self).is_defined_at(x)
    }
}

/// Domain of a kernel, see [Kernel::domain]
#[derive(Clone, Copy, Debug)]
pub struct KernelDomain<'a, K>(&'a K);

impl<F: Float, K: Kernel<F>> Domain<F> for KernelDomain<'_, K> {
    fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        self.0.is_defined_at(x)
    }
}

fn squared_distance<F: Float>(x: ArrayView1<F>, y: ArrayView1<F>) -> F {
    let mut d2 = F::zero();
    Zip::from(&x).and(&y).for_each(|&a, &b| d2 += (a - b) * (a - b));
    d2
}

macro_rules! stationary_kernel {
    ($(#[$doc:meta])* $name:ident, $label:expr) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq)]
        #[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
        pub struct $name<F: Float> {
            sigma: F,
            length_scale: F,
        }

        impl<F: Float> Default for $name<F> {
            fn default() -> Self {
                Self {
                    sigma: F::one(),
                    length_scale: F::one(),
                }
            }
        }

        impl<F: Float> $name<F> {
            /// Constructor given the standard deviation `sigma` and the `length_scale`
            pub fn new(sigma: F, length_scale: F) -> Self {
                Self {
                    sigma,
                    length_scale,
                }
            }

            /// Standard deviation, the kernel variance being `sigma^2`
            pub fn sigma(&self) -> F {
                self.sigma
            }

            /// Length scale
            pub fn length_scale(&self) -> F {
                self.length_scale
            }
        }

        impl<F: Float> fmt::Display for $name<F> {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(
                    f,
                    "{}(sigma={}, length_scale={})",
                    $label, self.sigma, self.length_scale
                )
            }
        }
    };
}

stationary_kernel!(
    /// Squared exponential (a.k.a. exponentiated quadratic or RBF) kernel
    SquaredExponential,
    "SquaredExponential"
);

impl<F: Float> Kernel<F> for SquaredExponential<F> {
    fn value(&self, x: ArrayView1<F>, y: ArrayView1<F>) -> F {
        let l2 = self.length_scale * self.length_scale;
        self.sigma * self.sigma * F::exp(-squared_distance(x, y) / (F::cast(2.) * l2))
    }
}

stationary_kernel!(
    /// Absolute exponential (a.k.a. Ornstein-Uhlenbeck or matern 1/2) kernel
    AbsoluteExponential,
    "AbsoluteExponential"
);

impl<F: Float> Kernel<F> for AbsoluteExponential<F> {
    fn value(&self, x: ArrayView1<F>, y: ArrayView1<F>) -> F {
        let r = squared_distance(x, y).sqrt() / self.length_scale;
        self.sigma * self.sigma * F::exp(-r)
    }
}

stationary_kernel!(
    /// Matern 3/2 kernel
    Matern32,
    "Matern32"
);

impl<F: Float> Kernel<F> for Matern32<F> {
    fn value(&self, x: ArrayView1<F>, y: ArrayView1<F>) -> F {
        let sqrt3 = F::cast(3.).sqrt();
        let r = sqrt3 * squared_distance(x, y).sqrt() / self.length_scale;
        self.sigma * self.sigma * (F::one() + r) * F::exp(-r)
    }
}

stationary_kernel!(
    /// Matern 5/2 kernel
    Matern52,
    "Matern52"
);

impl<F: Float> Kernel<F> for Matern52<F> {
    fn value(&self, x: ArrayView1<F>, y: ArrayView1<F>) -> F {
        let sqrt5 = F::cast(5.).sqrt();
        let r = sqrt5 * squared_distance(x, y).sqrt() / self.length_scale;
        // 5 d^2 / (3 l^2) == r^2 / 3
        self.sigma * self.sigma * (F::one() + r + r * r / F::cast(3.)) * F::exp(-r)
    }
}

/// White noise kernel: `sigma^2` when both points are equal, 0 otherwise
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct WhiteNoise<F: Float> {
    sigma: F,
}

impl<F: Float> WhiteNoise<F> {
    /// Constructor given the noise standard deviation
    pub fn new(sigma: F) -> Self {
        WhiteNoise { sigma }
    }
}

impl<F: Float> Kernel<F> for WhiteNoise<F> {
    fn value(&self, x: ArrayView1<F>, y: ArrayView1<F>) -> F {
        if x == y {
            self.sigma * self.sigma
        } else {
            F::zero()
        }
    }
}

impl<F: Float> fmt::Display for WhiteNoise<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "WhiteNoise(sigma={})", self.sigma)
    }
}

/// Constant kernel
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct ConstantKernel<F: Float>(pub F);

impl<F: Float> Kernel<F> for ConstantKernel<F> {
    fn value(&self, _x: ArrayView1<F>, _y: ArrayView1<F>) -> F {
        self.0
    }
}

impl<F: Float> fmt::Display for ConstantKernel<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Constant({})", self.0)
    }
}

/// Sum of two kernels, see [Kernel::add]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sum<A, B>(A, B);

impl<F: Float, A: Kernel<F>, B: Kernel<F>> Kernel<F> for Sum<A, B> {
    fn value(&self, x: ArrayView1<F>, y: ArrayView1<F>) -> F {
        self.0.value(x, y) + self.1.value(x, y)
    }

    fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        self.0.is_defined_at(x) && self.1.is_defined_at(x)
    }
}

impl<A: fmt::Display, B: fmt::Display> fmt::Display for Sum<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({} + {})", self.0, self.1)
    }
}

/// Product of two kernels, see [Kernel::multiply]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Product<A, B>(A, B);

impl<F: Float, A: Kernel<F>, B: Kernel<F>> Kernel<F> for Product<A, B> {
    fn value(&self, x: ArrayView1<F>, y: ArrayView1<F>) -> F {
        self.0.value(x, y) * self.1.value(x, y)
    }

    fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        self.0.is_defined_at(x) && self.1.is_defined_at(x)
    }
}

impl<A: fmt::Display, B: fmt::Display> fmt::Display for Product<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({} * {})", self.0, self.1)
    }
}

/// Kernel multiplied by a constant factor, see [Kernel::scale]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scaled<K, F> {
    kernel: K,
    factor: F,
}

impl<F: Float, K: Kernel<F>> Kernel<F> for Scaled<K, F> {
    fn value(&self, x: ArrayView1<F>, y: ArrayView1<F>) -> F {
        self.factor * self.kernel.value(x, y)
    }

    fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        self.kernel.is_defined_at(x)
    }
}

impl<K: fmt::Display, F: fmt::Display> fmt::Display for Scaled<K, F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} * {}", self.factor, self.kernel)
    }
}

/// Kernel evaluated at transformed points, see [Kernel::compose_with]
#[derive(Clone, Copy)]
pub struct Composed<K, T> {
    kernel: K,
    transform: T,
}

impl<F, K, T> Kernel<F> for Composed<K, T>
where
    F: Float,
    K: Kernel<F>,
    T: Fn(ArrayView1<F>) -> Array1<F>,
{
    fn value(&self, x: ArrayView1<F>, y: ArrayView1<F>) -> F {
        let tx = (self.transform)(x);
        let ty = (self.transform)(y);
        self.kernel.value(tx.view(), ty.view())
    }

    fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        self.kernel.is_defined_at(x) && self.kernel.is_defined_at((self.transform)(x).view())
    }
}

impl<K: fmt::Display, T> fmt::Display for Composed<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Composed({})", self.kernel)
    }
}

/// Kernel restricted to a domain, see [Kernel::restrict]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RestrictedKernel<K, D> {
    kernel: K,
    domain: D,
}

impl<F: Float, K: Kernel<F>, D: Domain<F>> Kernel<F> for RestrictedKernel<K, D> {
    fn value(&self, x: ArrayView1<F>, y: ArrayView1<F>) -> F {
        self.kernel.value(x, y)
    }

    fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        self.domain.is_defined_at(x) && self.kernel.is_defined_at(x)
    }
}

impl<K: fmt::Display, D> fmt::Display for RestrictedKernel<K, D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Restricted({})", self.kernel)
    }
}
