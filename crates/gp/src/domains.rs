//! Domains of definition of kernels, mean functions and gaussian processes.
//!
//! A domain is a membership predicate over points. Domains are combined with
//! [Domain::union] and [Domain::intersection] which short-circuit their operands.
//!
//! The following domains are implemented:
//! * the whole real space,
//! * a hyper-rectangle given by lower and upper bounds,
//! * a domain defined by a predicate.

use crate::errors::{GpError, Result};
use linfa::Float;
use ndarray::{Array2, ArrayBase, ArrayView1, Data, Ix2};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A trait for sets of points on which a function is defined
pub trait Domain<F: Float> {
    /// Whether the point `x` belongs to the domain
    fn is_defined_at(&self, x: ArrayView1<F>) -> bool;

    /// Domain of points belonging to `self` or `other`
    fn union<D: Domain<F>>(self, other: D) -> Union<Self, D>
    where
        Self: Sized,
    {
        Union(self, other)
    }

    /// Domain of points belonging to both `self` and `other`
    fn intersection<D: Domain<F>>(self, other: D) -> Intersection<Self, D>
    where
        Self: Sized,
    {
        Intersection(self, other)
    }
}

impl<F: Float, D: Domain<F> + ?Sized> Domain<F> for &D {
    fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        (**self).is_defined_at(x)
    }
}

impl<F: Float, D: Domain<F> + ?Sized> Domain<F> for Arc<D> {
    fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        (**self).is_defined_at(x)
    }
}

impl<F: Float, D: Domain<F> + ?Sized> Domain<F> for Box<D> {
    fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        (**self).is_defined_at(x)
    }
}

/// The whole space: every point belongs to it
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct RealSpace;

impl<F: Float> Domain<F> for RealSpace {
    fn is_defined_at(&self, _x: ArrayView1<F>) -> bool {
        true
    }
}

/// A hyper-rectangle defined as a (nx, 2) matrix where the ith row is
/// the \[lower bound, upper bound\] of the ith component of the points.
///
/// Points with a number of components different from nx do not belong to it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct BoxDomain<F: Float> {
    xlimits: Array2<F>,
}

impl<F: Float> BoxDomain<F> {
    /// Constructor given a (nx, 2) matrix \[\[lower bound, upper bound\], ...\]
    ///
    /// ```
    /// use gaussproc_gp::{BoxDomain, Domain};
    /// use ndarray::{arr1, arr2};
    ///
    /// let domain = BoxDomain::new(&arr2(&[[0.0, 1.0], [5.0, 10.0]])).unwrap();
    /// assert!(domain.is_defined_at(arr1(&[0.5, 7.0]).view()));
    /// ```
    pub fn new(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Self> {
        if xlimits.ncols() != 2 {
            return Err(GpError::InvalidDimension(format!(
                "xlimits must have 2 columns (lower, upper), got {}",
                xlimits.ncols()
            )));
        }
        if xlimits.rows().into_iter().any(|row| row[0] > row[1]) {
            return Err(GpError::InvalidValueError(
                "lower bounds should be less than or equal to upper bounds".to_string(),
            ));
        }
        Ok(BoxDomain {
            xlimits: xlimits.to_owned(),
        })
    }

    /// Bounds as a (nx, 2) matrix
    pub fn xlimits(&self) -> &Array2<F> {
        &self.xlimits
    }

    /// Number of components of the points of the domain
    pub fn dim(&self) -> usize {
        self.xlimits.nrows()
    }
}

impl<F: Float> Domain<F> for BoxDomain<F> {
    fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        x.len() == self.dim()
            && x
                .iter()
                .zip(self.xlimits.rows())
                .all(|(&xi, bounds)| bounds[0] <= xi && xi <= bounds[1])
    }
}

/// A domain given by a predicate on points
#[derive(Clone, Copy)]
pub struct FnDomain<P>(P);

impl<P> FnDomain<P> {
    /// Constructor given the membership predicate
    pub fn new<F: Float>(predicate: P) -> Self
    where
        P: Fn(ArrayView1<F>) -> bool,
    {
        FnDomain(predicate)
    }
}

impl<F: Float, P: Fn(ArrayView1<F>) -> bool> Domain<F> for FnDomain<P> {
    fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        (self.0)(x)
    }
}

/// Union of two domains, see [Domain::union]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Union<A, B>(A, B);

impl<F: Float, A: Domain<F>, B: Domain<F>> Domain<F> for Union<A, B> {
    fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        self.0.is_defined_at(x) || self.1.is_defined_at(x)
    }
}

/// Intersection of two domains, see [Domain::intersection]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection<A, B>(A, B);

impl<F: Float, A: Domain<F>, B: Domain<F>> Domain<F> for Intersection<A, B> {
    fn is_defined_at(&self, x: ArrayView1<F>) -> bool {
        self.0.is_defined_at(x) && self.1.is_defined_at(x)
    }
}
