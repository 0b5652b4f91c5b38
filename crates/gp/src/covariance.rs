//! Covariance matrices and vectors built from a kernel and sequences of points.
//!
//! Points are given as (n, nx) matrices, one point per row. Row and column order
//! of the results follows the order of the points.

use crate::errors::{GpError, Result};
use crate::kernels::{check_defined_at, Kernel};
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix1, Ix2};

/// Check every point (row) of `points` lies in the kernel domain, in row order
fn check_points<F: Float, K: Kernel<F> + ?Sized>(
    points: &ArrayBase<impl Data<Elem = F>, Ix2>,
    kernel: &K,
) -> Result<()> {
    points
        .rows()
        .into_iter()
        .try_for_each(|x| check_defined_at(kernel, x))
}

/// Compute the (n, n) covariance matrix `K[i, j] = k(x_i, x_j)` of the n points given as
/// a (n, nx) matrix.
///
/// Only the lower triangle is evaluated (n (n + 1) / 2 kernel evaluations) and the result
/// is symmetrized as `K + K^t - diag(K)`, hence exactly symmetric.
pub fn build_covariance_matrix<F: Float, K: Kernel<F> + ?Sized>(
    points: &ArrayBase<impl Data<Elem = F>, Ix2>,
    kernel: &K,
) -> Result<Array2<F>> {
    check_points(points, kernel)?;
    let n = points.nrows();
    let mut lower = Array2::<F>::zeros((n, n));
    for (i, xi) in points.rows().into_iter().enumerate() {
        for (j, xj) in points.rows().into_iter().enumerate().take(i + 1) {
            lower[[i, j]] = kernel.value(xi, xj);
        }
    }
    let diag = Array2::from_diag(&lower.diag());
    Ok(&lower + &lower.t() - diag)
}

/// Compute the (n, m) cross covariance matrix `K[i, j] = k(x_i, y_j)` of the n points `xs`
/// given as a (n, nx) matrix and the m points `ys` given as a (m, nx) matrix.
pub fn build_cross_covariance_matrix<F: Float, K: Kernel<F> + ?Sized>(
    xs: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ys: &ArrayBase<impl Data<Elem = F>, Ix2>,
    kernel: &K,
) -> Result<Array2<F>> {
    if xs.ncols() != ys.ncols() {
        return Err(GpError::InvalidDimension(format!(
            "points should have the same number of components, got {} and {}",
            xs.ncols(),
            ys.ncols()
        )));
    }
    check_points(xs, kernel)?;
    check_points(ys, kernel)?;
    let mut cross = Array2::<F>::zeros((xs.nrows(), ys.nrows()));
    for ((i, j), v) in cross.indexed_iter_mut() {
        *v = kernel.value(xs.row(i), ys.row(j));
    }
    Ok(cross)
}

/// Compute the (n,) covariance vector `k(x, p_i)` of the point `x` with the n points
/// given as a (n, nx) matrix.
pub fn build_covariance_vector<F: Float, K: Kernel<F> + ?Sized>(
    x: &ArrayBase<impl Data<Elem = F>, Ix1>,
    points: &ArrayBase<impl Data<Elem = F>, Ix2>,
    kernel: &K,
) -> Result<Array1<F>> {
    if x.len() != points.ncols() {
        return Err(GpError::InvalidDimension(format!(
            "point has {} components, expected {}",
            x.len(),
            points.ncols()
        )));
    }
    check_defined_at(kernel, x.view())?;
    check_points(points, kernel)?;
    Ok(points
        .rows()
        .into_iter()
        .map(|p| kernel.value(x.view(), p))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::BoxDomain;
    use crate::kernels::{Matern52, SquaredExponential};
    use approx::assert_abs_diff_eq;
    use ndarray::{arr1, array, ArrayView1};
    use std::cell::Cell;

    /// Non symmetric function counting its evaluations
    struct CountingKernel {
        count: Cell<usize>,
    }

    impl Kernel<f64> for CountingKernel {
        fn value(&self, x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
            self.count.set(self.count.get() + 1);
            x[0] + 10. * y[0]
        }
    }

    #[test]
    fn test_covariance_matrix() {
        let kernel = SquaredExponential::new(1., f64::sqrt(0.5));
        let points = array![[2.0], [4.0], [10.0]];
        let cov = build_covariance_matrix(&points, &kernel).unwrap();
        assert_eq!(cov.dim(), (3, 3));
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(cov[[i, j]], cov[[j, i]]);
                assert_abs_diff_eq!(
                    cov[[i, j]],
                    kernel.value(points.row(i), points.row(j)),
                    epsilon = 1e-15
                );
            }
        }
        assert_abs_diff_eq!(cov[[0, 1]], f64::exp(-4.), epsilon = 1e-15);
    }

    #[test]
    fn test_covariance_matrix_lower_triangle_only() {
        let kernel = CountingKernel {
            count: Cell::new(0),
        };
        let points = array![[1.], [2.], [3.], [4.]];
        let cov = build_covariance_matrix(&points, &kernel).unwrap();
        assert_eq!(kernel.count.get(), 10);
        // symmetrized from the lower triangle k(x_i, x_j), j <= i
        assert_abs_diff_eq!(cov[[0, 3]], 4. + 10. * 1.);
        assert_abs_diff_eq!(cov[[3, 0]], 4. + 10. * 1.);
        assert_abs_diff_eq!(cov[[2, 2]], 3. + 10. * 3.);
    }

    #[test]
    fn test_cross_covariance_matrix() {
        let kernel = CountingKernel {
            count: Cell::new(0),
        };
        let xs = array![[1.], [2.]];
        let ys = array![[3.], [4.], [5.]];
        let cross = build_cross_covariance_matrix(&xs, &ys, &kernel).unwrap();
        assert_eq!(kernel.count.get(), 6);
        assert_abs_diff_eq!(cross, array![[31., 41., 51.], [32., 42., 52.]]);

        let bad = array![[1., 2.]];
        assert!(matches!(
            build_cross_covariance_matrix(&xs, &bad, &kernel),
            Err(GpError::InvalidDimension(_))
        ));
    }

    #[test]
    fn test_covariance_vector() {
        let kernel = Matern52::new(2., 0.3);
        let points = array![[0., 0.], [1., 0.5], [-0.2, 0.7]];
        let x = arr1(&[0.1, 0.2]);
        let v = build_covariance_vector(&x, &points, &kernel).unwrap();
        let row = x.view().insert_axis(ndarray::Axis(0));
        let cross = build_cross_covariance_matrix(&row, &points, &kernel).unwrap();
        assert_abs_diff_eq!(v, cross.row(0).to_owned(), epsilon = 1e-15);
        assert!(matches!(
            build_covariance_vector(&arr1(&[0.1]), &points, &kernel),
            Err(GpError::InvalidDimension(_))
        ));
    }

    #[test]
    fn test_out_of_domain_points() {
        let domain = BoxDomain::new(&array![[0., 5.]]).unwrap();
        let kernel = SquaredExponential::<f64>::default().restrict(domain);
        let points = array![[1.], [6.], [7.]];
        match build_covariance_matrix(&points, &kernel) {
            Err(GpError::OutOfDomain(msg)) => assert!(msg.contains("[6]")),
            other => panic!("expected out of domain error, got {other:?}"),
        }
    }
}
