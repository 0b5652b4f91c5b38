//! Forward and back substitutions with triangular factors.
//!
//! Only the relevant triangle of the factor is read: passing a matrix which is
//! not actually triangular is a caller error which is not detected.

use crate::errors::{LinalgError, Result};
#[cfg(feature = "blas")]
use linfa::dataset::{WithLapack, WithoutLapack};
use linfa::Float;
#[cfg(not(feature = "blas"))]
use linfa_linalg::triangular::*;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
#[cfg(feature = "blas")]
use ndarray_linalg::{triangular::*, Diag, UPLO};

/// Solve `L.X = B` where `L` is a (n, n) lower triangular matrix and `B` a (n, m) matrix.
pub fn forward_solve<F: Float>(
    l: &ArrayBase<impl Data<Elem = F>, Ix2>,
    b: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Result<Array2<F>> {
    check_shapes(l, b.nrows())?;
    #[cfg(not(feature = "blas"))]
    let x = l.solve_triangular(b, UPLO::Lower)?;
    #[cfg(feature = "blas")]
    let x = l
        .to_owned()
        .with_lapack()
        .solve_triangular(UPLO::Lower, Diag::NonUnit, &b.to_owned().with_lapack())?
        .without_lapack();
    Ok(x)
}

/// Solve `U.X = B` where `U` is a (n, n) upper triangular matrix and `B` a (n, m) matrix.
pub fn back_solve<F: Float>(
    u: &ArrayBase<impl Data<Elem = F>, Ix2>,
    b: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Result<Array2<F>> {
    check_shapes(u, b.nrows())?;
    #[cfg(not(feature = "blas"))]
    let x = u.solve_triangular(b, UPLO::Upper)?;
    #[cfg(feature = "blas")]
    let x = u
        .to_owned()
        .with_lapack()
        .solve_triangular(UPLO::Upper, Diag::NonUnit, &b.to_owned().with_lapack())?
        .without_lapack();
    Ok(x)
}

/// Solve `L.x = b` for a single right-hand side vector
pub fn forward_solve_vec<F: Float>(
    l: &ArrayBase<impl Data<Elem = F>, Ix2>,
    b: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> Result<Array1<F>> {
    let x = forward_solve(l, &b.view().insert_axis(Axis(1)))?;
    Ok(x.remove_axis(Axis(1)))
}

/// Solve `U.x = b` for a single right-hand side vector
pub fn back_solve_vec<F: Float>(
    u: &ArrayBase<impl Data<Elem = F>, Ix2>,
    b: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> Result<Array1<F>> {
    let x = back_solve(u, &b.view().insert_axis(Axis(1)))?;
    Ok(x.remove_axis(Axis(1)))
}

/// Solve `(L.L^t).X = B` given the Cholesky factor `L`, forward then back substitution.
pub fn cholesky_solve<F: Float>(
    l: &ArrayBase<impl Data<Elem = F>, Ix2>,
    b: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Result<Array2<F>> {
    let y = forward_solve(l, b)?;
    back_solve(&l.t(), &y)
}

/// Solve `(L.L^t).x = b` for a single right-hand side vector
pub fn cholesky_solve_vec<F: Float>(
    l: &ArrayBase<impl Data<Elem = F>, Ix2>,
    b: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> Result<Array1<F>> {
    let y = forward_solve_vec(l, b)?;
    back_solve_vec(&l.t(), &y)
}

fn check_shapes<F: Float>(a: &ArrayBase<impl Data<Elem = F>, Ix2>, nrhs: usize) -> Result<()> {
    if a.nrows() != a.ncols() {
        return Err(LinalgError::InvalidDimension(format!(
            "triangular matrix should be square, got ({}, {})",
            a.nrows(),
            a.ncols()
        )));
    }
    if a.nrows() != nrhs {
        return Err(LinalgError::InvalidDimension(format!(
            "right-hand side should have {} rows, got {}",
            a.nrows(),
            nrhs
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cholesky::{regularized_cholesky, Jitter};
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array};
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use paste::paste;
    use rand_xoshiro::Xoshiro256Plus;

    /// Random lower triangular matrix with a diagonal kept away from zero
    fn random_lower(n: usize, rng: &mut Xoshiro256Plus) -> Array2<f64> {
        let mut a = Array::random_using((n, n), Uniform::new(-1f64, 1.), rng);
        for ((i, j), v) in a.indexed_iter_mut() {
            if j > i {
                *v = 0.;
            } else if i == j {
                *v = 1. + v.abs();
            }
        }
        a
    }

    macro_rules! test_solves {
        ($n:expr) => {
            paste! {
                #[test]
                fn [<test_forward_solve_ $n>]() {
                    let mut rng = Xoshiro256Plus::seed_from_u64($n);
                    let l = random_lower($n, &mut rng);
                    let x = Array::random_using(($n, 3), Uniform::new(-5., 5.), &mut rng);
                    let sol = forward_solve(&l, &l.dot(&x)).expect("forward solve");
                    assert_abs_diff_eq!(sol, x, epsilon = 1e-8);

                    let xv = x.column(0).to_owned();
                    let solv = forward_solve_vec(&l, &l.dot(&xv)).expect("forward solve");
                    assert_abs_diff_eq!(solv, xv, epsilon = 1e-8);
                }

                #[test]
                fn [<test_back_solve_ $n>]() {
                    let mut rng = Xoshiro256Plus::seed_from_u64(100 + $n);
                    let u = random_lower($n, &mut rng).reversed_axes();
                    let x = Array::random_using(($n, 2), Uniform::new(-5., 5.), &mut rng);
                    let sol = back_solve(&u, &u.dot(&x)).expect("back solve");
                    assert_abs_diff_eq!(sol, x, epsilon = 1e-8);

                    let xv = x.column(1).to_owned();
                    let solv = back_solve_vec(&u, &u.dot(&xv)).expect("back solve");
                    assert_abs_diff_eq!(solv, xv, epsilon = 1e-8);
                }
            }
        };
    }

    test_solves!(1);
    test_solves!(4);
    test_solves!(12);

    #[test]
    fn test_cholesky_solve() {
        let c = array![[4., 2., 0.6], [2., 3., 0.4], [0.6, 0.4, 2.]];
        let l = regularized_cholesky(&Jitter::default(), &c).unwrap();
        let b = array![1., -2., 0.5];
        let x = cholesky_solve_vec(&l, &b).unwrap();
        assert_abs_diff_eq!(c.dot(&x), b, epsilon = 1e-8);

        let bm = array![[1., 0.], [0., 1.], [2., 3.]];
        let xm = cholesky_solve(&l, &bm).unwrap();
        assert_abs_diff_eq!(c.dot(&xm), bm, epsilon = 1e-8);
    }

    #[test]
    fn test_solve_shape_mismatch() {
        let l = array![[1., 0.], [1., 1.]];
        let b = array![[1.], [2.], [3.]];
        assert!(matches!(
            forward_solve(&l, &b),
            Err(LinalgError::InvalidDimension(_))
        ));
        let u = array![[1., 0., 1.], [1., 1., 2.]];
        assert!(matches!(
            back_solve(&u, &b),
            Err(LinalgError::InvalidDimension(_))
        ));
    }
}
