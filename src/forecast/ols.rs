//! Least squares solver for the lag regressions used in model estimation.
//!
//! The design matrices here are tall and thin (hundreds of rows, a handful of
//! lag columns), and lagged case counts can be close to collinear during flat
//! stretches of an epidemic curve. SVD handles both shapes and near-singular
//! systems without panicking, which nalgebra's QR solver would not.

use nalgebra::{DMatrix, DVector};

/// Solve `min ||X b - y||` by SVD.
///
/// Returns `None` when no finite solution is found even at a loose tolerance.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-7] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_linear_coefficients() {
        // y = 1 + 2*x over x = 0..4
        let x = DMatrix::from_row_slice(
            5,
            2,
            &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0, 1.0, 4.0],
        );
        let y = DVector::from_row_slice(&[1.0, 3.0, 5.0, 7.0, 9.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 1.0).abs() < 1e-9);
        assert!((beta[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn overdetermined_noisy_system_still_solves() {
        let x = DMatrix::from_fn(50, 2, |r, c| if c == 0 { 1.0 } else { r as f64 });
        let y = DVector::from_fn(50, |r, _| 3.0 * r as f64 + if r % 2 == 0 { 0.1 } else { -0.1 });

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[1] - 3.0).abs() < 0.05);
    }
}
