use nalgebra::*;
use std::borrow::Borrow;
use std::default::Default;
use super::{Estimator, Degeneracy, FitError, InvalidInput};

/// Ordinary least square estimation. This estimator minimizes ||X b - y||^2 through the singular
/// value decomposition of the design matrix X (rather than by forming X^T X), which lets it report
/// the numerical rank of the design. Columns are first equilibrated to unit norm, so the rank does not
/// depend on the units of each predictor; singular values of the equilibrated design at or below
/// RCOND * s_max are then treated as zero. For full-rank designs the result is the unique least-squares
/// solution; for rank-deficient designs it is either rejected or replaced by the minimum-norm solution
/// (in equilibrated coordinates), depending on the informed Degeneracy policy. Equilibration does not
/// remove offsets: predictors with a large common offset relative to their spread should be centred
/// by the caller (as the plane regressor does).
#[derive(Debug, Clone)]
pub struct OLS {
    pub beta : DVector<f64>,

    // Numerical rank of the design matrix.
    pub rank : usize,

    // Sum of squared residuals at the solution (the minimized objective).
    pub ssr : f64,

    pub err : Option<DVector<f64>>
}

impl OLS {

    pub fn predict(&self, x : &DMatrix<f64>) -> DVector<f64> {
        assert!(x.ncols() == self.beta.nrows());
        x * &self.beta
    }

    pub fn estimate_from_data(
        y : &DVector<f64>,
        x : &DMatrix<f64>,
        degeneracy : Degeneracy
    ) -> Result<Self, FitError> {
        let (n, p) = x.shape();
        if n == 0 {
            return Err(InvalidInput::Empty.into());
        }
        if p == 0 {
            return Err(InvalidInput::Shape { expected : 1, found : 0 }.into());
        }
        if y.nrows() != n {
            return Err(InvalidInput::Shape { expected : n, found : y.nrows() }.into());
        }
        check_finite(y, x)?;

        // Column norms; all-zero columns keep a unit scale and end up with a zero singular value.
        let scale = DVector::from_iterator(p, x.column_iter().map(|c| {
            let norm = c.norm();
            if norm > 0.0 { norm } else { 1.0 }
        }));
        let mut xs = x.clone();
        for (mut c, d) in xs.column_iter_mut().zip(scale.iter()) {
            c.unscale_mut(*d);
        }

        let SVD { u, v_t, singular_values } = xs.svd(true, true);
        let tol = rank_tolerance(&singular_values);
        let rank = singular_values.iter().filter(|s| **s > tol ).count();
        if rank < p {
            if degeneracy == Degeneracy::Reject {
                return Err(FitError::DegenerateFit { rank, expected : p });
            }
            log::warn!("Rank-deficient design (rank {} < {}); using minimum-norm solution", rank, p);
        }

        let (u, v_t) = match (u, v_t) {
            (Some(u), Some(v_t)) => (u, v_t),
            _ => unreachable!("SVD requested with both U and V^T")
        };

        // b' = V S^+ U^T y over the equilibrated design; b = D^-1 b'.
        let mut uty = u.transpose() * y;
        for (c, s) in uty.iter_mut().zip(singular_values.iter()) {
            *c = if *s > tol { *c / *s } else { 0.0 };
        }
        let beta = (v_t.transpose() * uty).component_div(&scale);
        let err = x * &beta - y;
        let ssr = err.norm_squared();
        log::debug!("OLS fit over {} observations: beta = {:?}, rank = {}, ssr = {}", n, beta.as_slice(), rank, ssr);
        Ok(Self { beta, rank, ssr, err : Some(err) })
    }

    pub fn is_full_rank(&self) -> bool {
        self.rank == self.beta.nrows()
    }

}

/// Prepends a column of ones to the predictor matrix.
pub fn append_intercept(x : DMatrix<f64>) -> DMatrix<f64> {
    x.insert_column(0, 1.0)
}

/// Singular values at or below RCOND times the largest one count as zero.
pub const RCOND : f64 = 1E-10;

fn rank_tolerance(singular_values : &DVector<f64>) -> f64 {
    let s_max = singular_values.iter().cloned().fold(0.0, f64::max);
    RCOND * s_max
}

fn check_finite(y : &DVector<f64>, x : &DMatrix<f64>) -> Result<(), FitError> {
    if let Some((row, value)) = y.iter().enumerate().find(|(_, v)| !v.is_finite() ) {
        return Err(InvalidInput::NonFinite { row, value : *value }.into());
    }
    // Storage is column-major, so the row is the position modulo the row count.
    let n = x.nrows();
    if let Some((pos, value)) = x.iter().enumerate().find(|(_, v)| !v.is_finite() ) {
        return Err(InvalidInput::NonFinite { row : pos % n, value : *value }.into());
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub struct OLSSettings {

    /// Whether a column of ones is prepended to the predictors.
    pub intercept : bool,

    pub degeneracy : Degeneracy
}

impl Default for OLSSettings {

    fn default() -> Self {
        Self { intercept : true, degeneracy : Degeneracy::default() }
    }

}

/// Collect the first entry of each row to the response vector
/// and the remaining entries to the predictor matrix. All rows must
/// share the width of the first one.
fn collect_to_matrix_and_vec(
    sample : impl Iterator<Item=impl Borrow<[f64]>> + Clone
) -> Result<(DVector<f64>, DMatrix<f64>), FitError> {
    let mut rows = sample.peekable();
    let row_len = match rows.peek() {
        Some(r) => <_ as Borrow<[f64]>>::borrow(r).len(),
        None => return Err(InvalidInput::Empty.into())
    };
    if row_len < 2 {
        return Err(InvalidInput::Shape { expected : 2, found : row_len }.into());
    }
    let mut y = Vec::new();
    let mut x = Vec::new();
    for r in rows {
        let r : &[f64] = r.borrow();
        if r.len() != row_len {
            return Err(InvalidInput::Shape { expected : row_len, found : r.len() }.into());
        }
        y.push(r[0]);
        x.extend_from_slice(&r[1..]);
    }
    let n = y.len();
    Ok((DVector::from_vec(y), DMatrix::from_row_slice(n, row_len - 1, &x)))
}

impl Estimator for OLS {

    type Settings = OLSSettings;

    type Error = FitError;

    /// Each row is [y, x_1, ..., x_k].
    fn estimate(
        sample : impl Iterator<Item=impl Borrow<[f64]>> + Clone,
        settings : Self::Settings
    ) -> Result<Self, Self::Error> {
        let (y, x) = collect_to_matrix_and_vec(sample)?;
        let x = if settings.intercept { append_intercept(x) } else { x };
        OLS::estimate_from_data(&y, &x, settings.degeneracy)
    }

}

#[test]
fn test_ols() {

    // statsmodels reference:
    // sm.OLS([1, 1.4, 2.1, 2.4, 3.1], [[1.0, 1.0], [1.0, 1.5], [1.0, 2.0], [1.0, 2.5], [1.0, 3.0]]).fit().params
    // -> [-0.08, 1.04]
    let y : DVector<f64> = DVector::from_vec(vec![1.0, 1.4, 2.1, 2.4, 3.1]);
    let x : DMatrix<f64> = DMatrix::from_vec(5,2,
        vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.5, 2.0, 2.5, 3.0]
    );
    let ols = OLS::estimate_from_data(&y, &x, Degeneracy::Reject).unwrap();
    assert!((ols.beta[0] + 0.08).abs() < 1E-10);
    assert!((ols.beta[1] - 1.04).abs() < 1E-10);
    assert_eq!(ols.rank, 2);
    assert!(ols.is_full_rank());
    let err = ols.err.as_ref().unwrap();
    assert!((err.norm_squared() - ols.ssr).abs() < 1E-12);

    // Residuals are orthogonal to the columns of the design.
    let score = x.transpose() * err;
    assert!(score.norm() < 1E-10);
}

#[test]
fn test_ols_rows() {
    let rows = vec![
        vec![1.0, 1.0],
        vec![1.4, 1.5],
        vec![2.1, 2.0],
        vec![2.4, 2.5],
        vec![3.1, 3.0]
    ];
    let ols = OLS::estimate(rows.iter().map(|r| &r[..] ), OLSSettings::default()).unwrap();
    assert!((ols.beta[0] + 0.08).abs() < 1E-10);
    assert!((ols.beta[1] - 1.04).abs() < 1E-10);
    let x = append_intercept(DMatrix::from_vec(1, 1, vec![4.0]));
    assert!((ols.predict(&x)[0] - 4.08).abs() < 1E-10);
}

#[test]
fn test_ols_ragged_rows() {
    let rows = vec![vec![1.0, 1.0], vec![2.0]];
    let res = OLS::estimate(rows.iter().map(|r| &r[..] ), OLSSettings::default());
    assert_eq!(res.unwrap_err(), FitError::InvalidInput(InvalidInput::Shape { expected : 2, found : 1 }));
}

#[test]
fn test_ols_rank_deficient() {
    // Second and third columns are identical.
    let y = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
    let x = DMatrix::from_row_slice(4, 3, &[
        1.0, 1.0, 1.0,
        1.0, 2.0, 2.0,
        1.0, 3.0, 3.0,
        1.0, 4.0, 4.0
    ]);
    let err = OLS::estimate_from_data(&y, &x, Degeneracy::Reject).unwrap_err();
    assert_eq!(err, FitError::DegenerateFit { rank : 2, expected : 3 });

    // Minimum-norm splits the slope evenly across the duplicated columns.
    let ols = OLS::estimate_from_data(&y, &x, Degeneracy::MinimumNorm).unwrap();
    assert_eq!(ols.rank, 2);
    assert!(!ols.is_full_rank());
    assert!(ols.beta[0].abs() < 1E-10);
    assert!((ols.beta[1] - 0.5).abs() < 1E-10);
    assert!((ols.beta[2] - 0.5).abs() < 1E-10);
    assert!(ols.ssr < 1E-20);
}

#[test]
fn test_ols_column_scales() {
    // Columns differing by 14 orders of magnitude still give a full-rank design.
    let t = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
    let u = [1.0, 0.0, 2.0, 1.0, 3.0, 2.0];
    let x = DMatrix::from_fn(6, 3, |i, j| match j {
        0 => 1.0,
        1 => t[i] * 1E-7,
        _ => u[i] * 1E7
    });
    let y = DVector::from_fn(6, |i, _| 1.0 + 2.0 * t[i] - 0.5 * u[i] );
    let ols = OLS::estimate_from_data(&y, &x, Degeneracy::Reject).unwrap();
    assert_eq!(ols.rank, 3);
    assert!((ols.beta[0] - 1.0).abs() < 1E-9);
    assert!((ols.beta[1] / 2E7 - 1.0).abs() < 1E-9);
    assert!((ols.beta[2] / -0.5E-7 - 1.0).abs() < 1E-9);
}

#[test]
fn test_ols_non_finite() {
    let y = DVector::from_vec(vec![1.0, 2.0, 3.0]);
    let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, f64::NAN, 1.0, 2.0]);
    match OLS::estimate_from_data(&y, &x, Degeneracy::default()) {
        Err(FitError::InvalidInput(InvalidInput::NonFinite { row, value })) => {
            assert_eq!(row, 1);
            assert!(value.is_nan());
        },
        other => panic!("Unexpected result: {:?}", other)
    }
}
