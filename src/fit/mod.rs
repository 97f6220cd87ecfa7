use std::borrow::Borrow;
use thiserror::Error;
use serde::{Serialize, Deserialize};

/// Ordinary least squares over an arbitrary design matrix, solved through
/// the singular value decomposition so rank-deficient designs are detected
/// instead of propagating NaNs.
pub mod linear;

/// First-order plane y = a + b x + c z fitted to three-dimensional samples.
pub mod plane;

/// Reasons a sample collection cannot be fitted at all.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInput {

    #[error("Empty sample collection")]
    Empty,

    #[error("Column length mismatch (x : {x}, y : {y}, z : {z})")]
    LengthMismatch { x : usize, y : usize, z : usize },

    #[error("Non-finite value {value} at row {row}")]
    NonFinite { row : usize, value : f64 },

    #[error("Expected rows with {expected} values, found {found}")]
    Shape { expected : usize, found : usize }

}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    /// The design matrix lacks full column rank, so the least-squares
    /// solution is not unique. Only raised under Degeneracy::Reject.
    #[error("Degenerate fit: design matrix has rank {rank}, expected {expected}")]
    DegenerateFit { rank : usize, expected : usize }

}

/// What to do when the design matrix is rank-deficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Degeneracy {

    /// Fail with FitError::DegenerateFit.
    Reject,

    /// Return the minimum-norm solution given by the pseudo-inverse. Directions
    /// without variance in the data receive a zero coefficient.
    MinimumNorm

}

impl Default for Degeneracy {

    fn default() -> Self {
        Degeneracy::MinimumNorm
    }

}

/// Trait shared by the least-squares estimators. Data arrives as an iterator over
/// row-oriented observations; how each row is split into response and predictors
/// is up to the implementor. Estimation either succeeds completely or returns an error,
/// never a partially-fitted value.
pub trait Estimator
where
    Self : Sized
{

    type Settings;

    type Error;

    fn estimate(
        sample : impl Iterator<Item=impl Borrow<[f64]>> + Clone,
        settings : Self::Settings
    ) -> Result<Self, Self::Error>;

}
