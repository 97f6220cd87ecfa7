use nalgebra::*;
use serde::{Serialize, Deserialize};
use crate::fit::{FitError, InvalidInput};

/// A single observation with three numeric coordinates. Which of them plays
/// the role of the response is a convention of the plane fit (y is predicted
/// from x and z); the record itself carries no semantic axis names.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x : f64,
    pub y : f64,
    pub z : f64
}

impl Sample {

    pub fn new(x : f64, y : f64, z : f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

}

/// Verifies the collection is non-empty and that every coordinate is finite.
/// The first offending value (in row order) is reported.
pub fn validate(samples : &[Sample]) -> Result<(), FitError> {
    if samples.is_empty() {
        return Err(InvalidInput::Empty.into());
    }
    for (row, s) in samples.iter().enumerate() {
        if let Some(value) = s.as_array().iter().find(|v| !v.is_finite() ) {
            return Err(InvalidInput::NonFinite { row, value : *value }.into());
        }
    }
    Ok(())
}

/// Builds samples from three parallel columns, which must be of equal length.
pub fn zip_columns(x : &[f64], y : &[f64], z : &[f64]) -> Result<Vec<Sample>, FitError> {
    if x.len() != y.len() || x.len() != z.len() {
        return Err(InvalidInput::LengthMismatch { x : x.len(), y : y.len(), z : z.len() }.into());
    }
    Ok(x.iter().zip(y.iter()).zip(z.iter())
        .map(|((x, y), z)| Sample::new(*x, *y, *z) )
        .collect())
}

/// Splits the samples into the response vector y and the design matrix,
/// with rows [1, x_i, z_i] (or [x_i, z_i] when the intercept is omitted).
pub fn design(samples : &[Sample], intercept : bool) -> (DVector<f64>, DMatrix<f64>) {
    let n = samples.len();
    let y = DVector::from_iterator(n, samples.iter().map(|s| s.y ));
    let x = if intercept {
        DMatrix::from_fn(n, 3, |i, j| match j {
            0 => 1.0,
            1 => samples[i].x,
            _ => samples[i].z
        })
    } else {
        DMatrix::from_fn(n, 2, |i, j| if j == 0 { samples[i].x } else { samples[i].z })
    };
    (y, x)
}
