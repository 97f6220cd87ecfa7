use std::borrow::Borrow;
use serde::{Serialize, Deserialize};
use crate::sample::{self, Sample};
use super::{Estimator, Degeneracy, FitError, InvalidInput};
use super::linear::OLS;

/// Builder for plane fits. Holds only the degeneracy policy; each call to fit(.)
/// produces an independent FittedPlane, so a changed sample set means a new fit
/// rather than an update of an existing plane.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaneRegressor {
    degeneracy : Degeneracy
}

impl PlaneRegressor {

    pub fn new() -> Self {
        Self::default()
    }

    pub fn degeneracy(mut self, degeneracy : Degeneracy) -> Self {
        self.degeneracy = degeneracy;
        self
    }

    /// Fits y = a + b x + c z by ordinary least squares. Fails with InvalidInput
    /// for empty or non-finite samples, and with DegenerateFit when the design
    /// [1, x, z] is rank-deficient and the policy is Degeneracy::Reject.
    ///
    /// x and z are centred and scaled to unit norm before the solve, so neither the rank
    /// nor the coefficients depend on the offset or the units of the predictors. A predictor
    /// without spread becomes an all-zero column: its slope is zero and the rank drops.
    pub fn fit(&self, samples : &[Sample]) -> Result<FittedPlane, FitError> {
        sample::validate(samples)?;
        let (centre_x, spread_x) = centre_and_spread(samples.iter().map(|s| s.x ));
        let (centre_z, spread_z) = centre_and_spread(samples.iter().map(|s| s.z ));
        let standardized : Vec<Sample> = samples.iter()
            .map(|s| Sample::new((s.x - centre_x) / spread_x, s.y, (s.z - centre_z) / spread_z) )
            .collect();
        let (y, x) = sample::design(&standardized, true);
        let ols = OLS::estimate_from_data(&y, &x, self.degeneracy)?;
        let level = ols.beta[0];
        let x_slope = ols.beta[1] / spread_x;
        let z_slope = ols.beta[2] / spread_z;
        Ok(FittedPlane {
            intercept : level - x_slope * centre_x - z_slope * centre_z,
            x_slope,
            z_slope,
            centre : [centre_x, centre_z],
            level,
            rank : ols.rank,
            ssr : ols.ssr,
            n : samples.len()
        })
    }

    /// Fits over arbitrary records, projecting each onto (x, y, z) through the
    /// informed accessors.
    pub fn fit_by<T, I, FX, FY, FZ>(&self, records : I, fx : FX, fy : FY, fz : FZ) -> Result<FittedPlane, FitError>
    where
        I : IntoIterator<Item=T>,
        FX : Fn(&T) -> f64,
        FY : Fn(&T) -> f64,
        FZ : Fn(&T) -> f64
    {
        let samples : Vec<Sample> = records.into_iter()
            .map(|r| Sample::new(fx(&r), fy(&r), fz(&r)) )
            .collect();
        self.fit(&samples)
    }

    /// Fits over three parallel columns of equal length.
    pub fn fit_columns(&self, x : &[f64], y : &[f64], z : &[f64]) -> Result<FittedPlane, FitError> {
        let samples = sample::zip_columns(x, y, z)?;
        self.fit(&samples)
    }

}

// Centre (mean, accumulated relative to the first value so that a constant column centres
// to exact zeros) and the norm of the centred values. Zero spread is reported as 1.
fn centre_and_spread(vals : impl Iterator<Item=f64> + Clone) -> (f64, f64) {
    let mut iter = vals.clone();
    let origin = iter.next().unwrap_or(0.0);
    let (sum, count) = iter.fold((0.0, 1usize), |(sum, count), v| (sum + (v - origin), count + 1) );
    let centre = origin + sum / count as f64;
    let spread = vals.map(|v| (v - centre).powi(2) ).sum::<f64>().sqrt();
    if spread > 0.0 { (centre, spread) } else { (centre, 1.0) }
}

/// Immutable result of a plane fit: y = intercept + x_slope * x + z_slope * z.
/// Once built, evaluation has no failure path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedPlane {

    intercept : f64,

    x_slope : f64,

    z_slope : f64,

    // Mean (x, z) of the training samples and the fitted height there. Evaluation is done
    // relative to this point, which keeps it accurate when x or z carry a large offset.
    centre : [f64; 2],

    level : f64,

    // Numerical rank of the design matrix the plane was fitted on (3 when the fit is unique).
    rank : usize,

    // Sum of squared residuals over the training samples.
    ssr : f64,

    n : usize

}

impl FittedPlane {

    /// Fits with the default (minimum-norm) degeneracy policy.
    pub fn fit(samples : &[Sample]) -> Result<Self, FitError> {
        PlaneRegressor::new().fit(samples)
    }

    /// Evaluates the plane at (x, z). Any real input is valid (the plane is extrapolated
    /// linearly outside the training range); non-finite inputs yield a non-finite output.
    pub fn predict(&self, x : f64, z : f64) -> f64 {
        self.level + self.x_slope * (x - self.centre[0]) + self.z_slope * (z - self.centre[1])
    }

    /// Returns (intercept, x_slope, z_slope).
    pub fn coefficients(&self) -> (f64, f64, f64) {
        (self.intercept, self.x_slope, self.z_slope)
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn x_slope(&self) -> f64 {
        self.x_slope
    }

    pub fn z_slope(&self) -> f64 {
        self.z_slope
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Whether the fit is the unique least-squares optimum (false for minimum-norm fallbacks).
    pub fn is_full_rank(&self) -> bool {
        self.rank == 3
    }

    /// Sum of squared residuals over the training samples.
    pub fn ssr(&self) -> f64 {
        self.ssr
    }

    /// Number of samples the plane was fitted on.
    pub fn n_samples(&self) -> usize {
        self.n
    }

    /// Observed minus predicted y for each sample.
    pub fn residuals(&self, samples : &[Sample]) -> Vec<f64> {
        samples.iter().map(|s| s.y - self.predict(s.x, s.z) ).collect()
    }

    pub fn sum_squared_residuals(&self, samples : &[Sample]) -> f64 {
        self.residuals(samples).iter().map(|r| r * r ).sum()
    }

    /// Coefficient of determination over the informed samples. Returns None when
    /// y has no variance (or the slice is empty).
    pub fn r_squared(&self, samples : &[Sample]) -> Option<f64> {
        if samples.is_empty() {
            return None;
        }
        let mean = samples.iter().map(|s| s.y ).sum::<f64>() / samples.len() as f64;
        let tss : f64 = samples.iter().map(|s| (s.y - mean).powi(2) ).sum();
        if tss == 0.0 {
            None
        } else {
            Some(1. - self.sum_squared_residuals(samples) / tss)
        }
    }

}

impl Estimator for FittedPlane {

    type Settings = Degeneracy;

    type Error = FitError;

    /// Each row is [x, y, z].
    fn estimate(
        sample : impl Iterator<Item=impl Borrow<[f64]>> + Clone,
        settings : Self::Settings
    ) -> Result<Self, Self::Error> {
        let mut samples = Vec::new();
        for row in sample {
            let row : &[f64] = row.borrow();
            if row.len() != 3 {
                return Err(InvalidInput::Shape { expected : 3, found : row.len() }.into());
            }
            samples.push(Sample::new(row[0], row[1], row[2]));
        }
        PlaneRegressor::new().degeneracy(settings).fit(&samples)
    }

}
