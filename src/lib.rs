/// Observation records and the conversions that turn them into a design matrix.
pub mod sample;

/// Least-squares estimators: the general OLS solver and the plane regressor
/// built on top of it, sharing a single error taxonomy.
pub mod fit;

/// Surfaces that can be sampled over a rectangular grid for 3D rendering
/// (fitted planes, the sinc surface and the ripple surface).
pub mod surface;

/// Flat-file (CSV) tables from which samples are drawn by column.
pub mod table;

pub use fit::{Degeneracy, FitError, InvalidInput};
pub use fit::plane::{FittedPlane, PlaneRegressor};
pub use sample::Sample;
