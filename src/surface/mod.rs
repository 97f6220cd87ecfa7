use nalgebra::*;
use std::str::FromStr;
use thiserror::Error;
use crate::fit::plane::FittedPlane;

/// Anything that assigns a height y to a point (x, z) of the horizontal plane.
/// Implementors are sampled by renderers, which decide how densely to do so.
pub trait Surface {

    fn height(&self, x : f64, z : f64) -> f64;

}

impl Surface for FittedPlane {

    fn height(&self, x : f64, z : f64) -> f64 {
        self.predict(x, z)
    }

}

impl<F> Surface for F
where
    F : Fn(f64, f64) -> f64
{

    fn height(&self, x : f64, z : f64) -> f64 {
        self(x, z)
    }

}

/// The radially symmetric sinc surface y = sin(h) / h, with h = hypot(x, z).
/// Takes its limit value 1 at the origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sinc;

impl Surface for Sinc {

    fn height(&self, x : f64, z : f64) -> f64 {
        let h = x.hypot(z);
        if h == 0.0 {
            1.0
        } else {
            h.sin() / h
        }
    }

}

/// Superposed sine waves along both axes, y = (sin(f x) + sin(f z)) / 2.
#[derive(Debug, Clone, Copy)]
pub struct Ripple {
    pub frequency : f64
}

impl Default for Ripple {

    fn default() -> Self {
        Self { frequency : 5.0 }
    }

}

impl Surface for Ripple {

    fn height(&self, x : f64, z : f64) -> f64 {
        ((self.frequency * x).sin() + (self.frequency * z).sin()) / 2.
    }

}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {

    #[error("Invalid domain {0}:{1} (bounds must be finite and increasing)")]
    Domain(f64, f64),

    #[error("Unable to parse domain '{0}' (expected low:high)")]
    Parse(String),

    #[error("Grid resolution must be at least 2 (informed {0})")]
    Resolution(usize)

}

/// Closed interval [low, high] of the real line, with finite bounds and low < high.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    low : f64,
    high : f64
}

impl Domain {

    pub fn new(low : f64, high : f64) -> Result<Self, GridError> {
        if low.is_finite() && high.is_finite() && low < high {
            Ok(Self { low, high })
        } else {
            Err(GridError::Domain(low, high))
        }
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    /// Returns n >= 2 evenly spaced values spanning the domain, endpoints included.
    pub fn linspace(&self, n : usize) -> Result<Vec<f64>, GridError> {
        if n < 2 {
            return Err(GridError::Resolution(n));
        }
        let step = self.width() / (n - 1) as f64;
        Ok((0..n).map(|i| if i == n - 1 { self.high } else { self.low + step * i as f64 }).collect())
    }

}

impl FromStr for Domain {

    type Err = GridError;

    fn from_str(s : &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(2, ':');
        let low = parts.next().and_then(|p| p.trim().parse::<f64>().ok() );
        let high = parts.next().and_then(|p| p.trim().parse::<f64>().ok() );
        match (low, high) {
            (Some(low), Some(high)) => Domain::new(low, high),
            _ => Err(GridError::Parse(s.to_string()))
        }
    }

}

/// Affine map from a data domain onto a plot range, so that domain.low maps to
/// range.low and domain.high to range.high.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain : Domain,
    pub range : Domain
}

impl LinearScale {

    pub fn new(domain : Domain, range : Domain) -> Self {
        Self { domain, range }
    }

    pub fn map(&self, val : f64) -> f64 {
        let t = (val - self.domain.low) / self.domain.width();
        self.range.low + t * self.range.width()
    }

    pub fn invert(&self, val : f64) -> f64 {
        let t = (val - self.range.low) / self.range.width();
        self.domain.low + t * self.domain.width()
    }

}

/// Heights of a surface sampled over a rectangular, evenly-spaced grid.
/// Rows of the height matrix follow z; columns follow x.
#[derive(Debug, Clone)]
pub struct Grid {
    xs : Vec<f64>,
    zs : Vec<f64>,
    heights : DMatrix<f64>
}

impl Grid {

    /// Samples the surface at resolution x resolution points spanning both domains.
    pub fn sample<S>(surface : &S, x : Domain, z : Domain, resolution : usize) -> Result<Self, GridError>
    where
        S : Surface + ?Sized
    {
        let xs = x.linspace(resolution)?;
        let zs = z.linspace(resolution)?;
        let heights = DMatrix::from_fn(zs.len(), xs.len(), |i, j| surface.height(xs[j], zs[i]) );
        Ok(Self { xs, zs, heights })
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs[..]
    }

    pub fn zs(&self) -> &[f64] {
        &self.zs[..]
    }

    pub fn heights(&self) -> &DMatrix<f64> {
        &self.heights
    }

    /// Smallest and largest sampled heights, ignoring non-finite values.
    pub fn height_bounds(&self) -> Option<(f64, f64)> {
        self.heights.iter()
            .filter(|h| h.is_finite() )
            .fold(None, |acc, h| match acc {
                None => Some((*h, *h)),
                Some((lo, hi)) => Some((lo.min(*h), hi.max(*h)))
            })
    }

    /// Iterates over (x, z, y) triplets, x varying fastest.
    pub fn points(&self) -> impl Iterator<Item=(f64, f64, f64)> + '_ {
        self.zs.iter().enumerate().flat_map(move |(i, z)| {
            self.xs.iter().enumerate().map(move |(j, x)| (*x, *z, self.heights[(i, j)]) )
        })
    }

}
