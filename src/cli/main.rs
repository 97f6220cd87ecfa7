use structopt::*;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use anyhow::{bail, Context};
use planefit::{Degeneracy, FittedPlane, PlaneRegressor};
use planefit::table::{ColumnIndex, HeaderMode, Table};
use planefit::surface::{Domain, Grid, Ripple, Sinc, Surface};

/// Fit least-squares planes to three-dimensional samples and sample surfaces for 3D charts
#[derive(StructOpt, Debug)]
#[structopt(name = "planefit")]
pub enum Planefit {

    /// Fits y = a + b x + c z to three columns of a CSV file and outputs the plane as JSON.
    /// Columns are informed by name or by position (headerless files such as iris.data
    /// only accept positions).
    Fit {
        #[structopt(parse(from_os_str))]
        src : PathBuf,

        #[structopt(short)]
        x : ColumnIndex,

        #[structopt(short)]
        y : ColumnIndex,

        #[structopt(short)]
        z : ColumnIndex,

        /// Fail on rank-deficient data instead of returning the minimum-norm plane
        #[structopt(long)]
        strict : bool,

        /// Whether the first line holds column names: auto, present or absent
        #[structopt(long, default_value = "auto")]
        header : HeaderMode,

        #[structopt(short, parse(from_os_str))]
        output : Option<PathBuf>
    },

    /// Evaluates a previously fitted plane at (x, z).
    Predict {
        #[structopt(parse(from_os_str))]
        plane : PathBuf,

        #[structopt(allow_hyphen_values = true)]
        x : f64,

        #[structopt(allow_hyphen_values = true)]
        z : f64
    },

    /// Samples a surface over a rectangular grid, writing x,z,y rows as CSV.
    Grid {

        /// One of plane, sinc or ripple
        #[structopt(long, default_value = "plane")]
        surface : SurfaceKind,

        /// Fitted plane (JSON) to sample when the surface is 'plane'
        #[structopt(long, parse(from_os_str))]
        plane : Option<PathBuf>,

        /// Frequency of the ripple surface
        #[structopt(long, default_value = "5")]
        frequency : f64,

        #[structopt(long = "x-domain", default_value = "-10:10", allow_hyphen_values = true)]
        x_domain : Domain,

        #[structopt(long = "z-domain", default_value = "-10:10", allow_hyphen_values = true)]
        z_domain : Domain,

        /// Points per axis
        #[structopt(long, default_value = "50")]
        resolution : usize,

        #[structopt(short, parse(from_os_str))]
        output : Option<PathBuf>
    }

}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceKind {
    Plane,
    Sinc,
    Ripple
}

impl FromStr for SurfaceKind {

    type Err = String;

    fn from_str(s : &str) -> Result<Self, Self::Err> {
        match s {
            "plane" => Ok(SurfaceKind::Plane),
            "sinc" => Ok(SurfaceKind::Sinc),
            "ripple" => Ok(SurfaceKind::Ripple),
            other => Err(format!("Unknown surface: {}", other))
        }
    }

}

fn open_output(opt_path : &Option<PathBuf>) -> anyhow::Result<Box<dyn Write>> {
    match opt_path {
        Some(path) => {
            let f = File::create(path)
                .with_context(|| format!("Unable to create {}", path.display()) )?;
            Ok(Box::new(f))
        },
        None => Ok(Box::new(io::stdout()))
    }
}

fn print_or_save(plane : &FittedPlane, opt_path : &Option<PathBuf>) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(plane)?;
    let mut out = open_output(opt_path)?;
    writeln!(out, "{}", content)?;
    Ok(())
}

fn load_plane(path : &Path) -> anyhow::Result<FittedPlane> {
    let f = File::open(path)
        .with_context(|| format!("Unable to open plane file {}", path.display()) )?;
    let plane = serde_json::from_reader(f)
        .with_context(|| format!("Invalid plane file {}", path.display()) )?;
    Ok(plane)
}

fn write_grid(grid : &Grid, opt_path : &Option<PathBuf>) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(open_output(opt_path)?);
    wtr.write_record(&["x", "z", "y"])?;
    for (x, z, y) in grid.points() {
        wtr.write_record(&[x.to_string(), z.to_string(), y.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let planefit = Planefit::from_args();
    match planefit {
        Planefit::Fit { src, x, y, z, strict, header, output } => {
            let tbl = Table::open_with(&src, header)
                .with_context(|| format!("Error opening table {}", src.display()) )?;
            let samples = tbl.samples(x, y, z)?;
            let degeneracy = if strict { Degeneracy::Reject } else { Degeneracy::MinimumNorm };
            let plane = PlaneRegressor::new()
                .degeneracy(degeneracy)
                .fit(&samples)
                .context("Unable to fit plane")?;
            log::info!(
                "Fitted plane over {} samples (rank {}, ssr {:.6}, r2 {:?})",
                plane.n_samples(),
                plane.rank(),
                plane.ssr(),
                plane.r_squared(&samples)
            );
            print_or_save(&plane, &output)
        },
        Planefit::Predict { plane, x, z } => {
            let plane = load_plane(&plane)?;
            println!("{}", plane.predict(x, z));
            Ok(())
        },
        Planefit::Grid { surface, plane, frequency, x_domain, z_domain, resolution, output } => {
            let surf : Box<dyn Surface> = match (surface, plane) {
                (SurfaceKind::Plane, Some(path)) => Box::new(load_plane(&path)?),
                (SurfaceKind::Plane, None) => bail!("Missing --plane file for the plane surface"),
                (SurfaceKind::Sinc, _) => Box::new(Sinc),
                (SurfaceKind::Ripple, _) => Box::new(Ripple { frequency })
            };
            let grid = Grid::sample(surf.as_ref(), x_domain, z_domain, resolution)?;
            log::debug!("Sampled {}x{} grid, height bounds {:?}", resolution, resolution, grid.height_bounds());
            write_grid(&grid, &output)
        }
    }
}
