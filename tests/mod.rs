use std::fs;
use std::path::PathBuf;
use std::process::Command;
use nalgebra::DMatrix;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use planefit::*;
use planefit::fit::Estimator;
use planefit::fit::linear::{OLS, OLSSettings};
use planefit::surface::{Domain, Grid, Surface};
use planefit::table::{Table, TableError};

const EPS : f64 = 1E-9;

fn random_samples(rng : &mut StdRng, n : usize, noise : f64) -> Vec<Sample> {
    let err = Normal::new(0.0, noise.max(f64::MIN_POSITIVE)).unwrap();
    (0..n).map(|_| {
        let x : f64 = rng.gen_range(-5.0..5.0);
        let z : f64 = rng.gen_range(-5.0..5.0);
        let e = if noise > 0.0 { err.sample(rng) } else { 0.0 };
        Sample::new(x, 2. + 3. * x - z + e, z)
    }).collect()
}

fn scratch_path(name : &str) -> PathBuf {
    std::env::temp_dir().join(format!("planefit-{}-{}", std::process::id(), name))
}

fn planefit(args : &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_planefit")).args(args).output().unwrap()
}

#[test]
fn exact_recovery() {
    let mut rng = StdRng::seed_from_u64(42);
    for n in [3, 4, 10, 150].iter() {
        let samples = random_samples(&mut rng, *n, 0.0);
        let plane = PlaneRegressor::new()
            .degeneracy(Degeneracy::Reject)
            .fit(&samples)
            .unwrap();
        let (a, b, c) = plane.coefficients();
        assert!((a - 2.).abs() < EPS, "n = {}: a = {}", n, a);
        assert!((b - 3.).abs() < EPS, "n = {}: b = {}", n, b);
        assert!((c + 1.).abs() < EPS, "n = {}: c = {}", n, c);
    }
}

#[test]
fn reported_ssr_is_the_least_squares_minimum() {
    let mut rng = StdRng::seed_from_u64(7);
    let samples = random_samples(&mut rng, 200, 0.5);
    let plane = FittedPlane::fit(&samples).unwrap();

    let independent : f64 = samples.iter()
        .map(|s| (s.y - plane.predict(s.x, s.z)).powi(2) )
        .sum();
    assert!((independent - plane.ssr()).abs() <= 1E-9 * independent.max(1.0));
    assert!((plane.sum_squared_residuals(&samples) - independent).abs() <= 1E-9 * independent);

    // Residuals satisfy the normal equations X^T r = 0.
    let res = plane.residuals(&samples);
    let sum_r : f64 = res.iter().sum();
    let sum_xr : f64 = res.iter().zip(samples.iter()).map(|(r, s)| r * s.x ).sum();
    let sum_zr : f64 = res.iter().zip(samples.iter()).map(|(r, s)| r * s.z ).sum();
    assert!(sum_r.abs() < 1E-8 && sum_xr.abs() < 1E-8 && sum_zr.abs() < 1E-8);

    // Moving any coefficient away from the solution increases the objective.
    let (a, b, c) = plane.coefficients();
    for (da, db, dc) in [(1E-3, 0., 0.), (0., -1E-3, 0.), (0., 0., 1E-3)].iter() {
        let perturbed : f64 = samples.iter()
            .map(|s| (s.y - (a + da) - (b + db) * s.x - (c + dc) * s.z).powi(2) )
            .sum();
        assert!(perturbed > plane.ssr());
    }

    let r2 = plane.r_squared(&samples).unwrap();
    assert!(r2 > 0.9 && r2 < 1.0);
}

#[test]
fn plane_agrees_with_general_ols() {
    let mut rng = StdRng::seed_from_u64(3);
    let samples = random_samples(&mut rng, 50, 1.0);
    let plane = FittedPlane::fit(&samples).unwrap();
    let rows : Vec<[f64; 3]> = samples.iter().map(|s| [s.y, s.x, s.z] ).collect();
    let ols = OLS::estimate(rows.iter().map(|r| &r[..] ), OLSSettings::default()).unwrap();
    let (a, b, c) = plane.coefficients();
    assert!((ols.beta[0] - a).abs() < EPS);
    assert!((ols.beta[1] - b).abs() < EPS);
    assert!((ols.beta[2] - c).abs() < EPS);
    assert!((ols.ssr - plane.ssr()).abs() < EPS);
    let x = DMatrix::from_row_slice(1, 3, &[1.0, 0.5, -0.25]);
    assert!((ols.predict(&x)[0] - plane.predict(0.5, -0.25)).abs() < EPS);
}

#[test]
fn one_dimensional_degeneracy() {
    let samples = [Sample::new(1., 3., 0.), Sample::new(2., 5., 0.), Sample::new(3., 7., 0.)];
    let plane = FittedPlane::fit(&samples).unwrap();
    assert!((plane.predict(4., 0.) - 9.).abs() < EPS);
    assert!(plane.z_slope().abs() < EPS);
    assert!(!plane.is_full_rank());
}

#[test]
fn failed_fits_never_produce_a_plane() {
    assert_eq!(FittedPlane::fit(&[]), Err(FitError::InvalidInput(InvalidInput::Empty)));
    let two = [Sample::new(0., 1., 0.), Sample::new(1., 2., 1.)];
    let strict = PlaneRegressor::new().degeneracy(Degeneracy::Reject).fit(&two);
    assert_eq!(strict, Err(FitError::DegenerateFit { rank : 2, expected : 3 }));
    let bad = [Sample::new(0., f64::NEG_INFINITY, 0.)];
    assert!(matches!(FittedPlane::fit(&bad), Err(FitError::InvalidInput(InvalidInput::NonFinite { row : 0, .. }))));
}

#[test]
fn shared_between_threads() {
    let samples = random_samples(&mut StdRng::seed_from_u64(11), 20, 0.0);
    let plane = FittedPlane::fit(&samples).unwrap();
    let handles : Vec<_> = (0..4).map(|i| {
        std::thread::spawn(move || plane.predict(i as f64, -(i as f64)) )
    }).collect();
    for (i, h) in handles.into_iter().enumerate() {
        let y = h.join().unwrap();
        assert_eq!(y.to_bits(), plane.predict(i as f64, -(i as f64)).to_bits());
    }
}

#[test]
fn iris_table_to_grid() {
    let content = "5.1,3.5,1.4,0.2,Iris-setosa
4.9,3.0,1.4,0.2,Iris-setosa
4.7,3.2,1.3,0.2,Iris-setosa
7.0,3.2,4.7,1.4,Iris-versicolor
6.4,3.2,4.5,1.5,Iris-versicolor
5.5,2.3,4.0,1.3,Iris-versicolor
6.3,3.3,6.0,2.5,Iris-virginica
5.8,2.7,5.1,1.9,Iris-virginica
7.1,3.0,5.9,2.1,Iris-virginica
";
    let tbl : Table = content.parse().unwrap();
    // Sepal length, petal length and petal width.
    let samples = tbl.samples(0usize, 2usize, 3usize).unwrap();
    assert_eq!(samples.len(), 9);
    let plane = PlaneRegressor::new().degeneracy(Degeneracy::Reject).fit(&samples).unwrap();
    assert!(plane.is_full_rank());
    assert!(plane.r_squared(&samples).unwrap() > 0.9);

    let grid = Grid::sample(&plane, Domain::new(4., 8.).unwrap(), Domain::new(0., 2.5).unwrap(), 10).unwrap();
    assert_eq!(grid.heights().shape(), (10, 10));
    for (x, z, y) in grid.points() {
        assert_eq!(y, plane.height(x, z));
    }
}

#[test]
fn offset_predictors() {
    // Timestamps around 1.6e12 ms against a small second predictor.
    let x0 = 1.6E12;
    let mut rng = StdRng::seed_from_u64(5);
    let samples : Vec<Sample> = (0..40).map(|i| {
        let z : f64 = rng.gen_range(0.0..3.0);
        Sample::new(x0 + i as f64 * 250., 0.004 * (i as f64 * 250.) - z + 5., z)
    }).collect();
    let plane = PlaneRegressor::new().degeneracy(Degeneracy::Reject).fit(&samples).unwrap();
    assert!(plane.is_full_rank());
    assert!((plane.x_slope() - 0.004).abs() < EPS);
    assert!((plane.z_slope() + 1.).abs() < EPS);
    assert!((plane.predict(x0 + 1000., 2.) - 7.).abs() < 1E-6);
    assert!(plane.ssr() < 1E-12);
}

#[test]
fn table_from_file() {
    let path = scratch_path("table.csv");
    fs::write(&path, "x,y,z\n1,3,0\n2,5,1\n3,6,0\n").unwrap();
    let tbl = Table::open(&path).unwrap();
    assert_eq!(tbl.col_names(), &["x", "y", "z"]);
    assert_eq!(tbl.samples("x", "y", "z").unwrap()[1], Sample::new(2., 5., 1.));

    fs::write(&path, "  \n\n").unwrap();
    assert!(matches!(Table::open(&path), Err(TableError::Empty)));
    fs::remove_file(&path).unwrap();

    assert!(matches!(Table::open(scratch_path("missing.csv")), Err(TableError::Io(_))));
}

#[test]
fn cli_fit_and_predict() {
    let src = scratch_path("cli.csv");
    let out = scratch_path("cli.json");
    fs::write(&src, "x,y,z\n1,3,0\n2,5,0\n3,7,0\n").unwrap();
    let _ = fs::remove_file(&out);
    let (src_arg, out_arg) = (src.to_str().unwrap(), out.to_str().unwrap());

    // z never varies: a strict fit fails before any output file is created.
    let res = planefit(&["fit", src_arg, "-x", "x", "-y", "y", "-z", "z", "--strict", "-o", out_arg]);
    assert!(!res.status.success());
    assert!(!out.exists());

    let res = planefit(&["fit", src_arg, "-x", "0", "-y", "1", "-z", "2", "-o", out_arg]);
    assert!(res.status.success());
    let plane : FittedPlane = serde_json::from_reader(fs::File::open(&out).unwrap()).unwrap();
    assert_eq!(plane.rank(), 2);
    assert_eq!(plane.n_samples(), 3);

    let res = planefit(&["predict", out_arg, "4", "0"]);
    assert!(res.status.success());
    let y : f64 = String::from_utf8(res.stdout).unwrap().trim().parse().unwrap();
    assert!((y - 9.).abs() < EPS);

    let res = planefit(&["grid", "--surface", "sinc", "--x-domain", "-1:1", "--z-domain", "0:1", "--resolution", "2"]);
    assert!(res.status.success());
    let csv = String::from_utf8(res.stdout).unwrap();
    let lines : Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "x,z,y");
    assert!(lines[1].starts_with("-1,0,"));

    fs::remove_file(&src).unwrap();
    fs::remove_file(&out).unwrap();
}
