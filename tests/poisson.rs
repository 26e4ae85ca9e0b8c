//! Poisson solver tests.
//!
//! MPI can be initialised only once per process, so every scenario runs
//! inside a single test; under `cargo test` the world is a single rank,
//! under `mpirun` any square process count works.
use lidcavity::solver::{Laplacian, PoissonPcg};
use lidcavity::{ProcessGrid, Tile};
use mpi::collective::SystemOperation;
use mpi::traits::*;
use ndarray::Array2;
use std::f64::consts::PI;

#[test]
fn poisson_solver() {
    let universe = mpi::initialize().expect("MPI initialises exactly once per process");
    let world = universe.world();
    let grid = ProcessGrid::new(&world).expect("square process count");

    near_zero_rhs(&grid);
    operator_symmetry(&grid);
    dirichlet_and_idempotence(&grid);
    sinusoidal_solution(&grid);
}

/// A right-hand side below the squared tolerance short-circuits to x = 0,
/// overwriting any initial guess.
fn near_zero_rhs(grid: &ProcessGrid) {
    let tile = grid.tile(10, 10, 0.9, 0.9);
    let mut solver = PoissonPcg::new(tile.nx, tile.ny, 0.1, 0.1, grid);
    let b = Array2::from_elem((tile.ny, tile.nx), 1e-8);
    let mut x = Array2::from_elem((tile.ny, tile.nx), 0.37);
    solver.solve(&b, &mut x).unwrap();
    assert!(x.iter().all(|&xi| xi == 0.0), "near-zero rhs must yield x = 0");
}

/// `<A u, w> = <u, A w>` for fields vanishing on the global boundary
fn operator_symmetry(grid: &ProcessGrid) {
    let (nx, ny) = (16, 16);
    let dx = 1.0 / (nx - 1) as f64;
    let dy = 1.0 / (ny - 1) as f64;
    let tile = grid.tile(nx, ny, 1.0, 1.0);
    let mut op = Laplacian::new(tile.nx, tile.ny, dx, dy, grid);

    let u = sine_field(&tile, dx, dy, 1, 2, 1.0);
    let w = sine_field(&tile, dx, dy, 3, 1, 1.0);
    let mut au = Array2::zeros((tile.ny, tile.nx));
    let mut aw = Array2::zeros((tile.ny, tile.nx));
    op.apply(&u, &mut au);
    op.apply(&w, &mut aw);

    let lhs = global_sum(grid, local_dot(&au, &w));
    let rhs = global_sum(grid, local_dot(&u, &aw));
    assert!(
        (lhs - rhs).abs() <= 1e-9 * lhs.abs().max(1.0),
        "operator must be symmetric: {lhs} vs {rhs}"
    );
}

/// The solution keeps the zero Dirichlet boundary, and re-solving with the
/// same right-hand side moves a converged solution by less than the
/// tolerance.
fn dirichlet_and_idempotence(grid: &ProcessGrid) {
    let (k, l) = (1, 1);
    let (nx, ny) = (64, 64);
    let (lx, ly) = (2.0 / k as f64, 2.0 / l as f64);
    let dx = lx / (nx - 1) as f64;
    let dy = ly / (ny - 1) as f64;
    let tile = grid.tile(nx, ny, lx, ly);
    let mut solver = PoissonPcg::new(tile.nx, tile.ny, dx, dy, grid);

    let scale = -PI * PI * ((k * k + l * l) as f64);
    let b = sine_field(&tile, dx, dy, k, l, scale);
    let mut x = Array2::zeros((tile.ny, tile.nx));
    solver.solve(&b, &mut x).unwrap();

    // global boundary strips stay at zero
    if grid.bottom.is_none() {
        assert!(x.row(0).iter().all(|&v| v == 0.0));
    }
    if grid.top.is_none() {
        assert!(x.row(tile.ny - 1).iter().all(|&v| v == 0.0));
    }
    if grid.left.is_none() {
        assert!(x.column(0).iter().all(|&v| v == 0.0));
    }
    if grid.right.is_none() {
        assert!(x.column(tile.nx - 1).iter().all(|&v| v == 0.0));
    }

    let first = x.clone();
    solver.solve(&b, &mut x).unwrap();
    let drift = x
        .iter()
        .zip(first.iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max);
    assert!(drift < 1e-3, "re-solve moved a converged solution by {drift}");
}

/// Manufactured solution: for
/// `b = -pi^2 (k^2 + l^2) sin(pi k x) sin(pi l y)` on `[0, 2/k] x [0, 2/l]`
/// the solution of `-laplace(x) = b` is `-sin(pi k x) sin(pi l y)`.
fn sinusoidal_solution(grid: &ProcessGrid) {
    let (k, l) = (3, 3);
    let (nx, ny) = (2000, 2000);
    let (lx, ly) = (2.0 / k as f64, 2.0 / l as f64);
    let dx = lx / (nx - 1) as f64;
    let dy = ly / (ny - 1) as f64;
    let tile = grid.tile(nx, ny, lx, ly);
    let mut solver = PoissonPcg::new(tile.nx, tile.ny, dx, dy, grid);

    let scale = -PI * PI * ((k * k + l * l) as f64);
    let b = sine_field(&tile, dx, dy, k, l, scale);
    let mut x = Array2::zeros((tile.ny, tile.nx));
    solver.solve(&b, &mut x).unwrap();

    let exact = sine_field(&tile, dx, dy, k, l, -1.0);
    let local = x
        .iter()
        .zip(exact.iter())
        .map(|(a, b)| (a - b) * (a - b))
        .sum();
    let error = global_sum(grid, local).sqrt();
    assert!(error < 1e-3, "solution error norm {error} exceeds 1e-3");
}

/// `scale * sin(pi k x) sin(pi l y)` sampled on this rank's tile
fn sine_field(tile: &Tile, dx: f64, dy: f64, k: usize, l: usize, scale: f64) -> Array2<f64> {
    Array2::from_shape_fn((tile.ny, tile.nx), |(j, i)| {
        let x = (tile.x_start + i) as f64 * dx;
        let y = (tile.y_start + j) as f64 * dy;
        scale * (PI * k as f64 * x).sin() * (PI * l as f64 * y).sin()
    })
}

fn local_dot(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn global_sum(grid: &ProcessGrid, local: f64) -> f64 {
    let mut global = 0.0;
    grid.world
        .all_reduce_into(&local, &mut global, SystemOperation::sum());
    global
}
