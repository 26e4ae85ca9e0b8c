//! Preconditioned conjugate gradient Poisson solver
//!
//! Solves `A x = b` on the distributed grid, where `A` is the discrete
//! negative Laplacian with zero Dirichlet conditions on the global
//! boundary. Every scalar entering a global decision (the step lengths
//! and the convergence test) is formed by a local dot product followed by
//! an Allreduce over the world; local partial values never drive control
//! flow on their own.
use super::laplacian::Laplacian;
use crate::error::{Error, Result};
use crate::topology::ProcessGrid;
use mpi::collective::SystemOperation;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;
use ndarray::{Array2, Zip};

/// Convergence tolerance. The residual norm is compared against
/// `TOL * TOL`, so the effective tolerance is 1e-6.
const TOL: f64 = 1e-3;
/// Hard iteration cap; exceeding it is a fatal error
const MAX_ITERATIONS: usize = 5000;

/// Conjugate gradient state for one tile.
///
/// The residual, search direction, preconditioned residual and operator
/// output are allocated once and reused across solves; no other state
/// survives a solve.
pub struct PoissonPcg<'a> {
    op: Laplacian<'a>,
    r: Array2<f64>,
    p: Array2<f64>,
    z: Array2<f64>,
    t: Array2<f64>,
}

impl<'a> PoissonPcg<'a> {
    /// Solver for an `nx` x `ny` tile with spacings `dx`, `dy`
    pub fn new(nx: usize, ny: usize, dx: f64, dy: f64, grid: &'a ProcessGrid) -> Self {
        Self {
            op: Laplacian::new(nx, ny, dx, dy, grid),
            r: Array2::zeros((ny, nx)),
            p: Array2::zeros((ny, nx)),
            z: Array2::zeros((ny, nx)),
            t: Array2::zeros((ny, nx)),
        }
    }

    /// Solve `A x = b`, taking the incoming `x` as the initial guess.
    ///
    /// A right-hand side with global norm below the squared tolerance
    /// yields `x = 0` immediately. On success the root rank reports the
    /// iteration count and the final residual norm.
    ///
    /// # Errors
    /// [`Error::NonConvergence`] after 5000 iterations.
    pub fn solve(&mut self, b: &Array2<f64>, x: &mut Array2<f64>) -> Result<()> {
        let grid = self.op.grid;
        let world = &grid.world;
        let root = grid.is_root();

        let eps = allreduce_sum(world, dot(b, b)).sqrt();
        if eps < TOL * TOL {
            x.fill(0.0);
            if root {
                println!("Norm is {}", eps);
            }
            return Ok(());
        }

        self.op.apply(x, &mut self.t);
        self.r.assign(b);
        self.op.impose_bc(&mut self.r);
        self.r.scaled_add(-1.0, &self.t);
        self.op.precondition(&self.r, &mut self.z);
        self.p.assign(&self.z);

        let mut k = 0;
        let eps = loop {
            k += 1;

            self.op.apply(&self.p, &mut self.t);

            let alpha_den = allreduce_sum(world, dot(&self.t, &self.p));
            let alpha_num = allreduce_sum(world, dot(&self.r, &self.z));
            let alpha = alpha_num / alpha_den;

            x.scaled_add(alpha, &self.p);
            self.r.scaled_add(-alpha, &self.t);

            let eps = allreduce_sum(world, dot(&self.r, &self.r)).sqrt();
            if eps < TOL * TOL {
                break eps;
            }
            if k >= MAX_ITERATIONS {
                if root {
                    println!("FAILED TO CONVERGE");
                }
                return Err(Error::NonConvergence(MAX_ITERATIONS));
            }

            self.op.precondition(&self.r, &mut self.z);
            let beta = allreduce_sum(world, dot(&self.r, &self.z)) / alpha_num;
            Zip::from(&mut self.p)
                .and(&self.z)
                .for_each(|p, &z| *p = z + beta * *p);
        };

        if root {
            println!("Converged in {} iterations. eps = {}", k, eps);
        }
        Ok(())
    }
}

/// Local dot product of two tiles
fn dot(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    Zip::from(a).and(b).fold(0.0, |acc, &x, &y| acc + x * y)
}

/// Sum a local scalar over every rank
fn allreduce_sum(world: &SimpleCommunicator, local: f64) -> f64 {
    let mut global = 0.0;
    world.all_reduce_into(&local, &mut global, SystemOperation::sum());
    global
}
