//! # `lidcavity`: distributed solver for the 2-D lid-driven cavity
//!
//! Solves the incompressible Navier-Stokes equations on the square cavity
//! `[0, Lx] x [0, Ly]` in vorticity-streamfunction form. The grid is block
//! decomposed over a p x p process grid (one MPI rank per tile); each time
//! step rebuilds the wall vorticity, advances the interior vorticity
//! explicitly and solves the streamfunction Poisson problem with a
//! preconditioned conjugate gradient iteration. Stencil sweeps at tile
//! edges read neighbour values from halo strips, exchanged with
//! non-blocking sends overlapped against the interior computation.
//!
//! # Dependencies
//! - an MPI installation (the `mpi` crate links against it)
//!
//! # Example
//! Run with `cargo mpirun`, on a square number of processes:
//!
//! ```text
//! cargo mpirun --np 4 --release -- --Nx 201 --Ny 201 --Re 1000 --dt 0.005 --T 1
//! ```
//!
//! ```no_run
//! use lidcavity::{Cavity2D, ProcessGrid};
//!
//! let universe = mpi::initialize().unwrap();
//! let world = universe.world();
//! let grid = ProcessGrid::new(&world).unwrap();
//! let mut cavity = Cavity2D::new(&grid);
//! cavity.set_grid_size(101, 101);
//! cavity.set_reynolds_number(1000.);
//! cavity.set_time_step(0.005);
//! cavity.set_final_time(0.1);
//! cavity.print_configuration().unwrap();
//! cavity.initialise();
//! cavity.integrate().unwrap();
//! ```
#![warn(missing_docs)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
pub mod cavity;
pub mod error;
pub mod halo;
pub mod solver;
pub mod topology;

pub use cavity::Cavity2D;
pub use error::{Error, Result};
pub use solver::PoissonPcg;
pub use topology::{ProcessGrid, Tile};
