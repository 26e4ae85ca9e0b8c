//! Distributed linear solver for the streamfunction Poisson problem
//!
//! `laplacian` holds the five-point operator, the diagonal preconditioner
//! and the Dirichlet boundary handling; `pcg` drives the preconditioned
//! conjugate gradient iteration across the process grid.
pub mod laplacian;
pub mod pcg;

pub use laplacian::Laplacian;
pub use pcg::PoissonPcg;
