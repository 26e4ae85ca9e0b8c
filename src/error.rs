//! Crate error type
//!
//! All failures are fatal at the job level: the binary reports them on the
//! root rank and exits non-zero. No local recovery is attempted.
use thiserror::Error;

/// Errors raised by the cavity solver
#[derive(Debug, Error)]
pub enum Error {
    /// The job was launched with a process count that is not a perfect square
    #[error("invalid process count {0}: must be a perfect square p*p with p >= 1")]
    NonSquareWorld(usize),
    /// The explicit time integration would be unstable: nu * dt / (dx * dy) > 0.25
    #[error("time-step restriction not satisfied, maximum time-step is {max_dt}")]
    UnstableTimeStep {
        /// Largest admissible time-step for the configured grid and viscosity
        max_dt: f64,
    },
    /// The conjugate gradient iteration hit the hard iteration cap
    #[error("conjugate gradient failed to converge within {0} iterations")]
    NonConvergence(usize),
    /// Writing the solution file failed
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;
