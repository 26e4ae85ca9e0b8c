//! Run example:
//!
//! cargo mpirun --np 4 --bin lidcavity --release -- --Nx 201 --Ny 201 --Re 1000 --dt 0.005 --T 1
//!
//! The process count must be a square number.
use clap::Parser;
use lidcavity::{Cavity2D, ProcessGrid};
use mpi::traits::*;
use std::path::PathBuf;
use std::process::ExitCode;

/// Lid-driven cavity solver, vorticity-streamfunction form
#[derive(Parser, Debug)]
#[command(name = "lidcavity")]
#[command(about = "2-D lid-driven cavity solver on a distributed grid", long_about = None)]
struct Args {
    /// Domain length in x
    #[arg(long = "Lx", default_value_t = 1.0)]
    lx: f64,

    /// Domain length in y
    #[arg(long = "Ly", default_value_t = 1.0)]
    ly: f64,

    /// Grid points in x
    #[arg(long = "Nx", default_value_t = 9)]
    nx: usize,

    /// Grid points in y
    #[arg(long = "Ny", default_value_t = 9)]
    ny: usize,

    /// Reynolds number
    #[arg(long = "Re", default_value_t = 10.0)]
    re: f64,

    /// Time step
    #[arg(long, default_value_t = 0.01)]
    dt: f64,

    /// Final time
    #[arg(long = "T", default_value_t = 1.0)]
    t: f64,

    /// Write the final solution to this file
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let universe = mpi::initialize().unwrap();
    let world = universe.world();

    let grid = match ProcessGrid::new(&world) {
        Ok(grid) => grid,
        Err(e) => {
            if world.rank() == 0 {
                eprintln!("{e}");
            }
            return ExitCode::FAILURE;
        }
    };

    let mut cavity = Cavity2D::new(&grid);
    cavity.set_domain_size(args.lx, args.ly);
    cavity.set_grid_size(args.nx, args.ny);
    cavity.set_time_step(args.dt);
    cavity.set_final_time(args.t);
    cavity.set_reynolds_number(args.re);

    // the stability message is printed by the root rank inside
    if cavity.print_configuration().is_err() {
        return ExitCode::FAILURE;
    }

    cavity.initialise();
    if let Err(e) = cavity.integrate() {
        if grid.is_root() {
            eprintln!("{e}");
        }
        return ExitCode::FAILURE;
    }

    if let Some(path) = &args.output {
        if let Err(e) = cavity.write_solution(path) {
            if grid.is_root() {
                eprintln!("{e}");
            }
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
