//! Lid-driven cavity integrator
//!
//! Owns the vorticity and streamfunction tiles and advances them in time:
//! per step the wall vorticity is rebuilt from the streamfunction, the
//! interior vorticity is recomputed and advanced explicitly
//! (advection + diffusion), and the streamfunction Poisson problem
//! `-laplace(s) = v` is handed to the conjugate gradient solver.
mod io;

use crate::error::{Error, Result};
use crate::halo::Halo;
use crate::solver::PoissonPcg;
use crate::topology::{ProcessGrid, Tile};
use ndarray::Array2;

/// Lid-driven cavity flow on a distributed 2-D grid.
///
/// Configuration is collective: every rank calls the setters with the same
/// global arguments, and each rank derives its own tile from them. Call
/// [`initialise`](Self::initialise) after the last configuration change and
/// before [`integrate`](Self::integrate).
pub struct Cavity2D<'a> {
    grid: &'a ProcessGrid,
    /// Global grid points in x
    nx: usize,
    /// Global grid points in y
    ny: usize,
    /// Global domain extent in x
    lx: f64,
    /// Global domain extent in y
    ly: f64,
    tile: Tile,
    dx: f64,
    dy: f64,
    dt: f64,
    t_final: f64,
    re: f64,
    nu: f64,
    /// Lid speed; the boundary treatment assumes 1
    u: f64,
    v: Array2<f64>,
    s: Array2<f64>,
    halo_s: Halo,
    halo_v: Halo,
    pcg: PoissonPcg<'a>,
}

impl<'a> Cavity2D<'a> {
    /// Cavity with the default configuration: unit square, 9 x 9 points,
    /// Re = 10, dt = 0.01, T = 1.
    pub fn new(grid: &'a ProcessGrid) -> Self {
        let (nx, ny) = (9, 9);
        let (lx, ly) = (1.0, 1.0);
        let tile = grid.tile(nx, ny, lx, ly);
        let dx = lx / (nx - 1) as f64;
        let dy = ly / (ny - 1) as f64;
        let shape = (tile.ny, tile.nx);
        Self {
            grid,
            nx,
            ny,
            lx,
            ly,
            dx,
            dy,
            dt: 0.01,
            t_final: 1.0,
            re: 10.0,
            nu: 0.1,
            u: 1.0,
            v: Array2::zeros(shape),
            s: Array2::zeros(shape),
            halo_s: Halo::new(tile.nx, tile.ny),
            halo_v: Halo::new(tile.nx, tile.ny),
            pcg: PoissonPcg::new(tile.nx, tile.ny, dx, dy, grid),
            tile,
        }
    }

    /// Set the global domain extents
    pub fn set_domain_size(&mut self, lx: f64, ly: f64) {
        self.lx = lx;
        self.ly = ly;
        self.update_spacing();
    }

    /// Set the global grid size
    pub fn set_grid_size(&mut self, nx: usize, ny: usize) {
        self.nx = nx;
        self.ny = ny;
        self.update_spacing();
    }

    /// Set the time step
    pub fn set_time_step(&mut self, dt: f64) {
        self.dt = dt;
    }

    /// Set the final time
    pub fn set_final_time(&mut self, t_final: f64) {
        self.t_final = t_final;
    }

    /// Set the Reynolds number; the kinematic viscosity becomes `1 / re`
    pub fn set_reynolds_number(&mut self, re: f64) {
        self.re = re;
        self.nu = 1.0 / re;
    }

    fn update_spacing(&mut self) {
        self.dx = self.lx / (self.nx - 1) as f64;
        self.dy = self.ly / (self.ny - 1) as f64;
        self.tile = self.grid.tile(self.nx, self.ny, self.lx, self.ly);
    }

    /// Report the resolved configuration on the root rank and check the
    /// explicit stability bound `nu * dt / (dx * dy) <= 0.25`.
    ///
    /// # Errors
    /// [`Error::UnstableTimeStep`] when the bound is violated; the root
    /// rank prints the largest admissible time-step.
    pub fn print_configuration(&self) -> Result<()> {
        if self.grid.is_root() {
            print!(
                "{}",
                configuration_report(
                    self.nx, self.ny, self.dx, self.dy, self.lx, self.ly, self.dt, self.t_final,
                    self.re,
                )
            );
        }
        if self.nu * self.dt / (self.dx * self.dy) > 0.25 {
            let max_dt = 0.25 * self.dx * self.dy / self.nu;
            if self.grid.is_root() {
                println!("ERROR: Time-step restriction not satisfied!");
                println!("Maximum time-step is {}", max_dt);
            }
            return Err(Error::UnstableTimeStep { max_dt });
        }
        Ok(())
    }

    /// Allocate zeroed vorticity and streamfunction tiles and build the
    /// Poisson solver for the current configuration
    pub fn initialise(&mut self) {
        let (nx, ny) = (self.tile.nx, self.tile.ny);
        self.v = Array2::zeros((ny, nx));
        self.s = Array2::zeros((ny, nx));
        self.halo_s = Halo::new(nx, ny);
        self.halo_v = Halo::new(nx, ny);
        self.pcg = PoissonPcg::new(nx, ny, self.dx, self.dy, self.grid);
    }

    /// Advance from t = 0 to the final time in `ceil(T / dt)` steps.
    ///
    /// # Errors
    /// Propagates a failed Poisson solve.
    pub fn integrate(&mut self) -> Result<()> {
        let steps = (self.t_final / self.dt).ceil() as usize;
        for step in 0..steps {
            if self.grid.is_root() {
                println!("Step: {:>8}  Time: {:>8}", step, step as f64 * self.dt);
            }
            self.advance()?;
        }
        Ok(())
    }

    /// One explicit time step (collective across the process grid)
    pub fn advance(&mut self) -> Result<()> {
        let (nx, ny) = (self.tile.nx, self.tile.ny);
        let (dxi, dyi) = (1.0 / self.dx, 1.0 / self.dy);
        let (dx2i, dy2i) = (dxi * dxi, dyi * dyi);
        let (dt, nu, u) = (self.dt, self.nu, self.u);
        let grid = self.grid;

        // Neighbour streamfunction values for the vorticity updates
        self.halo_s.update(grid, &self.s);

        // Local index ranges of the cells owned by this tile that are not
        // on a global wall
        let i0 = usize::from(grid.left.is_none());
        let i1 = if grid.right.is_none() { nx - 1 } else { nx };
        let j0 = usize::from(grid.bottom.is_none());
        let j1 = if grid.top.is_none() { ny - 1 } else { ny };

        // Wall vorticity from the one-sided second-order expression; the
        // lid term applies on the top wall only
        if grid.bottom.is_none() {
            for i in i0..i1 {
                let s_up = if ny > 1 { self.s[[1, i]] } else { self.halo_s.recv.top[i] };
                self.v[[0, i]] = 2.0 * dy2i * (self.s[[0, i]] - s_up);
            }
        }
        if grid.top.is_none() {
            for i in i0..i1 {
                let s_dn = if ny > 1 {
                    self.s[[ny - 2, i]]
                } else {
                    self.halo_s.recv.bottom[i]
                };
                self.v[[ny - 1, i]] =
                    2.0 * dy2i * (self.s[[ny - 1, i]] - s_dn) - 2.0 * dyi * u;
            }
        }
        if grid.left.is_none() {
            for j in j0..j1 {
                let s_rt = if nx > 1 { self.s[[j, 1]] } else { self.halo_s.recv.right[j] };
                self.v[[j, 0]] = 2.0 * dx2i * (self.s[[j, 0]] - s_rt);
            }
        }
        if grid.right.is_none() {
            for j in j0..j1 {
                let s_lt = if nx > 1 {
                    self.s[[j, nx - 2]]
                } else {
                    self.halo_s.recv.left[j]
                };
                self.v[[j, nx - 1]] = 2.0 * dx2i * (self.s[[j, nx - 1]] - s_lt);
            }
        }

        // Interior vorticity from the streamfunction
        for j in j0..j1 {
            for i in i0..i1 {
                let [sl, sr, sb, st] = self.halo_s.recv.neighbourhood(&self.s, i, j);
                let sc = self.s[[j, i]];
                self.v[[j, i]] =
                    dx2i * (2.0 * sc - sr - sl) + dy2i * (2.0 * sc - st - sb);
            }
        }

        // Neighbour vorticity values for the explicit advance
        self.halo_v.update(grid, &self.v);

        // Explicit advance, in place: the sweep runs i-outer/j-inner and
        // lower-index neighbours are the already-updated values
        for i in i0..i1 {
            for j in j0..j1 {
                let [vl, vr, vb, vt] = self.halo_v.recv.neighbourhood(&self.v, i, j);
                let [sl, sr, sb, st] = self.halo_s.recv.neighbourhood(&self.s, i, j);
                let vc = self.v[[j, i]];
                self.v[[j, i]] = vc
                    + dt * ((sr - sl) * 0.5 * dxi * (vt - vb) * 0.5 * dyi
                        - (st - sb) * 0.5 * dyi * (vr - vl) * 0.5 * dxi
                        + nu * (vr - 2.0 * vc + vl) * dx2i
                        + nu * (vt - 2.0 * vc + vb) * dy2i);
            }
        }

        // Poisson solve for the streamfunction
        self.pcg.solve(&self.v, &mut self.s)
    }

    /// Global grid points per axis
    pub fn global_grid_size(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// This rank's tile of the global grid
    pub fn tile(&self) -> &Tile {
        &self.tile
    }

    /// Grid spacings
    pub fn spacing(&self) -> (f64, f64) {
        (self.dx, self.dy)
    }

    /// Kinematic viscosity
    pub fn nu(&self) -> f64 {
        self.nu
    }

    /// Local vorticity tile, shape `(ny_local, nx_local)`
    pub fn vorticity(&self) -> &Array2<f64> {
        &self.v
    }

    /// Local streamfunction tile, shape `(ny_local, nx_local)`
    pub fn streamfunction(&self) -> &Array2<f64> {
        &self.s
    }
}

/// The resolved-configuration report printed by the root rank
fn configuration_report(
    nx: usize,
    ny: usize,
    dx: f64,
    dy: f64,
    lx: f64,
    ly: f64,
    dt: f64,
    t_final: f64,
    re: f64,
) -> String {
    let steps = (t_final / dt).ceil() as usize;
    format!(
        "Grid size: {nx} x {ny}\n\
         Spacing:   {dx} x {dy}\n\
         Length:    {lx} x {ly}\n\
         Grid pts:  {}\n\
         Timestep:  {dt}\n\
         Steps:     {steps}\n\
         Reynolds number: {re}\n\
         Linear solver: preconditioned conjugate gradient\n\n",
        nx * ny
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_matches_reference_strings() {
        // dt = 0.2, T = 5.1, 21 x 11 points on a 1 x 2 box, Re = 100
        let report = configuration_report(21, 11, 0.05, 0.2, 1.0, 2.0, 0.2, 5.1, 100.0);
        for expected in [
            "Grid size: 21 x 11",
            "Spacing:   0.05 x 0.2",
            "Length:    1 x 2",
            "Grid pts:  231",
            "Timestep:  0.2",
            "Steps:     26",
            "Reynolds number: 100",
            "Linear solver: preconditioned conjugate gradient",
        ] {
            assert!(report.contains(expected), "missing {expected:?} in {report:?}");
        }
    }

    #[test]
    fn step_count_rounds_up() {
        let report = configuration_report(9, 9, 0.125, 0.125, 1.0, 1.0, 0.3, 1.0, 10.0);
        assert!(report.contains("Steps:     4"), "ceil(1.0 / 0.3) = 4");
    }
}
