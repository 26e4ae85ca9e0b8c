//! Solution output
//!
//! The tiles are gathered onto the root rank, which derives the velocity
//! components from the streamfunction and writes one text record per grid
//! cell: `x y v s u0 u1`, Ny rows per column with a blank line between
//! columns.
use super::Cavity2D;
use crate::error::Result;
use crate::topology::Tile;
use mpi::traits::*;
use ndarray::{s, Array2};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const TAG_VORTICITY: i32 = 10;
const TAG_STREAMFUNCTION: i32 = 11;

impl Cavity2D<'_> {
    /// Write the solution to `path` (collective; the file is written by the
    /// root rank only).
    ///
    /// Velocities are `u0 = (s(i,j+1) - s(i,j)) / dy` and
    /// `u1 = -(s(i+1,j) - s(i,j)) / dx` on interior cells, zero on the
    /// boundary except `u0 = U` on the lid row.
    ///
    /// # Errors
    /// File creation or writing failed on the root rank.
    pub fn write_solution(&self, path: &Path) -> Result<()> {
        let world = &self.grid.world;
        if !self.grid.is_root() {
            let v: Vec<f64> = self.v.iter().copied().collect();
            let s: Vec<f64> = self.s.iter().copied().collect();
            let root = world.process_at_rank(0);
            root.send_with_tag(&v[..], TAG_VORTICITY);
            root.send_with_tag(&s[..], TAG_STREAMFUNCTION);
            return Ok(());
        }

        let (nx, ny) = (self.nx, self.ny);
        let mut v = Array2::<f64>::zeros((ny, nx));
        let mut s = Array2::<f64>::zeros((ny, nx));
        place_tile(&mut v, &self.v, &self.tile);
        place_tile(&mut s, &self.s, &self.tile);

        // Tile geometry of every sender is recomputed from its coordinates;
        // the splitting is deterministic
        let p = self.grid.p;
        for rank in 1..world.size() {
            let (py, px) = ((rank as usize) / p, (rank as usize) % p);
            let tile = Tile::new(p, px, py, nx, ny, self.lx, self.ly);
            let mut buf = vec![0.0; tile.npts()];
            let sender = world.process_at_rank(rank);
            sender.receive_into_with_tag(&mut buf[..], TAG_VORTICITY);
            copy_tile(&mut v, &buf, &tile);
            sender.receive_into_with_tag(&mut buf[..], TAG_STREAMFUNCTION);
            copy_tile(&mut s, &buf, &tile);
        }

        let mut u0 = Array2::<f64>::zeros((ny, nx));
        let mut u1 = Array2::<f64>::zeros((ny, nx));
        for i in 1..nx - 1 {
            for j in 1..ny - 1 {
                u0[[j, i]] = (s[[j + 1, i]] - s[[j, i]]) / self.dy;
                u1[[j, i]] = -(s[[j, i + 1]] - s[[j, i]]) / self.dx;
            }
        }
        for i in 0..nx {
            u0[[ny - 1, i]] = self.u;
        }

        let mut out = BufWriter::new(File::create(path)?);
        for i in 0..nx {
            for j in 0..ny {
                writeln!(
                    out,
                    "{} {} {} {} {} {}",
                    i as f64 * self.dx,
                    j as f64 * self.dy,
                    v[[j, i]],
                    s[[j, i]],
                    u0[[j, i]],
                    u1[[j, i]],
                )?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

}

/// Place a local tile into the global field at its start offsets
fn place_tile(dst: &mut Array2<f64>, src: &Array2<f64>, tile: &Tile) {
    dst.slice_mut(s![
        tile.y_start..tile.y_start + tile.ny,
        tile.x_start..tile.x_start + tile.nx
    ])
    .assign(src);
}

/// Scatter a received flat tile (row-major, shape `(ny, nx)`) into the
/// global field at its start offsets
fn copy_tile(dst: &mut Array2<f64>, buf: &[f64], tile: &Tile) {
    for j in 0..tile.ny {
        for i in 0..tile.nx {
            dst[[tile.y_start + j, tile.x_start + i]] = buf[j * tile.nx + i];
        }
    }
}
