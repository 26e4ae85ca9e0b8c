//! Five-point negative Laplacian on one tile
//!
//! The operator computes
//!
//! ```text
//! out(i,j) = (-in(i-1,j) + 2 in(i,j) - in(i+1,j)) / dx^2
//!          + (-in(i,j-1) + 2 in(i,j) - in(i,j+1)) / dy^2
//! ```
//!
//! for every cell that is not on the global domain boundary; global
//! boundary cells are left untouched and carry the zero Dirichlet
//! residual. Tile-edge cells read neighbour values from the halo, so an
//! application overlaps the halo sends with the interior sweep.
use crate::halo::Halo;
use crate::topology::ProcessGrid;
use ndarray::{s, Array2, Zip};

/// Discrete negative Laplacian with halo exchange and diagonal scaling
pub struct Laplacian<'a> {
    pub(crate) grid: &'a ProcessGrid,
    nx: usize,
    ny: usize,
    dx2i: f64,
    dy2i: f64,
    halo: Halo,
}

impl<'a> Laplacian<'a> {
    /// Operator for an `nx` x `ny` tile with spacings `dx`, `dy`
    pub fn new(nx: usize, ny: usize, dx: f64, dy: f64, grid: &'a ProcessGrid) -> Self {
        Self {
            grid,
            nx,
            ny,
            dx2i: 1.0 / (dx * dx),
            dy2i: 1.0 / (dy * dy),
            halo: Halo::new(nx, ny),
        }
    }

    /// Apply the operator: `out = A * input`.
    ///
    /// Send order, interior sweep, receives, then tile-edge and corner
    /// cells; the sends are guaranteed complete on return. Tiles one cell
    /// wide or tall take their edge values from the two opposite halo
    /// strips through the same lookup.
    pub fn apply(&mut self, input: &Array2<f64>, out: &mut Array2<f64>) {
        self.halo.pack(input);
        let (nx, ny) = (self.nx, self.ny);
        let (dx2i, dy2i) = (self.dx2i, self.dy2i);
        let grid = self.grid;
        self.halo.exchange(
            grid,
            out,
            |out| {
                if nx > 1 && ny > 1 {
                    Zip::indexed(out.slice_mut(s![1..ny - 1, 1..nx - 1])).par_for_each(
                        |(j, i), o| {
                            let (j, i) = (j + 1, i + 1);
                            *o = dx2i
                                * (-input[[j, i - 1]] + 2.0 * input[[j, i]] - input[[j, i + 1]])
                                + dy2i
                                    * (-input[[j - 1, i]] + 2.0 * input[[j, i]]
                                        - input[[j + 1, i]]);
                        },
                    );
                }
            },
            |out, recv| {
                let stencil = |i: usize, j: usize| {
                    let [l, r, b, t] = recv.neighbourhood(input, i, j);
                    let c = input[[j, i]];
                    dx2i * (-l + 2.0 * c - r) + dy2i * (-b + 2.0 * c - t)
                };
                let rows = [0, ny - 1];
                let rows = &rows[..if ny > 1 { 2 } else { 1 }];
                let cols = [0, nx - 1];
                let cols = &cols[..if nx > 1 { 2 } else { 1 }];
                for &j in rows {
                    for i in 1..nx.saturating_sub(1) {
                        if !grid.on_global_boundary(i, j, nx, ny) {
                            out[[j, i]] = stencil(i, j);
                        }
                    }
                }
                for &i in cols {
                    for j in 1..ny.saturating_sub(1) {
                        if !grid.on_global_boundary(i, j, nx, ny) {
                            out[[j, i]] = stencil(i, j);
                        }
                    }
                }
                for &j in rows {
                    for &i in cols {
                        if !grid.on_global_boundary(i, j, nx, ny) {
                            out[[j, i]] = stencil(i, j);
                        }
                    }
                }
            },
        );
    }

    /// Diagonal preconditioner: `out = input / (2 (1/dx^2 + 1/dy^2))` on
    /// every cell that is not on the global boundary, identity there.
    ///
    /// Whether a tile-edge cell is scaled depends only on neighbour
    /// presence, never on its position within the tile.
    pub fn precondition(&self, input: &Array2<f64>, out: &mut Array2<f64>) {
        let factor = 2.0 * (self.dx2i + self.dy2i);
        Zip::from(&mut *out).and(input).par_for_each(|o, &v| *o = v / factor);
        let (nx, ny) = (self.nx, self.ny);
        if self.grid.bottom.is_none() {
            out.slice_mut(s![0, ..]).assign(&input.slice(s![0, ..]));
        }
        if self.grid.top.is_none() {
            out.slice_mut(s![ny - 1, ..]).assign(&input.slice(s![ny - 1, ..]));
        }
        if self.grid.left.is_none() {
            out.slice_mut(s![.., 0]).assign(&input.slice(s![.., 0]));
        }
        if self.grid.right.is_none() {
            out.slice_mut(s![.., nx - 1]).assign(&input.slice(s![.., nx - 1]));
        }
    }

    /// Zero the strips of `field` that lie on the global boundary
    pub fn impose_bc(&self, field: &mut Array2<f64>) {
        let (nx, ny) = (self.nx, self.ny);
        if self.grid.bottom.is_none() {
            field.slice_mut(s![0, ..]).fill(0.0);
        }
        if self.grid.top.is_none() {
            field.slice_mut(s![ny - 1, ..]).fill(0.0);
        }
        if self.grid.left.is_none() {
            field.slice_mut(s![.., 0]).fill(0.0);
        }
        if self.grid.right.is_none() {
            field.slice_mut(s![.., nx - 1]).fill(0.0);
        }
    }
}
