//! Process grid and domain decomposition
//!
//! The world is arranged as a p x p grid of ranks, one tile of the global
//! Nx x Ny mesh per rank. Row and column sub-communicators carry the
//! left/right and top/bottom halo traffic respectively; global reductions
//! run over the world communicator.
use crate::error::{Error, Result};
use mpi::topology::{Color, Rank, SimpleCommunicator};
use mpi::traits::*;

/// Square process grid with row/column sub-communicators and neighbour ranks.
///
/// `None` neighbours mark the global domain boundary. "Top" is the process
/// row `py + 1`, the side that owns the moving lid.
pub struct ProcessGrid {
    /// World communicator, used for global reductions and gathers
    pub world: SimpleCommunicator,
    /// Sub-communicator over this process row (left/right halo traffic)
    pub row: SimpleCommunicator,
    /// Sub-communicator over this process column (top/bottom halo traffic)
    pub col: SimpleCommunicator,
    /// Processes per grid dimension (world size is `p * p`)
    pub p: usize,
    /// Column coordinate of this rank (x direction)
    pub px: usize,
    /// Row coordinate of this rank (y direction)
    pub py: usize,
    /// Neighbour rank within `row`, towards smaller x
    pub left: Option<Rank>,
    /// Neighbour rank within `row`, towards larger x
    pub right: Option<Rank>,
    /// Neighbour rank within `col`, towards smaller y
    pub bottom: Option<Rank>,
    /// Neighbour rank within `col`, towards larger y
    pub top: Option<Rank>,
}

impl ProcessGrid {
    /// Build the p x p layout over `world`.
    ///
    /// # Errors
    /// The world size must be a perfect square.
    pub fn new(world: &SimpleCommunicator) -> Result<Self> {
        let size = world.size();
        let p = (size as f64).sqrt().round() as Rank;
        if p * p != size {
            return Err(Error::NonSquareWorld(size as usize));
        }
        let rank = world.rank();
        let py = rank / p;
        let px = rank % p;
        // Color by row/column coordinate; rank order inside each split
        // follows the world order, so the row rank equals px and the
        // column rank equals py (a non-reordered MPI_Cart_sub).
        let row = world
            .split_by_color(Color::with_value(py))
            .expect("every rank is a member of its own process row");
        let col = world
            .split_by_color(Color::with_value(px))
            .expect("every rank is a member of its own process column");
        Ok(Self {
            world: world.duplicate(),
            row,
            col,
            p: p as usize,
            px: px as usize,
            py: py as usize,
            left: (px > 0).then(|| px - 1),
            right: (px + 1 < p).then(|| px + 1),
            bottom: (py > 0).then(|| py - 1),
            top: (py + 1 < p).then(|| py + 1),
        })
    }

    /// Whether this rank is the reporting rank (coordinates (0, 0))
    pub fn is_root(&self) -> bool {
        self.px == 0 && self.py == 0
    }

    /// Whether the local cell `(i, j)` of an `nx` x `ny` tile lies on the
    /// global domain boundary
    pub fn on_global_boundary(&self, i: usize, j: usize, nx: usize, ny: usize) -> bool {
        (i == 0 && self.left.is_none())
            || (i + 1 == nx && self.right.is_none())
            || (j == 0 && self.bottom.is_none())
            || (j + 1 == ny && self.top.is_none())
    }

    /// The tile of the global `nx` x `ny` grid owned by this rank
    pub fn tile(&self, nx: usize, ny: usize, lx: f64, ly: f64) -> Tile {
        Tile::new(self.p, self.px, self.py, nx, ny, lx, ly)
    }
}

/// The sub-rectangle of the global grid owned by one process
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    /// Local grid points in x
    pub nx: usize,
    /// Local grid points in y
    pub ny: usize,
    /// Local physical extent in x
    pub lx: f64,
    /// Local physical extent in y
    pub ly: f64,
    /// Global index of the tile's first column
    pub x_start: usize,
    /// Global index of the tile's first row
    pub y_start: usize,
}

impl Tile {
    /// Split the global grid for the process at `(px, py)` of a p x p layout
    pub fn new(
        p: usize,
        px: usize,
        py: usize,
        nx_global: usize,
        ny_global: usize,
        lx_global: f64,
        ly_global: f64,
    ) -> Self {
        let (nx, x_start) = split_extent(nx_global, p, px);
        let (ny, y_start) = split_extent(ny_global, p, py);
        Self {
            nx,
            ny,
            lx: lx_global * nx as f64 / nx_global as f64,
            ly: ly_global * ny as f64 / ny_global as f64,
            x_start,
            y_start,
        }
    }

    /// Number of grid points in the tile
    pub fn npts(&self) -> usize {
        self.nx * self.ny
    }
}

/// Split `n` grid points over `p` coordinates; the first `n % p` coordinates
/// take one extra point. Returns the local extent and start offset.
pub fn split_extent(n: usize, p: usize, coord: usize) -> (usize, usize) {
    let base = n / p;
    let rem = n % p;
    if coord < rem {
        (base + 1, (base + 1) * coord)
    } else {
        (base, (base + 1) * rem + base * (coord - rem))
    }
}
