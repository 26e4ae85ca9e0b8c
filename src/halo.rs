//! Halo exchange between neighbouring tiles
//!
//! Each tile keeps four send and four receive strips: contiguous top and
//! bottom rows, and left and right columns gathered out of their stride
//! before sending. The exchange overlaps communication with computation:
//! all four non-blocking sends are posted first, the caller computes the
//! strictly interior cells while they are in flight, then the receives are
//! drained and the caller computes the tile-edge cells. Sends complete
//! before the exchange returns.
//!
//! Tag discipline: each direction of travel carries its own tag, matched
//! from the opposite side of the link. Top/bottom strips travel on the
//! column communicator, left/right strips on the row communicator.
use crate::topology::ProcessGrid;
use mpi::request::WaitGuard;
use mpi::traits::*;
use ndarray::{s, Array2};

/// Strip travelling upwards (a tile's top row, the receiver's bottom halo)
const TAG_UP: i32 = 0;
/// Strip travelling downwards
const TAG_DOWN: i32 = 1;
/// Strip travelling leftwards
const TAG_LEFT: i32 = 2;
/// Strip travelling rightwards
const TAG_RIGHT: i32 = 3;

/// One strip of values per tile side
pub struct EdgeBuffers {
    /// Row above the tile (length nx)
    pub top: Vec<f64>,
    /// Row below the tile (length nx)
    pub bottom: Vec<f64>,
    /// Column left of the tile (length ny)
    pub left: Vec<f64>,
    /// Column right of the tile (length ny)
    pub right: Vec<f64>,
}

impl EdgeBuffers {
    fn new(nx: usize, ny: usize) -> Self {
        Self {
            top: vec![0.0; nx],
            bottom: vec![0.0; nx],
            left: vec![0.0; ny],
            right: vec![0.0; ny],
        }
    }

    /// The four neighbour values of cell `(i, j)`, falling back to the halo
    /// strips where the neighbour lies outside the tile.
    ///
    /// Returns `[left, right, bottom, top]`.
    pub fn neighbourhood(&self, field: &Array2<f64>, i: usize, j: usize) -> [f64; 4] {
        let (ny, nx) = field.dim();
        [
            if i > 0 { field[[j, i - 1]] } else { self.left[j] },
            if i + 1 < nx { field[[j, i + 1]] } else { self.right[j] },
            if j > 0 { field[[j - 1, i]] } else { self.bottom[i] },
            if j + 1 < ny { field[[j + 1, i]] } else { self.top[i] },
        ]
    }
}

/// Send and receive strips for one field
pub struct Halo {
    send: EdgeBuffers,
    /// Neighbour values received in the most recent exchange
    pub recv: EdgeBuffers,
}

impl Halo {
    /// Allocate strips for an `nx` x `ny` tile
    pub fn new(nx: usize, ny: usize) -> Self {
        Self {
            send: EdgeBuffers::new(nx, ny),
            recv: EdgeBuffers::new(nx, ny),
        }
    }

    /// Copy the tile's four edge strips into the send buffers.
    ///
    /// The left and right columns are strided in memory and are gathered
    /// into their contiguous buffers here.
    pub fn pack(&mut self, field: &Array2<f64>) {
        let (ny, nx) = field.dim();
        for (dst, src) in self.send.top.iter_mut().zip(field.slice(s![ny - 1, ..])) {
            *dst = *src;
        }
        for (dst, src) in self.send.bottom.iter_mut().zip(field.slice(s![0, ..])) {
            *dst = *src;
        }
        for (dst, src) in self.send.left.iter_mut().zip(field.slice(s![.., 0])) {
            *dst = *src;
        }
        for (dst, src) in self.send.right.iter_mut().zip(field.slice(s![.., nx - 1])) {
            *dst = *src;
        }
    }

    /// Run one overlapped exchange of the packed strips.
    ///
    /// `interior` runs while the sends are in flight and must not touch any
    /// halo value; `edges` runs once every neighbour strip has arrived.
    /// `ctx` threads the caller's mutable state through both callbacks.
    /// Absent neighbours (global boundary) are skipped on both sides.
    pub fn exchange<C>(
        &mut self,
        grid: &ProcessGrid,
        ctx: &mut C,
        interior: impl FnOnce(&mut C),
        edges: impl FnOnce(&mut C, &EdgeBuffers),
    ) {
        let Halo { send, recv } = self;
        mpi::request::scope(|scope| {
            let mut pending = Vec::with_capacity(4);
            if let Some(rank) = grid.top {
                pending.push(WaitGuard::from(
                    grid.col
                        .process_at_rank(rank)
                        .immediate_send_with_tag(scope, &send.top[..], TAG_UP),
                ));
            }
            if let Some(rank) = grid.bottom {
                pending.push(WaitGuard::from(
                    grid.col
                        .process_at_rank(rank)
                        .immediate_send_with_tag(scope, &send.bottom[..], TAG_DOWN),
                ));
            }
            if let Some(rank) = grid.left {
                pending.push(WaitGuard::from(
                    grid.row
                        .process_at_rank(rank)
                        .immediate_send_with_tag(scope, &send.left[..], TAG_LEFT),
                ));
            }
            if let Some(rank) = grid.right {
                pending.push(WaitGuard::from(
                    grid.row
                        .process_at_rank(rank)
                        .immediate_send_with_tag(scope, &send.right[..], TAG_RIGHT),
                ));
            }

            interior(&mut *ctx);

            if let Some(rank) = grid.bottom {
                grid.col
                    .process_at_rank(rank)
                    .receive_into_with_tag(&mut recv.bottom[..], TAG_UP);
            }
            if let Some(rank) = grid.top {
                grid.col
                    .process_at_rank(rank)
                    .receive_into_with_tag(&mut recv.top[..], TAG_DOWN);
            }
            if let Some(rank) = grid.right {
                grid.row
                    .process_at_rank(rank)
                    .receive_into_with_tag(&mut recv.right[..], TAG_LEFT);
            }
            if let Some(rank) = grid.left {
                grid.row
                    .process_at_rank(rank)
                    .receive_into_with_tag(&mut recv.left[..], TAG_RIGHT);
            }

            edges(ctx, recv);
            // the send guards drop here, after all edge work
        });
    }

    /// Pack and exchange `field` with no overlapped computation
    pub fn update(&mut self, grid: &ProcessGrid, field: &Array2<f64>) {
        self.pack(field);
        self.exchange(grid, &mut (), |_| (), |_, _| ());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn field_3x4() -> Array2<f64> {
        // shape (ny, nx) = (4, 3): value encodes the grid position
        Array2::from_shape_fn((4, 3), |(j, i)| (10 * j + i) as f64)
    }

    #[test]
    fn pack_gathers_strips() {
        let field = field_3x4();
        let mut halo = Halo::new(3, 4);
        halo.pack(&field);
        assert_eq!(halo.send.top, vec![30.0, 31.0, 32.0]);
        assert_eq!(halo.send.bottom, vec![0.0, 1.0, 2.0]);
        assert_eq!(halo.send.left, vec![0.0, 10.0, 20.0, 30.0]);
        assert_eq!(halo.send.right, vec![2.0, 12.0, 22.0, 32.0]);
    }

    #[test]
    fn neighbourhood_reads_halo_at_edges() {
        let field = field_3x4();
        let mut halo = Halo::new(3, 4);
        halo.recv.left = vec![-1.0, -2.0, -3.0, -4.0];
        halo.recv.right = vec![-5.0, -6.0, -7.0, -8.0];
        halo.recv.bottom = vec![-9.0, -10.0, -11.0];
        halo.recv.top = vec![-12.0, -13.0, -14.0];

        // interior cell: all values local
        assert_eq!(halo.recv.neighbourhood(&field, 1, 1), [10.0, 12.0, 1.0, 21.0]);
        // bottom-left corner: left and bottom come from the halo
        assert_eq!(halo.recv.neighbourhood(&field, 0, 0), [-1.0, 1.0, -9.0, 10.0]);
        // top-right corner: right and top come from the halo
        assert_eq!(
            halo.recv.neighbourhood(&field, 2, 3),
            [31.0, -8.0, 22.0, -14.0]
        );
    }
}
