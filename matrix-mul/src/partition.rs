//! Row ownership across ranks.
//!
//! Rows are split into contiguous blocks of `total / world` rows. Rank 0
//! takes the remainder on top of its block, so it always owns the first
//! `total / world + total % world` rows and rank `r > 0` owns the block that
//! follows rank `r - 1`.

use std::ops::Range;

/// Number of rows owned by `rank` when `total_rows` are split over
/// `world_size` ranks.
///
/// # Panics
///
/// Panics if `world_size` is zero.
pub fn rows_owned_by(total_rows: usize, rank: usize, world_size: usize) -> usize {
    assert!(world_size > 0, "world size must be at least 1");
    let base = total_rows / world_size;
    if rank == 0 {
        base + total_rows % world_size
    } else {
        base
    }
}

/// The row assignment of one matrix over one world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPartition {
    total_rows: usize,
    world_size: usize,
}

impl RowPartition {
    pub fn new(total_rows: usize, world_size: usize) -> Self {
        assert!(world_size > 0, "world size must be at least 1");
        Self {
            total_rows,
            world_size,
        }
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn world_size(&self) -> usize {
        self.world_size
    }

    pub fn rows_owned_by(&self, rank: usize) -> usize {
        rows_owned_by(self.total_rows, rank, self.world_size)
    }

    pub fn first_row_of(&self, rank: usize) -> usize {
        if rank == 0 {
            0
        } else {
            self.rows_owned_by(0) + self.total_rows / self.world_size * (rank - 1)
        }
    }

    pub fn range_of(&self, rank: usize) -> Range<usize> {
        let first = self.first_row_of(rank);
        first..first + self.rows_owned_by(rank)
    }

    /// Every rank's range, in rank order.
    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.world_size).map(move |rank| self.range_of(rank))
    }
}
