//! Distributed matrix multiplication implementation.

use std::ops::Range;

use mesh::{Communicator, Tag};
use tracing::debug;

use crate::Error;
use crate::matrix::Matrix;
use crate::partition::RowPartition;

/// Rank that owns the inputs and collects the result.
pub const ROOT: usize = 0;
/// Tag of the messages carrying rows of A from the root.
pub const SCATTER_TAG: Tag = 0;
/// Tag of the messages carrying rows of C back to the root.
pub const GATHER_TAG: Tag = 1;

/// Computes `c = a × b` across every rank reachable through `comm`.
///
/// Every rank calls this with its own communicator and matrices of the same
/// shapes. On entry `a` and `b` hold the inputs on the root only (zeros
/// elsewhere) and `c` is zero everywhere. On success `c` holds the full
/// product on the root; its contents on other ranks are unspecified.
///
/// The protocol:
///
/// 1. `b` is broadcast from the root.
/// 2. The root sends each rank its rows of `a` without blocking; other ranks
///    block until their rows arrive.
/// 3. Every rank computes its own rows of `c`. The root does this while its
///    sends are in flight and waits on them afterwards.
/// 4. Other ranks send their rows of `c` back; the root receives them
///    straight into `c` and waits on all of them before returning.
///
/// Shapes are checked before any message is sent. A communication failure
/// aborts the call and is returned as is; nothing is retried.
pub async fn multiply<C>(
    a: &mut Matrix,
    b: &mut Matrix,
    c: &mut Matrix,
    comm: &C,
) -> Result<(), Error>
where
    C: Communicator + ?Sized,
{
    check_shapes(a, b, c)?;

    let rank = comm.rank();
    let partition = RowPartition::new(a.rows(), comm.world_size());
    debug!(
        rank,
        world_size = partition.world_size(),
        rows = ?partition.range_of(rank),
        "starting multiply"
    );

    comm.broadcast(b.raw_buffer_mut(), ROOT).await?;

    if rank == ROOT {
        multiply_as_root(a, b, c, comm, &partition).await
    } else {
        multiply_as_worker(a, b, c, comm, &partition).await
    }
}

async fn multiply_as_root<C>(
    a: &Matrix,
    b: &Matrix,
    c: &mut Matrix,
    comm: &C,
    partition: &RowPartition,
) -> Result<(), Error>
where
    C: Communicator + ?Sized,
{
    let world_size = partition.world_size();

    let mut sends = Vec::with_capacity(world_size - 1);
    for dest in 1..world_size {
        let rows = partition.range_of(dest);
        if rows.is_empty() {
            continue;
        }
        let range = a.element_range(rows);
        sends.push(comm.isend(&a.raw_buffer()[range], dest, SCATTER_TAG)?);
    }
    debug!(rank = ROOT, sends = sends.len(), "scatter issued");

    compute_rows(a, b, c, partition.range_of(ROOT));
    comm.wait_all(sends).await?;

    let cols = c.cols();
    let own = c.element_range(partition.range_of(ROOT));
    let mut rest = &mut c.raw_buffer_mut()[own.end..];
    let mut receives = Vec::with_capacity(world_size - 1);
    for src in 1..world_size {
        let len = partition.rows_owned_by(src) * cols;
        let (region, tail) = std::mem::take(&mut rest).split_at_mut(len);
        rest = tail;
        if region.is_empty() {
            continue;
        }
        receives.push(comm.irecv(region, src, GATHER_TAG)?);
    }

    debug!(rank = ROOT, receives = receives.len(), "gathering results");
    comm.wait_all(receives).await?;
    Ok(())
}

async fn multiply_as_worker<C>(
    a: &mut Matrix,
    b: &Matrix,
    c: &mut Matrix,
    comm: &C,
    partition: &RowPartition,
) -> Result<(), Error>
where
    C: Communicator + ?Sized,
{
    let rank = comm.rank();
    let rows = partition.range_of(rank);
    if rows.is_empty() {
        debug!(rank, "no rows assigned");
        return Ok(());
    }

    let range = a.element_range(rows.clone());
    comm.receive(&mut a.raw_buffer_mut()[range], ROOT, SCATTER_TAG).await?;

    compute_rows(a, b, c, rows.clone());

    let range = c.element_range(rows);
    comm.send(&c.raw_buffer()[range], ROOT, GATHER_TAG).await?;
    debug!(rank, "rows sent to root");
    Ok(())
}

/// Single-process reference: returns `a × b` with the same summation order
/// as [`multiply`].
pub fn multiply_sequential(a: &Matrix, b: &Matrix) -> Result<Matrix, Error> {
    if a.cols() != b.rows() {
        return Err(Error::DimensionMismatch(a.rows(), a.cols(), b.rows(), b.cols()));
    }
    let mut c = Matrix::new(a.rows(), b.cols());
    compute_rows(a, b, &mut c, 0..a.rows());
    Ok(c)
}

fn check_shapes(a: &Matrix, b: &Matrix, c: &Matrix) -> Result<(), Error> {
    if a.cols() != b.rows() {
        return Err(Error::DimensionMismatch(a.rows(), a.cols(), b.rows(), b.cols()));
    }
    let expected = (a.rows(), b.cols());
    if c.shape() != expected {
        return Err(Error::OutputShape {
            expected,
            actual: c.shape(),
        });
    }
    Ok(())
}

/// `c[i][j] = Σ_k a[i][k] * b[k][j]` for the given rows, accumulated left to
/// right.
fn compute_rows(a: &Matrix, b: &Matrix, c: &mut Matrix, rows: Range<usize>) {
    for i in rows {
        for j in 0..c.cols() {
            c.set(i, j, 0.0);
            for k in 0..b.rows() {
                c.increment(i, j, a.get(i, k) * b.get(k, j));
            }
        }
    }
}
