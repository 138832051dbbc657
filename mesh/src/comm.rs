//! The message-passing interface every rank programs against.

use std::fmt;

use async_trait::async_trait;
use futures_util::future::{BoxFuture, try_join_all};

use crate::Error;

/// User tag attached to point-to-point messages.
pub type Tag = u32;

/// What a message on a link carries.
///
/// Point-to-point traffic is tagged by the caller. Broadcast payloads and
/// their acknowledgements travel on their own kinds so collectives never
/// match a user receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Data(Tag),
    Broadcast,
    Ack,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Data(tag) => write!(f, "tag {}", tag),
            MessageKind::Broadcast => write!(f, "broadcast"),
            MessageKind::Ack => write!(f, "ack"),
        }
    }
}

/// Which side of a transfer a [`Request`] tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Send { dest: usize, tag: Tag },
    Receive { src: usize, tag: Tag },
}

/// Handle to an in-flight non-blocking send or receive.
///
/// The handle borrows the buffer region it was issued against for `'a`, so
/// the region cannot be touched again until the handle has been consumed by
/// [`Communicator::wait_all`].
#[must_use = "an in-flight request must be passed to wait_all"]
pub struct Request<'a> {
    operation: Operation,
    pending: BoxFuture<'a, Result<(), Error>>,
}

impl<'a> Request<'a> {
    pub fn send(dest: usize, tag: Tag, pending: BoxFuture<'a, Result<(), Error>>) -> Self {
        Self {
            operation: Operation::Send { dest, tag },
            pending,
        }
    }

    pub fn receive(src: usize, tag: Tag, pending: BoxFuture<'a, Result<(), Error>>) -> Self {
        Self {
            operation: Operation::Receive { src, tag },
            pending,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Drives the transfer to completion.
    pub async fn wait(self) -> Result<(), Error> {
        tracing::trace!(operation = ?self.operation, "waiting on request");
        self.pending.await
    }
}

impl fmt::Debug for Request<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}

/// A fixed-size group of ranks reachable by message passing.
///
/// Every rank of the group holds its own `Communicator` and calls the
/// collective operations in the same order. Buffers are plain `f64` slices;
/// a transfer of a sub-range is expressed by slicing the raw buffer.
///
/// # Example
///
/// ```no_run
/// use mesh::{Communicator, MeshConfig, launch};
///
/// #[tokio::main]
/// async fn main() -> Result<(), mesh::Error> {
///     let config = MeshConfig::default().with_world_size(2);
///     let sums = launch(&config, |comm| async move {
///         let mut value = [comm.rank() as f64 + 1.0];
///         if comm.rank() == 0 {
///             let mut other = [0.0];
///             comm.receive(&mut other, 1, 7).await?;
///             value[0] += other[0];
///         } else {
///             comm.send(&value, 0, 7).await?;
///         }
///         Ok::<_, mesh::Error>(value[0])
///     })
///     .await?;
///     assert_eq!(sums[0].as_ref().ok(), Some(&3.0));
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait Communicator: Send + Sync {
    /// Returns this rank's identity in `[0, world_size)`.
    fn rank(&self) -> usize;

    /// Returns the number of ranks in the group.
    fn world_size(&self) -> usize;

    /// Blocking collective: on return every rank holds `root`'s buffer.
    ///
    /// Does not return on any rank until all ranks have received the data.
    async fn broadcast(&self, buf: &mut [f64], root: usize) -> Result<(), Error>;

    /// Blocking send; returns once the message has been handed to the link.
    async fn send(&self, buf: &[f64], dest: usize, tag: Tag) -> Result<(), Error>;

    /// Blocking receive; returns once exactly `buf.len()` values were written.
    async fn receive(&self, buf: &mut [f64], src: usize, tag: Tag) -> Result<(), Error>;

    /// Non-blocking send. The transfer makes progress in the background.
    fn isend<'a>(&'a self, buf: &'a [f64], dest: usize, tag: Tag) -> Result<Request<'a>, Error>;

    /// Non-blocking receive into `buf`, completed by [`Communicator::wait_all`].
    fn irecv<'a>(&'a self, buf: &'a mut [f64], src: usize, tag: Tag)
    -> Result<Request<'a>, Error>;

    /// Blocks until every request has completed.
    ///
    /// Requests are driven concurrently; the first failure is returned.
    async fn wait_all<'a>(&self, requests: Vec<Request<'a>>) -> Result<(), Error> {
        if requests.is_empty() {
            return Ok(());
        }
        tracing::trace!(rank = self.rank(), count = requests.len(), "wait_all");
        try_join_all(requests.into_iter().map(Request::wait)).await?;
        Ok(())
    }
}
