//! Channel-backed mesh connecting ranks that live in one process.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use futures_util::FutureExt;
use tokio::sync::mpsc::{self, Sender};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use crate::comm::{Communicator, MessageKind, Request, Tag};
use crate::config::MeshConfig;
use crate::error::Error;
use crate::inbox::{Envelope, Inbox};

/// Builder for a fully connected set of [`LocalComm`]s.
pub struct LocalMesh;

impl LocalMesh {
    /// Creates one communicator per rank, in rank order.
    ///
    /// Every ordered pair of ranks gets its own bounded link, so messages
    /// between two ranks are delivered in send order.
    pub fn build(config: &MeshConfig) -> Result<Vec<LocalComm>, Error> {
        config.validate()?;
        let n = config.world_size;

        let mut outbound: Vec<Vec<Arc<Link>>> = (0..n).map(|_| Vec::with_capacity(n)).collect();
        let mut inbound: Vec<Vec<Mutex<Inbox>>> = (0..n).map(|_| Vec::with_capacity(n)).collect();

        for src in 0..n {
            for dst in 0..n {
                let (tx, rx) = mpsc::channel(config.channel_capacity);
                outbound[src].push(Arc::new(Link::new(tx)));
                inbound[dst].push(Mutex::new(Inbox::new(rx)));
            }
        }

        let comms = outbound
            .into_iter()
            .zip(inbound)
            .enumerate()
            .map(|(rank, (outbound, inbound))| LocalComm {
                rank,
                world_size: n,
                outbound,
                inbound,
                sent: Arc::new(AtomicU64::new(0)),
            })
            .collect();

        tracing::debug!(world_size = n, capacity = config.channel_capacity, "mesh built");
        Ok(comms)
    }
}

/// Sending half of the link to one peer.
///
/// A message takes a ticket when it is issued and enters the channel only
/// after every earlier ticket has, so the link stays FIFO although each
/// delivery runs on its own task.
struct Link {
    tx: Sender<Envelope>,
    next_ticket: AtomicU64,
    serving: watch::Sender<u64>,
}

impl Link {
    fn new(tx: Sender<Envelope>) -> Self {
        let (serving, _) = watch::channel(0);
        Self {
            tx,
            next_ticket: AtomicU64::new(0),
            serving,
        }
    }

    /// Claims the next position on the link and spawns the delivery for it.
    fn enqueue(
        self: &Arc<Self>,
        sent: &Arc<AtomicU64>,
        dest: usize,
        envelope: Envelope,
    ) -> JoinHandle<Result<(), Error>> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        let link = Arc::clone(self);
        let sent = Arc::clone(sent);

        tokio::spawn(async move {
            let mut turn = link.serving.subscribe();
            // The link owns `serving`, so this only returns once it is our turn.
            let _ = turn.wait_for(|&serving| serving == ticket).await;

            let result = link
                .tx
                .send(envelope)
                .await
                .map_err(|_| Error::ChannelClosed { peer: dest });
            if result.is_ok() {
                sent.fetch_add(1, Ordering::SeqCst);
            }
            link.serving.send_modify(|serving| *serving += 1);
            result
        })
    }
}

async fn join(handle: JoinHandle<Result<(), Error>>) -> Result<(), Error> {
    handle.await.unwrap_or_else(|e| Err(Error::from(e)))
}

/// One rank's endpoint of a [`LocalMesh`].
///
/// Dropping a `LocalComm` closes all of its links; peers blocked on it then
/// fail with [`Error::ChannelClosed`].
pub struct LocalComm {
    rank: usize,
    world_size: usize,
    outbound: Vec<Arc<Link>>,
    inbound: Vec<Mutex<Inbox>>,
    sent: Arc<AtomicU64>,
}

impl LocalComm {
    /// Number of messages this rank has handed to its links, including
    /// broadcast acknowledgements.
    pub fn messages_sent(&self) -> u64 {
        self.sent.load(Ordering::SeqCst)
    }

    fn check_peer(&self, peer: usize) -> Result<(), Error> {
        if peer >= self.world_size {
            return Err(Error::InvalidRank {
                rank: peer,
                world_size: self.world_size,
            });
        }
        Ok(())
    }

    fn others(&self, root: usize) -> impl Iterator<Item = usize> {
        (0..self.world_size).filter(move |&r| r != root)
    }

    async fn post(&self, dest: usize, kind: MessageKind, payload: Vec<f64>) -> Result<(), Error> {
        tracing::trace!(rank = self.rank, dest, %kind, len = payload.len(), "post");
        join(self.outbound[dest].enqueue(&self.sent, dest, Envelope { kind, payload })).await
    }

    async fn take(&self, src: usize, kind: MessageKind, buf: &mut [f64]) -> Result<(), Error> {
        take_from(&self.inbound[src], src, kind, buf).await?;
        tracing::trace!(rank = self.rank, src, %kind, len = buf.len(), "take");
        Ok(())
    }
}

async fn take_from(
    inbox: &Mutex<Inbox>,
    src: usize,
    kind: MessageKind,
    buf: &mut [f64],
) -> Result<(), Error> {
    let envelope = inbox
        .lock()
        .await
        .next_matching(kind)
        .await
        .ok_or(Error::ChannelClosed { peer: src })?;

    if envelope.payload.len() != buf.len() {
        return Err(Error::LengthMismatch {
            peer: src,
            kind,
            expected: buf.len(),
            actual: envelope.payload.len(),
        });
    }
    buf.copy_from_slice(&envelope.payload);
    Ok(())
}

#[async_trait]
impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn world_size(&self) -> usize {
        self.world_size
    }

    async fn broadcast(&self, buf: &mut [f64], root: usize) -> Result<(), Error> {
        self.check_peer(root)?;
        if self.world_size == 1 {
            return Ok(());
        }

        // Phase one delivers the payload and collects an ack from every rank.
        // Phase two releases the ranks, so nobody returns before all have it.
        if self.rank == root {
            for dest in self.others(root) {
                self.post(dest, MessageKind::Broadcast, buf.to_vec()).await?;
            }
            for src in self.others(root) {
                self.take(src, MessageKind::Ack, &mut []).await?;
            }
            for dest in self.others(root) {
                self.post(dest, MessageKind::Ack, Vec::new()).await?;
            }
        } else {
            self.take(root, MessageKind::Broadcast, buf).await?;
            self.post(root, MessageKind::Ack, Vec::new()).await?;
            self.take(root, MessageKind::Ack, &mut []).await?;
        }

        tracing::debug!(rank = self.rank, root, len = buf.len(), "broadcast complete");
        Ok(())
    }

    async fn send(&self, buf: &[f64], dest: usize, tag: Tag) -> Result<(), Error> {
        self.check_peer(dest)?;
        self.post(dest, MessageKind::Data(tag), buf.to_vec()).await
    }

    async fn receive(&self, buf: &mut [f64], src: usize, tag: Tag) -> Result<(), Error> {
        self.check_peer(src)?;
        self.take(src, MessageKind::Data(tag), buf).await
    }

    fn isend<'a>(&'a self, buf: &'a [f64], dest: usize, tag: Tag) -> Result<Request<'a>, Error> {
        self.check_peer(dest)?;

        let envelope = Envelope {
            kind: MessageKind::Data(tag),
            payload: buf.to_vec(),
        };
        tracing::trace!(rank = self.rank, dest, tag, len = buf.len(), "isend");

        let handle = self.outbound[dest].enqueue(&self.sent, dest, envelope);
        Ok(Request::send(dest, tag, join(handle).boxed()))
    }

    fn irecv<'a>(
        &'a self,
        buf: &'a mut [f64],
        src: usize,
        tag: Tag,
    ) -> Result<Request<'a>, Error> {
        self.check_peer(src)?;

        let inbox = &self.inbound[src];
        tracing::trace!(rank = self.rank, src, tag, len = buf.len(), "irecv");
        Ok(Request::receive(
            src,
            tag,
            async move { take_from(inbox, src, MessageKind::Data(tag), buf).await }.boxed(),
        ))
    }
}
