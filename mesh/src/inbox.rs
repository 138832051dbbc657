//! Receiving end of a single link, with tag matching.

use std::collections::VecDeque;

use tokio::sync::mpsc::Receiver;

use crate::MessageKind;

/// A message on the wire between two ranks.
#[derive(Debug)]
pub struct Envelope {
    pub kind: MessageKind,
    pub payload: Vec<f64>,
}

/// Inbound side of the link from one peer.
///
/// Messages arrive in send order. A receive takes the oldest message of the
/// requested kind; anything older with a different kind is parked in the
/// stash and stays ahead of newer arrivals.
pub struct Inbox {
    rx: Receiver<Envelope>,
    stash: VecDeque<Envelope>,
}

impl Inbox {
    pub fn new(rx: Receiver<Envelope>) -> Self {
        Self {
            rx,
            stash: VecDeque::new(),
        }
    }

    /// Returns the next message of `kind`, or `None` once the peer hung up.
    pub async fn next_matching(&mut self, kind: MessageKind) -> Option<Envelope> {
        if let Some(pos) = self.stash.iter().position(|env| env.kind == kind) {
            return self.stash.remove(pos);
        }

        while let Some(env) = self.rx.recv().await {
            if env.kind == kind {
                return Some(env);
            }
            self.stash.push_back(env);
        }
        None
    }

    #[cfg(test)]
    pub fn stashed(&self) -> usize {
        self.stash.len()
    }
}
