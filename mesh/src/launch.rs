//! Running one program on every rank of a local mesh.

use std::future::Future;

use crate::config::MeshConfig;
use crate::error::Error;
use crate::local::{LocalComm, LocalMesh};

/// Runs `f` once per rank, each on its own tokio task, and returns the
/// outputs in rank order.
///
/// A rank whose task panics is reported as [`Error::RankPanicked`]. Its
/// communicator is dropped while unwinding, so peers waiting on it fail with
/// [`Error::ChannelClosed`] instead of hanging.
pub async fn launch<F, Fut, T>(config: &MeshConfig, f: F) -> Result<Vec<T>, Error>
where
    F: Fn(LocalComm) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let comms = LocalMesh::build(config)?;
    let handles: Vec<_> = comms.into_iter().map(|comm| tokio::spawn(f(comm))).collect();

    let mut outputs = Vec::with_capacity(handles.len());
    for (rank, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(output) => outputs.push(output),
            Err(e) if e.is_panic() => {
                tracing::error!(rank, "rank panicked");
                return Err(Error::RankPanicked { rank });
            }
            Err(e) => return Err(Error::from(e)),
        }
    }
    Ok(outputs)
}
