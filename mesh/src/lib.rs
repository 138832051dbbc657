//! Message passing between the ranks of a fixed-size group.
//!
//! `mesh` provides the [`Communicator`] interface used by SPMD programs:
//! every rank runs the same code and is told apart only by its rank and the
//! world size. Ranks exchange `f64` buffers through blocking and
//! non-blocking point-to-point operations and a broadcast collective.
//!
//! # Features
//!
//! - Blocking `send`/`receive` matched on `(source, tag)` in send order
//! - Non-blocking `isend`/`irecv` returning [`Request`] handles that borrow
//!   their buffer until [`Communicator::wait_all`] consumes them
//! - A broadcast that does not return on any rank until all ranks have the data
//! - An in-process mesh ([`LocalMesh`]) with one bounded channel per link
//!
//! # Example
//!
//! ```no_run
//! use mesh::{Communicator, MeshConfig, launch};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MeshConfig::default().with_world_size(4);
//!     let results = launch(&config, |comm| async move {
//!         let mut data = if comm.rank() == 0 { vec![1.0, 2.0] } else { vec![0.0; 2] };
//!         comm.broadcast(&mut data, 0).await?;
//!         Ok::<_, mesh::Error>(data)
//!     })
//!     .await?;
//!
//!     for data in results {
//!         assert_eq!(data?, vec![1.0, 2.0]);
//!     }
//!     Ok(())
//! }
//! ```

mod comm;
mod config;
mod error;
mod inbox;
mod launch;
mod local;

pub use comm::{Communicator, MessageKind, Operation, Request, Tag};
pub use config::MeshConfig;
pub use error::Error;
pub use launch::launch;
pub use local::{LocalComm, LocalMesh};
