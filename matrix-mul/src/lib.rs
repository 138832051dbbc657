//! Distributed matrix multiplication over a message-passing mesh.
//!
//! `matrix-mul` computes C = A × B with every rank of a fixed-size group
//! running the same code. Rows of A are split across ranks, B is replicated
//! by broadcast, each rank computes its rows of C, and rank 0 collects the
//! full result.
//!
//! # Row Layout
//!
//! - **Rank 0** owns the first `m / world + m % world` rows
//! - **Rank r > 0** owns the next `m / world` rows after rank `r - 1`
//! - Ranks owning no rows (`m < world`) skip the scatter and gather
//!
//! # Example
//!
//! ```no_run
//! use matrix_mul::{Matrix, multiply};
//! use mesh::{Communicator, MeshConfig, launch};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MeshConfig::default().with_world_size(2);
//!     let results = launch(&config, |comm| async move {
//!         let (mut a, mut b) = if comm.rank() == 0 {
//!             (
//!                 Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]])?,
//!                 Matrix::from_rows(vec![vec![5.0, 6.0], vec![7.0, 8.0]])?,
//!             )
//!         } else {
//!             (Matrix::new(2, 2), Matrix::new(2, 2))
//!         };
//!         let mut c = Matrix::new(2, 2);
//!         multiply(&mut a, &mut b, &mut c, &comm).await?;
//!         Ok::<_, matrix_mul::Error>(c)
//!     })
//!     .await?;
//!
//!     let c = results.into_iter().next().unwrap()?;
//!     assert_eq!(c.to_rows(), vec![vec![19.0, 22.0], vec![43.0, 50.0]]);
//!     Ok(())
//! }
//! ```

pub mod config;
mod error;
mod matrix;
mod matrix_mul;
pub mod partition;

pub use error::Error;
pub use matrix::Matrix;
pub use matrix_mul::{GATHER_TAG, ROOT, SCATTER_TAG, multiply, multiply_sequential};
pub use partition::{RowPartition, rows_owned_by};
