//! Error types for matrix-mul operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("mesh error: {0}")]
    Mesh(#[from] mesh::Error),

    #[error("matrix dimension mismatch: A is {0}x{1}, B is {2}x{3}")]
    DimensionMismatch(usize, usize, usize, usize),

    #[error(
        "output matrix is {}x{}, expected {}x{}",
        .actual.0, .actual.1, .expected.0, .expected.1
    )]
    OutputShape {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("{len} values cannot fill a {rows}x{cols} matrix")]
    InvalidData { rows: usize, cols: usize, len: usize },

    #[error("row {row} has {actual} columns, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("parse error: {0}")]
    Parse(#[from] std::num::ParseIntError),

    #[error("usage: {0}")]
    Usage(String),
}
