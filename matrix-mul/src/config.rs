//! Command-line configuration for the demo binary.

use std::env;
use std::str::FromStr;

use mesh::MeshConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Error, Matrix};

const PROGRAM: &str = "matrix-mul";
const WORLD_SIZE_VAR: &str = "MESH_WORLD_SIZE";
const DEFAULT_RANKS: usize = 4;
const DEFAULT_DIM: usize = 4;
const DEFAULT_SEED: u64 = 42;

/// How the demo fills A and B on the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Uniform values in `[-1, 1)` from a seeded generator.
    Random,
    /// Every element is 1.
    Ones,
    /// A counts up from 1, B is the identity.
    Identity,
    /// Both matrices count up from 1 row by row.
    Sequence,
}

impl FromStr for InputMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(Self::Random),
            "ones" => Ok(Self::Ones),
            "identity" => Ok(Self::Identity),
            "sequence" => Ok(Self::Sequence),
            other => Err(Error::Usage(format!("unknown mode {:?}", other))),
        }
    }
}

/// Settings for one run of the demo.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mesh: MeshConfig,
    pub m: usize,
    pub n: usize,
    pub p: usize,
    pub mode: InputMode,
    pub seed: u64,
}

impl RunConfig {
    /// Parses `[ranks] [m] [n] [p] [mode] [seed]` (program name excluded).
    ///
    /// Mesh settings not given on the command line come from the
    /// `MESH_*` environment variables; without either, four ranks are used.
    pub fn from_args(args: &[String]) -> Result<Self, Error> {
        let mesh = MeshConfig::default().with_env()?;
        Self::parse(args, mesh, env::var_os(WORLD_SIZE_VAR).is_some())
    }

    /// Layers `args` over `mesh`, which holds the environment settings and
    /// has not been validated yet.
    fn parse(args: &[String], mut mesh: MeshConfig, ranks_from_env: bool) -> Result<Self, Error> {
        match args.first() {
            Some(ranks) => mesh.world_size = ranks.parse()?,
            None if !ranks_from_env => mesh.world_size = DEFAULT_RANKS,
            None => {}
        }
        mesh.validate()?;

        let m = parse_or(args.get(1), DEFAULT_DIM)?;
        let n = parse_or(args.get(2), DEFAULT_DIM)?;
        let p = parse_or(args.get(3), DEFAULT_DIM)?;
        let mode = match args.get(4) {
            Some(mode) => mode.parse()?,
            None => InputMode::Random,
        };
        let seed = match args.get(5) {
            Some(seed) => seed.parse()?,
            None => DEFAULT_SEED,
        };

        if mode == InputMode::Identity && n != p {
            return Err(Error::Usage(format!(
                "identity mode needs a square B, got {}x{}",
                n, p
            )));
        }

        Ok(Self {
            mesh,
            m,
            n,
            p,
            mode,
            seed,
        })
    }

    /// Builds the `m×n` and `n×p` inputs.
    pub fn inputs(&self) -> (Matrix, Matrix) {
        match self.mode {
            InputMode::Random => {
                let mut rng = StdRng::seed_from_u64(self.seed);
                (
                    random_matrix(&mut rng, self.m, self.n),
                    random_matrix(&mut rng, self.n, self.p),
                )
            }
            InputMode::Ones => (
                Matrix::filled(self.m, self.n, 1.0),
                Matrix::filled(self.n, self.p, 1.0),
            ),
            InputMode::Identity => (sequence_matrix(self.m, self.n), Matrix::identity(self.n)),
            InputMode::Sequence => (
                sequence_matrix(self.m, self.n),
                sequence_matrix(self.n, self.p),
            ),
        }
    }
}

/// Splits argv into the program name and the remaining arguments. An empty
/// argv yields the binary's default name.
pub fn split_program(args: impl IntoIterator<Item = String>) -> (String, Vec<String>) {
    let mut args = args.into_iter();
    let program = args.next().unwrap_or_else(|| PROGRAM.to_string());
    (program, args.collect())
}

fn parse_or(arg: Option<&String>, default: usize) -> Result<usize, Error> {
    match arg {
        Some(value) => Ok(value.parse()?),
        None => Ok(default),
    }
}

fn random_matrix(rng: &mut StdRng, rows: usize, cols: usize) -> Matrix {
    let mut m = Matrix::new(rows, cols);
    for value in m.raw_buffer_mut() {
        *value = rng.gen_range(-1.0..1.0);
    }
    m
}

fn sequence_matrix(rows: usize, cols: usize) -> Matrix {
    let mut m = Matrix::new(rows, cols);
    let mut next = 1.0;
    for value in m.raw_buffer_mut() {
        *value = next;
        next += 1.0;
    }
    m
}
