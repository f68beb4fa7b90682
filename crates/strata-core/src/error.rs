//! Error type shared by every stage of the classification pipeline.
//!
//! All variants are fatal: a run either classifies every element or
//! produces no output at all.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrataError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unsupported depth distribution '{0}' (expected fixed, normal, uniform or mean_depth)")]
    UnsupportedDistribution(String),

    #[error("{}: horizon file defines {found} boundaries, expected {expected}", .file.display())]
    BoundaryCountMismatch {
        file: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("{}: horizon file contains no sample points", .file.display())]
    EmptyHorizonSet { file: PathBuf },

    #[error("element {element} references node {node}, which is not defined in the mesh")]
    MissingNode { element: u64, node: u64 },

    #[error("{}:{line}: expected {expected} columns, found {found}", .file.display())]
    ColumnCount {
        file: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("{}:{line}: cannot parse '{token}' as a number", .file.display())]
    ParseNumber {
        file: PathBuf,
        line: usize,
        token: String,
    },

    #[error("{}: sample {row}: spread {spread} around {mean} gives no finite depth range", .file.display())]
    InvalidSpread {
        file: PathBuf,
        row: usize,
        mean: f64,
        spread: f64,
    },

    #[error("{}:{line}: {message}", .file.display())]
    MeshFormat {
        file: PathBuf,
        line: usize,
        message: String,
    },

    #[error("cannot parse configuration {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, StrataError>;

impl StrataError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StrataError::Io { path: path.into(), source }
    }
}
