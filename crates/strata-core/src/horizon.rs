//! Horizon depth files and the sampled horizon sets built from them.
//!
//! A horizon file is a table with one row per sample point:
//!   x, y, v₁, v₂, …
//! The value columns hold either one depth per boundary or, for
//! probabilistic runs, a (mean, spread) pair per boundary. Boundary 0 is the
//! shallowest (top of the second stratum).

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, StrataError};

/// Depth value marking a boundary as absent at a sample point (pinch-out).
pub const ABSENT_BOUNDARY: f64 = 9999.0;

#[inline]
pub fn is_absent(depth: f64) -> bool {
    depth == ABSENT_BOUNDARY
}

/// One raw row of a horizon file.
#[derive(Debug, Clone, PartialEq)]
pub struct HorizonRecord {
    pub x: f64,
    pub y: f64,
    /// Every column after x and y, in file order.
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct HorizonFile {
    pub source: PathBuf,
    pub records: Vec<HorizonRecord>,
}

impl HorizonFile {
    /// Number of columns after x and y (0 for an empty file).
    pub fn value_columns(&self) -> usize {
        self.records.first().map_or(0, |r| r.values.len())
    }
}

pub fn read_horizon_file(path: &Path) -> Result<HorizonFile> {
    let text = fs::read_to_string(path).map_err(|e| StrataError::io(path, e))?;
    parse_horizon_file(&text, path)
}

/// Parse a horizon table. Values may be separated by commas, whitespace or
/// both; blank lines and `#` comments are ignored. Every row must have the
/// column count of the first row.
pub fn parse_horizon_file(text: &str, source: &Path) -> Result<HorizonFile> {
    let mut records = Vec::new();
    let mut expected: Option<usize> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut row = Vec::new();
        for token in line.split(|c: char| c == ',' || c.is_whitespace()).filter(|t| !t.is_empty()) {
            let v = token.parse::<f64>().map_err(|_| StrataError::ParseNumber {
                file: source.to_path_buf(),
                line: line_no,
                token: token.to_string(),
            })?;
            row.push(v);
        }

        let expected = *expected.get_or_insert(row.len());
        if row.len() != expected || row.len() < 3 {
            return Err(StrataError::ColumnCount {
                file: source.to_path_buf(),
                line: line_no,
                expected: expected.max(3),
                found: row.len(),
            });
        }

        records.push(HorizonRecord { x: row[0], y: row[1], values: row.split_off(2) });
    }

    Ok(HorizonFile { source: source.to_path_buf(), records })
}

/// A sample point with one concrete depth per boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct HorizonSample {
    pub position: [f64; 2],
    pub boundaries: Vec<f64>,
}

impl HorizonSample {
    pub fn new(x: f64, y: f64, boundaries: Vec<f64>) -> Self {
        Self { position: [x, y], boundaries }
    }
}

/// The sampled contents of one horizon file, ready for indexing.
#[derive(Debug, Clone)]
pub struct HorizonSet {
    pub source: PathBuf,
    pub samples: Vec<HorizonSample>,
}

impl HorizonSet {
    pub fn new(source: impl Into<PathBuf>, samples: Vec<HorizonSample>) -> Self {
        Self { source: source.into(), samples }
    }

    /// Boundaries per sample point; rows are uniform by construction.
    pub fn boundary_count(&self) -> usize {
        self.samples.first().map_or(0, |s| s.boundaries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
