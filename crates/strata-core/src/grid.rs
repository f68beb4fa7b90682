//! Assembly of a multi-column horizon file from per-horizon point files.
//!
//! Each input file holds `x y depth` rows for a single horizon, shallowest
//! horizon first. Points are matched across horizons by exact (x, y). A grid
//! point missing from a horizon is first marked with the absent sentinel and
//! then, in `fill_absent`, given the depth of the next deeper horizon defined
//! there, so the unit pinches out instead of leaving a hole.

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::error::{Result, StrataError};
use crate::horizon::{is_absent, ABSENT_BOUNDARY};

/// Depth given to a horizon with no deeper horizon defined below it.
pub const UNDEFINED_BELOW: f64 = -100_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizonPoint {
    pub x: f64,
    pub y: f64,
    pub depth: f64,
}

pub fn read_point_file(path: &Path, comment: &str) -> Result<Vec<HorizonPoint>> {
    let text = fs::read_to_string(path).map_err(|e| StrataError::io(path, e))?;
    parse_point_file(&text, path, comment)
}

/// Parse whitespace-separated `x y depth` rows; columns past the third are
/// ignored, lines starting with `comment` are skipped.
pub fn parse_point_file(text: &str, source: &Path, comment: &str) -> Result<Vec<HorizonPoint>> {
    let mut points = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || (!comment.is_empty() && line.starts_with(comment)) {
            continue;
        }
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() < 3 {
            return Err(StrataError::ColumnCount {
                file: source.to_path_buf(),
                line: idx + 1,
                expected: 3,
                found: cols.len(),
            });
        }
        let mut v = [0.0f64; 3];
        for (slot, token) in v.iter_mut().zip(&cols) {
            *slot = token.parse().map_err(|_| StrataError::ParseNumber {
                file: source.to_path_buf(),
                line: idx + 1,
                token: token.to_string(),
            })?;
        }
        points.push(HorizonPoint { x: v[0], y: v[1], depth: v[2] });
    }
    Ok(points)
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridRow {
    pub x: f64,
    pub y: f64,
    /// One depth per horizon, shallowest first.
    pub depths: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct HorizonGrid {
    rows: Vec<GridRow>,
    horizons: usize,
}

impl HorizonGrid {
    /// Start a grid from the shallowest horizon; its points define the
    /// initial rows.
    pub fn from_first(points: &[HorizonPoint]) -> Self {
        let rows = points
            .iter()
            .map(|p| GridRow { x: p.x, y: p.y, depths: vec![p.depth] })
            .collect();
        Self { rows, horizons: 1 }
    }

    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    pub fn horizon_count(&self) -> usize {
        self.horizons
    }

    /// Append the next deeper horizon as a new column.
    pub fn add_horizon(&mut self, points: &[HorizonPoint]) {
        self.horizons += 1;
        let column = self.horizons - 1;
        for row in &mut self.rows {
            row.depths.push(ABSENT_BOUNDARY);
        }

        for (gp, p) in points.iter().enumerate() {
            let same = |r: &GridRow| r.x == p.x && r.y == p.y;
            // Files written from the same grid list points in the same order.
            let hit = match self.rows.get(gp) {
                Some(row) if same(row) => Some(gp),
                _ => self.rows.iter().position(same),
            };
            match hit {
                Some(i) => self.rows[i].depths[column] = p.depth,
                None => {
                    let mut depths = vec![ABSENT_BOUNDARY; self.horizons];
                    depths[column] = p.depth;
                    self.rows.push(GridRow { x: p.x, y: p.y, depths });
                }
            }
        }
    }

    /// Replace every absent depth with the next deeper defined depth in its
    /// row, or [`UNDEFINED_BELOW`] when nothing deeper is defined.
    pub fn fill_absent(&mut self) {
        for row in &mut self.rows {
            let mut below = UNDEFINED_BELOW;
            for d in row.depths.iter_mut().rev() {
                if !is_absent(*d) {
                    below = *d;
                }
                *d = below;
            }
        }
    }

    /// One `x, y, d₁, …` line per row, six decimals per value.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            let _ = write!(out, "{:.6}, {:.6}", row.x, row.y);
            for d in &row.depths {
                let _ = write!(out, ", {d:.6}");
            }
            out.push('\n');
        }
        out
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.render().as_bytes())?;
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(rows: &[(f64, f64, f64)]) -> Vec<HorizonPoint> {
        rows.iter().map(|&(x, y, depth)| HorizonPoint { x, y, depth }).collect()
    }

    #[test]
    fn point_file_skips_comments_and_extra_columns() {
        let text = "# x y z\n0 0 -10 extra\n\n1 0 -11\n";
        let p = parse_point_file(text, Path::new("a.dat"), "#").unwrap();
        assert_eq!(p, pts(&[(0.0, 0.0, -10.0), (1.0, 0.0, -11.0)]));
        assert!(parse_point_file("0 0\n", Path::new("a.dat"), "#").is_err());
    }

    #[test]
    fn horizons_are_matched_by_coordinates() {
        let mut grid = HorizonGrid::from_first(&pts(&[(0.0, 0.0, -10.0), (1.0, 0.0, -12.0)]));
        // Second horizon lists the points in the opposite order and adds one.
        grid.add_horizon(&pts(&[(1.0, 0.0, -30.0), (0.0, 0.0, -20.0), (2.0, 0.0, -25.0)]));
        assert_eq!(grid.horizon_count(), 2);
        assert_eq!(grid.rows()[0].depths, vec![-10.0, -20.0]);
        assert_eq!(grid.rows()[1].depths, vec![-12.0, -30.0]);
        assert_eq!(grid.rows()[2].depths, vec![ABSENT_BOUNDARY, -25.0]);
    }

    #[test]
    fn absent_depths_take_next_deeper_value() {
        let mut grid = HorizonGrid::from_first(&pts(&[(0.0, 0.0, -10.0), (1.0, 0.0, -12.0)]));
        grid.add_horizon(&pts(&[(0.0, 0.0, -20.0)]));
        grid.add_horizon(&pts(&[(0.0, 0.0, -40.0), (1.0, 0.0, -45.0)]));
        grid.fill_absent();
        assert_eq!(grid.rows()[0].depths, vec![-10.0, -20.0, -40.0]);
        assert_eq!(grid.rows()[1].depths, vec![-12.0, -45.0, -45.0]);
    }

    #[test]
    fn missing_deepest_horizon_uses_floor_value() {
        let mut grid = HorizonGrid::from_first(&pts(&[(0.0, 0.0, -10.0)]));
        grid.add_horizon(&[]);
        grid.fill_absent();
        assert_eq!(grid.rows()[0].depths, vec![-10.0, UNDEFINED_BELOW]);
    }

    #[test]
    fn render_uses_six_decimals() {
        let mut grid = HorizonGrid::from_first(&pts(&[(0.5, 1.0, -10.25)]));
        grid.add_horizon(&pts(&[(0.5, 1.0, -20.0)]));
        assert_eq!(grid.render(), "0.500000, 1.000000, -10.250000, -20.000000\n");
    }
}
