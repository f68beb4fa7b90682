//! Vertical-profile assignment: maps every mesh node to its nearest horizon
//! sample point in the horizontal plane.
//!
//! The index is built once per horizon set and only queried afterwards, so an
//! immutable k-d tree is used. With the `threading` feature the per-node
//! queries run on the rayon pool against the shared read-only tree.

use std::collections::HashMap;

use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;
#[cfg(feature = "threading")]
use rayon::prelude::*;

use crate::error::{Result, StrataError};
use crate::horizon::HorizonSet;
use crate::mesh::{Mesh, Node, NodeId};

/// A node's vertical coordinate and the sample point that governs it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalProfile {
    pub node: NodeId,
    pub z: f64,
    /// Index into `HorizonSet::samples`.
    pub profile: usize,
}

/// Node id → vertical profile, rebuilt for every horizon set.
pub type NodeProfiles = HashMap<NodeId, VerticalProfile>;

pub struct ProfileIndex {
    tree: ImmutableKdTree<f64, u32, 2, 32>,
}

impl ProfileIndex {
    /// Index the horizontal positions of every sample in `set`.
    pub fn build(set: &HorizonSet) -> Result<Self> {
        if set.is_empty() {
            return Err(StrataError::EmptyHorizonSet { file: set.source.clone() });
        }
        let points: Vec<[f64; 2]> = set.samples.iter().map(|s| s.position).collect();
        Ok(Self { tree: ImmutableKdTree::new_from_slice(&points) })
    }

    /// Index of the sample point closest to (x, y).
    pub fn nearest(&self, x: f64, y: f64) -> usize {
        self.tree.nearest_one::<SquaredEuclidean>(&[x, y]).item as usize
    }

    fn profile_of(&self, node: &Node) -> VerticalProfile {
        let [x, y] = node.horizontal();
        VerticalProfile { node: node.id, z: node.z(), profile: self.nearest(x, y) }
    }

    /// Assign a vertical profile to every node of the mesh.
    #[cfg(not(feature = "threading"))]
    pub fn assign_nodes(&self, mesh: &Mesh) -> NodeProfiles {
        mesh.nodes.iter().map(|n| (n.id, self.profile_of(n))).collect()
    }

    /// Assign a vertical profile to every node of the mesh.
    #[cfg(feature = "threading")]
    pub fn assign_nodes(&self, mesh: &Mesh) -> NodeProfiles {
        mesh.nodes.par_iter().map(|n| (n.id, self.profile_of(n))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::horizon::HorizonSample;

    fn grid_set(n: usize) -> HorizonSet {
        let mut samples = Vec::new();
        for i in 0..n {
            for j in 0..n {
                samples.push(HorizonSample::new(i as f64 * 10.0, j as f64 * 10.0, vec![-5.0]));
            }
        }
        HorizonSet::new("grid.txt", samples)
    }

    #[test]
    fn empty_set_cannot_be_indexed() {
        let set = HorizonSet::new("empty.txt", Vec::new());
        assert!(matches!(ProfileIndex::build(&set), Err(StrataError::EmptyHorizonSet { .. })));
    }

    #[test]
    fn nearest_ignores_vertical_coordinate() {
        let set = grid_set(5);
        let index = ProfileIndex::build(&set).unwrap();

        let mesh = Mesh::from_parts(
            vec![Node::new(1, 21.0, 38.0, -1000.0), Node::new(2, 21.0, 38.0, 1000.0)],
            Vec::new(),
        );
        let profiles = index.assign_nodes(&mesh);
        assert_eq!(profiles.len(), 2);
        let expected = set.samples.iter().position(|s| s.position == [20.0, 40.0]).unwrap();
        assert_eq!(profiles[&1].profile, expected);
        assert_eq!(profiles[&2].profile, expected);
        assert_eq!(profiles[&2].z, 1000.0);
    }

    #[test]
    fn nearest_matches_brute_force() {
        let set = grid_set(12);
        let index = ProfileIndex::build(&set).unwrap();
        for k in 0..200 {
            let x = (k * 37 % 113) as f64 + 0.3;
            let y = (k * 53 % 109) as f64 + 0.7;
            let got = index.nearest(x, y);
            let d = |i: usize| {
                let [px, py] = set.samples[i].position;
                (px - x).powi(2) + (py - y).powi(2)
            };
            let best = (0..set.samples.len()).map(d).fold(f64::INFINITY, f64::min);
            assert_eq!(d(got), best, "query ({x}, {y})");
        }
    }

    fn squared_distance(set: &HorizonSet, i: usize, x: f64, y: f64) -> f64 {
        let [px, py] = set.samples[i].position;
        (px - x).powi(2) + (py - y).powi(2)
    }

    fn assert_nearest(set: &HorizonSet, index: &ProfileIndex, x: f64, y: f64) {
        let got = index.nearest(x, y);
        assert!(got < set.samples.len());
        let best = (0..set.samples.len())
            .map(|i| squared_distance(set, i, x, y))
            .fold(f64::INFINITY, f64::min);
        assert_eq!(squared_distance(set, got, x, y), best, "query ({x}, {y})");
    }

    #[test]
    fn large_regular_grid_is_indexed() {
        // 100 × 100 samples, every x and y value shared by 100 points.
        let set = grid_set(100);
        let index = ProfileIndex::build(&set).unwrap();
        for k in 0..500 {
            let x = (k * 37 % 1013) as f64 + 0.3;
            let y = (k * 53 % 997) as f64 + 0.7;
            assert_nearest(&set, &index, x, y);
        }
    }

    #[test]
    fn collinear_and_duplicate_samples_are_indexed() {
        let line: Vec<_> = (0..200)
            .map(|j| HorizonSample::new(0.0, j as f64 * 5.0, vec![-5.0]))
            .collect();
        let line = HorizonSet::new("line.txt", line);
        let index = ProfileIndex::build(&line).unwrap();
        for k in 0..100 {
            assert_nearest(&line, &index, (k % 7) as f64 - 3.0, k as f64 * 9.7);
        }

        let same = HorizonSet::new("same.txt", vec![HorizonSample::new(3.0, 4.0, vec![-5.0]); 500]);
        let index = ProfileIndex::build(&same).unwrap();
        assert!(index.nearest(0.0, 0.0) < 500);
        assert_nearest(&same, &index, 100.0, -20.0);
    }

    #[test]
    fn repeated_queries_are_stable() {
        let set = grid_set(8);
        let index = ProfileIndex::build(&set).unwrap();
        // Equidistant from four sample points.
        let first = index.nearest(15.0, 15.0);
        for _ in 0..10 {
            assert_eq!(index.nearest(15.0, 15.0), first);
        }
    }
}
