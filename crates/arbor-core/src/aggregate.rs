//! Aggregate recomputation for directory nodes.
//!
//! A directory's dependency map is a projection of its descendant leaves:
//! the per-identifier sum of their occurrence counts. It is rebuilt from
//! scratch after every merge — nothing is accumulated across runs, so a
//! partial rebuild can never leave a stale aggregate behind.

use crate::model::{DependencyCounts, DirectoryNode, GraphEntity};

/// Recompute every directory's dependency map in `root`'s subtree.
pub fn recompute_aggregates(root: &mut DirectoryNode) {
    recompute(root);
}

fn recompute(node: &mut DirectoryNode) -> DependencyCounts {
    let mut totals = DependencyCounts::new();
    for child in &mut node.children {
        let child_counts = match child {
            GraphEntity::File(leaf) => leaf.dependencies.clone(),
            GraphEntity::Directory(dir) => recompute(dir),
        };
        for (id, count) in child_counts {
            *totals.entry(id).or_insert(0) += count;
        }
    }
    node.dependencies = totals.clone();
    totals
}
