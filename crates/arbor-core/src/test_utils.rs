//! Test utilities for Arbor

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::TempDir;

use crate::model::{truncate_to_seconds, utc_from_system, DirectoryNode, FileLeaf, GraphEntity};
use crate::path;

/// A temporary on-disk project tree.
pub struct TestTree {
    dir: TempDir,
}

impl TestTree {
    pub fn new() -> Self {
        TestTree {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Create a file (and its parent directories) under the root.
    pub fn file(&self, rel: &str, content: &str) -> PathBuf {
        let full = self.dir.path().join(rel);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full, content).unwrap();
        full
    }

    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let full = self.dir.path().join(rel);
        fs::create_dir_all(&full).unwrap();
        full
    }

    /// Second-truncated mtime of a file under the root.
    pub fn mtime_of(&self, rel: &str) -> DateTime<Utc> {
        let meta = fs::metadata(self.dir.path().join(rel)).unwrap();
        utc_from_system(meta.modified().unwrap())
    }
}

/// A fixed timestamp comfortably in the past.
pub fn t_past() -> DateTime<Utc> {
    truncate_to_seconds(Utc::now()) - chrono::Duration::minutes(10)
}

/// Fresh snapshot root named `project`.
pub fn snapshot_root(project: &str) -> DirectoryNode {
    DirectoryNode::new(project, path::ROOT, t_past())
}

/// Insert a file leaf (and its directory chain) into a snapshot tree.
/// `rel` is root-relative, e.g. `"src/B.cs"`.
pub fn add_snapshot_file(
    root: &mut DirectoryNode,
    rel: &str,
    mtime: DateTime<Utc>,
    deps: &[&str],
) {
    let canonical = format!("./{}", rel.trim_start_matches("./"));
    let parent = path::parent_dir(&canonical).unwrap();

    let mut current = root;
    if parent != path::ROOT {
        let chain = parent.trim_start_matches("./").trim_end_matches('/');
        let mut prefix = String::from("./");
        for segment in chain.split('/') {
            prefix.push_str(segment);
            prefix.push('/');
            current = current.ensure_child_dir(segment, &prefix, mtime);
        }
    }

    let mut leaf = GraphEntity::File(FileLeaf::new(
        path::segment_name(&canonical),
        canonical.as_str(),
        mtime,
    ));
    for dep in deps {
        leaf.add_dependency(dep);
    }
    current.replace_child(leaf);
}

/// Insert an empty directory node chain into a snapshot tree.
pub fn add_snapshot_dir(root: &mut DirectoryNode, rel: &str, mtime: DateTime<Utc>) {
    let chain = rel.trim_start_matches("./").trim_end_matches('/');
    let mut current = root;
    let mut prefix = String::from("./");
    for segment in chain.split('/') {
        prefix.push_str(segment);
        prefix.push('/');
        current = current.ensure_child_dir(segment, &prefix, mtime);
    }
}
