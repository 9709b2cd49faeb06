//! Arbor Core — incremental dependency graph engine for source trees
//!
//! Scans a project tree, diffs it against the persisted snapshot graph,
//! rebuilds only the changed subtrees, and merges the result back with
//! deterministic conflict resolution and full aggregate recomputation.

pub mod aggregate;
pub mod builder;
pub mod changes;
pub mod error;
pub mod exclude;
pub mod model;
pub mod options;
pub mod path;
pub mod scan;
pub mod snapshot;


#[cfg(test)]
pub mod test_utils;

pub use builder::{DependencyParser, GraphBuilder};
pub use changes::{detect_changes, project_changes, ProjectChanges};
pub use error::{check_cancelled, Error, Result};
pub use exclude::ExclusionRules;
pub use model::{DependencyCounts, DirectoryNode, FileLeaf, GraphEntity};
pub use options::{
    BaseOptions, Language, Package, ParserOptions, RenderFormat, RenderOptions, SnapshotBackend,
    SnapshotOptions, View,
};
pub use scan::{scan_tree, FileEntry, FileInventory};
pub use snapshot::{store_for, LocalSnapshotStore, SnapshotStore};

pub use tokio_util::sync::CancellationToken;
