//! Partial graph construction and snapshot merge.
//!
//! A run builds a fresh tree covering only the changed directories and
//! files, merges it into the previous snapshot by recursive upsert,
//! excises deleted paths, prunes emptied directories, and recomputes
//! aggregates. On a first run the partial tree simply becomes the graph.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::aggregate::recompute_aggregates;
use crate::changes::ProjectChanges;
use crate::error::{check_cancelled, Result};
use crate::model::{truncate_to_seconds, utc_from_system, DirectoryNode, FileLeaf, GraphEntity};
use crate::options::BaseOptions;
use crate::path;

/// Per-language dependency extraction contract.
///
/// Implementations must not fail on a file they cannot parse — they log
/// and return an empty list. The only error is cancellation. Duplicate
/// identifiers are meaningful: each occurrence increments a counter.
#[async_trait]
pub trait DependencyParser: Send + Sync {
    async fn parse_file_dependencies(
        &self,
        file: &Path,
        ct: &CancellationToken,
    ) -> Result<Vec<String>>;
}

/// Builds and merges the dependency graph for one run.
pub struct GraphBuilder<'a> {
    parsers: &'a [Box<dyn DependencyParser>],
    options: &'a BaseOptions,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(parsers: &'a [Box<dyn DependencyParser>], options: &'a BaseOptions) -> Self {
        GraphBuilder { parsers, options }
    }

    /// Produce the merged graph for this run's changes.
    pub async fn build(
        &self,
        changes: &ProjectChanges,
        snapshot: Option<GraphEntity>,
        ct: &CancellationToken,
    ) -> Result<GraphEntity> {
        let partial = self.build_partial(changes, ct).await?;

        let mut merged = match snapshot {
            Some(GraphEntity::Directory(saved_root)) => merge_graphs(saved_root, partial),
            Some(GraphEntity::File(_)) => {
                tracing::warn!("snapshot root is not a directory; treating as first run");
                partial
            }
            None => partial,
        };

        apply_deletions(&mut merged, changes);
        prune_empty_directories(&mut merged);
        recompute_aggregates(&mut merged);

        Ok(GraphEntity::Directory(merged))
    }

    /// Build the partial tree covering only the changed paths.
    async fn build_partial(
        &self,
        changes: &ProjectChanges,
        ct: &CancellationToken,
    ) -> Result<DirectoryNode> {
        let root_full = &self.options.full_root_path;
        let mut root = DirectoryNode::new(
            self.options.project_name.as_str(),
            path::ROOT,
            dir_mtime(root_full),
        );

        // Every changed directory gets a node even when it contributes no
        // files this run.
        for dir in changes.changed_files_by_directory.keys() {
            check_cancelled(ct)?;
            self.ensure_directory_node(&mut root, dir);
        }

        for contents in changes.changed_files_by_directory.values() {
            for item in contents {
                if item.trim().is_empty() {
                    continue;
                }
                check_cancelled(ct)?;

                let canonical = path::canonical_file(root_full, Path::new(item));

                // No extension: a nested directory reference, not a file.
                if !path::has_extension(&canonical) {
                    self.ensure_directory_node(&mut root, item);
                    continue;
                }

                let Some(parent) = path::parent_dir(&canonical) else {
                    continue;
                };

                let abs = path::to_absolute(root_full, &canonical);
                let modified = match fs::metadata(&abs).and_then(|m| m.modified()) {
                    Ok(t) => utc_from_system(t),
                    Err(e) => {
                        tracing::warn!("skipping {canonical}: cannot stat {}: {e}", abs.display());
                        continue;
                    }
                };

                let mut deps = Vec::new();
                for parser in self.parsers {
                    deps.extend(parser.parse_file_dependencies(&abs, ct).await?);
                }

                let leaf =
                    FileLeaf::new(path::segment_name(&canonical), canonical.as_str(), modified);
                let mut entity = GraphEntity::File(leaf);
                entity.add_dependencies(deps);

                let parent_node = self.ensure_directory_node(&mut root, &parent);
                parent_node.replace_child(entity);
            }
        }

        Ok(root)
    }

    /// Descend to the directory node for `spelling`, creating the chain of
    /// missing ancestors. Canonicalization happens first, so every
    /// spelling of the same logical directory lands on the same node.
    fn ensure_directory_node<'t>(
        &self,
        root: &'t mut DirectoryNode,
        spelling: &str,
    ) -> &'t mut DirectoryNode {
        let root_full = &self.options.full_root_path;
        let canonical = path::canonical_dir(root_full, Path::new(spelling));
        if canonical == path::ROOT {
            return root;
        }

        let rel = canonical.trim_start_matches("./").trim_end_matches('/');
        let mut current = root;
        let mut prefix = String::from("./");
        for segment in rel.split('/') {
            prefix.push_str(segment);
            prefix.push('/');
            let mtime = dir_mtime(&path::to_absolute(root_full, &prefix));
            current = current.ensure_child_dir(segment, &prefix, mtime);
        }
        current
    }
}

fn dir_mtime(abs: &Path) -> chrono::DateTime<Utc> {
    match fs::metadata(abs).and_then(|m| m.modified()) {
        Ok(t) => utc_from_system(t),
        Err(_) => truncate_to_seconds(Utc::now()),
    }
}

/// Merge the freshly built partial tree into the saved graph.
fn merge_graphs(mut saved_root: DirectoryNode, changed_root: DirectoryNode) -> DirectoryNode {
    for child in changed_root.children {
        upsert_child(&mut saved_root, child);
    }
    saved_root
}

/// Insert-or-reconcile one entity under `parent`.
///
/// Matching directories merge: the incoming dependency map replaces the
/// existing one wholesale and grandchildren upsert recursively; siblings
/// untouched by this run stay as they are. Any kind mismatch, or a leaf
/// on either side, resolves by replacement — last observed kind wins.
pub(crate) fn upsert_child(parent: &mut DirectoryNode, incoming: GraphEntity) {
    let Some(idx) = parent.child_index(incoming.path()) else {
        parent.children.push(incoming);
        return;
    };

    match incoming {
        GraphEntity::Directory(incoming_node) => {
            if let GraphEntity::Directory(existing) = &mut parent.children[idx] {
                existing.dependencies = incoming_node.dependencies;
                for grandchild in incoming_node.children {
                    upsert_child(existing, grandchild);
                }
            } else {
                parent.children[idx] = GraphEntity::Directory(incoming_node);
            }
        }
        leaf @ GraphEntity::File(_) => parent.children[idx] = leaf,
    }
}

/// Remove deleted files and directories anywhere in the tree.
fn apply_deletions(root: &mut DirectoryNode, changes: &ProjectChanges) {
    for file in &changes.deleted_files {
        // A deleted path may have changed kind between runs; the identity
        // key matches either form.
        let target = path::lookup_key(file);
        remove_entities(root, &|e| path::lookup_key(e.path()) == target);
    }

    for dir in &changes.deleted_directories {
        let target = path::lookup_key(dir);
        let prefix = {
            let k = path::key(dir);
            if k.ends_with('/') { k } else { format!("{k}/") }
        };
        remove_entities(root, &|e| {
            path::lookup_key(e.path()) == target || path::key(e.path()).starts_with(&prefix)
        });
    }
}

fn remove_entities(node: &mut DirectoryNode, should_remove: &dyn Fn(&GraphEntity) -> bool) {
    node.children.retain(|c| !should_remove(c));
    for child in &mut node.children {
        if let GraphEntity::Directory(dir) = child {
            remove_entities(dir, should_remove);
        }
    }
}

/// Drop non-root directory nodes left without children, bottom-up.
fn prune_empty_directories(root: &mut DirectoryNode) {
    fn prune(node: &mut DirectoryNode) {
        for child in &mut node.children {
            if let GraphEntity::Directory(dir) = child {
                prune(dir);
            }
        }
        node.children.retain(|c| match c {
            GraphEntity::Directory(dir) => !dir.children.is_empty(),
            GraphEntity::File(_) => true,
        });
    }
    prune(root);
}
