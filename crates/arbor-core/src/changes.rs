//! Change detection against the previous snapshot graph.
//!
//! Classifies the scanned inventory into new/modified files (grouped by
//! parent directory), deleted files, and a collapsed set of deleted
//! directories. Timestamps compare at whole-second resolution; an equal
//! timestamp means unchanged, even if content differs.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::error::{check_cancelled, Result};
use crate::exclude::ExclusionRules;
use crate::model::{truncate_to_seconds, GraphEntity};
use crate::options::ParserOptions;
use crate::path;
use crate::scan::{scan_tree, FileInventory};

/// The classified difference between disk and snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectChanges {
    /// Canonical directory → upserted (new or modified) files beneath it.
    pub changed_files_by_directory: BTreeMap<String, Vec<String>>,
    /// Deleted files not covered by a deleted directory.
    pub deleted_files: Vec<String>,
    /// Topmost deleted directories; no entry is an ancestor of another.
    pub deleted_directories: Vec<String>,
}

impl ProjectChanges {
    pub fn is_empty(&self) -> bool {
        self.changed_files_by_directory.is_empty()
            && self.deleted_files.is_empty()
            && self.deleted_directories.is_empty()
    }
}

/// Scan the project and diff it against `snapshot` in one step.
pub fn project_changes(
    options: &ParserOptions,
    snapshot: Option<&GraphEntity>,
    ct: &CancellationToken,
) -> Result<ProjectChanges> {
    let rules = ExclusionRules::compile(&options.exclusions);
    let inventory = scan_tree(
        &options.base.full_root_path,
        &options.file_extensions,
        &rules,
        ct,
    )?;
    detect_changes(&inventory, snapshot, ct)
}

/// Diff a scanned inventory against the snapshot graph.
pub fn detect_changes(
    inventory: &FileInventory,
    snapshot: Option<&GraphEntity>,
    ct: &CancellationToken,
) -> Result<ProjectChanges> {
    let index = SnapshotIndex::build(snapshot);

    let mut changed: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entry in inventory.files() {
        check_cancelled(ct)?;

        let previous = index.files.get(&path::key(&entry.path));
        let upserted = match previous {
            None => true,
            Some(last_write) => {
                truncate_to_seconds(entry.modified) > truncate_to_seconds(*last_write)
            }
        };
        if upserted {
            changed
                .entry(entry.parent_dir.clone())
                .or_default()
                .push(entry.path.clone());
        }
    }
    for files in changed.values_mut() {
        files.sort_by_key(|p| path::key(p));
        files.dedup_by_key(|p| path::key(p));
    }

    let (mut deleted_files, deleted_dirs) = discover_deleted_paths(&index, inventory, ct)?;

    let collapsed = collapse_deleted_directories(deleted_dirs);
    let collapsed_keys: HashSet<String> = collapsed.iter().map(|d| path::key(d)).collect();

    deleted_files.retain(|f| !is_under_any_deleted_directory(f, &collapsed_keys));
    deleted_files.sort_by_key(|p| path::key(p));

    Ok(ProjectChanges {
        changed_files_by_directory: changed,
        deleted_files,
        deleted_directories: collapsed,
    })
}

/// Flat path index over the snapshot tree, one walk instead of a tree
/// search per file.
#[derive(Default)]
struct SnapshotIndex {
    files: HashMap<String, DateTime<Utc>>,
    file_paths: Vec<String>,
    dir_paths: Vec<String>,
}

impl SnapshotIndex {
    fn build(snapshot: Option<&GraphEntity>) -> Self {
        let mut index = SnapshotIndex::default();
        let Some(root) = snapshot else {
            return index;
        };

        for entity in root.iter() {
            let rel = entity.path();
            if rel.trim().is_empty() || rel == path::ROOT {
                continue;
            }
            if entity.is_file() {
                index.files.insert(path::key(rel), entity.last_write());
                index.file_paths.push(rel.to_string());
            } else {
                index.dir_paths.push(rel.to_string());
            }
        }
        index
    }
}

fn discover_deleted_paths(
    index: &SnapshotIndex,
    inventory: &FileInventory,
    ct: &CancellationToken,
) -> Result<(Vec<String>, Vec<String>)> {
    let mut deleted_files = Vec::new();
    let mut deleted_dirs = Vec::new();
    let mut seen_dirs = HashSet::new();

    for file in &index.file_paths {
        check_cancelled(ct)?;
        if !inventory.contains_file(file) {
            deleted_files.push(file.clone());
        }
    }
    for dir in &index.dir_paths {
        check_cancelled(ct)?;
        if !inventory.contains_dir(dir) && seen_dirs.insert(path::key(dir)) {
            deleted_dirs.push(dir.clone());
        }
    }

    Ok((deleted_files, deleted_dirs))
}

/// Keep only the topmost deleted directories: shortest paths first, drop
/// any candidate already covered by a kept prefix.
fn collapse_deleted_directories(candidates: Vec<String>) -> Vec<String> {
    let mut ordered: Vec<String> = candidates
        .into_iter()
        .map(|d| d.replace('\\', "/"))
        .filter(|d| !d.is_empty() && d != path::ROOT)
        .collect();
    ordered.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

    let mut kept: Vec<String> = Vec::new();
    for candidate in ordered {
        let candidate_prefix = as_dir_prefix(&candidate);
        let covered = kept
            .iter()
            .any(|k| candidate_prefix.starts_with(&as_dir_prefix(k)));
        if !covered {
            kept.push(candidate);
        }
    }
    kept
}

fn as_dir_prefix(dir: &str) -> String {
    let k = path::key(dir);
    if k.ends_with('/') { k } else { format!("{k}/") }
}

fn is_under_any_deleted_directory(file: &str, deleted_dir_keys: &HashSet<String>) -> bool {
    path::ancestor_dirs(file)
        .iter()
        .any(|a| deleted_dir_keys.contains(&path::key(a)))
}
