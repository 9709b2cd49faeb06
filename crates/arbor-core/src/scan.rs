//! Filesystem scan producing the current file/directory inventory.
//!
//! One stack-based walk over the project tree. Exclusion rules and the
//! extension allow-list are evaluated independently per entry. A directory
//! that cannot be read is skipped, not fatal — the rest of the walk
//! continues. The scan never consults the previous snapshot.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::error::{check_cancelled, Result};
use crate::exclude::ExclusionRules;
use crate::model::utc_from_system;
use crate::path;

/// One scanned file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    /// Canonical file path.
    pub path: String,
    /// Canonical directory containing the file.
    pub parent_dir: String,
    /// Last write time, UTC, truncated to whole seconds.
    pub modified: DateTime<Utc>,
}

/// Everything currently on disk that passed the filters.
#[derive(Debug, Default)]
pub struct FileInventory {
    files: BTreeMap<String, FileEntry>,
    dirs: BTreeMap<String, String>,
}

impl FileInventory {
    pub fn insert_file(&mut self, entry: FileEntry) {
        // Duplicate spellings of the same path: last one wins.
        self.files.insert(path::key(&entry.path), entry);
    }

    pub fn insert_dir(&mut self, canonical: String) {
        self.dirs.insert(path::key(&canonical), canonical);
    }

    pub fn file(&self, canonical: &str) -> Option<&FileEntry> {
        self.files.get(&path::key(canonical))
    }

    pub fn contains_file(&self, canonical: &str) -> bool {
        self.files.contains_key(&path::key(canonical))
    }

    pub fn contains_dir(&self, canonical: &str) -> bool {
        self.dirs.contains_key(&path::key(canonical))
    }

    /// Files in deterministic (key) order.
    pub fn files(&self) -> impl Iterator<Item = &FileEntry> {
        self.files.values()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn dir_count(&self) -> usize {
        self.dirs.len()
    }
}

/// Walk the tree under `root`, applying `rules` and the extension
/// allow-list (extensions include the leading dot; comparison is
/// case-insensitive).
pub fn scan_tree(
    root: &Path,
    extensions: &[String],
    rules: &ExclusionRules,
    ct: &CancellationToken,
) -> Result<FileInventory> {
    let allowed: Vec<String> = extensions.iter().map(|e| e.to_lowercase()).collect();
    let mut inventory = FileInventory::default();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir_abs) = stack.pop() {
        check_cancelled(ct)?;

        let dir_rel = path::canonical_dir(root, &dir_abs);
        inventory.insert_dir(dir_rel.clone());

        let entries = match fs::read_dir(&dir_abs) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("cannot read directory {}: {e}", dir_abs.display());
                continue;
            }
        };

        for entry in entries {
            check_cancelled(ct)?;

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("cannot read entry in {}: {e}", dir_abs.display());
                    continue;
                }
            };

            let entry_abs = entry.path();
            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!("cannot stat {}: {e}", entry_abs.display());
                    continue;
                }
            };

            if file_type.is_dir() {
                let sub_rel = path::canonical_dir(root, &entry_abs);
                if !rules.is_excluded(&sub_rel) {
                    stack.push(entry_abs);
                }
                continue;
            }

            if !file_type.is_file() {
                continue;
            }

            let file_rel = path::canonical_file(root, &entry_abs);
            if rules.is_excluded(&file_rel) {
                continue;
            }

            let ext = entry_abs
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()));
            let allowed_ext = ext.map(|e| allowed.contains(&e)).unwrap_or(false);
            if !allowed_ext {
                continue;
            }

            let modified = match entry.metadata().and_then(|m| m.modified()) {
                Ok(t) => utc_from_system(t),
                Err(e) => {
                    tracing::warn!("cannot read mtime of {}: {e}", entry_abs.display());
                    continue;
                }
            };

            inventory.insert_file(FileEntry {
                path: file_rel,
                parent_dir: dir_rel.clone(),
                modified,
            });
        }
    }

    tracing::debug!(
        "scan complete: {} files in {} directories",
        inventory.file_count(),
        inventory.dir_count()
    );
    Ok(inventory)
}
