//! The persistent dependency graph: directory nodes and file leaves.
//!
//! The tree is strictly owned top-down. Sibling paths are unique under the
//! case-insensitive identity of [`path::lookup_key`], which also ignores
//! the file-vs-directory spelling so that a path observed with a different
//! kind in a later run resolves to the same slot.

use std::collections::BTreeMap;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::path;

/// Dependency identifier → occurrence count.
pub type DependencyCounts = BTreeMap<String, u32>;

/// A node of the dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GraphEntity {
    Directory(DirectoryNode),
    File(FileLeaf),
}

/// A directory (package) with child entities and an aggregated
/// dependency map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryNode {
    pub name: String,
    pub path: String,
    pub last_write: DateTime<Utc>,
    #[serde(default)]
    pub dependencies: DependencyCounts,
    #[serde(default)]
    pub children: Vec<GraphEntity>,
}

/// A terminal file entry whose dependencies come straight from a parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileLeaf {
    pub name: String,
    pub path: String,
    pub last_write: DateTime<Utc>,
    #[serde(default)]
    pub dependencies: DependencyCounts,
}

/// Truncate a timestamp to whole seconds. All graph timestamps and every
/// timestamp comparison use this resolution.
pub fn truncate_to_seconds(t: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(t.timestamp(), 0).unwrap_or(t)
}

/// Second-truncated UTC timestamp from filesystem metadata.
pub fn utc_from_system(t: SystemTime) -> DateTime<Utc> {
    truncate_to_seconds(DateTime::<Utc>::from(t))
}

impl DirectoryNode {
    pub fn new(name: impl Into<String>, path: impl Into<String>, last_write: DateTime<Utc>) -> Self {
        DirectoryNode {
            name: name.into(),
            path: path.into(),
            last_write: truncate_to_seconds(last_write),
            dependencies: DependencyCounts::new(),
            children: Vec::new(),
        }
    }

    /// Index of the child sharing `path`'s identity, if any.
    pub fn child_index(&self, path: &str) -> Option<usize> {
        let key = path::lookup_key(path);
        self.children
            .iter()
            .position(|c| path::lookup_key(c.path()) == key)
    }

    /// Append a child unless a sibling already owns its path.
    pub fn add_child(&mut self, child: GraphEntity) {
        if self.child_index(child.path()).is_none() {
            self.children.push(child);
        }
    }

    /// Replace the child sharing `replacement`'s path, or append it.
    pub fn replace_child(&mut self, replacement: GraphEntity) {
        match self.child_index(replacement.path()) {
            Some(i) => self.children[i] = replacement,
            None => self.children.push(replacement),
        }
    }

    /// Return the child directory for `canonical`, creating it if absent.
    /// A file squatting on the same identity is displaced.
    pub(crate) fn ensure_child_dir(
        &mut self,
        name: &str,
        canonical: &str,
        last_write: DateTime<Utc>,
    ) -> &mut DirectoryNode {
        let idx = match self.child_index(canonical) {
            Some(i) => {
                if !matches!(self.children[i], GraphEntity::Directory(_)) {
                    self.children[i] =
                        GraphEntity::Directory(DirectoryNode::new(name, canonical, last_write));
                }
                i
            }
            None => {
                self.children
                    .push(GraphEntity::Directory(DirectoryNode::new(name, canonical, last_write)));
                self.children.len() - 1
            }
        };
        match &mut self.children[idx] {
            GraphEntity::Directory(node) => node,
            GraphEntity::File(_) => unreachable!("slot was just ensured to be a directory"),
        }
    }
}

impl FileLeaf {
    pub fn new(name: impl Into<String>, path: impl Into<String>, last_write: DateTime<Utc>) -> Self {
        FileLeaf {
            name: name.into(),
            path: path.into(),
            last_write: truncate_to_seconds(last_write),
            dependencies: DependencyCounts::new(),
        }
    }
}

impl GraphEntity {
    pub fn name(&self) -> &str {
        match self {
            GraphEntity::Directory(d) => &d.name,
            GraphEntity::File(f) => &f.name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            GraphEntity::Directory(d) => &d.path,
            GraphEntity::File(f) => &f.path,
        }
    }

    pub fn last_write(&self) -> DateTime<Utc> {
        match self {
            GraphEntity::Directory(d) => d.last_write,
            GraphEntity::File(f) => f.last_write,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, GraphEntity::File(_))
    }

    pub fn dependencies(&self) -> &DependencyCounts {
        match self {
            GraphEntity::Directory(d) => &d.dependencies,
            GraphEntity::File(f) => &f.dependencies,
        }
    }

    /// Children, empty for a file leaf.
    pub fn children(&self) -> &[GraphEntity] {
        match self {
            GraphEntity::Directory(d) => &d.children,
            GraphEntity::File(_) => &[],
        }
    }

    /// Record one occurrence of a dependency identifier.
    pub fn add_dependency(&mut self, id: &str) {
        let deps = match self {
            GraphEntity::Directory(d) => &mut d.dependencies,
            GraphEntity::File(f) => &mut f.dependencies,
        };
        *deps.entry(id.to_string()).or_insert(0) += 1;
    }

    /// Record every identifier in order; duplicates increment the counter.
    pub fn add_dependencies<I>(&mut self, ids: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for id in ids {
            self.add_dependency(id.as_ref());
        }
    }

    /// Depth-first walk over this entity and every descendant.
    pub fn iter(&self) -> EntityIter<'_> {
        EntityIter { stack: vec![self] }
    }

    /// Find an entity by path. The query may be spelled canonically,
    /// relative without the `./` prefix, or with either kind's trailing
    /// slash; matching is case-insensitive and never touches the
    /// filesystem.
    pub fn find_by_path(&self, query: &str) -> Option<&GraphEntity> {
        if query.trim().is_empty() {
            return None;
        }
        let target = path::lookup_key(query);
        self.iter().find(|e| path::lookup_key(e.path()) == target)
    }

    pub fn contains_path(&self, query: &str) -> bool {
        self.find_by_path(query).is_some()
    }
}

/// Iterator behind [`GraphEntity::iter`].
pub struct EntityIter<'a> {
    stack: Vec<&'a GraphEntity>,
}

impl<'a> Iterator for EntityIter<'a> {
    type Item = &'a GraphEntity;

    fn next(&mut self) -> Option<Self::Item> {
        let entity = self.stack.pop()?;
        for child in entity.children().iter().rev() {
            self.stack.push(child);
        }
        Some(entity)
    }
}
