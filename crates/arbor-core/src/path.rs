//! Canonical path convention used for all entity identity and lookup.
//!
//! Canonical form: rooted at `"./"`, `/`-separated, directories carry a
//! trailing `/`, files never do. Equality is case-insensitive. These are
//! process-wide conventions, so everything here is a free function over
//! strings — no state, no filesystem access.

use std::path::Path;

/// Canonical path of the project root.
pub const ROOT: &str = "./";

/// Canonical directory form of `path`, relative to `root`.
///
/// Accepts absolute paths under `root`, already-relative paths (with or
/// without a leading `./`), and backslash separators.
pub fn canonical_dir(root: &Path, path: &Path) -> String {
    let rel = relative(root, path);
    if rel.is_empty() {
        ROOT.to_string()
    } else {
        format!("./{rel}/")
    }
}

/// Canonical file form of `path`, relative to `root`.
pub fn canonical_file(root: &Path, path: &Path) -> String {
    let rel = relative(root, path);
    if rel.is_empty() {
        ROOT.to_string()
    } else {
        format!("./{rel}")
    }
}

fn relative(root: &Path, path: &Path) -> String {
    let p = path.to_string_lossy().replace('\\', "/");
    let r = root.to_string_lossy().replace('\\', "/");
    let r = r.trim_end_matches('/');

    let rel = if !r.is_empty() && p.len() >= r.len() && p[..r.len()].eq_ignore_ascii_case(r) {
        match p[r.len()..].strip_prefix('/') {
            Some(rest) => rest,
            None if p.len() == r.len() => "",
            None => p.as_str(),
        }
    } else {
        p.as_str()
    };

    let rel = rel.trim_start_matches("./").trim_end_matches('/');
    if rel == "." { String::new() } else { rel.to_string() }
}

/// Lowercased form used wherever canonical paths act as map keys.
pub fn key(path: &str) -> String {
    path.replace('\\', "/").to_lowercase()
}

/// Identity key for tree lookups: case-insensitive and indifferent to the
/// file-vs-directory spelling (trailing `/`) and a leading `./`.
pub fn lookup_key(path: &str) -> String {
    key(path)
        .trim_start_matches("./")
        .trim_end_matches('/')
        .to_string()
}

/// Last segment of a canonical path — the file name or module name.
pub fn segment_name(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

/// Canonical directory containing `path`, or `None` at the root.
pub fn parent_dir(path: &str) -> Option<String> {
    let trimmed = path.trim_start_matches("./").trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.rsplit_once('/') {
        Some((parent, _)) => Some(format!("./{parent}/")),
        None => Some(ROOT.to_string()),
    }
}

/// Every canonical ancestor directory of `path`, nearest first, excluding
/// the root.
pub fn ancestor_dirs(path: &str) -> Vec<String> {
    let mut ancestors = Vec::new();
    let mut current = parent_dir(path);
    while let Some(dir) = current {
        if dir == ROOT {
            break;
        }
        current = parent_dir(&dir);
        ancestors.push(dir);
    }
    ancestors
}

/// Dot-separated package identifier of a canonical path
/// (`"./src/util/"` → `"src.util"`). The root maps to the empty string.
pub fn dot_separated(path: &str) -> String {
    path.trim_start_matches("./")
        .trim_end_matches('/')
        .replace('/', ".")
}

/// Whether the last segment carries a file extension.
pub fn has_extension(path: &str) -> bool {
    Path::new(segment_name(path)).extension().is_some()
}

/// Absolute filesystem path for a canonical path under `root`.
pub fn to_absolute(root: &Path, canonical: &str) -> std::path::PathBuf {
    let rel = canonical.trim_start_matches("./").trim_end_matches('/');
    if rel.is_empty() {
        root.to_path_buf()
    } else {
        root.join(rel)
    }
}
