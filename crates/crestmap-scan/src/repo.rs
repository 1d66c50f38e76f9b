//! Repository-name heuristic.

use std::path::{Component, Path, PathBuf};

use compact_str::CompactString;

/// Name of the repository a file belongs to: the first path segment under
/// the first include root that contains it.
///
/// For a file outside every root the result is implementation-defined: the
/// second normal path component when the path has one, otherwise the file
/// name. Callers should treat the fallback as a label, not a path.
pub fn repo_for_path(path: &Path, roots: &[PathBuf]) -> CompactString {
    for root in roots {
        if let Ok(rel) = path.strip_prefix(root) {
            for component in rel.components() {
                if let Component::Normal(name) = component {
                    return CompactString::new(name.to_string_lossy());
                }
            }
        }
    }

    let normals: Vec<CompactString> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(CompactString::new(name.to_string_lossy())),
            _ => None,
        })
        .collect();
    normals
        .get(1)
        .or(normals.last())
        .cloned()
        .unwrap_or_else(|| CompactString::new("(unknown)"))
}
