//! Materialized path helpers.
//!
//! Paths are absolute, `/`-separated, and never end with a slash except
//! for the root itself (`/`).

/// Path of every owner's root folder.
pub const ROOT_PATH: &str = "/";

/// Compute a child path from its parent's path and the child's name.
pub fn join(parent: &str, name: &str) -> String {
    if parent == ROOT_PATH || parent.is_empty() {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Parent portion of `path`; the root's parent is the root.
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => ROOT_PATH,
        Some(idx) => &path[..idx],
    }
}

/// Prefix shared by every path strictly below `path`.
pub fn descendant_prefix(path: &str) -> String {
    if path == ROOT_PATH {
        ROOT_PATH.to_string()
    } else {
        format!("{path}/")
    }
}

/// Returns `true` if `candidate` lies strictly below `ancestor`.
pub fn is_descendant_path(candidate: &str, ancestor: &str) -> bool {
    candidate != ancestor && candidate.starts_with(&descendant_prefix(ancestor))
}

/// Replace the `old_prefix` of `path` with `new_prefix`.
///
/// Returns `None` when `path` is neither `old_prefix` itself nor below it.
pub fn rebase(path: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    if path == old_prefix {
        return Some(new_prefix.to_string());
    }
    let rest = path.strip_prefix(&descendant_prefix(old_prefix))?;
    Some(join(new_prefix, rest))
}
