//! Root-relative filepath helpers.
//!
//! Filepaths in this module are `/`-separated and relative to the tree root;
//! the root itself is the empty string. A node's depth relates to its
//! filepath: the root listing sits at depth 2 (depth 1 is the enclosing
//! repository), so a node at depth `d` has `d - 2` segments and its selected
//! child corresponds to segment `d - 2` of the active blob's filepath.

/// Join a parent filepath with a child segment.
pub fn join_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{}/{}", parent, segment)
    }
}

/// Split a filepath into its parent and final segment.
pub fn parent_and_segment(filepath: &str) -> (&str, &str) {
    match filepath.rsplit_once('/') {
        Some((parent, segment)) => (parent, segment),
        None => ("", filepath),
    }
}

/// All prefixes of a filepath from the root down, the target included:
/// `"a/b/c"` yields `["", "a", "a/b", "a/b/c"]`.
pub fn prefixes(filepath: &str) -> Vec<String> {
    let mut out = vec![String::new()];
    if filepath.is_empty() {
        return out;
    }
    let mut acc = String::new();
    for segment in filepath.split('/') {
        acc = join_path(&acc, segment);
        out.push(acc.clone());
    }
    out
}

/// Segment of `filepath` a node at `depth` remembers as its selected child.
/// Undefined below depth 2, where no enclosing repository segment exists.
pub fn segment_at_depth(filepath: &str, depth: usize) -> Option<&str> {
    if depth < 2 {
        return None;
    }
    filepath.split('/').nth(depth - 2)
}

/// Whether `filepath` lies inside the subtree rooted at `ancestor`.
pub fn descends_from(filepath: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() {
        return true;
    }
    filepath == ancestor
        || filepath
            .strip_prefix(ancestor)
            .map(|rest| rest.starts_with('/'))
            .unwrap_or(false)
}
