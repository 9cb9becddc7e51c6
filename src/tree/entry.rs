//! Tree listing entries and their wire form.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

/// What a listing row points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Tree,
    Blob,
}

/// One row of a directory listing
///
/// Immutable once parsed; `path` is the entry's name within its parent
/// listing and uniquely identifies it there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl TreeEntry {
    pub fn tree(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Tree,
            sha: None,
            url: None,
            size: None,
        }
    }

    pub fn blob(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Blob,
            sha: None,
            url: None,
            size: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_sha(mut self, sha: impl Into<String>) -> Self {
        self.sha = Some(sha.into());
        self
    }

    pub fn is_tree(&self) -> bool {
        self.kind == EntryKind::Tree
    }
}

/// Optional ordering applied to a fetched listing; applied with a stable
/// sort, so equal entries keep server order.
pub type Comparer = Arc<dyn Fn(&TreeEntry, &TreeEntry) -> Ordering + Send + Sync>;

/// Comparer that lists directories before files, each group alphabetical.
pub fn dirs_first_comparer() -> Comparer {
    Arc::new(|a: &TreeEntry, b: &TreeEntry| match (a.kind, b.kind) {
        (EntryKind::Tree, EntryKind::Blob) => Ordering::Less,
        (EntryKind::Blob, EntryKind::Tree) => Ordering::Greater,
        _ => a.path.cmp(&b.path),
    })
}

/// Listing row as the forge returns it; `type` is an open string on the
/// wire, so conversion decides which rows survive.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl RawTreeEntry {
    /// Convert a wire row, dropping kinds this toolkit does not model
    /// (submodule commits and the like).
    pub fn into_entry(self) -> Option<TreeEntry> {
        let kind = match self.kind.as_str() {
            "tree" => EntryKind::Tree,
            "blob" => EntryKind::Blob,
            other => {
                tracing::warn!(path = %self.path, kind = %other, "dropping unsupported tree entry");
                return None;
            }
        };
        Some(TreeEntry {
            path: self.path,
            kind,
            sha: self.sha,
            url: self.url,
            size: self.size,
        })
    }
}
