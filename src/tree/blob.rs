//! Blob leaves and the descriptor selection events carry.

use crate::tree::entry::TreeEntry;
use serde::{Deserialize, Serialize};

/// Everything a consumer needs to open the selected file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobDescriptor {
    /// Entry name within its parent listing
    pub path: String,
    /// Full path from the tree root
    pub filepath: String,
    pub sha: Option<String>,
    pub url: Option<String>,
    pub size: Option<u64>,
    /// Branch the enclosing tree was opened on
    pub branch: Option<String>,
}

/// Leaf node for a single file
#[derive(Debug, Clone)]
pub struct BlobNode {
    pub path: String,
    pub filepath: String,
    pub sha: Option<String>,
    pub url: Option<String>,
    pub size: Option<u64>,
    /// Whether this blob is the one active selection in the hierarchy
    pub active: bool,
}

impl BlobNode {
    pub fn from_entry(entry: &TreeEntry, filepath: String, active: bool) -> Self {
        Self {
            path: entry.path.clone(),
            filepath,
            sha: entry.sha.clone(),
            url: entry.url.clone(),
            size: entry.size,
            active,
        }
    }

    pub fn descriptor(&self, branch: Option<&str>) -> BlobDescriptor {
        BlobDescriptor {
            path: self.path.clone(),
            filepath: self.filepath.clone(),
            sha: self.sha.clone(),
            url: self.url.clone(),
            size: self.size,
            branch: branch.map(|b| b.to_string()),
        }
    }
}
