//! Directory node state machine.
//!
//! A `TreeNode` is one lazily-populated directory level. Expansion is split
//! into two halves so the fetch can happen anywhere: `begin_expand` registers
//! intent and hands back a fetch ticket when one level must be loaded, and
//! `apply_listing` installs the result if the ticket is still current. A
//! completion whose epoch no longer matches is reported as stale and must be
//! discarded by the caller, never applied.
//!
//! Collapse destroys child nodes but keeps the node's own `entries`, so
//! re-expanding the same node never refetches. When an ancestor collapses,
//! this node is destroyed with it, and a later rebuild starts empty.

use crate::error::{Error, Result};
use crate::tree::blob::BlobNode;
use crate::tree::entry::{EntryKind, TreeEntry};
use crate::tree::path;

/// Expansion lifecycle of one directory level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Collapsed,
    /// A listing fetch stamped with `epoch` is in flight
    Expanding { epoch: u64 },
    ExpandedEmpty,
    ExpandedPopulated,
}

/// What the caller must do after `begin_expand`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandAction {
    /// Fetch one level from `url` and feed it back with `epoch`
    Fetch { url: String, epoch: u64 },
    /// The node is expanded; nothing to fetch
    Ready,
    /// A fetch is already in flight; do not issue another
    InFlight,
}

/// A node's child: either a nested directory or a file leaf
#[derive(Debug, Clone)]
pub enum ChildNode {
    Dir(TreeNode),
    Blob(BlobNode),
}

impl ChildNode {
    /// Entry name of this child within its parent's listing.
    pub fn segment(&self) -> &str {
        match self {
            ChildNode::Dir(node) => path::parent_and_segment(&node.filepath).1,
            ChildNode::Blob(blob) => &blob.path,
        }
    }

    pub fn as_dir(&self) -> Option<&TreeNode> {
        match self {
            ChildNode::Dir(node) => Some(node),
            ChildNode::Blob(_) => None,
        }
    }

    pub fn as_dir_mut(&mut self) -> Option<&mut TreeNode> {
        match self {
            ChildNode::Dir(node) => Some(node),
            ChildNode::Blob(_) => None,
        }
    }

    pub fn as_blob(&self) -> Option<&BlobNode> {
        match self {
            ChildNode::Dir(_) => None,
            ChildNode::Blob(blob) => Some(blob),
        }
    }

    pub fn as_blob_mut(&mut self) -> Option<&mut BlobNode> {
        match self {
            ChildNode::Dir(_) => None,
            ChildNode::Blob(blob) => Some(blob),
        }
    }
}

/// One directory level of the tree
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Root-relative path; empty at the root
    pub filepath: String,
    /// Depth in the hierarchy; the root listing sits at depth 2
    pub depth: usize,
    /// Listing URL; absent for nodes constructed with eager entries
    pub url: Option<String>,
    entries: Vec<TreeEntry>,
    state: NodeState,
    /// Set once a listing completed, even an empty or failed one
    loaded: bool,
    selected_child: Option<String>,
    children: Vec<ChildNode>,
}

impl TreeNode {
    /// Build a node from eager entries or a listing URL.
    ///
    /// A node constructed selected with eager entries starts expanded; one
    /// without entries stays collapsed until `begin_expand` drives a fetch.
    /// When the active blob's path runs through this node, the matching
    /// child starts out remembered as selected, which is what lets a fresh
    /// tree reopen straight to a previously active blob.
    pub fn new(
        entries: Vec<TreeEntry>,
        url: Option<String>,
        depth: usize,
        filepath: String,
        selected: bool,
        active_path: Option<&str>,
    ) -> Self {
        let loaded = !entries.is_empty();
        let selected_child = derive_selected_child(&filepath, depth, active_path);
        let mut node = Self {
            filepath,
            depth,
            url,
            entries,
            state: NodeState::Collapsed,
            loaded,
            selected_child,
            children: Vec::new(),
        };
        if selected && !node.entries.is_empty() {
            node.state = NodeState::ExpandedPopulated;
            node.build_children(active_path);
        }
        node
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn selected_child(&self) -> Option<&str> {
        self.selected_child.as_deref()
    }

    pub fn children(&self) -> &[ChildNode] {
        &self.children
    }

    pub fn is_expanded(&self) -> bool {
        matches!(
            self.state,
            NodeState::ExpandedEmpty | NodeState::ExpandedPopulated
        )
    }

    pub fn child(&self, segment: &str) -> Option<&ChildNode> {
        self.children.iter().find(|c| c.segment() == segment)
    }

    pub fn child_mut(&mut self, segment: &str) -> Option<&mut ChildNode> {
        self.children.iter_mut().find(|c| c.segment() == segment)
    }

    /// Move toward expanded, fetching at most once.
    ///
    /// Exactly one `Fetch` ticket is issued per transition into `Expanding`;
    /// repeated calls while in flight return `InFlight`, and a node whose
    /// listing already completed reuses it without a new fetch.
    pub fn begin_expand(&mut self, epoch: u64, active_path: Option<&str>) -> ExpandAction {
        match self.state {
            NodeState::Expanding { .. } => ExpandAction::InFlight,
            NodeState::ExpandedEmpty | NodeState::ExpandedPopulated => ExpandAction::Ready,
            NodeState::Collapsed => {
                if !self.entries.is_empty() {
                    self.state = NodeState::ExpandedPopulated;
                    if self.children.is_empty() {
                        self.build_children(active_path);
                    }
                    ExpandAction::Ready
                } else if self.loaded {
                    self.state = NodeState::ExpandedEmpty;
                    ExpandAction::Ready
                } else if let Some(url) = self.url.clone() {
                    self.state = NodeState::Expanding { epoch };
                    ExpandAction::Fetch { url, epoch }
                } else {
                    // No entries and nowhere to fetch from: expand empty
                    self.loaded = true;
                    self.state = NodeState::ExpandedEmpty;
                    ExpandAction::Ready
                }
            }
        }
    }

    /// Install a fetched listing if its ticket is still current.
    ///
    /// A mismatched epoch, or a node that left `Expanding` (collapsed while
    /// the fetch was in flight), rejects the listing as stale.
    pub fn apply_listing(
        &mut self,
        epoch: u64,
        entries: Vec<TreeEntry>,
        active_path: Option<&str>,
    ) -> Result<()> {
        match self.state {
            NodeState::Expanding { epoch: current } if current == epoch => {
                self.entries = entries;
                self.loaded = true;
                if self.entries.is_empty() {
                    self.state = NodeState::ExpandedEmpty;
                } else {
                    self.state = NodeState::ExpandedPopulated;
                    self.build_children(active_path);
                }
                Ok(())
            }
            NodeState::Expanding { epoch: current } => Err(Error::StaleSelection(format!(
                "listing epoch {} superseded by epoch {} on '{}'",
                epoch, current, self.filepath
            ))),
            _ => Err(Error::StaleSelection(format!(
                "listing epoch {} arrived after '{}' left the expanding state",
                epoch, self.filepath
            ))),
        }
    }

    /// Collapse this level. Children are destroyed; `entries`, the loaded
    /// flag, and the remembered child survive for re-expansion.
    pub fn collapse(&mut self) {
        self.children.clear();
        self.state = NodeState::Collapsed;
    }

    /// Drop the cached listing along with the children built from it, so the
    /// next expansion fetches fresh data. The remembered child survives,
    /// letting the rebuilt level reopen the way a fresh tree does.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.children.clear();
        self.loaded = false;
        self.state = NodeState::Collapsed;
    }

    /// Remember `segment` as this node's selected child, replacing the prior
    /// one. The previously selected directory collapses; a previously active
    /// blob loses its active flag. Siblings at other depths are untouched.
    pub fn select_child(&mut self, segment: &str) {
        if self.selected_child.as_deref() == Some(segment) {
            return;
        }
        if let Some(prior) = self.selected_child.take() {
            if let Some(child) = self.child_mut(&prior) {
                match child {
                    ChildNode::Dir(dir) => dir.collapse(),
                    ChildNode::Blob(blob) => blob.active = false,
                }
            }
        }
        self.selected_child = Some(segment.to_string());
    }

    /// Drop the entry named `segment` from this listing, along with its
    /// child node. Returns false when no such entry exists.
    pub fn remove_entry(&mut self, segment: &str) -> bool {
        let index = match self.entries.iter().position(|e| e.path == segment) {
            Some(index) => index,
            None => return false,
        };
        self.entries.remove(index);
        self.children.retain(|c| c.segment() != segment);
        if self.selected_child.as_deref() == Some(segment) {
            self.selected_child = None;
        }
        if self.entries.is_empty() && self.state == NodeState::ExpandedPopulated {
            self.state = NodeState::ExpandedEmpty;
        }
        true
    }

    fn build_children(&mut self, active_path: Option<&str>) {
        self.children = self
            .entries
            .iter()
            .map(|entry| {
                let filepath = path::join_path(&self.filepath, &entry.path);
                match entry.kind {
                    EntryKind::Tree => ChildNode::Dir(TreeNode::new(
                        Vec::new(),
                        entry.url.clone(),
                        self.depth + 1,
                        filepath,
                        false,
                        active_path,
                    )),
                    EntryKind::Blob => {
                        let active = active_path == Some(filepath.as_str());
                        ChildNode::Blob(BlobNode::from_entry(entry, filepath, active))
                    }
                }
            })
            .collect();
    }
}

fn derive_selected_child(
    filepath: &str,
    depth: usize,
    active_path: Option<&str>,
) -> Option<String> {
    let active = active_path?;
    if !path::descends_from(active, filepath) {
        return None;
    }
    path::segment_at_depth(active, depth).map(|s| s.to_string())
}
