//! Repository tree browsing.
//!
//! A `Tree` is the root of a lazily-expanded directory hierarchy: one level
//! is fetched when first expanded, nested directories fetch on demand, and
//! exactly one blob across the whole hierarchy can be the active selection.
//! Consumers drive it with `open`/`expand`/`collapse`/`select_blob` and
//! drain typed `TreeEvent`s; nothing here renders.

pub mod blob;
pub mod entry;
pub mod fetch;
pub mod node;
pub mod path;
pub mod selection;

pub use blob::{BlobDescriptor, BlobNode};
pub use entry::{dirs_first_comparer, Comparer, EntryKind, RawTreeEntry, TreeEntry};
pub use fetch::{fetch_tree, TreePage};
pub use node::{ChildNode, ExpandAction, NodeState, TreeNode};
pub use selection::{SelectionState, TreeEvent};

use crate::api::Repository;
use crate::error::{Error, Result};
use crate::http::{ClientConfig, Transport};
use futures::future;
use std::sync::Arc;

/// Everything needed to root a tree
pub struct TreeInit {
    /// Eager entries; a non-empty listing skips the root fetch entirely
    pub entries: Vec<TreeEntry>,
    /// Root listing URL, absolute or server-relative
    pub url: Option<String>,
    /// Depth of the root listing; 2 under the repository convention
    pub depth: usize,
    /// Branch the tree is opened on, carried into blob descriptors
    pub branch: Option<String>,
    /// Previously active blob to reopen to
    pub active_blob: Option<String>,
    /// Listing order, applied after every fetch
    pub comparer: Option<Comparer>,
}

impl Default for TreeInit {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            url: None,
            depth: 2,
            branch: None,
            active_blob: None,
            comparer: None,
        }
    }
}

impl TreeInit {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn from_entries(entries: Vec<TreeEntry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    /// Root the tree at a repository's branch (or its default branch).
    pub fn repository(
        config: &ClientConfig,
        repository: &Repository,
        reference: Option<&str>,
    ) -> Self {
        let branch = reference.map(str::to_string).or_else(|| {
            if repository.default_branch.is_empty() {
                None
            } else {
                Some(repository.default_branch.clone())
            }
        });
        let url = config.api_url(&repository.tree_path(branch.as_deref().unwrap_or("HEAD")));
        Self {
            url: Some(url),
            branch,
            ..Self::default()
        }
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_active_blob(mut self, filepath: impl Into<String>) -> Self {
        self.active_blob = Some(filepath.into());
        self
    }

    pub fn with_comparer(mut self, comparer: Comparer) -> Self {
        self.comparer = Some(comparer);
        self
    }
}

/// Root controller of one repository tree
pub struct Tree {
    root: TreeNode,
    transport: Arc<dyn Transport>,
    config: ClientConfig,
    comparer: Option<Comparer>,
    branch: Option<String>,
    selection: SelectionState,
    epoch: u64,
}

impl Tree {
    pub fn new(transport: Arc<dyn Transport>, config: ClientConfig, init: TreeInit) -> Self {
        let selection = SelectionState::new(init.active_blob.clone());
        let root = TreeNode::new(
            init.entries,
            init.url,
            init.depth,
            String::new(),
            false,
            init.active_blob.as_deref(),
        );
        Self {
            root,
            transport,
            config,
            comparer: init.comparer,
            branch: init.branch,
            selection,
            epoch: 0,
        }
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    /// Filepath of the active blob, if any.
    pub fn active_path(&self) -> Option<&str> {
        self.selection.active_path()
    }

    /// Descriptor of the active blob, when its node is currently built.
    pub fn active_descriptor(&self) -> Option<BlobDescriptor> {
        let active = self.selection.active_path()?;
        let (parent_path, segment) = path::parent_and_segment(active);
        let parent = self.node(parent_path)?;
        let blob = parent.child(segment)?.as_blob()?;
        Some(blob.descriptor(self.branch.as_deref()))
    }

    /// Next still-relevant event, superseded ones silently dropped.
    pub fn poll_event(&mut self) -> Option<TreeEvent> {
        self.selection.poll()
    }

    pub fn take_events(&mut self) -> Vec<TreeEvent> {
        self.selection.take_events()
    }

    /// Node at a root-relative filepath; `""` is the root. Returns nodes
    /// only while their ancestors are expanded.
    pub fn node(&self, filepath: &str) -> Option<&TreeNode> {
        let mut current = &self.root;
        if filepath.is_empty() {
            return Some(current);
        }
        for segment in filepath.split('/') {
            current = current.child(segment)?.as_dir()?;
        }
        Some(current)
    }

    fn node_mut(&mut self, filepath: &str) -> Option<&mut TreeNode> {
        let mut current = &mut self.root;
        if filepath.is_empty() {
            return Some(current);
        }
        for segment in filepath.split('/') {
            current = current.child_mut(segment)?.as_dir_mut()?;
        }
        Some(current)
    }

    /// Expand the root and reopen the path to a previously active blob.
    pub async fn open(&mut self) {
        self.expand_node("").await;
        if let Some(active) = self.selection.active_path().map(String::from) {
            let (dirs, _) = path::parent_and_segment(&active);
            if !dirs.is_empty() {
                for prefix in path::prefixes(dirs) {
                    self.expand_node(&prefix).await;
                }
            }
        }
    }

    /// Select and expand the directory at `filepath`, expanding collapsed
    /// ancestors on the way down.
    pub async fn expand(&mut self, filepath: &str) -> Result<()> {
        if !filepath.is_empty() {
            let (parent_path, segment) = path::parent_and_segment(filepath);
            for prefix in path::prefixes(parent_path) {
                self.expand_node(&prefix).await;
            }
            match self.node_mut(parent_path) {
                Some(parent) => {
                    if parent.child(segment).and_then(|c| c.as_dir()).is_none() {
                        return Err(Error::NotFound(format!(
                            "no directory '{}' under '{}'",
                            segment, parent_path
                        )));
                    }
                    parent.select_child(segment);
                }
                None => {
                    return Err(Error::NotFound(format!(
                        "directory '{}' is not reachable",
                        parent_path
                    )))
                }
            }
        }
        self.expand_node(filepath).await;
        Ok(())
    }

    /// Collapse the directory at `filepath`. Its listing survives; its child
    /// nodes do not.
    pub fn collapse(&mut self, filepath: &str) {
        if let Some(node) = self.node_mut(filepath) {
            node.collapse();
        }
    }

    /// Make the blob at `filepath` the active selection.
    ///
    /// The parent directory must already be expanded (a blob is only
    /// selectable once visible). Returns whether the active selection
    /// changed; re-selecting the active blob reports false and emits no
    /// event.
    pub fn select_blob(&mut self, filepath: &str) -> Result<bool> {
        let previous = self.selection.active_path().map(String::from);
        let branch = self.branch.clone();
        let (parent_path, segment) = path::parent_and_segment(filepath);

        let descriptor = {
            let parent = match self.node_mut(parent_path) {
                Some(parent) => parent,
                None => {
                    return Err(Error::NotFound(format!(
                        "directory '{}' is not expanded",
                        parent_path
                    )))
                }
            };
            if parent.child(segment).and_then(|c| c.as_blob()).is_none() {
                return Err(Error::NotFound(format!(
                    "no file '{}' under '{}'",
                    segment, parent_path
                )));
            }
            parent.select_child(segment);
            let blob = match parent.child_mut(segment).and_then(|c| c.as_blob_mut()) {
                Some(blob) => blob,
                None => {
                    return Err(Error::NotFound(format!(
                        "no file '{}' under '{}'",
                        segment, parent_path
                    )))
                }
            };
            blob.active = true;
            blob.descriptor(branch.as_deref())
        };

        let changed = self.selection.select(descriptor);
        if changed {
            if let Some(previous_path) = previous {
                if previous_path != filepath {
                    self.deactivate_blob(&previous_path);
                }
            }
        }
        Ok(changed)
    }

    /// Drop the entry at `filepath` from its parent listing, typically after
    /// a successful remote delete. Clears the active selection when it
    /// pointed into the removed subtree.
    pub fn remove_entry(&mut self, filepath: &str) -> bool {
        let (parent_path, segment) = path::parent_and_segment(filepath);
        let removed = match self.node_mut(parent_path) {
            Some(parent) => parent.remove_entry(segment),
            None => false,
        };
        if removed {
            let invalidated = self
                .selection
                .active_path()
                .map(|active| path::descends_from(active, filepath))
                .unwrap_or(false);
            if invalidated {
                self.selection.clear();
            }
        }
        removed
    }

    /// Expand every directory, level by level, sibling fetches in flight
    /// together. `max_depth` counts levels below the root listing.
    pub async fn expand_all(&mut self, max_depth: Option<usize>) {
        self.expand_node("").await;
        let mut frontier = self.dir_children("", max_depth);

        while !frontier.is_empty() {
            let mut next = Vec::new();
            let mut tickets = Vec::new();

            for filepath in &frontier {
                self.epoch += 1;
                let epoch = self.epoch;
                let active = self.selection.active_path().map(String::from);
                let action = match self.node_mut(filepath) {
                    Some(node) => node.begin_expand(epoch, active.as_deref()),
                    None => continue,
                };
                match action {
                    ExpandAction::Fetch { url, epoch } => {
                        tickets.push((filepath.clone(), url, epoch))
                    }
                    ExpandAction::Ready => next.extend(self.dir_children(filepath, max_depth)),
                    ExpandAction::InFlight => {}
                }
            }

            for filepath in self.run_fetch_wave(tickets).await {
                next.extend(self.dir_children(&filepath, max_depth));
            }

            frontier = next;
        }
    }

    /// Re-fetch every expanded listing from the server.
    ///
    /// The root listing is invalidated and refetched first; each directory
    /// that was expanded before the refresh and survives the fresh listings
    /// is expanded again from new data, waves of sibling fetches in flight
    /// together. The active selection is restored the way reopening restores
    /// it. A tree rooted on eager entries has no listing URL and is left
    /// untouched.
    pub async fn refresh_expanded(&mut self) {
        if self.root.url.is_none() {
            return;
        }
        let levels = self.expanded_levels();
        if levels.is_empty() {
            return;
        }

        self.root.invalidate();
        self.expand_node("").await;

        for level in levels.into_iter().skip(1) {
            let mut tickets = Vec::new();
            for filepath in level {
                self.epoch += 1;
                let epoch = self.epoch;
                let active = self.selection.active_path().map(String::from);
                let action = match self.node_mut(&filepath) {
                    Some(node) => node.begin_expand(epoch, active.as_deref()),
                    None => continue,
                };
                if let ExpandAction::Fetch { url, epoch } = action {
                    tickets.push((filepath, url, epoch));
                }
            }
            self.run_fetch_wave(tickets).await;
        }
    }

    /// Run one wave of listing fetches concurrently, each node applying only
    /// its own result. Returns the filepaths whose listings were applied.
    async fn run_fetch_wave(&mut self, tickets: Vec<(String, String, u64)>) -> Vec<String> {
        let transport = Arc::clone(&self.transport);
        let config = self.config.clone();
        let comparer = self.comparer.clone();
        let fetches = tickets.into_iter().map(|(filepath, url, epoch)| {
            let transport = Arc::clone(&transport);
            let config = config.clone();
            let comparer = comparer.clone();
            async move {
                let listing = fetch_level_soft(transport.as_ref(), &config, &url, &comparer).await;
                (filepath, epoch, listing)
            }
        });

        let mut applied = Vec::new();
        for (filepath, epoch, listing) in future::join_all(fetches).await {
            let active = self.selection.active_path().map(String::from);
            let ok = match self.node_mut(&filepath) {
                Some(node) => node.apply_listing(epoch, listing, active.as_deref()).is_ok(),
                None => false,
            };
            if ok {
                applied.push(filepath);
            }
        }
        applied
    }

    /// Expanded directory filepaths, one vec per level, the root level first.
    fn expanded_levels(&self) -> Vec<Vec<String>> {
        if !self.root.is_expanded() {
            return Vec::new();
        }
        let mut levels = Vec::new();
        let mut current = vec![String::new()];
        while !current.is_empty() {
            let mut next = Vec::new();
            for filepath in &current {
                if let Some(node) = self.node(filepath) {
                    next.extend(
                        node.children()
                            .iter()
                            .filter_map(|child| child.as_dir())
                            .filter(|dir| dir.is_expanded())
                            .map(|dir| dir.filepath.clone()),
                    );
                }
            }
            levels.push(current);
            current = next;
        }
        levels
    }

    async fn expand_node(&mut self, filepath: &str) {
        self.epoch += 1;
        let epoch = self.epoch;
        let active = self.selection.active_path().map(String::from);
        let action = match self.node_mut(filepath) {
            Some(node) => node.begin_expand(epoch, active.as_deref()),
            None => return,
        };
        if let ExpandAction::Fetch { url, epoch } = action {
            let listing =
                fetch_level_soft(self.transport.as_ref(), &self.config, &url, &self.comparer).await;
            let active = self.selection.active_path().map(String::from);
            if let Some(node) = self.node_mut(filepath) {
                if let Err(err) = node.apply_listing(epoch, listing, active.as_deref()) {
                    tracing::debug!(filepath = %filepath, error = %err, "discarded stale listing");
                }
            }
        }
    }

    fn deactivate_blob(&mut self, filepath: &str) {
        let (parent_path, segment) = path::parent_and_segment(filepath);
        if let Some(parent) = self.node_mut(parent_path) {
            if let Some(blob) = parent.child_mut(segment).and_then(|c| c.as_blob_mut()) {
                blob.active = false;
            }
        }
    }

    fn dir_children(&self, filepath: &str, max_depth: Option<usize>) -> Vec<String> {
        let root_depth = self.root.depth;
        match self.node(filepath) {
            Some(parent) => parent
                .children()
                .iter()
                .filter_map(|child| child.as_dir())
                .filter(|dir| {
                    let level = dir.depth.saturating_sub(root_depth);
                    max_depth.map(|max| level <= max).unwrap_or(true)
                })
                .map(|dir| dir.filepath.clone())
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Fetch one level, folding failures into an empty listing. An unreadable
/// directory and an empty one look the same to the tree.
async fn fetch_level_soft(
    transport: &dyn Transport,
    config: &ClientConfig,
    url: &str,
    comparer: &Option<Comparer>,
) -> Vec<TreeEntry> {
    match fetch::fetch_tree(transport, config, url, comparer.as_ref()).await {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(url = %url, error = %err, "tree listing failed, treating as empty");
            Vec::new()
        }
    }
}
