//! Property-based tests for the tree selection machine
//!
//! Drives a `Tree` through random sequences of expand, collapse, select,
//! and remove against a transport that generates a bounded hierarchy on
//! demand, then checks the structural invariants after every step: at most
//! one visible active blob, at most one expanded directory per level, and
//! network fetches tied exactly to unloaded nodes.

use async_trait::async_trait;
use forgekit::error::{Error, Result};
use forgekit::http::{ClientConfig, Transport};
use forgekit::tree::path::descends_from;
use forgekit::tree::{ChildNode, NodeState, Tree, TreeInit, TreeNode};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

const ROOT_TOKEN: &str = "2x0";

fn level_url(token: &str) -> String {
    format!("https://forge.test/api/v1/repos/p/r/git/trees/{}", token)
}

/// Transport that answers every tree listing from its URL alone.
///
/// The token after `/trees/` is `<depth>x<uniq>`: a positive depth yields
/// two subdirectories one level shallower plus two blobs, depth zero yields
/// blobs only. Every distinct node therefore has a distinct URL, and the
/// per-URL fetch counter makes refetches observable.
struct LevelTransport {
    fetches: Mutex<HashMap<String, usize>>,
}

impl LevelTransport {
    fn new() -> Self {
        Self {
            fetches: Mutex::new(HashMap::new()),
        }
    }

    fn fetch_count(&self, url: &str) -> usize {
        self.fetches.lock().get(url).copied().unwrap_or(0)
    }

    fn listing(token: &str) -> Result<Value> {
        let (depth, uniq) = token
            .split_once('x')
            .ok_or_else(|| Error::NotFound(format!("malformed tree token '{}'", token)))?;
        let depth: usize = depth
            .parse()
            .map_err(|_| Error::NotFound(format!("malformed tree depth in '{}'", token)))?;

        let mut rows = Vec::new();
        if depth > 0 {
            for i in 0..2 {
                let child = format!("{}x{}{}", depth - 1, uniq, i);
                rows.push(json!({
                    "path": format!("d{}", i),
                    "type": "tree",
                    "sha": child,
                    "url": level_url(&child),
                }));
            }
        }
        rows.push(json!({"path": "a.md", "type": "blob", "sha": format!("b-{}-a", uniq), "size": 10}));
        rows.push(json!({"path": "b.md", "type": "blob", "sha": format!("b-{}-b", uniq), "size": 11}));
        Ok(json!({"sha": token, "tree": rows, "truncated": false}))
    }
}

#[async_trait]
impl Transport for LevelTransport {
    async fn get(&self, url: &str, _config: &ClientConfig) -> Result<Value> {
        *self.fetches.lock().entry(url.to_string()).or_insert(0) += 1;
        let token = url
            .rsplit('/')
            .next()
            .ok_or_else(|| Error::NotFound(format!("no tree token in '{}'", url)))?;
        Self::listing(token)
    }

    async fn post(&self, url: &str, _payload: &Value, _config: &ClientConfig) -> Result<Value> {
        Err(Error::NotFound(format!("unexpected POST {}", url)))
    }

    async fn put(&self, url: &str, _payload: &Value, _config: &ClientConfig) -> Result<Value> {
        Err(Error::NotFound(format!("unexpected PUT {}", url)))
    }

    async fn patch(&self, url: &str, _payload: &Value, _config: &ClientConfig) -> Result<Value> {
        Err(Error::NotFound(format!("unexpected PATCH {}", url)))
    }

    async fn delete(
        &self,
        url: &str,
        _payload: Option<&Value>,
        _config: &ClientConfig,
    ) -> Result<Value> {
        Err(Error::NotFound(format!("unexpected DELETE {}", url)))
    }
}

/// Everything currently reachable through expanded ancestors.
#[derive(Default)]
struct Visible {
    collapsed_dirs: Vec<String>,
    expanded_dirs: Vec<String>,
    /// (filepath, active flag) per visible blob
    blobs: Vec<(String, bool)>,
}

fn collect_visible(node: &TreeNode, out: &mut Visible) {
    if !node.is_expanded() {
        return;
    }
    for child in node.children() {
        match child {
            ChildNode::Dir(dir) => {
                if dir.is_expanded() {
                    out.expanded_dirs.push(dir.filepath.clone());
                    collect_visible(dir, out);
                } else {
                    out.collapsed_dirs.push(dir.filepath.clone());
                }
            }
            ChildNode::Blob(blob) => out.blobs.push((blob.filepath.clone(), blob.active)),
        }
    }
}

fn visible(tree: &Tree) -> Visible {
    let mut out = Visible::default();
    collect_visible(tree.root(), &mut out);
    out
}

fn assert_single_expanded_child(node: &TreeNode) {
    let expanded = node
        .children()
        .iter()
        .filter_map(|c| c.as_dir())
        .filter(|d| d.is_expanded())
        .count();
    assert!(
        expanded <= 1,
        "node '{}' has {} expanded children",
        node.filepath,
        expanded
    );
    for child in node.children() {
        if let Some(dir) = child.as_dir() {
            assert_single_expanded_child(dir);
        }
    }
}

fn assert_invariants(tree: &Tree) {
    let seen = visible(tree);
    let active: Vec<&str> = seen
        .blobs
        .iter()
        .filter(|(_, active)| *active)
        .map(|(filepath, _)| filepath.as_str())
        .collect();
    assert!(
        active.len() <= 1,
        "more than one visible active blob: {:?}",
        active
    );
    if let Some(&only) = active.first() {
        assert_eq!(tree.active_path(), Some(only));
    }
    assert_single_expanded_child(tree.root());
}

async fn drive(ops: Vec<(u8, usize)>) {
    let transport = Arc::new(LevelTransport::new());
    let shared: Arc<dyn Transport> = transport.clone();
    let mut tree = Tree::new(
        shared,
        ClientConfig::new("https://forge.test"),
        TreeInit::from_url(level_url(ROOT_TOKEN)),
    );

    tree.open().await;
    assert_eq!(tree.root().state(), NodeState::ExpandedPopulated);
    assert_invariants(&tree);

    for (op, pick) in ops {
        let seen = visible(&tree);
        match op {
            // Expand a visible collapsed directory, one level like a click
            0 => {
                if seen.collapsed_dirs.is_empty() {
                    continue;
                }
                let target = seen.collapsed_dirs[pick % seen.collapsed_dirs.len()].clone();
                let node = tree.node(&target).unwrap();
                let url = node.url.clone().unwrap();
                let loaded = node.is_loaded();
                let before = transport.fetch_count(&url);

                tree.expand(&target).await.unwrap();

                let node = tree.node(&target).unwrap();
                assert_eq!(node.state(), NodeState::ExpandedPopulated);
                // A loaded node expands from its cached listing; an
                // unloaded one costs exactly one fetch
                let expected = if loaded { before } else { before + 1 };
                assert_eq!(transport.fetch_count(&url), expected);
            }
            // Collapse an expanded directory; its listing must survive
            1 => {
                if seen.expanded_dirs.is_empty() {
                    continue;
                }
                let target = seen.expanded_dirs[pick % seen.expanded_dirs.len()].clone();
                let entries_before = tree.node(&target).unwrap().entries().len();
                let active_before = tree.active_path().map(String::from);

                tree.collapse(&target);

                let node = tree.node(&target).unwrap();
                assert_eq!(node.state(), NodeState::Collapsed);
                assert!(node.children().is_empty());
                assert!(node.is_loaded());
                assert_eq!(node.entries().len(), entries_before);
                assert_eq!(tree.active_path(), active_before.as_deref());
            }
            // Select a visible blob
            2 => {
                if seen.blobs.is_empty() {
                    continue;
                }
                let target = seen.blobs[pick % seen.blobs.len()].0.clone();
                let already_active = tree.active_path() == Some(target.as_str());

                let changed = tree.select_blob(&target).unwrap();

                assert_eq!(changed, !already_active);
                assert_eq!(tree.active_path(), Some(target.as_str()));
            }
            // Remove any visible entry
            _ => {
                let mut entries: Vec<String> = seen.collapsed_dirs.clone();
                entries.extend(seen.expanded_dirs.iter().cloned());
                entries.extend(seen.blobs.iter().map(|(filepath, _)| filepath.clone()));
                if entries.is_empty() {
                    continue;
                }
                let target = entries[pick % entries.len()].clone();
                let invalidates = tree
                    .active_path()
                    .map(|active| descends_from(active, &target))
                    .unwrap_or(false);
                let active_before = tree.active_path().map(String::from);

                assert!(tree.remove_entry(&target));

                assert!(tree.node(&target).is_none());
                if invalidates {
                    assert_eq!(tree.active_path(), None);
                } else {
                    assert_eq!(tree.active_path(), active_before.as_deref());
                }
            }
        }
        assert_invariants(&tree);
    }

    // The root node is never destroyed, so its listing loads exactly once
    assert_eq!(transport.fetch_count(&level_url(ROOT_TOKEN)), 1);
}

/// Test that random op sequences keep the selection invariants
#[test]
fn test_selection_machine_invariants_property() {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &proptest::collection::vec((0..4u8, 0..16usize), 1..40),
            |ops| {
                rt.block_on(drive(ops));
                Ok(())
            },
        )
        .unwrap();
}

/// Test that the visibility walk sees exactly what expansion reveals
#[tokio::test]
async fn test_visible_walk_tracks_expansion() {
    let transport = Arc::new(LevelTransport::new());
    let shared: Arc<dyn Transport> = transport.clone();
    let mut tree = Tree::new(
        shared,
        ClientConfig::new("https://forge.test"),
        TreeInit::from_url(level_url(ROOT_TOKEN)),
    );

    tree.open().await;
    let seen = visible(&tree);
    assert_eq!(seen.collapsed_dirs, vec!["d0", "d1"]);
    assert!(seen.expanded_dirs.is_empty());
    assert_eq!(seen.blobs.len(), 2);

    tree.expand("d0").await.unwrap();
    let seen = visible(&tree);
    assert_eq!(seen.expanded_dirs, vec!["d0"]);
    assert_eq!(seen.collapsed_dirs, vec!["d0/d0", "d0/d1", "d1"]);
    assert_eq!(seen.blobs.len(), 4);
}
