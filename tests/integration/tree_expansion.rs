//! Full-flow tests for lazy tree expansion
//!
//! Drives a `Tree` rooted at a repository through open, nested expansion,
//! collapse, and re-expansion, and checks that each directory level is
//! fetched at most once.

use super::support::{
    blob_row, client_config, dir_row, repository_json, tree_page, ScriptedTransport, SERVER,
};
use forgekit::api::Repository;
use forgekit::tree::{dirs_first_comparer, NodeState, Tree, TreeInit};
use std::sync::Arc;

fn repository(branch: &str) -> Repository {
    serde_json::from_value(repository_json("door43", "en_obs", branch, true)).unwrap()
}

fn root_url(reference: &str) -> String {
    format!("{}/api/v1/repos/door43/en_obs/git/trees/{}", SERVER, reference)
}

fn subtree_url(sha: &str) -> String {
    format!("{}/api/v1/repos/door43/en_obs/git/trees/{}", SERVER, sha)
}

fn browse_tree(transport: &Arc<ScriptedTransport>, reference: Option<&str>) -> Tree {
    let config = client_config();
    let repository = repository("master");
    let init = TreeInit::repository(&config, &repository, reference)
        .with_comparer(dirs_first_comparer());
    let transport: Arc<dyn forgekit::http::Transport> = transport.clone();
    Tree::new(transport, config, init)
}

#[tokio::test]
async fn test_open_fetches_only_the_root_level() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.script(
        "GET",
        &root_url("master"),
        Ok(tree_page(
            "root-sha",
            serde_json::json!([
                blob_row("README.md", "blob-1"),
                dir_row("content", &subtree_url("sha-content")),
            ]),
        )),
    );

    let mut tree = browse_tree(&transport, None);
    tree.open().await;

    assert!(tree.root().is_expanded());
    // Directories sort ahead of blobs under the dirs-first comparer
    let names: Vec<&str> = tree.root().children().iter().map(|c| c.segment()).collect();
    assert_eq!(names, vec!["content", "README.md"]);
    assert_eq!(transport.call_count("GET", &root_url("master")), 1);
    assert_eq!(transport.call_count("GET", &subtree_url("sha-content")), 0);
}

#[tokio::test]
async fn test_nested_expansion_fetches_one_level_per_step() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.script(
        "GET",
        &root_url("master"),
        Ok(tree_page(
            "root-sha",
            serde_json::json!([dir_row("content", &subtree_url("sha-content"))]),
        )),
    );
    transport.script(
        "GET",
        &subtree_url("sha-content"),
        Ok(tree_page(
            "sha-content",
            serde_json::json!([
                dir_row("img", &subtree_url("sha-img")),
                blob_row("01.md", "blob-01"),
            ]),
        )),
    );

    let mut tree = browse_tree(&transport, None);
    tree.open().await;
    tree.expand("content").await.unwrap();

    let content = tree.node("content").unwrap();
    assert!(content.is_expanded());
    assert_eq!(content.children().len(), 2);
    // The nested "img" directory was listed but not fetched
    assert_eq!(transport.call_count("GET", &subtree_url("sha-img")), 0);
}

#[tokio::test]
async fn test_collapse_keeps_listing_and_reexpand_skips_refetch() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.script(
        "GET",
        &root_url("master"),
        Ok(tree_page(
            "root-sha",
            serde_json::json!([dir_row("content", &subtree_url("sha-content"))]),
        )),
    );
    transport.script(
        "GET",
        &subtree_url("sha-content"),
        Ok(tree_page(
            "sha-content",
            serde_json::json!([blob_row("01.md", "blob-01"), blob_row("02.md", "blob-02")]),
        )),
    );

    let mut tree = browse_tree(&transport, None);
    tree.open().await;
    tree.expand("content").await.unwrap();

    tree.collapse("content");
    let content = tree.node("content").unwrap();
    assert_eq!(content.state(), NodeState::Collapsed);
    assert!(content.children().is_empty());
    assert_eq!(content.entries().len(), 2);

    tree.expand("content").await.unwrap();
    let content = tree.node("content").unwrap();
    assert!(content.is_expanded());
    assert_eq!(content.children().len(), 2);
    assert_eq!(transport.call_count("GET", &subtree_url("sha-content")), 1);
}

#[tokio::test]
async fn test_expand_all_respects_depth_limit() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.script(
        "GET",
        &root_url("master"),
        Ok(tree_page(
            "root-sha",
            serde_json::json!([
                dir_row("a", &subtree_url("sha-a")),
                blob_row("root.md", "blob-root"),
            ]),
        )),
    );
    transport.script(
        "GET",
        &subtree_url("sha-a"),
        Ok(tree_page(
            "sha-a",
            serde_json::json!([
                dir_row("b", &subtree_url("sha-b")),
                blob_row("a1.md", "blob-a1"),
            ]),
        )),
    );

    let mut tree = browse_tree(&transport, None);
    tree.expand_all(Some(1)).await;

    assert!(tree.node("a").unwrap().is_expanded());
    assert_eq!(transport.call_count("GET", &subtree_url("sha-a")), 1);
    // Depth 1 stops above "a/b"
    assert_eq!(transport.call_count("GET", &subtree_url("sha-b")), 0);
}

#[tokio::test]
async fn test_explicit_reference_overrides_default_branch() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.script(
        "GET",
        &root_url("develop"),
        Ok(tree_page("dev-sha", serde_json::json!([]))),
    );

    let mut tree = browse_tree(&transport, Some("develop"));
    tree.open().await;

    assert_eq!(tree.branch(), Some("develop"));
    assert_eq!(transport.call_count("GET", &root_url("develop")), 1);
    assert_eq!(transport.call_count("GET", &root_url("master")), 0);
}

#[tokio::test]
async fn test_failed_root_fetch_degrades_to_empty_listing() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.script(
        "GET",
        &root_url("master"),
        Err(forgekit::error::Error::NotFound("no such tree".into())),
    );

    let mut tree = browse_tree(&transport, None);
    tree.open().await;

    assert!(tree.root().is_expanded());
    assert!(tree.root().children().is_empty());
}
