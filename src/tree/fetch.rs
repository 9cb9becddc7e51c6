//! One-level tree listing fetch.

use crate::error::Result;
use crate::http::{ClientConfig, Transport};
use crate::tree::entry::{Comparer, RawTreeEntry, TreeEntry};
use serde::Deserialize;

/// Git tree page as the forge returns it; `tree` is null for empty trees
#[derive(Debug, Clone, Deserialize)]
pub struct TreePage {
    pub sha: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub tree: Option<Vec<RawTreeEntry>>,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub total_count: Option<i64>,
}

/// Fetch one directory level.
///
/// `url` may be absolute (as listings embed) or relative to the configured
/// server. Rows of unsupported kinds are dropped during conversion; the
/// optional comparer reorders the survivors with a stable sort, so equal
/// entries keep server order.
pub async fn fetch_tree(
    transport: &dyn Transport,
    config: &ClientConfig,
    url: &str,
    comparer: Option<&Comparer>,
) -> Result<Vec<TreeEntry>> {
    let resolved = config.resolve(url);
    let value = transport.get(&resolved, config).await?;
    let page: TreePage = serde_json::from_value(value)?;

    if page.truncated {
        tracing::warn!(url = %resolved, "tree listing truncated by the server");
    }

    let mut entries: Vec<TreeEntry> = page
        .tree
        .unwrap_or_default()
        .into_iter()
        .filter_map(RawTreeEntry::into_entry)
        .collect();

    if let Some(comparer) = comparer {
        entries.sort_by(|a, b| comparer(a, b));
    }

    tracing::debug!(url = %resolved, count = entries.len(), "fetched tree level");
    Ok(entries)
}
