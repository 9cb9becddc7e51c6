//! CLI presentation: text and json formatters per command family.

use crate::api::{Organization, Repository, User};
use crate::error::Error;
use crate::tree::{ChildNode, Tree, TreeNode};
use owo_colors::OwoColorize;
use serde_json::json;

fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn format_user(user: &User, format: &str) -> Result<String, Error> {
    if format == "json" {
        return Ok(serde_json::to_string_pretty(user)?);
    }
    let mut out = format!("{}\n", format_section_heading(&user.username));
    if !user.full_name.is_empty() {
        out.push_str(&format!("  Name: {}\n", user.full_name));
    }
    if !user.email.is_empty() {
        out.push_str(&format!("  Email: {}\n", user.email));
    }
    out.push_str(&format!("  ID: {}", user.id));
    Ok(out)
}

pub fn format_organizations(organizations: &[Organization], format: &str) -> Result<String, Error> {
    if format == "json" {
        return Ok(serde_json::to_string_pretty(organizations)?);
    }
    if organizations.is_empty() {
        return Ok("No organizations.".to_string());
    }
    use comfy_table::Table;
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Organization", "Full name", "Visibility"]);
    for org in organizations {
        table.add_row(vec![
            org.username.clone(),
            org.full_name.clone(),
            org.visibility.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    Ok(table.to_string())
}

pub fn format_repositories(repositories: &[Repository], format: &str) -> Result<String, Error> {
    if format == "json" {
        return Ok(serde_json::to_string_pretty(repositories)?);
    }
    if repositories.is_empty() {
        return Ok("No repositories found.".to_string());
    }
    use comfy_table::Table;
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Repository", "Branch", "Description"]);
    for repository in repositories {
        table.add_row(vec![
            repository.full_name.clone(),
            repository.default_branch.clone(),
            repository.description.clone(),
        ]);
    }
    let mut out = table.to_string();
    out.push_str(&format!("\nTotal: {} repository(ies)", repositories.len()));
    Ok(out)
}

pub fn format_repository(repository: &Repository, format: &str) -> Result<String, Error> {
    if format == "json" {
        return Ok(serde_json::to_string_pretty(repository)?);
    }
    let mut out = format!("{}\n", format_section_heading(&repository.full_name));
    if !repository.description.is_empty() {
        out.push_str(&format!("  Description: {}\n", repository.description));
    }
    out.push_str(&format!(
        "  Default branch: {}\n",
        repository.default_branch
    ));
    out.push_str(&format!(
        "  Private: {}\n",
        if repository.private { "yes" } else { "no" }
    ));
    if repository.fork {
        out.push_str("  Fork: yes\n");
    }
    if let Some(permissions) = repository.permissions {
        let mut held = Vec::new();
        if permissions.admin {
            held.push("admin");
        }
        if permissions.push {
            held.push("push");
        }
        if permissions.pull {
            held.push("pull");
        }
        let held = if held.is_empty() {
            "none".to_string()
        } else {
            held.join(", ")
        };
        out.push_str(&format!("  Permissions: {}\n", held));
    }
    if let Some(ref html_url) = repository.html_url {
        out.push_str(&format!("  URL: {}\n", html_url));
    }
    Ok(out.trim_end().to_string())
}

/// Render the expanded portion of a tree. Collapsed directories show as a
/// bare name; only expanded levels are walked.
pub fn format_tree(repository: &Repository, tree: &Tree, format: &str) -> Result<String, Error> {
    if format == "json" {
        let out = json!({
            "repository": repository.full_name,
            "branch": tree.branch(),
            "entries": tree.root().children().iter().map(child_to_json).collect::<Vec<_>>(),
        });
        return Ok(serde_json::to_string_pretty(&out)?);
    }
    let heading = match tree.branch() {
        Some(branch) => format!("{} @ {}", repository.full_name, branch),
        None => repository.full_name.clone(),
    };
    let mut out = format!("{}\n", format_section_heading(&heading));
    if tree.root().children().is_empty() {
        out.push_str("  (empty)");
        return Ok(out);
    }
    append_children(&mut out, tree.root(), 1);
    Ok(out.trim_end().to_string())
}

fn append_children(out: &mut String, node: &TreeNode, indent: usize) {
    let pad = "  ".repeat(indent);
    for child in node.children() {
        match child {
            ChildNode::Dir(dir) => {
                out.push_str(&format!("{}{}/\n", pad, child.segment()));
                if dir.is_expanded() {
                    append_children(out, dir, indent + 1);
                }
            }
            ChildNode::Blob(blob) => {
                out.push_str(&format!("{}{}\n", pad, blob.path));
            }
        }
    }
}

fn child_to_json(child: &ChildNode) -> serde_json::Value {
    match child {
        ChildNode::Dir(dir) if dir.is_expanded() => json!({
            "name": child.segment(),
            "kind": "dir",
            "children": dir.children().iter().map(child_to_json).collect::<Vec<_>>(),
        }),
        ChildNode::Dir(_) => json!({ "name": child.segment(), "kind": "dir" }),
        ChildNode::Blob(blob) => json!({
            "name": blob.path,
            "kind": "file",
            "size": blob.size,
        }),
    }
}
