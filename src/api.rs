//! Typed wrappers over the forge REST API
//!
//! Thin async functions that build `api/v1` URLs, push JSON through the
//! `Transport` seam, and deserialize responses into the DTOs below. Read
//! helpers follow the fail-soft convention: a missing or unreadable resource
//! becomes `None`, never an error. Write helpers always surface failures.

use serde::{Deserialize, Serialize};

pub mod contents;
pub mod orgs;
pub mod repos;
pub mod tokens;
pub mod users;

pub use contents::{ContentsFile, ContentsResponse};
pub use repos::{NewRepository, RepoPatch, SearchResults};

/// Forge user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(alias = "login")]
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Organization the current user belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
}

/// Access levels the authenticated user holds on a repository
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub pull: bool,
}

/// Repository record as the forge returns it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_branch: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub fork: bool,
    pub owner: User,
    #[serde(default)]
    pub permissions: Option<Permissions>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

impl Repository {
    /// Whether the authenticated user may write to this repository.
    pub fn push_access(&self) -> bool {
        self.permissions.map(|p| p.push).unwrap_or(false)
    }

    /// API path of the one-level tree listing for a branch or commit sha.
    pub fn tree_path(&self, reference: &str) -> String {
        format!("repos/{}/git/trees/{}", self.full_name, reference)
    }

    /// API path of a file in this repository.
    pub fn contents_path(&self, filepath: &str) -> String {
        format!(
            "repos/{}/contents/{}",
            self.full_name,
            filepath.trim_start_matches('/')
        )
    }
}

/// Application access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: i64,
    pub name: String,
    /// Secret, present only in the create response
    #[serde(default)]
    pub sha1: Option<String>,
}

impl Token {
    /// Only a token whose secret we hold can authenticate requests.
    pub fn is_usable(&self) -> bool {
        self.sha1.as_deref().map(|s| !s.is_empty()).unwrap_or(false)
    }
}
