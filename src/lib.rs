//! forgekit: Repository browsing and editing for Gitea-compatible forges
//!
//! A typed client for the forge REST API with a lazily-expanded repository
//! tree: one directory level is fetched per expansion, a single blob can be
//! the active selection, and the selected file can be fetched, edited, and
//! written back.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod file;
pub mod http;
pub mod logging;
pub mod search;
pub mod tree;
