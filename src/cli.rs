//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to the forge API.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, RepoCommands};
pub use presentation::{
    format_organizations, format_repositories, format_repository, format_tree, format_user,
};
pub use route::RunContext;
