//! CLI parse: clap types for forgekit. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// forgekit CLI - Browse and edit repositories on a Gitea-compatible forge
#[derive(Parser)]
#[command(name = "forgekit")]
#[command(about = "Browse and edit repositories on a Gitea-compatible forge")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (where forgekit.toml is looked up)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Forge server URL (overrides configuration)
    #[arg(long)]
    pub server: Option<String>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in to the forge and remember the session
    Login {
        /// Username (prompted for when omitted)
        #[arg(long)]
        username: Option<String>,
        /// Password (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,
        /// Do not persist the session for later runs
        #[arg(long)]
        no_remember: bool,
    },
    /// Forget the stored session
    Logout,
    /// Show the authenticated user
    Whoami {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List organizations the authenticated user belongs to
    Orgs {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Search repositories
    Search {
        /// Query string
        query: String,
        /// Restrict to repositories owned by this user
        #[arg(long)]
        owner: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Manage repositories
    Repo {
        #[command(subcommand)]
        command: RepoCommands,
    },
    /// Browse a repository tree
    Tree {
        /// Repository as owner/name
        repo: String,
        /// Directory path inside the repository (root listing when omitted)
        path: Option<String>,
        /// Branch or commit sha (repository default when omitted)
        #[arg(long)]
        branch: Option<String>,
        /// Expand every directory down to this many levels below the root
        #[arg(long)]
        depth: Option<usize>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print a file from a repository
    Cat {
        /// Repository as owner/name
        repo: String,
        /// File path inside the repository
        filepath: String,
        /// Branch or commit sha (repository default when omitted)
        #[arg(long)]
        branch: Option<String>,
    },
    /// Create or update a file in a repository
    Put {
        /// Repository as owner/name
        repo: String,
        /// File path inside the repository
        filepath: String,
        /// Read content from this local file (stdin when omitted)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Branch to commit to (repository default when omitted)
        #[arg(long)]
        branch: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum RepoCommands {
    /// Create a repository for the authenticated user
    Create {
        /// Repository name
        name: String,
        /// Repository description
        #[arg(long)]
        description: Option<String>,
        /// Make the repository private
        #[arg(long)]
        private: bool,
    },
    /// Show repository details
    Show {
        /// Repository as owner/name
        repo: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Delete a repository
    Delete {
        /// Repository as owner/name
        repo: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
}
