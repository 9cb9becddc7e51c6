//! CLI route: single route table and run context. Dispatches to the forge API and presentation.

use crate::api::repos::{self, NewRepository};
use crate::api::{contents, orgs, users};
use crate::auth::{AuthSession, Credentials, XdgAuthStorage};
use crate::cli::parse::{Commands, RepoCommands};
use crate::cli::presentation::{
    format_organizations, format_repositories, format_repository, format_tree, format_user,
};
use crate::config::{ConfigLoader, ForgeSettings};
use crate::error::Error;
use crate::file::File;
use crate::http::{ClientConfig, RestTransport, Transport};
use crate::tree::path::parent_and_segment;
use crate::tree::{dirs_first_comparer, BlobDescriptor, Tree, TreeInit};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Runtime context for CLI execution: resolved settings, client config,
/// transport, and the session restored from storage.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    settings: ForgeSettings,
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    session: AuthSession,
}

impl RunContext {
    /// Create run context from workspace root, optional config path, and an
    /// optional server override. A stored session, when present, has its
    /// token installed on the client config before any command runs.
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        server: Option<String>,
    ) -> Result<Self, Error> {
        let mut settings = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        if let Some(server) = server {
            settings.server = server;
        }
        if let Err(errors) = settings.validate() {
            let joined = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Error::Config(joined));
        }

        let mut config = settings.client_config();
        let transport: Arc<dyn Transport> = Arc::new(RestTransport::new()?);
        let mut session = AuthSession::new(Arc::new(XdgAuthStorage::new()), &settings.tokenid);
        if let Err(err) = session.restore(&mut config) {
            tracing::warn!(error = %err, "stored session could not be restored");
        }

        Ok(Self {
            settings,
            config,
            transport,
            session,
        })
    }

    /// Forge settings resolved for this run.
    pub fn settings(&self) -> &ForgeSettings {
        &self.settings
    }

    /// Execute a parsed command against the forge.
    pub async fn execute(&mut self, command: &Commands) -> Result<String, Error> {
        match command {
            Commands::Login {
                username,
                password,
                no_remember,
            } => {
                self.handle_login(username.as_deref(), password.as_deref(), *no_remember)
                    .await
            }
            Commands::Logout => self.handle_logout(),
            Commands::Whoami { format } => self.handle_whoami(format).await,
            Commands::Orgs { format } => self.handle_orgs(format).await,
            Commands::Search {
                query,
                owner,
                format,
            } => self.handle_search(query, owner.as_deref(), format).await,
            Commands::Repo { command } => match command {
                RepoCommands::Create {
                    name,
                    description,
                    private,
                } => {
                    self.handle_repo_create(name, description.as_deref(), *private)
                        .await
                }
                RepoCommands::Show { repo, format } => self.handle_repo_show(repo, format).await,
                RepoCommands::Delete { repo, force } => {
                    self.handle_repo_delete(repo, *force).await
                }
            },
            Commands::Tree {
                repo,
                path,
                branch,
                depth,
                format,
            } => {
                self.handle_tree(repo, path.as_deref(), branch.as_deref(), *depth, format)
                    .await
            }
            Commands::Cat {
                repo,
                filepath,
                branch,
            } => self.handle_cat(repo, filepath, branch.as_deref()).await,
            Commands::Put {
                repo,
                filepath,
                input,
                branch,
            } => {
                self.handle_put(repo, filepath, input.as_deref(), branch.as_deref())
                    .await
            }
        }
    }

    fn require_auth(&self) -> Result<(), Error> {
        if self.session.authentication().is_none() {
            return Err(Error::NotAuthenticated(
                "run 'forgekit login' first".to_string(),
            ));
        }
        Ok(())
    }

    async fn handle_login(
        &mut self,
        username: Option<&str>,
        password: Option<&str>,
        no_remember: bool,
    ) -> Result<String, Error> {
        let username = match username {
            Some(username) => username.to_string(),
            None => {
                use dialoguer::Input;
                Input::new()
                    .with_prompt("Username")
                    .interact_text()
                    .map_err(|e| Error::Config(format!("Failed to get user input: {}", e)))?
            }
        };
        let password = match password {
            Some(password) => password.to_string(),
            None => {
                use dialoguer::Password;
                Password::new()
                    .with_prompt("Password")
                    .interact()
                    .map_err(|e| Error::Config(format!("Failed to get user input: {}", e)))?
            }
        };

        let credentials = Credentials {
            username,
            password,
            remember: !no_remember,
        };
        let authentication = self
            .session
            .login(self.transport.as_ref(), &mut self.config, credentials)
            .await?;
        Ok(format!("Logged in as {}", authentication.user.username))
    }

    fn handle_logout(&mut self) -> Result<String, Error> {
        let had_session = self.session.authentication().is_some();
        self.session.logout(&mut self.config)?;
        if had_session {
            Ok("Logged out; stored session forgotten".to_string())
        } else {
            Ok("No active session".to_string())
        }
    }

    /// Re-fetches the account rather than echoing the stored one, so an
    /// expired or revoked token surfaces here instead of on a later write.
    async fn handle_whoami(&self, format: &str) -> Result<String, Error> {
        self.require_auth()?;
        let user = users::current_user(self.transport.as_ref(), &self.config).await?;
        format_user(&user, format)
    }

    async fn handle_orgs(&self, format: &str) -> Result<String, Error> {
        self.require_auth()?;
        let organizations = orgs::current_user_orgs(self.transport.as_ref(), &self.config).await?;
        format_organizations(&organizations, format)
    }

    async fn handle_search(
        &self,
        query: &str,
        owner: Option<&str>,
        format: &str,
    ) -> Result<String, Error> {
        let owner = owner.unwrap_or(self.settings.owner.as_str());
        let repositories =
            repos::search_repos(self.transport.as_ref(), &self.config, owner, query).await?;
        format_repositories(&repositories, format)
    }

    async fn handle_repo_create(
        &self,
        name: &str,
        description: Option<&str>,
        private: bool,
    ) -> Result<String, Error> {
        self.require_auth()?;
        let mut new_repo = NewRepository::new(name);
        new_repo.description = description.map(str::to_string);
        if private {
            new_repo.private = Some(true);
        }
        let repository =
            repos::create_repo(self.transport.as_ref(), &self.config, &new_repo).await?;
        Ok(format!("Created repository: {}", repository.full_name))
    }

    async fn handle_repo_show(&self, spec: &str, format: &str) -> Result<String, Error> {
        let (owner, name) = parse_repo(spec)?;
        let repository = repos::read_repo(self.transport.as_ref(), &self.config, owner, name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("repository '{}'", spec)))?;
        format_repository(&repository, format)
    }

    async fn handle_repo_delete(&self, spec: &str, force: bool) -> Result<String, Error> {
        self.require_auth()?;
        let (owner, name) = parse_repo(spec)?;
        if !force {
            use dialoguer::Confirm;
            let confirmed = Confirm::new()
                .with_prompt(format!("Delete repository '{}'?", spec))
                .interact()
                .map_err(|e| Error::Config(format!("Failed to get user input: {}", e)))?;
            if !confirmed {
                return Ok("Deletion cancelled".to_string());
            }
        }
        repos::delete_repo(self.transport.as_ref(), &self.config, owner, name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("repository '{}' was not deleted", spec)))?;
        Ok(format!("Deleted repository: {}", spec))
    }

    async fn handle_tree(
        &self,
        spec: &str,
        path: Option<&str>,
        branch: Option<&str>,
        depth: Option<usize>,
        format: &str,
    ) -> Result<String, Error> {
        let (owner, name) = parse_repo(spec)?;
        let repository = repos::read_repo(self.transport.as_ref(), &self.config, owner, name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("repository '{}'", spec)))?;

        let init = TreeInit::repository(&self.config, &repository, branch)
            .with_comparer(dirs_first_comparer());
        let mut tree = Tree::new(Arc::clone(&self.transport), self.config.clone(), init);
        match (depth, path) {
            (Some(depth), _) => tree.expand_all(Some(depth)).await,
            (None, Some(path)) => tree.expand(path).await?,
            (None, None) => tree.open().await,
        }
        format_tree(&repository, &tree, format)
    }

    async fn handle_cat(
        &self,
        spec: &str,
        filepath: &str,
        branch: Option<&str>,
    ) -> Result<String, Error> {
        let (owner, name) = parse_repo(spec)?;
        let file = contents::read_content(
            self.transport.as_ref(),
            &self.config,
            owner,
            name,
            filepath,
            branch,
        )
        .await?
        .ok_or_else(|| Error::NotFound(format!("'{}' in repository '{}'", filepath, spec)))?;
        file.decoded()
    }

    async fn handle_put(
        &self,
        spec: &str,
        filepath: &str,
        input: Option<&Path>,
        branch: Option<&str>,
    ) -> Result<String, Error> {
        self.require_auth()?;
        let (owner, name) = parse_repo(spec)?;
        let new_content = read_input(input)?;

        let repository = repos::read_repo(self.transport.as_ref(), &self.config, owner, name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("repository '{}'", spec)))?;

        let descriptor = BlobDescriptor {
            path: parent_and_segment(filepath).1.to_string(),
            filepath: filepath.to_string(),
            sha: None,
            url: None,
            size: None,
            branch: branch.map(str::to_string),
        };
        let mut file = File::from_descriptor(&repository, &descriptor);
        // Learns the current blob sha so an existing file becomes an update
        // instead of a rejected create.
        file.fetch(self.transport.as_ref(), &self.config).await?;
        let existed = file.sha().is_some();
        file.save(self.transport.as_ref(), &self.config, &new_content)
            .await?;
        let verb = if existed { "Updated" } else { "Created" };
        Ok(format!("{} '{}' on {}", verb, filepath, file.branch()))
    }
}

/// Split an `owner/name` argument into its two halves.
fn parse_repo(spec: &str) -> Result<(&str, &str), Error> {
    match spec.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() => Ok((owner, name)),
        _ => Err(Error::Config(format!(
            "Expected repository as owner/name, got '{}'",
            spec
        ))),
    }
}

/// Content for `put`: a local file when `--input` is given, stdin otherwise.
fn read_input(input: Option<&Path>) -> Result<String, Error> {
    match input {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| Error::Storage(format!("Failed to read {}: {}", path.display(), e))),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| Error::Storage(format!("Failed to read stdin: {}", e)))?;
            Ok(buffer)
        }
    }
}
