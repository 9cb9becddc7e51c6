//! File viewing and editing over the contents API.
//!
//! `File` owns one remote file's lifecycle: content fetch keyed by blob sha,
//! save through update-or-create, and confirmed delete. `FileCard` wraps a
//! `File` with the editing state a front end needs: an edit buffer, a
//! preview flag, the push-access gate, and typed events. Neither renders.

use crate::api::contents::{self, ContentsResponse};
use crate::api::Repository;
use crate::error::{Error, Result};
use crate::http::{ClientConfig, Transport};
use crate::tree::BlobDescriptor;
use std::collections::VecDeque;

/// Events a file card emits toward its consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    Saved { filepath: String },
    Deleted { filepath: String },
    Closed { filepath: String },
}

/// One remote file
#[derive(Debug, Clone)]
pub struct File {
    owner: String,
    repo: String,
    filepath: String,
    branch: String,
    sha: Option<String>,
    content: Option<String>,
    /// Blob sha the cached content was decoded from
    fetched_sha: Option<String>,
    writable: bool,
}

impl File {
    /// Bind a selected blob to its repository. The branch falls back to the
    /// repository default when the descriptor does not carry one.
    pub fn from_descriptor(repository: &Repository, descriptor: &BlobDescriptor) -> Self {
        let branch = descriptor
            .branch
            .clone()
            .unwrap_or_else(|| repository.default_branch.clone());
        Self {
            owner: repository.owner.username.clone(),
            repo: repository.name.clone(),
            filepath: descriptor.filepath.clone(),
            branch,
            sha: descriptor.sha.clone(),
            content: None,
            fetched_sha: None,
            writable: repository.push_access(),
        }
    }

    pub fn filepath(&self) -> &str {
        &self.filepath
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn sha(&self) -> Option<&str> {
        self.sha.as_deref()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Fetch the file body, at most once per blob sha.
    ///
    /// A repeat call with the cached sha still current answers from memory.
    /// When the descriptor's sha moved on (branch switch, upstream commit),
    /// the cache is invalid and the body is fetched again. A missing or
    /// unreadable file yields `None`.
    pub async fn fetch(
        &mut self,
        transport: &dyn Transport,
        config: &ClientConfig,
    ) -> Result<Option<&str>> {
        let cache_current = self.content.is_some()
            && self.fetched_sha.is_some()
            && self.fetched_sha == self.sha;
        if !cache_current {
            let fetched = contents::read_content(
                transport,
                config,
                &self.owner,
                &self.repo,
                &self.filepath,
                Some(&self.branch),
            )
            .await?;
            match fetched {
                Some(remote) => {
                    self.content = Some(remote.decoded()?);
                    self.sha = Some(remote.sha.clone());
                    self.fetched_sha = Some(remote.sha);
                }
                None => {
                    self.content = None;
                    self.fetched_sha = None;
                }
            }
        }
        Ok(self.content.as_deref())
    }

    /// Point the file at a different blob sha, invalidating cached content.
    pub fn set_sha(&mut self, sha: impl Into<String>) {
        let sha = sha.into();
        if self.sha.as_deref() != Some(sha.as_str()) {
            self.sha = Some(sha);
        }
    }

    /// Persist `new_content`, updating the known blob or creating the file
    /// when no sha exists yet. Local state changes only on success.
    pub async fn save(
        &mut self,
        transport: &dyn Transport,
        config: &ClientConfig,
        new_content: &str,
    ) -> Result<ContentsResponse> {
        if !self.writable {
            return Err(Error::PermissionDenied(format!(
                "no push access to save '{}'",
                self.filepath
            )));
        }

        let response = match &self.sha {
            Some(sha) => {
                contents::update_content(
                    transport,
                    config,
                    &self.owner,
                    &self.repo,
                    &self.filepath,
                    new_content,
                    sha,
                    &self.branch,
                    &format!("Update '{}'", self.filepath),
                )
                .await?
            }
            None => {
                contents::create_content(
                    transport,
                    config,
                    &self.owner,
                    &self.repo,
                    &self.filepath,
                    new_content,
                    &self.branch,
                    &format!("Create '{}'", self.filepath),
                )
                .await?
            }
        };

        self.content = Some(new_content.to_string());
        if let Some(remote) = &response.content {
            self.sha = Some(remote.sha.clone());
            self.fetched_sha = Some(remote.sha.clone());
        }
        Ok(response)
    }

    /// Remove the remote file. `confirmed` is the caller's explicit
    /// acknowledgement; without it nothing is sent. The owning tree still
    /// has to drop the matching entry after a successful delete.
    pub async fn delete(
        &mut self,
        transport: &dyn Transport,
        config: &ClientConfig,
        confirmed: bool,
    ) -> Result<ContentsResponse> {
        if !self.writable {
            return Err(Error::PermissionDenied(format!(
                "no push access to delete '{}'",
                self.filepath
            )));
        }
        if !confirmed {
            return Err(Error::PermissionDenied(format!(
                "delete of '{}' was not confirmed",
                self.filepath
            )));
        }
        let sha = match &self.sha {
            Some(sha) => sha.clone(),
            None => {
                return Err(Error::NotFound(format!(
                    "no blob sha known for '{}'",
                    self.filepath
                )))
            }
        };

        contents::delete_content(
            transport,
            config,
            &self.owner,
            &self.repo,
            &self.filepath,
            &sha,
            &self.branch,
            &format!("Delete '{}'", self.filepath),
        )
        .await
    }
}

/// Editing state around one file
#[derive(Debug)]
pub struct FileCard {
    file: File,
    buffer: String,
    preview: bool,
    /// Push access on the enclosing repository; gates save and delete
    access: bool,
    closed: bool,
    events: VecDeque<FileEvent>,
}

impl FileCard {
    pub fn new(repository: &Repository, descriptor: &BlobDescriptor) -> Self {
        Self {
            file: File::from_descriptor(repository, descriptor),
            buffer: String::new(),
            preview: false,
            access: repository.push_access(),
            closed: false,
            events: VecDeque::new(),
        }
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn access(&self) -> bool {
        self.access
    }

    pub fn preview(&self) -> bool {
        self.preview
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Fetch the file and seed the edit buffer with its content.
    pub async fn load(
        &mut self,
        transport: &dyn Transport,
        config: &ClientConfig,
    ) -> Result<()> {
        let content = self.file.fetch(transport, config).await?;
        self.buffer = content.unwrap_or_default().to_string();
        Ok(())
    }

    pub fn edit(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
    }

    /// Whether the buffer differs from the fetched content.
    pub fn changed(&self) -> bool {
        self.file.content().unwrap_or_default() != self.buffer
    }

    pub fn toggle_preview(&mut self) {
        self.preview = !self.preview;
    }

    /// Persist the buffer. An unchanged buffer is a no-op reporting false;
    /// a missing push access or a failed write surfaces unchanged state.
    pub async fn save(
        &mut self,
        transport: &dyn Transport,
        config: &ClientConfig,
    ) -> Result<bool> {
        if !self.changed() {
            return Ok(false);
        }
        if !self.access {
            return Err(Error::PermissionDenied(format!(
                "no push access to save '{}'",
                self.file.filepath
            )));
        }
        let buffer = self.buffer.clone();
        self.file.save(transport, config, &buffer).await?;
        self.events.push_back(FileEvent::Saved {
            filepath: self.file.filepath.clone(),
        });
        Ok(true)
    }

    /// Delete the remote file after explicit confirmation.
    pub async fn request_delete(
        &mut self,
        transport: &dyn Transport,
        config: &ClientConfig,
        confirmed: bool,
    ) -> Result<()> {
        if !self.access {
            return Err(Error::PermissionDenied(format!(
                "no push access to delete '{}'",
                self.file.filepath
            )));
        }
        self.file.delete(transport, config, confirmed).await?;
        self.events.push_back(FileEvent::Deleted {
            filepath: self.file.filepath.clone(),
        });
        Ok(())
    }

    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.events.push_back(FileEvent::Closed {
                filepath: self.file.filepath.clone(),
            });
        }
    }

    pub fn poll_event(&mut self) -> Option<FileEvent> {
        self.events.pop_front()
    }
}
