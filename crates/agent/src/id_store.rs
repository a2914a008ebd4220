//! The persisted assistant identifier.
//!
//! A single newline-free UTF-8 string at a well-known relative path. It is
//! the only durable record of the remote assistant. Writes go to a sibling
//! temp file that is then renamed over the target, so a reader never sees a
//! partially written ID.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use studymate_core::{Error, Result};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct AssistantIdFile {
    path: PathBuf,
}

impl AssistantIdFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored ID. Absent and empty files both read as `None`.
    pub async fn read(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let id = content.trim();
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(&self.path, e)),
        }
    }

    /// Atomically replace the stored ID.
    pub async fn write(&self, id: &str) -> Result<()> {
        let id = id.trim();
        if id.is_empty() || id.contains(['\n', '\r']) {
            return Err(Error::Internal(format!(
                "refusing to persist invalid assistant ID {id:?}"
            )));
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io(parent, e))?;
        }

        let tmp_path = self.tmp_path();
        tokio::fs::write(&tmp_path, id)
            .await
            .map_err(|e| Error::io(&tmp_path, e))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| Error::io(&self.path, e))?;

        debug!(path = %self.path.display(), "Persisted assistant ID");
        Ok(())
    }

    /// Delete the file. Returns whether there was one.
    pub async fn remove(&self) -> Result<bool> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::io(&self.path, e)),
        }
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// `<file name>.tmp` next to the target, never the target itself.
    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("assistant_id"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
