//! Resource provisioning: create-or-reuse for the assistant and its store.
//!
//! # Flow
//!
//! 1. Check the document exists and is a regular file (before any request)
//! 2. Read the persisted assistant ID and try to fetch it
//! 3. If absent or unfetchable, create an assistant with retrieval declared
//!    and persist its ID
//! 4. Upload the document, then append it to the attached knowledge store,
//!    or create a store seeded with it and attach that
//! 5. Re-fetch the assistant and confirm the store is attached
//!
//! Creation failures are fatal. Appending to an existing store and the
//! final confirmation are best-effort: failures are logged and the handle
//! is still returned.

use std::path::Path;
use std::sync::Arc;

use studymate_config::AppConfig;
use studymate_core::assistant::{AssistantHandle, AssistantSpec};
use studymate_core::error::{Error, PreconditionError, Result};
use studymate_core::provider::AssistantsApi;
use tracing::{debug, info, warn};

use crate::id_store::AssistantIdFile;

/// Ensures a single assistant and knowledge store exist, idempotently.
pub struct Provisioner {
    api: Arc<dyn AssistantsApi>,
    id_file: AssistantIdFile,
    spec: AssistantSpec,
    store_name: String,
}

impl Provisioner {
    pub fn new(
        api: Arc<dyn AssistantsApi>,
        id_file: AssistantIdFile,
        spec: AssistantSpec,
        store_name: impl Into<String>,
    ) -> Self {
        Self {
            api,
            id_file,
            spec,
            store_name: store_name.into(),
        }
    }

    /// Build from configuration: assistant name, instructions, model, paths.
    pub fn from_config(api: Arc<dyn AssistantsApi>, config: &AppConfig) -> Self {
        Self::new(
            api,
            AssistantIdFile::new(&config.paths.assistant_id_file),
            AssistantSpec::with_retrieval(
                &config.assistant.name,
                &config.assistant.instructions,
                &config.model,
            ),
            &config.assistant.store_name,
        )
    }

    pub fn id_file(&self) -> &AssistantIdFile {
        &self.id_file
    }

    /// Ensure the assistant exists and has `document` ingested.
    pub async fn ensure_ready(&self, document: &Path) -> Result<AssistantHandle> {
        check_document(document).await?;
        let handle = self.ensure_assistant().await?;
        self.ingest(handle, document).await
    }

    /// Reuse the persisted assistant if it can be fetched, else create one.
    pub async fn ensure_assistant(&self) -> Result<AssistantHandle> {
        if let Some(assistant_id) = self.id_file.read().await? {
            match self.api.retrieve_assistant(&assistant_id).await {
                Ok(handle) => {
                    info!(assistant_id = %handle.id, "Reusing existing assistant");
                    if !handle.has_retrieval() {
                        warn!(
                            assistant_id = %handle.id,
                            "Assistant does not declare file search; answers will not cite documents"
                        );
                    }
                    return Ok(handle);
                }
                Err(e) => {
                    warn!(
                        assistant_id = %assistant_id,
                        error = %e,
                        "Existing assistant not found, creating new one"
                    );
                }
            }
        }

        let handle = self.api.create_assistant(&self.spec).await?;
        self.id_file.write(&handle.id).await?;
        info!(assistant_id = %handle.id, "Created new assistant");
        Ok(handle)
    }

    /// Upload `document` and make it retrievable by the assistant.
    pub async fn ingest(
        &self,
        handle: AssistantHandle,
        document: &Path,
    ) -> Result<AssistantHandle> {
        let uploaded = self.api.upload_file(document).await?;
        info!(file_id = %uploaded.file_id, filename = %uploaded.filename, "Uploaded document");

        let (handle, store_id) = match handle.primary_store().map(str::to_string) {
            Some(store_id) => {
                if let Err(e) = self
                    .api
                    .add_file_to_vector_store(&store_id, &uploaded.file_id)
                    .await
                {
                    warn!(
                        store_id = %store_id,
                        file_id = %uploaded.file_id,
                        error = %e,
                        "Could not add document to the existing knowledge store"
                    );
                    return Ok(handle);
                }
                info!(store_id = %store_id, "Added document to existing knowledge store");
                (handle, store_id)
            }
            None => {
                let store = self
                    .api
                    .create_vector_store(&self.store_name, std::slice::from_ref(&uploaded.file_id))
                    .await?;
                let updated = self.api.attach_vector_store(&handle.id, &store.id).await?;
                info!(store_id = %store.id, "Created knowledge store and attached it");
                (updated, store.id)
            }
        };

        Ok(self.confirm_attached(handle, &store_id).await)
    }

    /// Re-fetch the assistant and check the store is attached. Never fails.
    async fn confirm_attached(&self, handle: AssistantHandle, store_id: &str) -> AssistantHandle {
        match self.api.retrieve_assistant(&handle.id).await {
            Ok(fresh) if fresh.has_store(store_id) => {
                debug!(assistant_id = %fresh.id, store_id, "Knowledge store attachment confirmed");
                fresh
            }
            Ok(fresh) => {
                warn!(
                    assistant_id = %fresh.id,
                    store_id,
                    attached = ?fresh.vector_store_ids,
                    "Knowledge store is not listed on the assistant"
                );
                fresh
            }
            Err(e) => {
                warn!(
                    assistant_id = %handle.id,
                    error = %e,
                    "Could not re-fetch assistant to confirm knowledge store"
                );
                handle
            }
        }
    }
}

/// The document must exist and be a regular file.
pub async fn check_document(document: &Path) -> Result<()> {
    let metadata = match tokio::fs::metadata(document).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PreconditionError::DocumentMissing(document.to_path_buf()).into());
        }
        Err(e) => return Err(Error::io(document, e)),
    };

    if !metadata.is_file() {
        return Err(PreconditionError::NotARegularFile(document.to_path_buf()).into());
    }
    Ok(())
}
