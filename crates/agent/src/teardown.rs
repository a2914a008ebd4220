//! Removal of the provisioned assistant.

use studymate_core::error::Result;
use studymate_core::provider::AssistantsApi;
use tracing::{info, warn};

use crate::id_store::AssistantIdFile;

/// What teardown actually did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// The persisted ID, if there was one
    pub assistant_id: Option<String>,
    pub remote_deleted: bool,
    /// Why the remote delete failed, when it did
    pub remote_error: Option<String>,
    /// Why the ID file could not be read, when it could not
    pub read_error: Option<String>,
    pub local_removed: bool,
}

/// Delete the remote assistant and the local ID file.
///
/// A failed remote delete (including an assistant that is already gone) is
/// logged and reported, not raised. An unreadable ID file skips the remote
/// delete. The local file is removed regardless.
pub async fn teardown(
    api: &dyn AssistantsApi,
    id_file: &AssistantIdFile,
) -> Result<TeardownReport> {
    let mut report = TeardownReport::default();
    match id_file.read().await {
        Ok(assistant_id) => report.assistant_id = assistant_id,
        Err(e) => {
            warn!(
                path = %id_file.path().display(),
                error = %e,
                "Could not read assistant ID file; skipping remote delete"
            );
            report.read_error = Some(e.to_string());
        }
    }

    match report.assistant_id.as_deref() {
        Some(assistant_id) => match api.delete_assistant(assistant_id).await {
            Ok(()) => {
                info!(assistant_id, "Deleted assistant");
                report.remote_deleted = true;
            }
            Err(e) => {
                warn!(assistant_id, error = %e, "Could not delete assistant");
                report.remote_error = Some(e.to_string());
            }
        },
        None => info!(path = %id_file.path().display(), "No persisted assistant to delete"),
    }

    report.local_removed = id_file.remove().await?;
    if report.local_removed {
        info!(path = %id_file.path().display(), "Removed assistant ID file");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::FakeAssistants;

    fn id_file_with(dir: &tempfile::TempDir, contents: Option<&str>) -> AssistantIdFile {
        let path = dir.path().join("assistant_id.txt");
        if let Some(contents) = contents {
            std::fs::write(&path, contents).unwrap();
        }
        AssistantIdFile::new(path)
    }

    #[tokio::test]
    async fn deletes_remote_and_local() {
        let dir = tempfile::tempdir().unwrap();
        let id_file = id_file_with(&dir, Some("asst_9"));
        let api = FakeAssistants::new().with_assistant("asst_9");

        let report = teardown(&api, &id_file).await.unwrap();

        assert!(report.remote_deleted);
        assert!(report.local_removed);
        assert!(!api.assistant_exists("asst_9"));
        assert!(!id_file.exists());
    }

    #[tokio::test]
    async fn missing_remote_is_reported_and_local_still_removed() {
        let dir = tempfile::tempdir().unwrap();
        let id_file = id_file_with(&dir, Some("asst_gone"));
        let api = FakeAssistants::new();

        let report = teardown(&api, &id_file).await.unwrap();

        assert!(!report.remote_deleted);
        assert!(report.remote_error.is_some());
        assert!(report.local_removed);
        assert!(!id_file.exists());
    }

    #[tokio::test]
    async fn network_failure_does_not_keep_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let id_file = id_file_with(&dir, Some("asst_9"));
        let api = FakeAssistants::new().with_assistant("asst_9").failing_delete();

        let report = teardown(&api, &id_file).await.unwrap();

        assert!(!report.remote_deleted);
        assert!(report.local_removed);
        assert!(api.assistant_exists("asst_9"));
    }

    #[tokio::test]
    async fn nothing_persisted_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let id_file = id_file_with(&dir, None);
        let api = FakeAssistants::new();

        let report = teardown(&api, &id_file).await.unwrap();

        assert_eq!(report, TeardownReport::default());
    }

    #[tokio::test]
    async fn unreadable_file_is_still_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assistant_id.txt");
        std::fs::write(&path, [0xff, 0xfe, b'a']).unwrap();
        let id_file = AssistantIdFile::new(&path);
        let api = FakeAssistants::new().with_assistant("asst_9");

        let report = teardown(&api, &id_file).await.unwrap();

        assert_eq!(report.assistant_id, None);
        assert!(report.read_error.is_some());
        assert!(!report.remote_deleted);
        assert!(report.local_removed);
        assert!(!path.exists());
        assert!(api.assistant_exists("asst_9"));
    }

    #[tokio::test]
    async fn empty_file_is_removed_without_remote_call() {
        let dir = tempfile::tempdir().unwrap();
        let id_file = id_file_with(&dir, Some("  \n"));
        let api = FakeAssistants::new();

        let report = teardown(&api, &id_file).await.unwrap();

        assert_eq!(report.assistant_id, None);
        assert!(report.local_removed);
    }
}
