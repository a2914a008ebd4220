//! `studymate teardown`: Delete the assistant and forget its ID.

use studymate_agent::{AssistantIdFile, teardown};

use super::{CommandResult, client, load_config};

pub async fn run() -> CommandResult {
    let config = load_config()?;
    let id_file = AssistantIdFile::new(&config.paths.assistant_id_file);

    if !id_file.exists() {
        println!(
            "  No {} found. Nothing to clean up.",
            id_file.path().display()
        );
        return Ok(());
    }

    let api = client(&config)?;
    let report = teardown(api.as_ref(), &id_file).await?;

    if let Some(e) = &report.read_error {
        println!("  Could not read {}: {e}", id_file.path().display());
    }
    if let Some(id) = &report.assistant_id {
        match &report.remote_error {
            None => println!("  Deleted assistant: {id}"),
            Some(e) => println!("  Error deleting assistant {id}: {e}"),
        }
    }
    if report.local_removed {
        println!("  Removed {}", id_file.path().display());
    }
    Ok(())
}
