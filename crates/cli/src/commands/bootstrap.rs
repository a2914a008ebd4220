//! `studymate bootstrap`: Create or reuse the assistant and ingest a document.

use std::path::PathBuf;

use studymate_agent::Provisioner;
use studymate_core::AssistantsApi;
use tracing::warn;

use super::{CommandResult, client, load_config};

pub async fn run(document: Option<PathBuf>) -> CommandResult {
    let config = load_config()?;
    let document = document
        .or_else(|| config.paths.document.clone())
        .ok_or("No document given. Pass a path or set `paths.document` in the config.")?;

    // Missing documents are reported before the key check or any request
    studymate_agent::check_document(&document).await?;

    let api = client(&config)?;
    let provisioner = Provisioner::from_config(api.clone(), &config);
    let handle = provisioner.ensure_ready(&document).await?;

    println!();
    println!("  Assistant:  {}", handle.id);
    match handle.primary_store() {
        Some(store_id) => match api.list_vector_store_files(store_id).await {
            Ok(files) => println!("  Store:      {store_id} ({} files)", files.len()),
            Err(e) => {
                warn!(store_id, error = %e, "Could not list knowledge store files");
                println!("  Store:      {store_id}");
            }
        },
        None => println!("  Store:      (not attached)"),
    }
    println!("  ID file:    {}", provisioner.id_file().path().display());
    println!();
    println!("  Ready. Run `studymate ask` to start asking questions.");
    Ok(())
}
