//! `studymate status`: Show resolved configuration. Makes no requests.

use studymate_agent::AssistantIdFile;
use studymate_config::AppConfig;

use super::{CommandResult, load_config};

pub async fn run() -> CommandResult {
    let config = load_config()?;
    let id_file = AssistantIdFile::new(&config.paths.assistant_id_file);
    let assistant_id = id_file.read().await?;

    println!("📚 studymate Status");
    println!("==================");
    println!("  Config file:   {}", AppConfig::config_path().display());
    println!("  API URL:       {}", config.api_url);
    println!(
        "  API key:       {}",
        if config.has_api_key() { "present" } else { "absent" }
    );
    println!("  Model:         {}", config.model);
    println!("  Assistant:     {}", config.assistant.name);
    println!(
        "  ID file:       {} ({})",
        id_file.path().display(),
        assistant_id.as_deref().unwrap_or("no assistant yet")
    );
    println!("  Notes file:    {}", config.paths.notes_file.display());
    if let Some(document) = &config.paths.document {
        println!("  Document:      {}", document.display());
    }

    if assistant_id.is_none() {
        println!("\n  ⚠️  No assistant provisioned. Run `studymate bootstrap <DOCUMENT>` first");
    }
    Ok(())
}
