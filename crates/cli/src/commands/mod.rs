pub mod ask;
pub mod bootstrap;
pub mod check;
pub mod notes;
pub mod status;
pub mod teardown;

use std::sync::Arc;

use studymate_config::AppConfig;
use studymate_providers::OpenAiClient;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Build the HTTP client. Fails before any request when no key is configured.
pub fn client(config: &AppConfig) -> Result<Arc<OpenAiClient>, Box<dyn std::error::Error>> {
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables (or put it in .env):");
        eprintln!("    OPENAI_API_KEY    = 'sk-...'");
        eprintln!("    STUDYMATE_API_KEY = 'sk-...'");
        eprintln!();
        eprintln!(
            "  Or add `api_key` to {}",
            AppConfig::config_path().display()
        );
        eprintln!();
    }
    Ok(Arc::new(OpenAiClient::from_config(config)?))
}
