//! `studymate check`: Validate a notes file written earlier.
//!
//! A diagnostic rerun: problems are reported and the command still succeeds.

use std::path::PathBuf;

use studymate_notes::validate_file;

use super::notes::render_warnings;
use super::{CommandResult, load_config};

pub async fn run(path: Option<PathBuf>) -> CommandResult {
    let config = load_config()?;
    let path = path.unwrap_or_else(|| config.paths.notes_file.clone());

    println!("  Exam notes file path: {}", path.display());
    match validate_file(&path, config.notes.expected_count).await {
        Ok(validated) => {
            print!("{}", render_warnings(&validated.warnings));
            println!(
                "  ✅ Validated schema and content of {} ({} notes)",
                path.display(),
                validated.collection.len()
            );
        }
        Err(e) => {
            println!("  ❌ {e}");
            if matches!(e, studymate_notes::NotesError::FileMissing(_)) {
                println!("  Run `studymate notes` first to create it.");
            }
        }
    }
    Ok(())
}
