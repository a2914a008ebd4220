//! `studymate notes`: Generate validated exam notes and save them.

use std::fmt::Write as _;

use studymate_core::NotesCollection;
use studymate_notes::{NotesGenerator, NotesWarning};

use super::{CommandResult, client, load_config};

pub async fn run() -> CommandResult {
    let config = load_config()?;
    let provider = client(&config)?;
    let generator = NotesGenerator::from_config(provider, &config);
    let path = &config.paths.notes_file;

    println!("  Generating exam notes...");
    let validated = match generator.generate_to(path).await {
        Ok(validated) => validated,
        Err(e) => {
            eprintln!("  Error: {e}");
            if let Some(raw) = e.raw() {
                eprintln!("  Raw response was: {raw}");
            }
            return Err(e.into());
        }
    };

    println!();
    println!("  Generated Exam Notes (Validated):");
    print!("{}", render_notes(&validated.collection));
    println!();
    println!("  Notes saved to {}", path.display());
    print!("{}", render_warnings(&validated.warnings));
    if validated.is_clean() {
        println!(
            "  ✅ Successfully generated exactly {} notes.",
            validated.collection.len()
        );
    }
    Ok(())
}

fn render_notes(notes: &NotesCollection) -> String {
    let mut out = String::new();
    for note in notes {
        let _ = writeln!(out, "    ID: {}", note.id);
        let _ = writeln!(out, "    Heading: {}", note.heading);
        let _ = writeln!(out, "    Summary: {}", note.summary);
        if let Some(page) = note.page_ref {
            let _ = writeln!(out, "    Page Ref: {page}");
        }
        let _ = writeln!(out, "    {}", "-".repeat(20));
    }
    out
}

pub(super) fn render_warnings(warnings: &[NotesWarning]) -> String {
    let mut out = String::new();
    for warning in warnings {
        let _ = writeln!(out, "  ⚠️  Warning: {warning}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use studymate_core::Note;

    #[test]
    fn page_ref_printed_only_when_present() {
        let notes = NotesCollection {
            notes: vec![
                Note {
                    id: 1,
                    heading: "Limits".into(),
                    summary: "A limit describes approach.".into(),
                    page_ref: Some(4),
                },
                Note {
                    id: 2,
                    heading: "Derivatives".into(),
                    summary: "Instantaneous rate of change.".into(),
                    page_ref: None,
                },
            ],
        };
        let out = render_notes(&notes);

        assert!(out.contains("Heading: Limits"));
        assert_eq!(out.matches("Page Ref:").count(), 1);
        assert!(out.contains("Page Ref: 4"));
    }

    #[test]
    fn warnings_are_listed() {
        let out = render_warnings(&[NotesWarning::CountMismatch {
            expected: 10,
            actual: 9,
        }]);
        assert!(out.contains("expected 10 notes, found 9"));
    }
}
