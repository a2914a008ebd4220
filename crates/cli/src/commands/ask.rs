//! `studymate ask`: Interactive Q&A over the ingested material.

use std::fmt::Write as _;
use std::io::Write;

use studymate_agent::{Answer, QaSession, is_quit};
use tokio::io::{self, AsyncBufReadExt, BufReader};

use super::{CommandResult, client, load_config};

pub async fn run() -> CommandResult {
    let config = load_config()?;
    let api = client(&config)?;
    let mut session = QaSession::open(api, &config).await?;

    println!();
    println!("  Assistant: {}", session.assistant_id());
    println!("  Thread:    {}", session.thread().id);
    println!();
    println!("  Type your question and press Enter. Type 'quit' to exit.");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        let question = line.trim();
        if is_quit(question) {
            break;
        }
        if question.is_empty() {
            prompt()?;
            continue;
        }

        println!();
        print!("  Assistant > ");
        std::io::stdout().flush()?;

        let result = session
            .ask_streaming(question, |delta| {
                print!("{delta}");
                let _ = std::io::stdout().flush();
            })
            .await;

        println!();
        match result {
            Ok(answer) => print!("{}", render_citations(&answer)),
            Err(e) => eprintln!("  [Error] {e}"),
        }
        println!();
        prompt()?;
    }

    println!();
    println!("  Exiting Q&A session.");
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

/// Citations and the self-check line printed under each answer.
fn render_citations(answer: &Answer) -> String {
    let mut out = String::new();
    if answer.citations.is_empty() {
        out.push_str("\n  No citations provided for this response.\n");
        return out;
    }

    out.push_str("\n  Citations:\n");
    for citation in &answer.citations {
        let _ = writeln!(out, "    - File: {}", citation.filename);
        if let Some(quote) = &citation.quote {
            let _ = writeln!(out, "      Reference Text: \"{quote}\"");
        }
    }

    if answer.self_check {
        out.push_str("\n  ✅ Self-check: answer references at least one source file.\n");
    } else {
        out.push_str("\n  ⚠️  Self-check: no file citations found in the response.\n");
    }
    out
}
