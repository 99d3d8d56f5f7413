//! `relay interactive`: REPL that runs one workflow per request.
//!
//! Type a scenario key to run that scenario, any other text to run it as a
//! request, or `quit` / `exit` / `q` to leave.

use dialoguer::Input;
use relay_core::scenarios;
use relay_core::WorkflowOrchestrator;

use super::render;
use super::run::{self, RunOptions};

#[derive(Debug, PartialEq, Eq)]
pub enum ReplInput {
    Quit,
    Empty,
    Scenario(&'static str),
    Request(String),
}

pub fn classify_input(line: &str) -> ReplInput {
    let line = line.trim();
    if line.is_empty() {
        return ReplInput::Empty;
    }
    if matches!(line.to_lowercase().as_str(), "quit" | "exit" | "q") {
        return ReplInput::Quit;
    }
    match scenarios::scenario(line) {
        Some(s) => ReplInput::Scenario(s.key),
        None => ReplInput::Request(line.to_string()),
    }
}

pub async fn run(orchestrator: &WorkflowOrchestrator, max_iterations: Option<u32>) -> Result<(), String> {
    println!("{}", render::banner());
    println!("Scenarios:");
    for s in scenarios::all() {
        println!("  {:<20} {}", s.key, s.name);
    }
    println!("\nEnter a scenario key or your own request ('quit' to exit).\n");

    let options = RunOptions {
        max_iterations,
        stream: true,
        json: false,
    };

    loop {
        let line: String = Input::new()
            .with_prompt("relay")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| format!("Failed to read input: {}", e))?;

        let (scenario, request) = match classify_input(&line) {
            ReplInput::Quit => break,
            ReplInput::Empty => continue,
            ReplInput::Scenario(key) => {
                let s = scenarios::scenario(key).ok_or_else(|| format!("Unknown scenario '{}'", key))?;
                (Some(s), s.request.to_string())
            }
            ReplInput::Request(text) => (None, text),
        };

        // A failed run should not end the session.
        if let Err(e) = run::run(orchestrator, scenario, &request, options).await {
            eprintln!("Error: {}", e);
        }
        println!();
    }

    println!("Goodbye!");
    Ok(())
}
