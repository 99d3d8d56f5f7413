//! Relay CLI: run multi-agent business analysis workflows from the terminal.
//!
//! Backends are configured through environment variables (or `.env.local`
//! / `.env` in the working directory); see `relay_core::config`.

use clap::{Parser, Subcommand};
use relay_cli::commands;
use relay_cli::commands::run::RunOptions;

/// Relay: multi-agent business analysis orchestrator
#[derive(Parser)]
#[command(name = "relay", version, about = "Relay: multi-agent business analysis orchestrator")]
pub struct Cli {
    /// Quick mode: run a workflow for this request and stream progress.
    /// Example: relay -p "Which customers are at churn risk?"
    #[arg(short = 'p', long = "prompt")]
    prompt: Option<String>,

    /// Directory of agent instruction overrides (*.yaml, *.yml, *.md)
    #[arg(long, env = "RELAY_AGENTS_DIR", global = true)]
    agents_dir: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a workflow for a scenario or a free-text request
    Run {
        /// Scenario key (see `relay scenarios`)
        #[arg(long, short = 's')]
        scenario: Option<String>,
        /// Free-text request
        #[arg(long, short = 'r')]
        request: Option<String>,
        /// Maximum plan/review iterations
        #[arg(long)]
        max_iterations: Option<u32>,
        /// Print progress events while the workflow runs
        #[arg(long)]
        stream: bool,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the built-in scenarios
    Scenarios {
        #[arg(long)]
        json: bool,
    },

    /// Show the agent catalog
    Agents {
        #[arg(long)]
        json: bool,
    },

    /// Interactive session: one workflow per entered request
    Interactive {
        /// Maximum plan/review iterations
        #[arg(long)]
        max_iterations: Option<u32>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay_core=warn,relay_cli=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let agents_dir = cli.agents_dir.as_deref();

    let result = if let Some(prompt_text) = cli.prompt {
        // ── Quick mode: relay -p "request" ──────────────────────────
        match (
            commands::init_orchestrator(agents_dir),
            commands::run::resolve_request(None, Some(&prompt_text)),
        ) {
            (Ok(orchestrator), Ok((_, request))) => {
                let options = RunOptions {
                    stream: true,
                    ..RunOptions::default()
                };
                commands::run::run(&orchestrator, None, &request, options).await
            }
            (Err(e), _) | (_, Err(e)) => Err(e),
        }
    } else if let Some(command) = cli.command {
        match command {
            Commands::Run {
                scenario,
                request,
                max_iterations,
                stream,
                json,
            } => match commands::run::resolve_request(scenario.as_deref(), request.as_deref()) {
                Ok((scenario, request)) => match commands::init_orchestrator(agents_dir) {
                    Ok(orchestrator) => {
                        let options = RunOptions {
                            max_iterations,
                            stream,
                            json,
                        };
                        commands::run::run(&orchestrator, scenario, &request, options).await
                    }
                    Err(e) => Err(e),
                },
                Err(e) => Err(e),
            },

            Commands::Scenarios { json } => commands::scenarios::list(json),

            Commands::Agents { json } => commands::agents::list(agents_dir, json),

            Commands::Interactive { max_iterations } => match commands::init_orchestrator(agents_dir) {
                Ok(orchestrator) => commands::interactive::run(&orchestrator, max_iterations).await,
                Err(e) => Err(e),
            },
        }
    } else {
        // No command and no prompt: show help
        use clap::CommandFactory;
        Cli::command().print_help().ok();
        println!();
        Ok(())
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
