//! `relay run` / `relay -p`: Run one workflow and print the result.

use relay_core::scenarios::{self, Scenario};
use relay_core::{NoopSink, WorkflowEvent, WorkflowOrchestrator, WorkflowSummary};
use tokio_stream::StreamExt;

use super::render;

/// Options shared by `relay run`, `relay -p` and the interactive loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub max_iterations: Option<u32>,
    pub stream: bool,
    pub json: bool,
}

/// Pick the request text from a scenario key or free text.
pub fn resolve_request(
    scenario: Option<&str>,
    request: Option<&str>,
) -> Result<(Option<&'static Scenario>, String), String> {
    match (scenario, request) {
        (Some(_), Some(_)) => Err("Use either --scenario or --request, not both".to_string()),
        (Some(key), None) => {
            let found = scenarios::scenario(key).ok_or_else(|| {
                let keys: Vec<&str> = scenarios::all().iter().map(|s| s.key).collect();
                format!("Unknown scenario '{}'. Available: {}", key, keys.join(", "))
            })?;
            Ok((Some(found), found.request.to_string()))
        }
        (None, Some(text)) if !text.trim().is_empty() => Ok((None, text.trim().to_string())),
        _ => Err("A --scenario or a non-empty --request is required".to_string()),
    }
}

pub async fn run(
    orchestrator: &WorkflowOrchestrator,
    scenario: Option<&Scenario>,
    request: &str,
    options: RunOptions,
) -> Result<(), String> {
    if !options.json {
        if let Some(s) = scenario {
            println!("📋 Scenario: {}", s.name);
        }
        println!("📝 Request: {}\n", request);
    }

    let summary = if options.stream {
        stream_to_stdout(orchestrator, request, options).await?
    } else {
        if !options.json {
            println!("🎯 Running workflow...");
        }
        orchestrator
            .run_request(request, options.max_iterations, &NoopSink)
            .await
            .map_err(|e| e.to_string())?
    };

    if options.json {
        super::print_json(&summary)
    } else {
        print!("{}", render::summary_text(&summary));
        Ok(())
    }
}

async fn stream_to_stdout(
    orchestrator: &WorkflowOrchestrator,
    request: &str,
    options: RunOptions,
) -> Result<WorkflowSummary, String> {
    let mut events = orchestrator.stream_workflow(request, options.max_iterations);
    let mut summary = None;

    while let Some(event) = events.next().await {
        match event {
            WorkflowEvent::Result { data } => summary = Some(data),
            other if options.json => {
                // One JSON object per line, like the streaming API.
                let line = serde_json::to_string(&other).map_err(|e| e.to_string())?;
                eprintln!("{}", line);
            }
            other => {
                if let Some(line) = render::event_line(&other) {
                    println!("{}", line);
                }
            }
        }
    }

    summary.ok_or_else(|| "Workflow ended without a result".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_request() {
        let (scenario, text) = resolve_request(Some("audit_prep"), None).unwrap();
        assert_eq!(scenario.unwrap().name, "SOC 2 Audit Preparation");
        assert!(text.starts_with("Our SOC 2 Type II audit"));

        let (scenario, text) = resolve_request(None, Some("  How is churn trending?  ")).unwrap();
        assert!(scenario.is_none());
        assert_eq!(text, "How is churn trending?");

        let err = resolve_request(Some("payroll"), None).unwrap_err();
        assert!(err.contains("incident"));
        assert!(resolve_request(None, Some("   ")).is_err());
        assert!(resolve_request(None, None).is_err());
        assert!(resolve_request(Some("incident"), Some("x")).is_err());
    }
}
