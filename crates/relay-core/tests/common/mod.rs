//! Scripted backends shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use relay_core::backend::{GenerationRequest, KnowledgeSearch, SearchHit, TextGeneration};
use relay_core::workflow::GenerationParams;
use relay_core::{AgentCatalog, AgentExecutor, AgentRole, RelayError, WorkflowOrchestrator};

pub const INCIDENT_REQUEST: &str =
    "We have a critical system outage affecting tax calculations for multiple customers.";

pub const READY_REVIEW: &str = r#"{"ready_for_output": true, "additional_work_needed": []}"#;

/// Generation backend that answers per role, from a script or a default.
pub struct FakeGenerator {
    // System prompt -> role, so replies can be routed without parsing.
    prompts: Vec<(String, AgentRole)>,
    scripts: Mutex<HashMap<AgentRole, VecDeque<Result<String, String>>>>,
    defaults: Mutex<HashMap<AgentRole, Result<String, String>>>,
    calls: Mutex<Vec<(AgentRole, GenerationRequest)>>,
}

impl FakeGenerator {
    pub fn new(catalog: &AgentCatalog) -> Self {
        let prompts = catalog
            .all()
            .iter()
            .map(|d| (d.system_prompt.clone(), d.role))
            .collect();

        let mut defaults = HashMap::new();
        defaults.insert(
            AgentRole::Planner,
            Err("planner unavailable".to_string()),
        );
        defaults.insert(
            AgentRole::Classifier,
            Ok(r#"{"category": "incident", "priority": "P1"}"#.to_string()),
        );
        defaults.insert(
            AgentRole::Research,
            Ok(r#"{"findings": ["P1 response SLA is 15 minutes"]}"#.to_string()),
        );
        defaults.insert(
            AgentRole::Compliance,
            Ok(r#"{"compliance_status": "at_risk"}"#.to_string()),
        );
        defaults.insert(AgentRole::Reviewer, Ok(READY_REVIEW.to_string()));
        defaults.insert(
            AgentRole::Formatter,
            Ok("# Incident Response Plan\n\n1. Page the on-call team.".to_string()),
        );

        Self {
            prompts,
            scripts: Mutex::new(HashMap::new()),
            defaults: Mutex::new(defaults),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue one reply for the next call of `role`.
    pub fn script(&self, role: AgentRole, reply: Result<&str, &str>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(role)
            .or_default()
            .push_back(reply.map(str::to_string).map_err(str::to_string));
    }

    /// Reply used once the script for `role` is exhausted.
    pub fn set_default(&self, role: AgentRole, reply: Result<&str, &str>) {
        self.defaults
            .lock()
            .unwrap()
            .insert(role, reply.map(str::to_string).map_err(str::to_string));
    }

    pub fn calls(&self) -> Vec<(AgentRole, GenerationRequest)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, role: AgentRole) -> usize {
        self.calls.lock().unwrap().iter().filter(|(r, _)| *r == role).count()
    }

    fn role_for(&self, system_prompt: &str) -> AgentRole {
        self.prompts
            .iter()
            .find(|(p, _)| p == system_prompt)
            .map(|(_, r)| *r)
            .expect("request used a system prompt that is not in the catalog")
    }
}

#[async_trait::async_trait]
impl TextGeneration for FakeGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, RelayError> {
        let role = self.role_for(&request.system_prompt);
        self.calls.lock().unwrap().push((role, request.clone()));

        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&role)
            .and_then(|q| q.pop_front());
        let reply = match scripted {
            Some(reply) => reply,
            None => self.defaults.lock().unwrap()[&role].clone(),
        };
        reply.map_err(RelayError::Backend)
    }
}

/// Search backend returning fixed hits and recording queries.
pub struct FakeSearch {
    hits: Vec<SearchHit>,
    fail: bool,
    queries: Mutex<Vec<String>>,
}

impl FakeSearch {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            hits: Vec::new(),
            fail: true,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl KnowledgeSearch for FakeSearch {
    async fn search(
        &self,
        query: &str,
        top: usize,
        _select: &[&str],
    ) -> Result<Vec<SearchHit>, RelayError> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(RelayError::Backend("Search service returned 503".to_string()));
        }
        Ok(self.hits.iter().take(top).cloned().collect())
    }
}

pub fn sla_hit() -> SearchHit {
    SearchHit {
        file_name: "sla_matrix.csv".to_string(),
        content: "P1 incidents: 15 minute response, 4 hour resolution".to_string(),
        title: None,
        source_url: Some("https://docs.example.test/sla".to_string()),
        score: Some(2.5),
    }
}

pub struct Harness {
    pub orchestrator: WorkflowOrchestrator,
    pub generator: Arc<FakeGenerator>,
    pub search: Option<Arc<FakeSearch>>,
}

pub fn harness() -> Harness {
    harness_with(AgentCatalog::builtin(), None, 5)
}

pub fn harness_with(catalog: AgentCatalog, search: Option<FakeSearch>, max_iterations: u32) -> Harness {
    let generator = Arc::new(FakeGenerator::new(&catalog));
    let search = search.map(Arc::new);
    let executor = AgentExecutor::new(
        Arc::new(catalog),
        generator.clone(),
        search.clone().map(|s| s as Arc<dyn KnowledgeSearch>),
        GenerationParams::default(),
    );
    Harness {
        orchestrator: WorkflowOrchestrator::new(Arc::new(executor), max_iterations),
        generator,
        search,
    }
}
