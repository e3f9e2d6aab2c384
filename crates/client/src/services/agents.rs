use brokerdesk_core::{Agent, AgentCreate, AgentUpdate, ApiError, Page};
use serde::Serialize;
use tracing::info;

use crate::http::HttpClient;

#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub active_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AgentsService {
    http: HttpClient,
}

impl AgentsService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self, query: &AgentQuery) -> Result<Page<Agent>, ApiError> {
        self.http.get_with("/api/agents", query).await
    }

    pub async fn get(&self, id: i64) -> Result<Agent, ApiError> {
        self.http.get(&format!("/api/agents/{id}")).await
    }

    pub async fn create(&self, agent: &AgentCreate) -> Result<Agent, ApiError> {
        agent.validate()?;
        let created: Agent = self.http.post("/api/agents", agent).await?;
        info!(agent_id = created.id, email = %created.email, "Agent created");
        Ok(created)
    }

    pub async fn update(&self, id: i64, update: &AgentUpdate) -> Result<Agent, ApiError> {
        update.validate()?;
        self.http.patch(&format!("/api/agents/{id}"), update).await
    }

    /// Soft removal: keeps the agent and its customers, marks it inactive.
    pub async fn deactivate(&self, id: i64) -> Result<Agent, ApiError> {
        let update = AgentUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        self.update(id, &update).await
    }

    /// Fails server-side while customers are still assigned to the agent.
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.http.delete(&format!("/api/agents/{id}")).await
    }
}
