use brokerdesk_core::{ApiError, AuditAction, AuditLogEntry, AuditStatistics, Page};
use serde::Serialize;

use crate::http::HttpClient;

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<AuditAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

#[derive(Serialize)]
struct Search<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<&'a str>,
    limit: u32,
}

#[derive(Serialize)]
struct Period {
    days: u32,
}

/// Longest window the statistics endpoint accepts.
pub const MAX_STATISTICS_DAYS: u32 = 90;

/// Read-only access to the audit trail.
#[derive(Debug, Clone)]
pub struct AuditService {
    http: HttpClient,
}

impl AuditService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self, query: &AuditQuery) -> Result<Page<AuditLogEntry>, ApiError> {
        self.http.get_with("/api/audit", query).await
    }

    pub async fn recent(&self, limit: u32) -> Result<Vec<AuditLogEntry>, ApiError> {
        self.http
            .get_with("/api/audit/recent", &Search { query: None, limit })
            .await
    }

    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<AuditLogEntry>, ApiError> {
        if query.trim().is_empty() {
            return Err(ApiError::Validation("search query is required".to_string()));
        }
        self.http
            .get_with(
                "/api/audit/search",
                &Search {
                    query: Some(query),
                    limit,
                },
            )
            .await
    }

    /// Complete history of one entity, e.g. (`mt5_account`, `12`).
    pub async fn entity_trail(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Vec<AuditLogEntry>, ApiError> {
        self.http
            .get(&format!("/api/audit/entity/{entity_type}/{entity_id}"))
            .await
    }

    /// Action, actor and entity counts over the last `days` days (1..=90).
    /// Admin only.
    pub async fn statistics(&self, days: u32) -> Result<AuditStatistics, ApiError> {
        if !(1..=MAX_STATISTICS_DAYS).contains(&days) {
            return Err(ApiError::Validation(format!(
                "days must be between 1 and {MAX_STATISTICS_DAYS}"
            )));
        }
        self.http
            .get_with("/api/audit/statistics", &Period { days })
            .await
    }
}
