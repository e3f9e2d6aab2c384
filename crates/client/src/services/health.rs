use brokerdesk_core::{ApiError, HealthStatus};

use crate::http::HttpClient;

#[derive(Debug, Clone)]
pub struct HealthService {
    http: HttpClient,
}

impl HealthService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn check(&self) -> Result<HealthStatus, ApiError> {
        self.http.get("/health").await
    }
}
