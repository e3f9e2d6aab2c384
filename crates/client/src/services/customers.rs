use brokerdesk_core::{ApiError, Customer, CustomerCreate, CustomerPositions, CustomerUpdate, Page};
use serde::Serialize;
use tracing::info;

use crate::http::HttpClient;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CustomerQuery {
    /// Matches name, email or phone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

#[derive(Serialize)]
struct SymbolFilter<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    symbol: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct CustomersService {
    http: HttpClient,
}

impl CustomersService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self, query: &CustomerQuery) -> Result<Page<Customer>, ApiError> {
        self.http.get_with("/api/customers", query).await
    }

    pub async fn list_by_agent(
        &self,
        agent_id: i64,
        skip: Option<u64>,
        limit: Option<u64>,
    ) -> Result<Page<Customer>, ApiError> {
        let query = CustomerQuery {
            search: None,
            skip,
            limit,
        };
        self.http
            .get_with(&format!("/api/customers/by-agent/{agent_id}"), &query)
            .await
    }

    pub async fn get(&self, id: i64) -> Result<Customer, ApiError> {
        self.http.get(&format!("/api/customers/{id}")).await
    }

    pub async fn create(&self, customer: &CustomerCreate) -> Result<Customer, ApiError> {
        customer.validate()?;
        let created: Customer = self.http.post("/api/customers", customer).await?;
        info!(customer_id = created.id, name = %created.name, "Customer created");
        Ok(created)
    }

    pub async fn update(&self, id: i64, update: &CustomerUpdate) -> Result<Customer, ApiError> {
        update.validate()?;
        self.http.put(&format!("/api/customers/{id}"), update).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.http.delete(&format!("/api/customers/{id}")).await?;
        info!(customer_id = id, "Customer deleted");
        Ok(())
    }

    /// Open positions across all of the customer's accounts, netted per symbol.
    pub async fn positions(
        &self,
        id: i64,
        symbol: Option<&str>,
    ) -> Result<CustomerPositions, ApiError> {
        self.http
            .get_with(
                &format!("/api/customers/{id}/positions"),
                &SymbolFilter { symbol },
            )
            .await
    }
}
