use brokerdesk_core::{ApiError, User, UserCreate, UserList, UserUpdate};
use serde::Serialize;
use tracing::info;

use crate::http::HttpClient;

/// Filters for the staff user list. Paging is offset-based.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserQuery {
    /// Matches email or full name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// Back-office logins. Mutations require an admin token.
#[derive(Debug, Clone)]
pub struct UsersService {
    http: HttpClient,
}

impl UsersService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self, query: &UserQuery) -> Result<UserList, ApiError> {
        self.http.get_with("/api/users", query).await
    }

    pub async fn get(&self, id: i64) -> Result<User, ApiError> {
        self.http.get(&format!("/api/users/{id}")).await
    }

    pub async fn create(&self, user: &UserCreate) -> Result<User, ApiError> {
        user.validate()?;
        let created: User = self.http.post("/api/users", user).await?;
        info!(user_id = created.id, role = created.role.as_str(), "User created");
        Ok(created)
    }

    pub async fn update(&self, id: i64, update: &UserUpdate) -> Result<User, ApiError> {
        update.validate()?;
        if update.is_empty() {
            return Err(ApiError::Validation("nothing to update".to_string()));
        }
        let updated: User = self.http.put(&format!("/api/users/{id}"), update).await?;
        info!(user_id = updated.id, "User updated");
        Ok(updated)
    }

    /// The server refuses to delete the caller's own user.
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.http.delete(&format!("/api/users/{id}")).await?;
        info!(user_id = id, "User deleted");
        Ok(())
    }
}
