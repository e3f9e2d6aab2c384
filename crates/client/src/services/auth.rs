use std::sync::Arc;

use brokerdesk_core::{ApiError, LoginRequest, TokenPair};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

use super::Ack;
use crate::http::HttpClient;

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Session handling. Tokens live in memory only; the access token is shared
/// with every other service through the [`HttpClient`].
#[derive(Debug, Clone)]
pub struct AuthService {
    http: HttpClient,
    refresh_token: Arc<RwLock<Option<String>>>,
}

impl AuthService {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            refresh_token: Arc::new(RwLock::new(None)),
        }
    }

    async fn store(&self, tokens: &TokenPair) {
        self.http.set_token(Some(tokens.access_token.clone())).await;
        *self.refresh_token.write().await = Some(tokens.refresh_token.clone());
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, ApiError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "email and password are required".to_string(),
            ));
        }
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let tokens: TokenPair = self.http.post("/auth/login", &request).await?;
        self.store(&tokens).await;
        info!(email = %request.email, "Logged in");
        Ok(tokens)
    }

    /// Exchange the stored refresh token for a new pair.
    pub async fn refresh(&self) -> Result<TokenPair, ApiError> {
        let current = self.refresh_token.read().await.clone();
        match current {
            Some(token) => self.refresh_with(&token).await,
            None => Err(ApiError::Unauthorized("no refresh token".to_string())),
        }
    }

    pub async fn refresh_with(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let tokens: TokenPair = self
            .http
            .post("/auth/refresh", &RefreshRequest { refresh_token })
            .await?;
        self.store(&tokens).await;
        Ok(tokens)
    }

    /// Tell the server, then forget the tokens even if the call failed.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self
            .http
            .post::<Ack, _>("/auth/logout", &serde_json::json!({}))
            .await;
        self.http.set_token(None).await;
        *self.refresh_token.write().await = None;
        result.map(|_| ())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.http.token().await.is_some()
    }
}
