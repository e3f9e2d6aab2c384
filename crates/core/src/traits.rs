use crate::events::LiveMessage;
use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by the REST services.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Not authenticated: {0}")]
    Unauthorized(String),
    #[error("Permission denied: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Invalid response: {0}")]
    Decode(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Map a non-success HTTP status and its error detail onto the taxonomy.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => ApiError::Unauthorized(message),
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            408 | 504 => ApiError::Timeout,
            400 | 422 => ApiError::Validation(message),
            _ => ApiError::Http { status, message },
        }
    }

    /// Whether the same request may succeed if simply repeated later.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout => true,
            ApiError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Errors from a live WebSocket channel.
#[derive(Debug, thiserror::Error)]
pub enum LiveError {
    #[error("Connection failed: {0}")]
    Connect(String),
    #[error("Connection closed: {0}")]
    Closed(String),
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

// ---------------------------------------------------------------------------
// Live Feed Trait
// ---------------------------------------------------------------------------

/// A view whose state is loaded over REST and kept fresh by push messages.
///
/// Implementations describe what to fetch, where to subscribe, and how to fold
/// a push message into the current state; the live view drives the rest.
#[async_trait]
pub trait LiveFeed: Send + Sync + 'static {
    type State: Clone + Default + PartialEq + Send + Sync + 'static;

    /// Short name used in log fields.
    fn name(&self) -> &str;

    /// WebSocket path relative to the server root, e.g. `/ws/dashboard`.
    fn ws_path(&self) -> String;

    /// Whether reconnection should pause while the view is hidden.
    fn requires_visibility(&self) -> bool {
        false
    }

    /// Load the full state over REST.
    async fn fetch(&self) -> Result<Self::State, ApiError>;

    /// Fold a push message into `state`. Returns `true` only when a field
    /// actually changed.
    fn reconcile(&self, state: &mut Self::State, message: LiveMessage) -> bool;

    /// Replace `state` with a freshly fetched one. Returns `true` when they differ.
    fn merge_fetched(&self, state: &mut Self::State, fresh: Self::State) -> bool {
        if *state == fresh {
            false
        } else {
            *state = fresh;
            true
        }
    }
}

/// Assign `value` to `slot` when it differs. Returns whether it changed.
pub fn replace_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}
