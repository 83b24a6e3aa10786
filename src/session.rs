use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::cache::CacheBackend;
use crate::errors::ServiceError;
use crate::repositories::product_repository::{CatalogFilter, SortKey};

/// Per-visitor state persisted between requests.
///
/// The shop works without any visitor account: sort choice, search text,
/// filter panel state and the comparison list all live here, keyed by the
/// caller-supplied session ID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// Catalog sort the visitor picked, applied while browsing.
    #[serde(default)]
    pub sort: Option<SortKey>,
    /// Search text the visitor last submitted.
    #[serde(default)]
    pub search_query: Option<String>,
    /// Filter panel state the visitor last submitted.
    #[serde(default)]
    pub filter: Option<CatalogFilter>,
    /// Products queued for comparison, in insertion order.
    #[serde(default)]
    pub compare: Vec<Uuid>,
}

/// Session persistence on top of the cache backend.
#[derive(Clone)]
pub struct SessionStore {
    cache: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(cache: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    fn key(session_id: &str) -> String {
        format!("session:{}", session_id)
    }

    /// Loads session state. An unknown ID yields a fresh session.
    pub async fn load(&self, session_id: &str) -> Result<SessionData, ServiceError> {
        match self.cache.get(&Self::key(session_id)).await? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(data) => Ok(data),
                Err(e) => {
                    warn!(session_id, "Discarding unreadable session state: {}", e);
                    Ok(SessionData::default())
                }
            },
            None => Ok(SessionData::default()),
        }
    }

    /// Persists session state, refreshing its TTL.
    pub async fn save(&self, session_id: &str, data: &SessionData) -> Result<(), ServiceError> {
        let json = serde_json::to_string(data)?;
        self.cache
            .set(&Self::key(session_id), &json, Some(self.ttl))
            .await?;
        Ok(())
    }

    /// Drops all state stored for a session.
    pub async fn delete(&self, session_id: &str) -> Result<(), ServiceError> {
        self.cache.delete(&Self::key(session_id)).await?;
        Ok(())
    }
}

/// Header carrying the visitor's session ID.
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// Header carrying the authenticated user's ID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller-supplied session ID.
///
/// The API never mints session IDs (cookie mechanics are out of scope);
/// the storefront sends one in `x-session-id`. Extracting it on a route
/// that needs a session fails with a validation error when the header is
/// missing; routes that merely *use* session state when present extract
/// `Option<SessionId>` instead.
#[derive(Debug, Clone)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionId {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(SESSION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| SessionId(v.to_string()))
            .ok_or_else(|| {
                ServiceError::InvalidInput(format!("Missing {} header", SESSION_ID_HEADER))
            })
    }
}

/// The authenticated user's ID, taken from `x-user-id`.
///
/// Validating the value against an account store is authentication
/// mechanics and out of scope; a missing or malformed header is rejected.
#[derive(Debug, Clone, Copy)]
pub struct UserId(pub Uuid);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for UserId {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .map(UserId)
            .ok_or_else(|| {
                ServiceError::Unauthorized(format!("Missing or invalid {} header", USER_ID_HEADER))
            })
    }
}
