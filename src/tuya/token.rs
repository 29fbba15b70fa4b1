//! Access token lifecycle
//!
//! The token is cached until `expires_at`. Concurrent callers that find no
//! valid token queue on a single refresh lock. The first one fetches; the rest
//! take the outcome it left behind, success or failure, so one expiry window
//! costs exactly one authentication call.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use super::sign::{timestamp_millis, SignedRequest};
use super::transport::CloudTransport;
use super::TuyaResponse;
use crate::error::TuyaError;

pub const TOKEN_PATH: &str = "/v1.0/token?grant_type=1";

/// Project credentials, loaded once at startup
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: Instant,
}

impl AccessToken {
    pub fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResult {
    access_token: String,
    #[serde(default)]
    expire_time: Option<u64>,
}

pub struct AuthTokenProvider {
    credentials: Credentials,
    transport: Arc<dyn CloudTransport>,
    token: RwLock<Option<AccessToken>>,
    /// Outcome of the most recent refresh
    refresh: Mutex<Option<Result<AccessToken, TuyaError>>>,
    /// Completed refreshes
    generation: AtomicU64,
    refresh_margin: Duration,
}

impl AuthTokenProvider {
    pub fn new(credentials: Credentials, transport: Arc<dyn CloudTransport>) -> Self {
        Self {
            credentials,
            transport,
            token: RwLock::new(None),
            refresh: Mutex::new(None),
            generation: AtomicU64::new(0),
            refresh_margin: Duration::ZERO,
        }
    }

    /// Expire cached tokens `margin` earlier than the upstream says
    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Return a token that is valid right now, refreshing if needed
    pub async fn get_token(&self) -> Result<AccessToken, TuyaError> {
        let seen = self.generation.load(Ordering::Acquire);
        if let Some(token) = self.cached().await {
            return Ok(token);
        }

        let mut last = self.refresh.lock().await;

        if let Some(token) = self.cached().await {
            return Ok(token);
        }

        // A refresh finished while we waited; its result is ours too
        if self.generation.load(Ordering::Acquire) != seen {
            if let Some(outcome) = last.as_ref() {
                return outcome.clone();
            }
        }

        let outcome = self.refresh_token().await;
        *last = Some(outcome.clone());
        self.generation.fetch_add(1, Ordering::Release);
        outcome
    }

    /// Drop the cached token so the next call authenticates again
    pub async fn invalidate(&self) {
        let mut token = self.token.write().await;
        if token.take().is_some() {
            tracing::info!("[Tuya] Cached access token invalidated");
        }
    }

    async fn cached(&self) -> Option<AccessToken> {
        let token = self.token.read().await;
        token.as_ref().filter(|t| t.is_valid()).cloned()
    }

    async fn refresh_token(&self) -> Result<AccessToken, TuyaError> {
        let request = SignedRequest::new(
            &self.credentials,
            None,
            Method::GET,
            TOKEN_PATH,
            b"",
            timestamp_millis(),
        )?
        .into_request(&self.credentials, None, None);

        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| TuyaError::Auth(format!("Token request failed: {}", e)))?;

        let envelope: TuyaResponse<TokenResult> = serde_json::from_value(response)
            .map_err(|e| TuyaError::Auth(format!("Token parse failed: {}", e)))?;

        if !envelope.success {
            return Err(TuyaError::Auth(envelope.error_message()));
        }

        let result = envelope
            .result
            .ok_or_else(|| TuyaError::Auth("No token in response".to_string()))?;

        let now = Instant::now();
        let lifetime = Duration::from_secs(result.expire_time.unwrap_or(0));
        let expires_at = now
            .checked_add(lifetime.saturating_sub(self.refresh_margin))
            .ok_or_else(|| {
                TuyaError::Auth(format!("Token expire_time out of range: {}", lifetime.as_secs()))
            })?;
        let token = AccessToken {
            value: result.access_token,
            expires_at,
        };

        if token.expires_at > now {
            *self.token.write().await = Some(token.clone());
            tracing::info!(
                "[Tuya] Token acquired, expires in {} sec",
                lifetime.as_secs()
            );
        } else {
            tracing::warn!("[Tuya] Token acquired without usable lifetime, not cached");
        }

        Ok(token)
    }
}
