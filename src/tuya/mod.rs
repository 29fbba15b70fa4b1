//! Tuya cloud OpenAPI integration module
//!
//! - `transport`: HTTP seam (reqwest implementation + trait for doubles)
//! - `sign`: HMAC-SHA256 request signing
//! - `token`: Access token acquisition, caching and refresh coalescing
//! - `client`: Signed device status / command calls

pub mod client;
pub mod sign;
pub mod token;
pub mod transport;

#[cfg(test)]
pub mod mock;

use serde::Deserialize;

pub use client::{CommandResult, SensorReading, SignedApiClient};
pub use token::{AuthTokenProvider, Credentials};
pub use transport::{CloudTransport, HttpTransport};

/// Upstream error code for an invalid or expired access token
pub const TOKEN_INVALID_CODE: i64 = 1010;

/// Envelope shared by every OpenAPI response
#[derive(Debug, Deserialize)]
pub struct TuyaResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub code: Option<i64>,
    pub msg: Option<String>,
    pub result: Option<T>,
}

impl<T> TuyaResponse<T> {
    /// Upstream message for a rejected call
    pub fn error_message(&self) -> String {
        match (&self.code, &self.msg) {
            (Some(code), Some(msg)) => format!("{} (code {})", msg, code),
            (None, Some(msg)) => msg.clone(),
            (Some(code), None) => format!("code {}", code),
            (None, None) => "request rejected".to_string(),
        }
    }
}
