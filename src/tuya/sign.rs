//! HMAC-SHA256 request signing
//!
//! Every call mints its own timestamp, so a signature is never reused:
//!
//! ```text
//! client_id + [access_token] + t + METHOD + "\n" + sha256(body) + "\n\n" + path
//! ```

use std::fmt::Write;

use hmac::{Hmac, Mac};
use reqwest::Method;
use sha2::{Digest, Sha256};

use super::token::Credentials;
use super::transport::CloudRequest;
use crate::error::TuyaError;

pub const SIGN_METHOD: &str = "HMAC-SHA256";

/// Lowercase hex SHA-256 of the request body
pub fn content_sha256(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    let mut hex = String::with_capacity(64);
    for byte in digest {
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

/// Uppercase hex HMAC-SHA256 of `message` keyed by `secret`
pub fn sign(secret: &str, message: &str) -> Result<String, TuyaError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| TuyaError::Auth(format!("Invalid signing key: {}", e)))?;
    mac.update(message.as_bytes());

    let mut hex = String::with_capacity(64);
    for byte in mac.finalize().into_bytes() {
        let _ = write!(&mut hex, "{byte:02X}");
    }
    Ok(hex)
}

/// Current time in milliseconds, as sent in the `t` header
pub fn timestamp_millis() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

pub fn string_to_sign(
    client_id: &str,
    access_token: Option<&str>,
    timestamp: &str,
    method: &Method,
    body_hash: &str,
    path: &str,
) -> String {
    format!(
        "{}{}{}{}\n{}\n\n{}",
        client_id,
        access_token.unwrap_or(""),
        timestamp,
        method.as_str(),
        body_hash,
        path
    )
}

#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub method: Method,
    pub path: String,
    pub timestamp: String,
    pub body_hash: String,
    pub signature: String,
}

impl SignedRequest {
    /// Sign `body` for one call. `access_token` is `None` only for the token endpoint.
    pub fn new(
        credentials: &Credentials,
        access_token: Option<&str>,
        method: Method,
        path: &str,
        body: &[u8],
        timestamp: String,
    ) -> Result<Self, TuyaError> {
        let body_hash = content_sha256(body);
        let message = string_to_sign(
            &credentials.client_id,
            access_token,
            &timestamp,
            &method,
            &body_hash,
            path,
        );
        let signature = sign(credentials.client_secret(), &message)?;

        Ok(Self {
            method,
            path: path.to_string(),
            timestamp,
            body_hash,
            signature,
        })
    }

    /// Attach the signed headers; `body` must be the bytes that were hashed
    pub fn into_request(
        self,
        credentials: &Credentials,
        access_token: Option<&str>,
        body: Option<Vec<u8>>,
    ) -> CloudRequest {
        let mut headers = vec![
            ("sign_method", SIGN_METHOD.to_string()),
            ("client_id", credentials.client_id.clone()),
            ("t", self.timestamp),
            ("sign", self.signature),
            ("Content-Type", "application/json".to_string()),
        ];
        if let Some(token) = access_token {
            headers.push(("access_token", token.to_string()));
        }

        CloudRequest {
            method: self.method,
            path: self.path,
            headers,
            body,
        }
    }
}
