//! HTTP transport for the cloud API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};

/// One outbound call, already signed
#[derive(Debug, Clone)]
pub struct CloudRequest {
    pub method: Method,
    /// Path and query, e.g. `/v1.0/token?grant_type=1`
    pub path: String,
    pub headers: Vec<(&'static str, String)>,
    /// Exact bytes covered by the content hash
    pub body: Option<Vec<u8>>,
}

impl CloudRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Executes signed requests and returns the decoded JSON body
#[async_trait]
pub trait CloudTransport: Send + Sync {
    async fn execute(&self, request: CloudRequest) -> Result<serde_json::Value, String>;
}

pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CloudTransport for HttpTransport {
    async fn execute(&self, request: CloudRequest) -> Result<serde_json::Value, String> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = self.client.request(request.method.clone(), &url);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let resp = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                format!("{} {} timed out", request.method, request.path)
            } else {
                format!("{} {} failed: {}", request.method, request.path, e)
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(format!("HTTP {}: {}", status.as_u16(), text));
        }

        resp.json::<serde_json::Value>()
            .await
            .map_err(|e| format!("Response parse failed: {}", e))
    }
}
