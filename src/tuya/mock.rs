//! In-process transport double for tests

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::transport::{CloudRequest, CloudTransport};

type Responder = Box<dyn Fn(&CloudRequest) -> Result<serde_json::Value, String> + Send + Sync>;

pub struct MockTransport {
    responder: Responder,
    delay: Option<Duration>,
    requests: Mutex<Vec<CloudRequest>>,
}

impl MockTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&CloudRequest) -> Result<serde_json::Value, String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<CloudRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<CloudRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    /// Requests whose path contains `fragment`
    pub fn requests_to(&self, fragment: &str) -> Vec<CloudRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.contains(fragment))
            .collect()
    }
}

#[async_trait]
impl CloudTransport for MockTransport {
    async fn execute(&self, request: CloudRequest) -> Result<serde_json::Value, String> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(&request)
    }
}

pub const TOKEN: &str = "tok123";

pub fn token() -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "result": { "access_token": TOKEN, "expire_time": 7200, "uid": "u1" }
    })
}

/// Status payload with raw (x10) sensor values
pub fn status(device_id: &str, temperature_x10: i64, humidity_x10: i64) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "result": [{
            "id": device_id,
            "status": [
                { "code": "va_temperature", "value": temperature_x10 },
                { "code": "va_humidity", "value": humidity_x10 },
                { "code": "battery_percentage", "value": 100 }
            ]
        }]
    })
}

/// Token and command endpoints succeed; status calls are answered by `status_fn`
pub fn cloud<F>(
    status_fn: F,
) -> impl Fn(&CloudRequest) -> Result<serde_json::Value, String> + Send + Sync + 'static
where
    F: Fn() -> serde_json::Value + Send + Sync + 'static,
{
    move |request| {
        if request.path.starts_with("/v1.0/token") {
            Ok(token())
        } else if request.path.ends_with("/commands") {
            Ok(serde_json::json!({ "success": true, "result": true }))
        } else {
            Ok(status_fn())
        }
    }
}
