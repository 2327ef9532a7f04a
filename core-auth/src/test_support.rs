//! Hand-written fakes for the host bridges used in this crate's tests.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::storage::SecureStore;
use bridge_traits::time::Clock;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct InMemorySecureStore {
    storage: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemorySecureStore {
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.storage.lock().get(key).cloned()
    }

    pub fn put_raw(&self, key: &str, value: &[u8]) {
        self.storage.lock().insert(key.to_string(), value.to_vec());
    }
}

#[async_trait]
impl SecureStore for InMemorySecureStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()> {
        self.put_raw(key, value);
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.raw(key))
    }

    async fn delete_secret(&self, key: &str) -> Result<()> {
        self.storage.lock().remove(key);
        Ok(())
    }
}

/// Secure store whose every call fails.
pub struct BrokenSecureStore;

#[async_trait]
impl SecureStore for BrokenSecureStore {
    async fn set_secret(&self, _key: &str, _value: &[u8]) -> Result<()> {
        Err(BridgeError::NotAvailable("keystore locked".to_string()))
    }

    async fn get_secret(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Err(BridgeError::NotAvailable("keystore locked".to_string()))
    }

    async fn delete_secret(&self, _key: &str) -> Result<()> {
        Err(BridgeError::NotAvailable("keystore locked".to_string()))
    }
}

/// HTTP client answering from a queue and recording every request.
#[derive(Clone, Default)]
pub struct ScriptedHttpClient {
    responses: Arc<Mutex<VecDeque<Result<HttpResponse>>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl ScriptedHttpClient {
    pub fn respond(&self, status: u16, body: serde_json::Value) {
        self.responses.lock().push_back(Ok(HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }));
    }

    pub fn fail(&self, message: &str) {
        self.responses
            .lock()
            .push_back(Err(BridgeError::OperationFailed(message.to_string())));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(BridgeError::OperationFailed("no scripted response".to_string())))
    }
}

/// Clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Utc::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
