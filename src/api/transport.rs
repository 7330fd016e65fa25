//! Transport seam to the game servers.
//!
//! The HTTP/OAuth client lives outside this crate; anything that can answer a
//! [GameRequest] with a JSON body can drive the session. Two implementations
//! ship here: [FixtureTransport] replays captured responses from disk and
//! [MemoryTransport] serves canned values for tests and benches.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no response available for `{resource}`")]
    NotFound { resource: String },
    #[error("invalid resource key `{0}`")]
    InvalidKey(String),
    #[error("transport io failed: {0}")]
    Io(#[from] io::Error),
    #[error("response is not valid json: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameRequest {
    pub method: Method,
    /// Server root, e.g. `https://stt.disruptorbeam.com/`.
    pub base: String,
    /// Path below the root, e.g. `player` or `stasis_vault/immortal_restore_info`.
    pub resource: String,
    pub params: Map<String, Value>,
    /// Bearer token for POST requests; GET requests carry it in `params`.
    pub access_token: Option<String>,
}

impl GameRequest {
    pub fn url(&self) -> String {
        format!("{}{}", self.base, self.resource)
    }

    /// Lookup key for replayed responses: the resource, plus `/<symbol>` when
    /// the request is keyed by a crew symbol.
    pub fn fixture_key(&self) -> String {
        match self.params.get("symbol").and_then(Value::as_str) {
            Some(symbol) => format!("{}/{}", self.resource, symbol),
            None => self.resource.clone(),
        }
    }
}

pub trait GameTransport {
    fn send(
        &self,
        request: GameRequest,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

/// Replays `<dir>/<fixture_key>.json` files.
#[derive(Debug, Clone)]
pub struct FixtureTransport {
    dir: PathBuf,
}

impl FixtureTransport {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, TransportError> {
        if key.is_empty() || key.split('/').any(|part| part.is_empty() || part == "..") {
            return Err(TransportError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl GameTransport for FixtureTransport {
    async fn send(&self, request: GameRequest) -> Result<Value, TransportError> {
        let key = request.fixture_key();
        let path = self.path_for(&key)?;
        debug!(path = %path.display(), "replaying fixture");
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(TransportError::NotFound { resource: key });
            }
            Err(err) => return Err(TransportError::Io(err)),
        };
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Canned responses keyed by [GameRequest::fixture_key]; records every request.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    responses: Mutex<HashMap<String, Value>>,
    requests: Mutex<Vec<GameRequest>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, key: &str, body: Value) -> Self {
        self.set_response(key, body);
        self
    }

    pub fn set_response(&self, key: &str, body: Value) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.insert(key.to_string(), body);
        }
    }

    pub fn requests(&self) -> Vec<GameRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn request_count(&self, key: &str) -> usize {
        self.requests()
            .iter()
            .filter(|request| request.fixture_key() == key)
            .count()
    }
}

impl GameTransport for MemoryTransport {
    async fn send(&self, request: GameRequest) -> Result<Value, TransportError> {
        let key = request.fixture_key();
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        self.responses
            .lock()
            .ok()
            .and_then(|responses| responses.get(&key).cloned())
            .ok_or(TransportError::NotFound { resource: key })
    }
}
