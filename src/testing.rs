//! Test infrastructure: MockGeocoder and MockGenerationBackend.
//!
//! Both record every call so tests can assert that failing stages stop the
//! pipeline before any further external calls are made.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::ChartError;
use crate::geocode::Geocoder;
use crate::reading::GenerationBackend;
use crate::types::Coordinates;

// ---------------------------------------------------------------------------
// MockGeocoder
// ---------------------------------------------------------------------------

/// Geocoder with one scripted outcome, shared across calls.
pub struct MockGeocoder {
    result: Option<Coordinates>,
    pub call_log: Mutex<Vec<String>>,
}

impl MockGeocoder {
    pub fn with_coordinates(latitude: f64, longitude: f64) -> Self {
        Self {
            result: Some(Coordinates {
                latitude,
                longitude,
            }),
            call_log: Mutex::new(Vec::new()),
        }
    }

    /// Always reports zero matches.
    pub fn not_found() -> Self {
        Self {
            result: None,
            call_log: Mutex::new(Vec::new()),
        }
    }

    pub async fn call_count(&self) -> usize {
        self.call_log.lock().await.len()
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn resolve(&self, place: &str) -> Result<Coordinates, ChartError> {
        self.call_log.lock().await.push(place.to_string());
        self.result
            .ok_or_else(|| ChartError::LocationNotFound(place.to_string()))
    }
}

// ---------------------------------------------------------------------------
// MockGenerationBackend
// ---------------------------------------------------------------------------

/// Scripted outcome for one `complete()` call.
pub enum MockCompletion {
    Text(String),
    Failure,
}

/// A recorded call to `MockGenerationBackend::complete()`.
#[derive(Debug, Clone)]
pub struct MockGenerationCall {
    pub messages: Vec<Value>,
    pub max_tokens: u32,
    pub credential: String,
}

/// Generation backend that returns scripted responses in FIFO order; once
/// the script runs out it returns "Mock reading".
pub struct MockGenerationBackend {
    responses: Mutex<Vec<MockCompletion>>,
    pub call_log: Mutex<Vec<MockGenerationCall>>,
}

impl MockGenerationBackend {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            call_log: Mutex::new(Vec::new()),
        }
    }

    pub fn with_responses(responses: Vec<MockCompletion>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_log: Mutex::new(Vec::new()),
        }
    }

    pub async fn call_count(&self) -> usize {
        self.call_log.lock().await.len()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn complete(
        &self,
        messages: &[Value],
        max_tokens: u32,
        credential: &str,
    ) -> anyhow::Result<String> {
        self.call_log.lock().await.push(MockGenerationCall {
            messages: messages.to_vec(),
            max_tokens,
            credential: credential.to_string(),
        });

        let mut responses = self.responses.lock().await;
        if responses.is_empty() {
            return Ok("Mock reading".to_string());
        }
        match responses.remove(0) {
            MockCompletion::Text(text) => Ok(text),
            MockCompletion::Failure => Err(anyhow::anyhow!("mock backend failure")),
        }
    }
}
