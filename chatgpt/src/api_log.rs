use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One request/response pair sent to the model API.
#[derive(Debug, Clone, Serialize)]
pub struct ApiExchange {
    pub timestamp: DateTime<Utc>,
    pub request: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Newest-first record of every exchange made by a client.
#[derive(Debug, Clone, Default)]
pub struct ApiLog {
    exchanges: Arc<Mutex<VecDeque<ApiExchange>>>,
}

impl ApiLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, exchange: ApiExchange) {
        let mut guard = self.exchanges.lock().unwrap_or_else(|e| e.into_inner());
        guard.push_front(exchange);
    }

    pub fn entries(&self) -> Vec<ApiExchange> {
        let guard = self.exchanges.lock().unwrap_or_else(|e| e.into_inner());
        guard.iter().cloned().collect()
    }

    pub fn clear(&self) {
        let mut guard = self.exchanges.lock().unwrap_or_else(|e| e.into_inner());
        guard.clear();
    }

    pub fn len(&self) -> usize {
        self.exchanges.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
