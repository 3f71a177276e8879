//! Scripted in-memory transport for unit tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use vibe_core::transport::{ApiRequest, Method, Transport};
use vibe_core::{Result, SyncError};

type Reply = Result<Option<Value>>;
type Route = (Method, String);

#[derive(Default)]
struct MockState {
    queued: HashMap<Route, VecDeque<Reply>>,
    sticky: HashMap<Route, Reply>,
    gates: HashMap<Route, watch::Receiver<bool>>,
    requests: Vec<ApiRequest>,
}

/// Replies per `(method, path)`: queued one-shot replies first, then the
/// sticky reply, otherwise a 404.
#[derive(Default, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

/// Holds requests for one route open until released.
pub struct Gate(watch::Sender<bool>);

impl Gate {
    pub fn release(&self) {
        self.0.send_replace(true);
    }
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Always answer `method path` with `reply`.
    pub fn on(&self, method: Method, path: &str, reply: Reply) {
        let mut state = self.state.lock().unwrap();
        state.sticky.insert((method, path.to_string()), reply);
    }

    pub fn on_json(&self, method: Method, path: &str, body: Value) {
        self.on(method, path, Ok(Some(body)));
    }

    /// Answer the next `method path` request with `reply`.
    pub fn once(&self, method: Method, path: &str, reply: Reply) {
        let mut state = self.state.lock().unwrap();
        state
            .queued
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    pub fn once_json(&self, method: Method, path: &str, body: Value) {
        self.once(method, path, Ok(Some(body)));
    }

    /// Holds every `method path` request until the returned gate is released.
    pub fn hold(&self, method: Method, path: &str) -> Gate {
        let (tx, rx) = watch::channel(false);
        let mut state = self.state.lock().unwrap();
        state.gates.insert((method, path.to_string()), rx);
        Gate(tx)
    }

    /// Number of requests received for `method path`.
    pub fn calls(&self, method: Method, path: &str) -> usize {
        let state = self.state.lock().unwrap();
        state
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    /// Every request received for `method path`, in order.
    pub fn requests(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        let state = self.state.lock().unwrap();
        state
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<Option<Value>> {
        let route = (request.method, request.path.clone());
        let gate = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(request.clone());
            state.gates.get(&route).cloned()
        };

        if let Some(mut gate) = gate {
            let _ = gate.wait_for(|open| *open).await;
        }

        let mut state = self.state.lock().unwrap();
        if let Some(reply) = state.queued.get_mut(&route).and_then(VecDeque::pop_front) {
            return reply;
        }
        state.sticky.get(&route).cloned().unwrap_or_else(|| {
            Err(SyncError::Server {
                status: 404,
                message: format!("no mock for {}", request),
            })
        })
    }
}
