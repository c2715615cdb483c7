#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::{Value, json};
use storefront_provider::config::ClientConfig;
use storefront_provider::errors::{ApiError, ApiResult};
use storefront_provider::transport::{ApiRequest, Method, Transport};
use storefront_provider::QueryClient;

struct Scripted {
    delay: Duration,
    result: ApiResult<Value>,
}

#[derive(Default)]
struct FakeState {
    requests: Vec<ApiRequest>,
    queued: HashMap<(Method, String), VecDeque<Scripted>>,
    fixed: HashMap<(Method, String), Value>,
}

/// In-memory backend recording every request
#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every `method path` request with `body`
    pub fn respond(&self, method: Method, path: &str, body: Value) -> &Self {
        self.state
            .lock()
            .unwrap()
            .fixed
            .insert((method, path.to_string()), body);
        self
    }

    /// Answer the next `method path` request with `result` after `delay`.
    /// Queued answers take precedence over [`respond`](Self::respond).
    pub fn respond_once(
        &self,
        method: Method,
        path: &str,
        delay: Duration,
        result: ApiResult<Value>,
    ) -> &Self {
        self.state
            .lock()
            .unwrap()
            .queued
            .entry((method, path.to_string()))
            .or_default()
            .push_back(Scripted { delay, result });
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn calls(&self, method: Method, path: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|request| request.method == method && request.path == path)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }
}

impl Transport for FakeTransport {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, ApiResult<Value>> {
        let scripted = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(request.clone());
            let key = (request.method, request.path.clone());
            match state.queued.get_mut(&key).and_then(VecDeque::pop_front) {
                Some(scripted) => scripted,
                None => Scripted {
                    delay: Duration::ZERO,
                    result: state.fixed.get(&key).cloned().ok_or_else(|| ApiError::Http {
                        status: 404,
                        data: json!({ "message": format!("no route for {} {}", request.method.as_str(), request.path) }),
                    }),
                },
            }
        };
        Box::pin(async move {
            if !scripted.delay.is_zero() {
                tokio::time::sleep(scripted.delay).await;
            }
            scripted.result
        })
    }
}

pub fn client_with(transport: &FakeTransport) -> QueryClient {
    QueryClient::with_transport(ClientConfig::new("http://localhost:5000"), transport.clone())
}

/// `{ success: true, data }`
pub fn ok(data: Value) -> Value {
    json!({ "success": true, "data": data })
}

pub fn product(id: &str, price: f64, stock: i64) -> Value {
    json!({ "_id": id, "name": format!("Product {id}"), "price": price, "stock": stock })
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Let spawned fetches run to completion
pub async fn settle_tasks() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
