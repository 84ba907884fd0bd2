/// In-process fake HTTP service for client tests
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Router;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::api::AUTH_TOKEN_HEADER;

/// A request seen by the fake service
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub token: Option<String>,
    pub body: Option<Value>,
}

struct Route {
    method: Method,
    path: String,
    status: StatusCode,
    body: String,
}

#[derive(Default)]
struct FakeState {
    routes: Vec<Route>,
    requests: Mutex<Vec<Recorded>>,
}

#[derive(Default)]
pub struct FakeServiceBuilder {
    routes: Vec<Route>,
}

impl FakeServiceBuilder {
    /// Answer `method path` with a JSON body
    pub fn route(self, method: &str, path: &str, status: u16, body: Value) -> Self {
        self.route_raw(method, path, status, &body.to_string())
    }

    /// Answer `method path` with a verbatim body
    pub fn route_raw(mut self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.routes.push(Route {
            method: method.parse().expect("valid method"),
            path: path.to_string(),
            status: StatusCode::from_u16(status).expect("valid status"),
            body: body.to_string(),
        });
        self
    }

    pub async fn spawn(self) -> FakeService {
        let state = Arc::new(FakeState {
            routes: self.routes,
            requests: Mutex::new(Vec::new()),
        });
        let app = Router::new()
            .fallback(handle)
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake service");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake service");
        });

        FakeService {
            base_url: format!("http://{}", addr),
            state,
        }
    }
}

pub struct FakeService {
    pub base_url: String,
    state: Arc<FakeState>,
}

impl FakeService {
    pub fn builder() -> FakeServiceBuilder {
        FakeServiceBuilder::default()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().expect("requests lock").clone()
    }
}

async fn handle(
    State(state): State<Arc<FakeState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let token = headers
        .get(AUTH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.requests.lock().expect("requests lock").push(Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        token,
        body: serde_json::from_slice(&body).ok(),
    });

    match state
        .routes
        .iter()
        .find(|r| r.method == method && r.path == uri.path())
    {
        Some(route) => (
            route.status,
            [(header::CONTENT_TYPE, "application/json")],
            route.body.clone(),
        ),
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "application/json")],
            "{}".to_string(),
        ),
    }
}
