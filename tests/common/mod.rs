#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

/// How `GET /vendors` should answer. Lets tests provoke each failure class
/// without tearing the server down.
#[derive(Debug, Clone)]
pub enum VendorsMode {
    Ok,
    Failing,
    PlainText,
    WrongShape,
}

#[derive(Default)]
pub struct BackendState {
    /// Authorization header (verbatim) seen by each authenticated-route hit,
    /// `None` when the request carried no header.
    pub auth_seen: Mutex<Vec<Option<String>>>,
    /// Raw bodies received by `POST /search/vendors`, in arrival order.
    pub search_requests: Mutex<Vec<Value>>,
    pub vendors_mode: Mutex<Option<VendorsMode>>,
}

impl BackendState {
    fn record_auth(&self, headers: &HeaderMap) {
        let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        self.auth_seen.lock().unwrap().push(auth);
    }

    fn vendors_mode(&self) -> VendorsMode {
        self.vendors_mode
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(VendorsMode::Ok)
    }
}

/// In-process vendor backend for the integration tests.
pub struct MockBackend {
    addr: SocketAddr,
    shutdown: Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
    handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
    pub state: Arc<BackendState>,
}

impl MockBackend {
    pub async fn spawn() -> Self {
        let state = Arc::new(BackendState::default());

        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/vendors", get(list_vendors).post(create_vendor))
            .route("/search/vendors", post(search_vendors))
            .route("/health", get(health))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown: Mutex::new(Some(shutdown_tx)),
            handle: Mutex::new(Some(handle)),
            state,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Authorization header of the most recent authenticated-route request.
    pub fn last_auth(&self) -> Option<Option<String>> {
        self.state.auth_seen.lock().unwrap().last().cloned()
    }

    pub fn search_requests(&self) -> Vec<Value> {
        self.state.search_requests.lock().unwrap().clone()
    }

    pub fn set_vendors_mode(&self, mode: VendorsMode) {
        *self.state.vendors_mode.lock().unwrap() = Some(mode);
    }

    /// Shut the server down so subsequent requests fail at the transport
    /// level. Waits for the serve task to finish: graceful shutdown also
    /// closes idle keep-alive connections, so a client that already pooled
    /// a connection cannot keep talking to a stopped backend.
    pub async fn stop(&self) {
        if let Some(shutdown) = self.shutdown.lock().unwrap().take() {
            let _ = shutdown.send(());
        }
        let handle = self.handle.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

/// A base URL nothing is listening on (bound once to reserve a port, then
/// released), for connection-refused tests.
pub async fn refused_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn vendor_fixtures() -> Value {
    json!([
        {
            "id": 1,
            "name": "TensorWorks",
            "category": "Machine Learning",
            "description": "Custom vision models",
            "website_url": "https://tensorworks.test",
            "contact_email": "hello@tensorworks.test",
            "is_active": true,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": null
        },
        {
            "id": 2,
            "name": "VisionLabs",
            "category": "Image Recognition",
            "description": "Off-the-shelf image APIs",
            "website_url": null,
            "contact_email": null,
            "is_active": false,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": null
        }
    ])
}

async fn login(Json(body): Json<Value>) -> Response {
    let email = body.get("email").and_then(Value::as_str).unwrap_or("");
    let password = body.get("password").and_then(Value::as_str).unwrap_or("");

    if email == "test@example.com" && password == "password" {
        Json(json!({"access_token": "abc123", "token_type": "bearer"})).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "bad credentials"})),
        )
            .into_response()
    }
}

async fn register(Json(body): Json<Value>) -> Response {
    let email = body.get("email").and_then(Value::as_str).unwrap_or("");
    let name = body.get("name").and_then(Value::as_str).unwrap_or("");

    (
        StatusCode::CREATED,
        Json(json!({
            "id": 7,
            "email": email,
            "name": name,
            "is_active": true,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": null
        })),
    )
        .into_response()
}

async fn list_vendors(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    state.record_auth(&headers);
    match state.vendors_mode() {
        VendorsMode::Ok => Json(vendor_fixtures()).into_response(),
        VendorsMode::Failing => {
            (StatusCode::INTERNAL_SERVER_ERROR, "vendor index offline").into_response()
        }
        VendorsMode::PlainText => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            "<html>maintenance</html>",
        )
            .into_response(),
        VendorsMode::WrongShape => Json(json!({"vendors": []})).into_response(),
    }
}

async fn create_vendor(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record_auth(&headers);

    let mut created = body;
    created["id"] = json!(99);
    created["created_at"] = json!(Utc::now().to_rfc3339());
    created["updated_at"] = Value::Null;
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn search_vendors(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record_auth(&headers);
    state.search_requests.lock().unwrap().push(body.clone());

    let query = body.get("query").and_then(Value::as_str).unwrap_or("");

    if query.starts_with("slow") {
        tokio::time::sleep(Duration::from_millis(300)).await;
        return Json(json!([
            {
                "vendor_name": "SlowCorp",
                "category": "Batch Processing",
                "description": "Takes its time",
                "score": 0.41,
                "website_url": null
            }
        ]))
        .into_response();
    }

    if query == "boom" {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": "query rejected"})),
        )
            .into_response();
    }

    Json(json!([
        {
            "vendor_name": "TensorWorks",
            "category": "Machine Learning",
            "description": "Custom vision models",
            "score": 0.92,
            "website_url": "https://tensorworks.test"
        },
        {
            "vendor_name": "VisionLabs",
            "category": "Image Recognition",
            "description": "Off-the-shelf image APIs",
            "score": 0.87,
            "website_url": null
        }
    ]))
    .into_response()
}

async fn health(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    state.record_auth(&headers);
    Json(json!({"status": "healthy", "database": "connected"})).into_response()
}
