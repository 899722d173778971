// In-process stand-in for the bell device: an axum router on its own tokio
// runtime that answers every device endpoint with a canned reply and keeps
// the requests it saw.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::{SocketAddr, TcpListener};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::oneshot;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub content_type: Option<String>,
    pub body: String,
}

impl Recorded {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "application/json",
            body: body.into(),
        }
    }
}

#[derive(Clone)]
struct DeviceState {
    fallback: Reply,
    by_path: Arc<HashMap<&'static str, Reply>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

async fn answer(
    State(state): State<DeviceState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let path = uri.path().to_string();
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let reply = state
        .by_path
        .get(path.as_str())
        .unwrap_or(&state.fallback)
        .clone();
    state.requests.lock().unwrap().push(Recorded {
        method,
        path,
        content_type,
        body,
    });

    (
        reply.status,
        [(header::CONTENT_TYPE, reply.content_type)],
        reply.body,
    )
}

pub struct FakeDevice {
    pub url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    // dropping the sender stops the server
    _shutdown: oneshot::Sender<()>,
}

impl FakeDevice {
    /// Same reply on every endpoint.
    pub fn respond(status: StatusCode, content_type: &'static str, body: &str) -> Self {
        Self::serve(
            Reply {
                status,
                content_type,
                body: body.to_string(),
            },
            HashMap::new(),
        )
    }

    pub fn json(body: &str) -> Self {
        Self::serve(Reply::json(body), HashMap::new())
    }

    /// Per-path replies; anything else gets `{"ok":true}`.
    pub fn routes(replies: impl IntoIterator<Item = (&'static str, Reply)>) -> Self {
        Self::serve(Reply::json(r#"{"ok":true}"#), replies.into_iter().collect())
    }

    fn serve(fallback: Reply, by_path: HashMap<&'static str, Reply>) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = DeviceState {
            fallback,
            by_path: Arc::new(by_path),
            requests: Arc::clone(&requests),
        };
        let app = Router::new()
            .route("/api/time", get(answer).post(answer))
            .route("/api/config", get(answer).post(answer))
            .route("/api/test", post(answer))
            .with_state(state);

        let (addr_tx, addr_rx) = mpsc::channel::<SocketAddr>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
                addr_tx.send(listener.local_addr().unwrap()).unwrap();
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = shutdown_rx.await;
                    })
                    .await
                    .unwrap();
            });
        });

        let addr = addr_rx.recv().unwrap();
        Self {
            url: format!("http://{addr}"),
            requests,
            _shutdown: shutdown_tx,
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    /// The only request the device received.
    pub fn request(&self) -> Recorded {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected one request, got {requests:?}");
        requests[0].clone()
    }
}

/// An address nothing listens on.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
