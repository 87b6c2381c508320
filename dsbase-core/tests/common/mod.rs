//! In-process fake of the ds admin API
//!
//! Every request is recorded. Replies are scripted per path; unscripted
//! paths answer 404. Uploads sent as multipart are kept so that
//! `/upload/<user>-<repo>/<name>` serves them back.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request, State};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use dsbase_core::{ClientBuilder, MemoryStore};
use tokio::net::TcpListener;

/// A request as the fake server saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn body_json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }
}

#[derive(Clone, Default)]
struct FakeState {
    replies: Arc<Mutex<HashMap<String, (u16, String)>>>,
    log: Arc<Mutex<Vec<Recorded>>>,
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    keep_uploads: bool,
}

pub struct FakeServer {
    pub port: u16,
    state: FakeState,
}

impl FakeServer {
    /// Scripted replies only
    pub async fn start() -> Self {
        Self::launch(FakeState::default()).await
    }

    /// Also accept uploads and serve them back
    pub async fn start_consistent() -> Self {
        Self::launch(FakeState {
            keep_uploads: true,
            ..FakeState::default()
        })
        .await
    }

    async fn launch(state: FakeState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("local listener should bind");
        let port = listener.local_addr().expect("local address").port();

        let app = Router::new().fallback(handle).with_state(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake server");
        });

        Self { port, state }
    }

    /// Script the reply for `path`
    pub fn reply(&self, path: &str, status: u16, body: &str) {
        self.state
            .replies
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.log.lock().unwrap().clone()
    }

    pub fn last(&self) -> Recorded {
        self.requests().pop().expect("at least one request")
    }

    /// Builder pointed at this server, repo `alice/kiosk`, in-memory session
    pub fn client(&self) -> ClientBuilder {
        dsbase_core::Client::builder()
            .origin("http://127.0.0.1")
            .api_port(self.port)
            .content_origin(format!("http://127.0.0.1:{}", self.port))
            .repo("alice", "kiosk")
            .store(MemoryStore::new())
    }
}

/// A port with nothing listening on it
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

async fn handle(State(state): State<FakeState>, request: Request) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let headers = request.headers().clone();

    if state.keep_uploads && method == Method::POST && path == "/api/upload" {
        return store_upload(&state, &headers, request).await;
    }

    let body = match Bytes::from_request(request, &()).await {
        Ok(body) => body.to_vec(),
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };
    record(&state, method.clone(), &path, &headers, body);

    if state.keep_uploads && method == Method::GET {
        if let Some(key) = path.strip_prefix("/upload/") {
            return match state.files.lock().unwrap().get(key) {
                Some(data) => (StatusCode::OK, data.clone()).into_response(),
                None => StatusCode::NOT_FOUND.into_response(),
            };
        }
    }

    match state.replies.lock().unwrap().get(&path) {
        Some((status, body)) => (
            StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body.clone(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn store_upload(state: &FakeState, headers: &HeaderMap, request: Request) -> Response {
    use axum::extract::Multipart;

    record(state, Method::POST, "/api/upload", headers, Vec::new());

    let mut multipart = match Multipart::from_request(request, &()).await {
        Ok(multipart) => multipart,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };

    let (mut user, mut repo, mut file) = (None, None, None);
    while let Ok(Some(field)) = multipart.next_field().await {
        match field.name().map(str::to_string).as_deref() {
            Some("user") => user = field.text().await.ok(),
            Some("repo") => repo = field.text().await.ok(),
            Some("file") => {
                let name = field.file_name().map(str::to_string);
                let data = field.bytes().await.ok();
                file = name.zip(data);
            }
            _ => {}
        }
    }

    match (user, repo, file) {
        (Some(user), Some(repo), Some((name, data))) => {
            state
                .files
                .lock()
                .unwrap()
                .insert(format!("{}-{}/{}", user, repo, name), data.to_vec());
            StatusCode::OK.into_response()
        }
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

fn record(state: &FakeState, method: Method, path: &str, headers: &HeaderMap, body: Vec<u8>) {
    let text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    state.log.lock().unwrap().push(Recorded {
        method,
        path: path.to_string(),
        authorization: text(header::AUTHORIZATION),
        content_type: text(header::CONTENT_TYPE),
        body,
    });
}
