//! In-process mock of the LM Studio HTTP API for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

/// What the chat completions route answers with.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: String,
    pub delay: Duration,
}

impl ChatReply {
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "application/json",
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    /// A well-formed completion whose first choice carries `content`.
    pub fn content(content: &str) -> Self {
        Self::json(
            serde_json::json!({
                "id": "chatcmpl-test",
                "object": "chat.completion",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": content },
                    "finish_reason": "stop"
                }]
            })
            .to_string(),
        )
    }

    pub fn status(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Everything the mock has seen.
pub struct MockState {
    chat_reply: Mutex<ChatReply>,
    models_status: Mutex<StatusCode>,
    pub chat_hits: AtomicUsize,
    pub model_hits: AtomicUsize,
    pub last_body: Mutex<Option<String>>,
    pub last_chat_content_type: Mutex<Option<String>>,
    pub last_models_headers: Mutex<Option<HeaderMap>>,
}

pub struct MockServer {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockServer {
    pub async fn start(chat_reply: ChatReply) -> Self {
        let state = Arc::new(MockState {
            chat_reply: Mutex::new(chat_reply),
            models_status: Mutex::new(StatusCode::OK),
            chat_hits: AtomicUsize::new(0),
            model_hits: AtomicUsize::new(0),
            last_body: Mutex::new(None),
            last_chat_content_type: Mutex::new(None),
            last_models_headers: Mutex::new(None),
        });

        let app = Router::new()
            .route("/v1/chat/completions", post(chat_completions))
            .route("/v1/models", get(list_models))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("mock server failed: {e}");
            }
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set_models_status(&self, status: StatusCode) {
        *self.state.models_status.lock().unwrap() = status;
    }

    pub fn chat_hits(&self) -> usize {
        self.state.chat_hits.load(Ordering::SeqCst)
    }

    pub fn model_hits(&self) -> usize {
        self.state.model_hits.load(Ordering::SeqCst)
    }

    /// Last chat request body, parsed as JSON.
    pub fn last_body(&self) -> serde_json::Value {
        let raw = self
            .state
            .last_body
            .lock()
            .unwrap()
            .clone()
            .expect("no chat request received");
        serde_json::from_str(&raw).unwrap()
    }

    pub fn last_chat_content_type(&self) -> Option<String> {
        self.state.last_chat_content_type.lock().unwrap().clone()
    }

    pub fn last_models_headers(&self) -> HeaderMap {
        self.state
            .last_models_headers
            .lock()
            .unwrap()
            .clone()
            .expect("no models request received")
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// An address with nothing listening on it.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

// ─── Raw TCP servers ─────────────────────────────────────────────────────────

/// Read one HTTP/1.1 request (headers plus `Content-Length` body).
async fn read_request(stream: &mut TcpStream) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Ok(())
}

/// Accept one connection, consume the request, write `response` verbatim
/// and close the socket.
pub async fn raw_reply_once(response: &'static [u8]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        read_request(&mut stream).await.unwrap();
        stream.write_all(response).await.unwrap();
        stream.flush().await.unwrap();
    });
    addr
}

/// Accept one connection, consume the request and never answer. The
/// receiver yields the moment the client closed its side.
pub async fn silent_server() -> (SocketAddr, oneshot::Receiver<Instant>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        read_request(&mut stream).await.unwrap();
        let mut sink = [0u8; 1024];
        loop {
            match stream.read(&mut sink).await {
                Ok(0) | Err(_) => break,
                Ok(_) => continue,
            }
        }
        let _ = tx.send(Instant::now());
    });
    (addr, rx)
}

// ─── Handlers ────────────────────────────────────────────────────────────────

async fn chat_completions(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    state.chat_hits.fetch_add(1, Ordering::SeqCst);
    *state.last_body.lock().unwrap() = Some(body);
    *state.last_chat_content_type.lock().unwrap() = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let reply = state.chat_reply.lock().unwrap().clone();
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }

    (reply.status, [(header::CONTENT_TYPE, reply.content_type)], reply.body)
}

async fn list_models(State(state): State<Arc<MockState>>, headers: HeaderMap) -> impl IntoResponse {
    state.model_hits.fetch_add(1, Ordering::SeqCst);
    *state.last_models_headers.lock().unwrap() = Some(headers);
    let status = *state.models_status.lock().unwrap();
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"object":"list","data":[{"id":"local-model","object":"model"}]}"#,
    )
}
