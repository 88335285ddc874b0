//! Shared test fixtures: a recording in-memory transport and an embedded
//! HTTP server.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use strider_core::{Engine, EngineConfig, OutboundRequest, RawResponse, Transport, TransportError};

/// A canned response served by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl MockResponse {
    pub fn html(body: &str) -> Self {
        Self {
            status: 200,
            headers: vec![("Content-Type".into(), "text/html; charset=utf-8".into())],
            body: Some(body.as_bytes().to_vec()),
        }
    }

    pub fn redirect(status: u16, location: &str) -> Self {
        Self {
            status,
            headers: vec![("Location".into(), location.into())],
            body: Some(Vec::new()),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Some(Vec::new()),
        }
    }

    pub fn bytes(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn without_body(mut self) -> Self {
        self.body = None;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Default)]
struct MockState {
    routes: HashMap<String, MockResponse>,
    requests: Vec<OutboundRequest>,
}

/// In-memory transport keyed by URL. Clones share routes and the request log,
/// so a test can keep a handle after boxing one into an [`Engine`].
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `response` for `url`. An exact match (query included) wins over
    /// a match on the URL without its query.
    pub fn route(&self, url: &str, response: MockResponse) -> &Self {
        self.state
            .lock()
            .unwrap()
            .routes
            .insert(url.to_string(), response);
        self
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn last_request(&self) -> OutboundRequest {
        self.requests().pop().expect("no request was sent")
    }

    /// An engine with the default configuration over this transport.
    pub fn engine(&self) -> Engine {
        self.engine_with(EngineConfig::default())
    }

    pub fn engine_with(&self, config: EngineConfig) -> Engine {
        Engine::with_transport(config, Box::new(self.clone()))
    }
}

impl Transport for MockTransport {
    fn send(&mut self, request: &OutboundRequest) -> Result<RawResponse, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());

        let mut bare = request.url.clone();
        bare.set_query(None);
        let response = state
            .routes
            .get(request.url.as_str())
            .or_else(|| state.routes.get(bare.as_str()))
            .cloned()
            .ok_or_else(|| format!("connection refused: {}", request.url))?;

        Ok(RawResponse {
            status: response.status,
            headers: response.headers,
            body: response
                .body
                .map(|bytes| Box::new(Cursor::new(bytes)) as Box<dyn std::io::Read + Send>),
        })
    }
}

/// A cloneable in-memory sink for the engine's trace output.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// An axum server on an ephemeral local port, running on its own thread.
/// Dropping it shuts the server down.
pub struct TestServer {
    addr: SocketAddr,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl TestServer {
    pub fn start(router: axum::Router) -> Self {
        let (addr_tx, addr_rx) = std::sync::mpsc::channel();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let thread = std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to build test runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("failed to bind test server");
                addr_tx
                    .send(listener.local_addr().expect("no local address"))
                    .expect("test thread hung up");
                axum::serve(listener, router)
                    .with_graceful_shutdown(async {
                        let _ = shutdown_rx.await;
                    })
                    .await
                    .expect("test server failed");
            });
        });

        let addr = addr_rx.recv().expect("test server did not start");
        Self {
            addr,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.stop();
    }
}
