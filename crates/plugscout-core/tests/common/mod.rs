//! Minimal HTTP/1.1 fixture server for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use plugscout_core::{DiskCache, HttpClient, NetworkConfig, ScoutContext};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Clone)]
struct Route {
    status: u16,
    body: Vec<u8>,
    /// When false the body is delimited by closing the connection.
    content_length: bool,
}

#[derive(Default)]
struct State {
    routes: HashMap<String, Route>,
    hits: HashMap<String, usize>,
}

/// Serves canned responses per path and counts requests.
#[derive(Clone)]
pub struct FixtureServer {
    base_url: String,
    state: Arc<Mutex<State>>,
}

impl FixtureServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(State::default()));

        let shared = state.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let state = shared.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, state).await;
                });
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn route(&self, path: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.insert(path, status, body.into(), true);
    }

    /// Like [`route`](Self::route) but without a `Content-Length` header.
    pub fn route_without_length(&self, path: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.insert(path, status, body.into(), false);
    }

    fn insert(&self, path: &str, status: u16, body: Vec<u8>, content_length: bool) {
        self.state.lock().unwrap().routes.insert(
            path.to_string(),
            Route {
                status,
                body,
                content_length,
            },
        );
    }

    pub fn hits(&self, path: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .hits
            .get(path)
            .copied()
            .unwrap_or(0)
    }
}

async fn serve(mut stream: TcpStream, state: Arc<Mutex<State>>) -> std::io::Result<()> {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        request.extend_from_slice(&buf[..n]);
    }

    let head = String::from_utf8_lossy(&request);
    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    let route = {
        let mut state = state.lock().unwrap();
        *state.hits.entry(path.clone()).or_insert(0) += 1;
        state.routes.get(&path).cloned()
    };
    let route = route.unwrap_or(Route {
        status: 404,
        body: b"not found".to_vec(),
        content_length: true,
    });

    let length = if route.content_length {
        format!("Content-Length: {}\r\n", route.body.len())
    } else {
        String::new()
    };
    let header = format!(
        "HTTP/1.1 {} Fixture\r\nContent-Type: application/json\r\n{length}Connection: close\r\n\r\n",
        route.status
    );
    stream.write_all(header.as_bytes()).await?;
    stream.write_all(&route.body).await?;
    stream.shutdown().await
}

/// A context pointed at `server` with a temp cache and zero backoff.
pub fn context_for(server: &FixtureServer, cache: &TempDir) -> Arc<ScoutContext> {
    let network = NetworkConfig {
        registry_url: server.url("/registry.json"),
        raw_base_url: server.base_url().to_string(),
        api_base_url: server.base_url().to_string(),
        ..NetworkConfig::default()
    };
    let ctx = ScoutContext::new(
        HttpClient::new().unwrap(),
        DiskCache::new(cache.path()),
        network,
    )
    .with_backoff(Duration::ZERO);
    Arc::new(ctx)
}

pub fn manifest_json(name: &str, plugins: &[&str]) -> String {
    let plugins: Vec<String> = plugins
        .iter()
        .map(|p| format!(r#"{{"name": "{p}", "source": "./plugins/{p}", "description": "{p} plugin"}}"#))
        .collect();
    format!(
        r#"{{"name": "{name}", "owner": {{"name": "fixture"}}, "plugins": [{}]}}"#,
        plugins.join(", ")
    )
}

pub fn manifest_path(owner: &str, repo: &str) -> String {
    format!("/{owner}/{repo}/main/.claude-plugin/marketplace.json")
}

pub fn registry_json(entries: &[(&str, &str)]) -> String {
    let marketplaces: Vec<String> = entries
        .iter()
        .map(|(name, url)| format!(r#"{{"name": "{name}", "repositoryUrl": "{url}"}}"#))
        .collect();
    format!(
        r#"{{"version": "1", "lastUpdated": "2025-01-01T00:00:00Z", "description": "fixture", "marketplaces": [{}]}}"#,
        marketplaces.join(", ")
    )
}
