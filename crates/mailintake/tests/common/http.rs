//! A minimal HTTP/1.1 server for exercising the cloud resolver locally.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// What the server answers for one path.
#[derive(Debug, Clone)]
pub struct Route {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    hang: bool,
    /// Body pieces are written this far apart; `None` sends it in one go.
    trickle: Option<(Vec<usize>, Duration)>,
}

impl Route {
    pub fn ok(content_type: &str, body: &[u8]) -> Self {
        Self {
            status: 200,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body: body.to_vec(),
            hang: false,
            trickle: None,
        }
    }

    pub fn html(body: &str) -> Self {
        Self::ok("text/html; charset=utf-8", body.as_bytes())
    }

    pub fn redirect(location: &str) -> Self {
        Self {
            status: 302,
            headers: vec![("Location".to_string(), location.to_string())],
            body: Vec::new(),
            hang: false,
            trickle: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
            body: b"error".to_vec(),
            hang: false,
            trickle: None,
        }
    }

    /// Accepts the request and never answers.
    pub fn hang() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: Vec::new(),
            hang: true,
            trickle: None,
        }
    }

    /// Sends `pieces` one after another, pausing `gap` between them.
    pub fn trickle(content_type: &str, pieces: &[&[u8]], gap: Duration) -> Self {
        let mut route = Self::ok(content_type, &pieces.concat());
        route.trickle = Some((pieces.iter().map(|p| p.len()).collect(), gap));
        route
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Request seen by the server.
#[derive(Debug, Clone)]
pub struct Hit {
    pub path: String,
    pub headers: HashMap<String, String>,
}

/// Serves fixed routes on `127.0.0.1` until dropped. Unknown paths get 404.
pub struct FixtureServer {
    addr: SocketAddr,
    hits: Arc<Mutex<Vec<Hit>>>,
    task: JoinHandle<()>,
}

impl FixtureServer {
    pub async fn start(routes: Vec<(&str, Route)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fixture server");
        let addr = listener.local_addr().expect("fixture server address");
        let routes: Arc<HashMap<String, Route>> = Arc::new(
            routes
                .into_iter()
                .map(|(path, route)| (path.to_string(), route))
                .collect(),
        );
        let hits = Arc::new(Mutex::new(Vec::new()));

        let task = {
            let hits = Arc::clone(&hits);
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let routes = Arc::clone(&routes);
                    let hits = Arc::clone(&hits);
                    tokio::spawn(async move {
                        handle(stream, &routes, &hits).await;
                    });
                }
            })
        };

        Self { addr, hits, task }
    }

    /// Absolute URL for `path_and_query` on this server.
    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }

    /// Paths requested so far, without query strings, in order.
    pub fn paths(&self) -> Vec<String> {
        self.hits
            .lock()
            .expect("hits lock")
            .iter()
            .map(|h| h.path.clone())
            .collect()
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.hits.lock().expect("hits lock").clone()
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle(mut stream: TcpStream, routes: &HashMap<String, Route>, hits: &Mutex<Vec<Hit>>) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    let text = String::from_utf8_lossy(&request);
    let mut lines = text.split("\r\n");
    let target = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let path = target.split('?').next().unwrap_or("/").to_string();
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    hits.lock().expect("hits lock").push(Hit {
        path: path.clone(),
        headers,
    });

    let route = routes.get(&path).cloned().unwrap_or_else(|| Route::status(404));
    if route.hang {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        return;
    }

    let mut response = format!("HTTP/1.1 {} Fixture\r\n", route.status);
    for (name, value) in &route.headers {
        response.push_str(&format!("{}: {}\r\n", name, value));
    }
    response.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n",
        route.body.len()
    ));

    if stream.write_all(response.as_bytes()).await.is_err() {
        return;
    }
    match &route.trickle {
        None => {
            let _ = stream.write_all(&route.body).await;
        }
        Some((sizes, gap)) => {
            let mut offset = 0;
            for (i, size) in sizes.iter().enumerate() {
                if i > 0 {
                    tokio::time::sleep(*gap).await;
                }
                let piece = &route.body[offset..offset + size];
                if stream.write_all(piece).await.is_err() || stream.flush().await.is_err() {
                    return;
                }
                offset += size;
            }
        }
    }
    let _ = stream.shutdown().await;
}
