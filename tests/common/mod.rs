//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use cors_relay::{HttpServer, RelayConfig, Shutdown};

/// A canned upstream reply.
#[derive(Clone)]
pub struct MockReply {
    pub status_line: &'static str,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: &'static str,
    /// Frame the body with `Transfer-Encoding: chunked` instead of `Content-Length`.
    pub chunked: bool,
}

impl MockReply {
    pub fn ok(body: &'static str) -> Self {
        Self {
            status_line: "200 OK",
            headers: Vec::new(),
            body,
            chunked: false,
        }
    }

    /// A 200 reply whose body is sent as two chunks.
    pub fn chunked(body: &'static str) -> Self {
        Self {
            chunked: true,
            ..Self::ok(body)
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }

    fn render(&self) -> String {
        let mut out = format!("HTTP/1.1 {}\r\n", self.status_line);
        for (name, value) in &self.headers {
            out.push_str(&format!("{}: {}\r\n", name, value));
        }
        if self.chunked {
            let (head, tail) = self.body.split_at(self.body.len() / 2);
            out.push_str("Transfer-Encoding: chunked\r\nConnection: close\r\n\r\n");
            for part in [head, tail].into_iter().filter(|p| !p.is_empty()) {
                out.push_str(&format!("{:x}\r\n{}\r\n", part.len(), part));
            }
            out.push_str("0\r\n\r\n");
        } else {
            out.push_str(&format!(
                "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                self.body.len(),
                self.body
            ));
        }
        out
    }
}

/// Raw requests (head and body) seen by a mock backend.
pub type Seen = Arc<Mutex<Vec<String>>>;

/// Start a mock backend on an ephemeral port that always sends `reply`.
pub async fn start_mock_backend(reply: MockReply) -> (SocketAddr, Seen) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));

    let log = seen.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let reply = reply.clone();
            let log = log.clone();
            tokio::spawn(async move {
                let raw = read_request(&mut socket).await;
                log.lock().unwrap().push(raw);
                let _ = socket.write_all(reply.render().as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, seen)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}

/// Start the relay in front of `upstream` and return its address.
pub async fn start_relay(upstream: SocketAddr, strip_prefix: bool) -> (SocketAddr, Shutdown) {
    let mut config = RelayConfig::default();
    config.upstream.origin = format!("http://{}", upstream);
    config.upstream.strip_prefix = strip_prefix;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}

/// A test client that never follows redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}
