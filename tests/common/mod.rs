//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use api_firewall::audit::MemorySink;
use api_firewall::config::FirewallConfig;
use api_firewall::http::HttpServer;
use api_firewall::lifecycle::Shutdown;

/// A firewall bound to an ephemeral port, auditing into memory.
pub struct TestFirewall {
    pub addr: SocketAddr,
    pub audit: Arc<MemorySink>,
    pub shutdown: Shutdown,
}

impl TestFirewall {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Wait until the in-memory audit log holds `count` records.
    #[allow(dead_code)]
    pub async fn wait_for_records(&self, count: usize) {
        for _ in 0..50 {
            if self.audit.records().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl Drop for TestFirewall {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_firewall(config: FirewallConfig) -> TestFirewall {
    let audit = Arc::new(MemorySink::new());
    let server = HttpServer::with_audit(config, Some(audit.clone())).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    TestFirewall {
        addr,
        audit,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Start a mock upstream that answers every request with `response` and
/// echoes the request body length in `x-body-len`.
#[allow(dead_code)]
pub async fn start_mock_backend(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let body_len = read_request_body_len(&mut socket).await;

                let response_str = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nx-body-len: {}\r\nConnection: close\r\n\r\n{}",
                    response.len(),
                    body_len,
                    response
                );
                let _ = socket.write_all(response_str.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

/// Read one HTTP/1.1 request and return its body length.
#[allow(dead_code)]
async fn read_request_body_len(socket: &mut tokio::net::TcpStream) -> usize {
    let mut data = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let read = socket.read(&mut chunk).await.unwrap_or(0);
        if read == 0 {
            return 0;
        }
        data.extend_from_slice(&chunk[..read]);

        let text = String::from_utf8_lossy(&data).to_string();
        if let Some((head, body)) = text.split_once("\r\n\r\n") {
            let expected = head
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if body.len() >= expected {
                return body.len();
            }
        }
    }
}
