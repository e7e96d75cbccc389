// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP/JSON job router -- the agent's network surface.
//
// A thin per-connection message router: it receives job requests, hands
// them to the print core, and relays the outcome.  It holds no job state of
// its own.  Transported as minimal HTTP/1.1 over a raw TCP listener; we
// parse the framing just enough to extract method, path, and body, and
// respond with a hand-built `Connection: close` response per request.
//
// # Routes
//
//   - GET  /health    liveness probe, plain text
//   - GET  /printers  fresh directory snapshot as a JSON array
//   - POST /jobs      wire-format PrintJob in, submission outcome out
//
// Print submissions block for the duration of the underlying OS call, so
// they run under `spawn_blocking`; each connection is its own task.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use spoolwerk_core::error::{Result, SpoolwerkError};
use spoolwerk_core::types::PrintJob;
use spoolwerk_print::dispatcher::{PlatformStrategy, PrintDispatcher};
use spoolwerk_print::directory;

/// Maximum bytes to accept in one request.
/// Prevents unbounded memory consumption from misbehaving clients.
const MAX_REQUEST_BYTES: usize = 16 * 1024 * 1024; // 16 MiB

/// The process-wide dispatcher handed to every connection task.
type SharedDispatcher = Arc<PrintDispatcher<PlatformStrategy>>;

/// The agent's TCP job router.
pub struct JobServer {
    listen_addr: String,
    shutdown: Arc<Notify>,
    task_handle: Option<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
}

impl JobServer {
    pub fn new(listen_addr: impl Into<String>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            shutdown: Arc::new(Notify::new()),
            task_handle: None,
            local_addr: None,
        }
    }

    /// The address actually bound, once started.  Differs from the
    /// configured address when port 0 was requested.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Bind the listener and spawn the accept loop.
    pub async fn start(&mut self, dispatcher: SharedDispatcher) -> Result<()> {
        let listener = TcpListener::bind(&self.listen_addr)
            .await
            .map_err(|e| SpoolwerkError::Server(format!("bind {}: {e}", self.listen_addr)))?;

        self.local_addr = listener.local_addr().ok();
        info!(addr = %self.listen_addr, "job router listening");

        let shutdown = Arc::clone(&self.shutdown);
        let handle = tokio::spawn(async move {
            Self::accept_loop(listener, shutdown, dispatcher).await;
        });
        self.task_handle = Some(handle);
        Ok(())
    }

    /// Gracefully stop the router.
    ///
    /// Signals the accept loop to exit and awaits it.  Connections that are
    /// mid-submission are allowed to finish.
    pub async fn stop(&mut self) -> Result<()> {
        self.shutdown.notify_one();
        if let Some(handle) = self.task_handle.take() {
            handle
                .await
                .map_err(|e| SpoolwerkError::Server(format!("task join: {e}")))?;
        }
        info!("job router stopped");
        Ok(())
    }

    async fn accept_loop(
        listener: TcpListener,
        shutdown: Arc<Notify>,
        dispatcher: SharedDispatcher,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.notified() => {
                    debug!("accept loop received shutdown signal");
                    break;
                }
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            let dispatcher = Arc::clone(&dispatcher);
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, peer_addr, dispatcher).await {
                                    warn!(peer = %peer_addr, error = %e, "connection failed");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "failed to accept connection");
                        }
                    }
                }
            }
        }
    }
}

/// Handle one request/response exchange, then close.
async fn handle_connection(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    dispatcher: SharedDispatcher,
) -> Result<()> {
    let Some((head, body)) = read_request(&mut stream).await? else {
        debug!(peer = %peer_addr, "empty connection -- closing");
        return Ok(());
    };

    debug!(
        peer = %peer_addr,
        method = %head.method,
        path = %head.path,
        body_bytes = body.len(),
        "request received"
    );

    let response = match (head.method.as_str(), head.path.as_str()) {
        ("GET", "/health") => http_response(
            200,
            "OK",
            "text/plain; charset=utf-8",
            b"spoolwerk agent is running\n",
        ),
        ("GET", "/printers") => handle_printers().await,
        ("POST", "/jobs") => handle_submit(&body, dispatcher).await,
        _ => http_response(404, "Not Found", "text/plain; charset=utf-8", b"not found\n"),
    };

    stream
        .write_all(&response)
        .await
        .map_err(|e| SpoolwerkError::Server(format!("write response to {peer_addr}: {e}")))?;
    stream
        .flush()
        .await
        .map_err(|e| SpoolwerkError::Server(format!("flush to {peer_addr}: {e}")))?;
    Ok(())
}

/// GET /printers -- a fresh snapshot on every call, never cached.
async fn handle_printers() -> Vec<u8> {
    match tokio::task::spawn_blocking(directory::detect).await {
        Ok(Ok(printers)) => {
            let body = serde_json::json!(printers);
            json_response(200, "OK", &body)
        }
        Ok(Err(e)) => {
            warn!(error = %e, "printer enumeration failed");
            json_response(502, "Bad Gateway", &serde_json::json!({ "error": e.to_string() }))
        }
        Err(e) => json_response(
            500,
            "Internal Server Error",
            &serde_json::json!({ "error": format!("task join: {e}") }),
        ),
    }
}

/// POST /jobs -- decode the wire job and run it through the dispatcher.
async fn handle_submit(body: &[u8], dispatcher: SharedDispatcher) -> Vec<u8> {
    let job: PrintJob = match serde_json::from_slice(body) {
        Ok(job) => job,
        Err(e) => {
            warn!(error = %e, "rejecting malformed print job");
            return json_response(
                400,
                "Bad Request",
                &serde_json::json!({ "error": format!("invalid print job: {e}") }),
            );
        }
    };

    let job_id = job.job_id.clone();
    info!(printer = %job.printer_name, job_id = %job_id, "job received");

    match tokio::task::spawn_blocking(move || dispatcher.submit(&job)).await {
        Ok(Ok(())) => json_response(
            200,
            "OK",
            &serde_json::json!({ "jobId": job_id, "status": "printed" }),
        ),
        Ok(Err(e)) => json_response(
            502,
            "Bad Gateway",
            &serde_json::json!({ "jobId": job_id, "error": e.to_string() }),
        ),
        Err(e) => json_response(
            500,
            "Internal Server Error",
            &serde_json::json!({ "jobId": job_id, "error": format!("task join: {e}") }),
        ),
    }
}

// ---------------------------------------------------------------------------
// Minimal HTTP framing
// ---------------------------------------------------------------------------

/// The parts of a request head this router cares about.
#[derive(Debug, PartialEq, Eq)]
struct RequestHead {
    method: String,
    path: String,
    content_length: usize,
}

/// Parse a request head (request line + headers, no terminator).
///
/// Only the method, path, and `Content-Length` are extracted; everything
/// else in the head is ignored.
fn parse_head(head: &str) -> Option<RequestHead> {
    let mut lines = head.lines();
    let request_line = lines.next()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut content_length = 0;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().ok()?;
            }
        }
    }

    Some(RequestHead {
        method,
        path,
        content_length,
    })
}

/// Byte offset of the `\r\n\r\n` head terminator, if present.
fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}

/// Read one full request from the stream.
///
/// Returns `None` for a connection that closes without sending anything.
async fn read_request(stream: &mut TcpStream) -> Result<Option<(RequestHead, Vec<u8>)>> {
    let mut buf: Vec<u8> = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = find_head_end(&buf) {
            break pos;
        }
        if buf.len() > MAX_REQUEST_BYTES {
            return Err(SpoolwerkError::Server("request head too large".into()));
        }
        let n = stream
            .read(&mut chunk)
            .await
            .map_err(|e| SpoolwerkError::Server(format!("read request: {e}")))?;
        if n == 0 {
            if buf.is_empty() {
                return Ok(None);
            }
            return Err(SpoolwerkError::Server("truncated request head".into()));
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head_text = std::str::from_utf8(&buf[..head_end])
        .map_err(|_| SpoolwerkError::Server("request head is not UTF-8".into()))?;
    let head = parse_head(head_text)
        .ok_or_else(|| SpoolwerkError::Server("malformed request line".into()))?;

    if head.content_length > MAX_REQUEST_BYTES {
        return Err(SpoolwerkError::Server("request body too large".into()));
    }

    let mut body = buf.split_off(head_end + 4);
    while body.len() < head.content_length {
        let n = stream
            .read(&mut chunk)
            .await
            .map_err(|e| SpoolwerkError::Server(format!("read request body: {e}")))?;
        if n == 0 {
            return Err(SpoolwerkError::Server("truncated request body".into()));
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(head.content_length);

    Ok(Some((head, body)))
}

/// Build a complete `Connection: close` HTTP/1.1 response.
fn http_response(status: u16, reason: &str, content_type: &str, body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Type: {content_type}\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

fn json_response(status: u16, reason: &str, body: &serde_json::Value) -> Vec<u8> {
    http_response(status, reason, "application/json", body.to_string().as_bytes())
}
