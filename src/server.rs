// Status HTTP endpoint.
//
// A minimal accept loop answering liveness queries: `GET /` returns a short
// status text, `GET /health` returns `OK`. Each connection is handled on its
// own spawned task so the endpoint stays responsive while the watcher task is
// fetching or sleeping — the two never share a blocking resource.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::status::{StatusShared, StatusSnapshot};

/// Cap on how much of a request is buffered while looking for the end of the
/// request line.
const MAX_REQUEST_BYTES: usize = 4096;

/// Run the status endpoint on the given port. Runs forever (until the task
/// is cancelled or the process exits).
pub async fn run(port: u16, status: Arc<StatusShared>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    let local_addr = listener.local_addr()?;
    info!("status endpoint listening on {local_addr}");

    loop {
        let (stream, addr) = listener.accept().await?;
        debug!("status request from {addr}");

        let status = Arc::clone(&status);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, &status).await {
                warn!("status connection from {addr} failed: {e}");
            }
        });
    }
}

/// Answer a single HTTP request on `stream`.
///
/// Generic over the stream type so it can be tested with in-memory duplex
/// streams without opening TCP ports.
pub async fn handle_connection<S>(mut stream: S, status: &StatusShared) -> std::io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    // Read until the request line is complete; the rest of the headers are
    // irrelevant to routing. Bounded so a client cannot grow the buffer.
    let mut buf = Vec::new();
    let mut chunk = [0u8; 512];
    while !buf.contains(&b'\n') && buf.len() < MAX_REQUEST_BYTES {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let request = String::from_utf8_lossy(&buf);

    let response = route(request_target(&request).as_deref(), &status.snapshot());
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

// ---------------------------------------------------------------------------
// Routing and rendering
// ---------------------------------------------------------------------------

/// The path of a `GET` request line, or `None` for anything unparseable or
/// any other method.
fn request_target(request: &str) -> Option<String> {
    let request_line = request.lines().next()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?;
    let path = parts.next()?;
    (method == "GET").then(|| path.to_string())
}

fn route(path: Option<&str>, snapshot: &StatusSnapshot) -> String {
    match path {
        Some("/") => http_response("200 OK", &render_status(snapshot)),
        Some("/health") => http_response("200 OK", "OK"),
        _ => http_response("404 Not Found", "not found"),
    }
}

fn render_status(snapshot: &StatusSnapshot) -> String {
    let last_cycle = snapshot
        .last_cycle
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());

    format!(
        "levelwatch is running\n\
         cycles completed: {}\n\
         failed fetches: {}\n\
         events emitted: {}\n\
         last roster size: {}\n\
         last cycle: {}\n",
        snapshot.cycles,
        snapshot.failed_fetches,
        snapshot.events_emitted,
        snapshot.last_roster_size,
        last_cycle,
    )
}

fn http_response(status_line: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status_line}\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        body.len(),
    )
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
