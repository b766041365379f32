//! Access logging middleware.
//!
//! Wraps the whole chain: one line per request, written both to the
//! persistent access log and to the structured logger, regardless of
//! what happens downstream. A failure to write the file is reported and
//! otherwise ignored; logging never blocks a response.

use std::net::IpAddr;
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, State};
use axum::http::{header, Method, Request, Response};
use axum::middleware::Next;
use tokio::io::AsyncWriteExt;
use tracing::{error, info};
use uuid::Uuid;

use crate::state::AppState;

/// Request bodies above this size are logged as a placeholder.
const MAX_BODY_LOG_BYTES: usize = 1024;

/// Log every request: id, caller IP, method, URI, status, response size,
/// user agent, elapsed time, and a capped rendering of the body.
pub async fn access_log(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    // Start time lives here, in this request's flow; nothing is stashed
    // on a process-global.
    let start = Instant::now();
    let request_id = Uuid::new_v4();

    let method = request.method().clone();
    let uri = request.uri().to_string();
    let ip = extract_client_ip(&request)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "-".to_string());
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let (request, body_log) = capture_body(request, state.config.max_body_size()).await;

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let content_length = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let elapsed_ms = start.elapsed().as_millis();

    let line = format!(
        "{request_id} - {ip} - {method} {uri} {status} {content_length} - {user_agent} - {elapsed_ms}ms - Body: {body_log}"
    );

    info!("{line}");

    if let Err(e) = append_line(&state, &line).await {
        error!("Error writing to access log: {e}");
    }

    response
}

/// Append one line to the persistent access log.
async fn append_line(state: &AppState, line: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&state.config.access_log_path)
        .await?;
    file.write_all(format!("{line}\n").as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

/// Produce a loggable rendering of the request body without consuming it.
///
/// GET requests log nothing. Bodies over the cap are replaced by a
/// placeholder naming their size; when Content-Length already says so
/// they are never buffered at all. Everything else, chunked bodies
/// included, is buffered up to `max_buffer`, rendered if it fits the
/// cap and is valid UTF-8, and replayed downstream untouched. No
/// outcome here aborts the request.
async fn capture_body(request: Request<Body>, max_buffer: usize) -> (Request<Body>, String) {
    if request.method() == Method::GET {
        return (request, String::new());
    }

    let content_length = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<usize>().ok());

    if let Some(len) = content_length {
        if len > MAX_BODY_LOG_BYTES {
            return (request, too_large(len));
        }
    }

    // Chunked bodies carry no length up front; buffer them like sized
    // ones and decide from the bytes actually read.
    let (parts, body) = request.into_parts();
    match axum::body::to_bytes(body, max_buffer).await {
        Ok(bytes) => {
            let rendered = if bytes.len() > MAX_BODY_LOG_BYTES {
                too_large(bytes.len())
            } else {
                render_body(&bytes)
            };
            (Request::from_parts(parts, Body::from(bytes)), rendered)
        }
        Err(e) => (
            Request::from_parts(parts, Body::empty()),
            format!("(Error reading request body: {e})"),
        ),
    }
}

fn too_large(len: usize) -> String {
    format!("(Request body too large - {len} bytes - Truncated)")
}

/// Render buffered body bytes for the log line.
fn render_body(bytes: &Bytes) -> String {
    if bytes.is_empty() {
        return String::new();
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(e) => format!("(Error parsing request body: {e})"),
    }
}

/// Extract client IP from request headers or connection info.
fn extract_client_ip(request: &Request<Body>) -> Option<IpAddr> {
    // X-Forwarded-For first (proxied requests); first hop is the client.
    if let Some(forwarded) = request.headers().get("X-Forwarded-For") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(first_ip) = forwarded_str.split(',').next() {
                if let Ok(ip) = first_ip.trim().parse() {
                    return Some(ip);
                }
            }
        }
    }

    if let Some(real_ip) = request.headers().get("X-Real-IP") {
        if let Ok(ip_str) = real_ip.to_str() {
            if let Ok(ip) = ip_str.parse() {
                return Some(ip);
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip())
}
