use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::BytesMut;
use client_logging::client_warn;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::types::{decode_event, ClientEvent, EventSink};

/// The single process-wide push connection to the job service's subscription
/// stream.
///
/// `connect` and `disconnect` are idempotent: connecting tears down any
/// previous stream first, so reconnect-after-error is `disconnect` then
/// `connect`, safe to call repeatedly. Transport failures, malformed
/// payloads, and unknown task kinds never terminate the channel object
/// itself; failures surface as a single `PushErrored` signal and the owner
/// decides when to redial.
pub struct PushChannel {
    runtime: tokio::runtime::Handle,
    http: reqwest::Client,
    url: String,
    sink: Arc<dyn EventSink>,
    token: Mutex<Option<CancellationToken>>,
}

impl PushChannel {
    pub fn new(
        runtime: tokio::runtime::Handle,
        connect_timeout: Duration,
        url: String,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        // Dedicated client without a request timeout: the subscription
        // response body is read for the lifetime of the connection.
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .expect("http client for push channel");
        Self {
            runtime,
            http,
            url,
            sink,
            token: Mutex::new(None),
        }
    }

    /// Opens the stream, replacing any previous connection.
    pub fn connect(&self) {
        self.disconnect();
        let token = CancellationToken::new();
        *self.token.lock().expect("push channel lock") = Some(token.clone());
        self.runtime.spawn(run_stream(
            self.http.clone(),
            self.url.clone(),
            self.sink.clone(),
            token,
        ));
    }

    /// Closes the stream. Safe to call when not connected.
    pub fn disconnect(&self) {
        if let Some(token) = self.token.lock().expect("push channel lock").take() {
            token.cancel();
        }
    }
}

async fn run_stream(
    http: reqwest::Client,
    url: String,
    sink: Arc<dyn EventSink>,
    token: CancellationToken,
) {
    let outcome = tokio::select! {
        _ = token.cancelled() => return,
        outcome = read_stream(&http, &url, sink.as_ref()) => outcome,
    };

    // A deliberate disconnect is silent; everything else is an error signal,
    // including the server closing an otherwise healthy stream.
    let detail = match outcome {
        Ok(()) => "event stream ended".to_string(),
        Err(detail) => detail,
    };
    sink.emit(ClientEvent::PushErrored { detail });
}

async fn read_stream(
    http: &reqwest::Client,
    url: &str,
    sink: &dyn EventSink,
) -> Result<(), String> {
    let response = http.get(url).send().await.map_err(|err| err.to_string())?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!(
            "subscribe endpoint returned http {}",
            status.as_u16()
        ));
    }

    sink.emit(ClientEvent::PushOpened);

    let mut buffer = BytesMut::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| err.to_string())?;
        buffer.extend_from_slice(&chunk);
        while let Some(frame) = take_frame(&mut buffer) {
            if let Some(payload) = event_data(&frame) {
                dispatch(&payload, sink);
            }
        }
    }
    Ok(())
}

fn dispatch(payload: &str, sink: &dyn EventSink) {
    match decode_event(payload) {
        Ok(event) => sink.emit(ClientEvent::Push(event)),
        // One bad message must never take the stream down.
        Err(err) => client_warn!("dropping push event: {err}"),
    }
}

/// Splits one blank-line-delimited SSE frame off the front of the buffer.
fn take_frame(buffer: &mut BytesMut) -> Option<String> {
    let lf = find(buffer, b"\n\n");
    let crlf = find(buffer, b"\r\n\r\n");
    let (pos, delim_len) = match (lf, crlf) {
        (Some(a), Some(b)) if b < a => (b, 4),
        (Some(a), _) => (a, 2),
        (None, Some(b)) => (b, 4),
        (None, None) => return None,
    };
    let frame = buffer.split_to(pos);
    let _ = buffer.split_to(delim_len);
    Some(String::from_utf8_lossy(&frame).into_owned())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Joins the frame's `data:` field lines; comments and other fields are
/// ignored. Returns `None` for frames without data (e.g. keep-alive pings).
fn event_data(frame: &str) -> Option<String> {
    let mut data_lines = Vec::new();
    for line in frame.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.starts_with(':') {
            continue;
        }
        if let Some(value) = line.strip_prefix("data:") {
            data_lines.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }
    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}
