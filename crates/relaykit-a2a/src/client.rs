//! A2A Protocol Client
//!
//! HTTP client that acts as the protocol event source for stream
//! reconciliation. It speaks the A2A JSON-RPC surface (`message/send`,
//! `message/stream`, `tasks/get`, `tasks/cancel`) and turns the
//! Server-Sent Events transport of `message/stream` into an async
//! sequence of [`A2aEvent`]s.
//!
//! # Connection Behavior
//!
//! | Operation | Default Timeout |
//! |-----------|-----------------|
//! | Regular requests | 30 seconds |
//! | Streaming requests | 5 minutes |
//!
//! The client does not retry failed requests; transport errors surface as
//! `Err` items on the event stream for the caller to handle.
//!
//! # Non-streaming fallback
//!
//! Agents without streaming support answer `message/send` with a single
//! `task` or `message` event. [`single_event_stream`] wraps that response
//! in a one-element synthetic stream so the same reconciliation path
//! handles both cases.

use crate::error::{A2aError, A2aResult, ErrorResponse};
use crate::types::{A2aEvent, Message, Task};
use futures::Stream;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

/// Default timeout for HTTP requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for streaming requests
const STREAMING_TIMEOUT: Duration = Duration::from_secs(300);

/// A boxed stream of protocol events
pub type EventStream = Pin<Box<dyn Stream<Item = A2aResult<A2aEvent>> + Send>>;

/// A2A protocol client for communicating with external agents
#[derive(Clone)]
pub struct A2aClient {
    /// Endpoint URL of the A2A agent
    endpoint: Url,
    /// HTTP client
    http: Client,
    /// Authentication configuration
    auth: Option<AuthConfig>,
}

impl std::fmt::Debug for A2aClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("A2aClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("has_auth", &self.auth.is_some())
            .finish()
    }
}

/// Authentication configuration for A2A requests
#[derive(Clone)]
pub enum AuthConfig {
    /// Bearer token authentication
    Bearer(String),
    /// API key in header
    ApiKeyHeader { name: String, value: String },
}

impl A2aClient {
    /// Create a new A2A client for the given agent endpoint
    pub fn new(endpoint: impl AsRef<str>) -> A2aResult<Self> {
        let endpoint = Url::parse(endpoint.as_ref())?;

        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(format!("relaykit-a2a/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                A2aError::connection_error(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            endpoint,
            http,
            auth: None,
        })
    }

    /// Create a new A2A client with a custom HTTP client
    pub fn with_http_client(endpoint: impl AsRef<str>, http: Client) -> A2aResult<Self> {
        let endpoint = Url::parse(endpoint.as_ref())?;

        Ok(Self {
            endpoint,
            http,
            auth: None,
        })
    }

    /// Set authentication configuration
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set bearer token authentication
    pub fn with_bearer_token(self, token: impl Into<String>) -> Self {
        self.with_auth(AuthConfig::Bearer(token.into()))
    }

    /// Set API key authentication (header)
    pub fn with_api_key(self, header_name: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.with_auth(AuthConfig::ApiKeyHeader {
            name: header_name.into(),
            value: api_key.into(),
        })
    }

    /// Get the endpoint URL
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Apply authentication to a request builder
    fn apply_auth(&self, mut builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(auth) = &self.auth {
            builder = match auth {
                AuthConfig::Bearer(token) => builder.bearer_auth(token),
                AuthConfig::ApiKeyHeader { name, value } => builder.header(name.as_str(), value),
            };
        }
        builder
    }

    // =========================================================================
    // Messaging
    // =========================================================================

    /// Send a message and wait for the complete response.
    ///
    /// Returns the single `task` or `message` event the agent responds with.
    pub async fn send_message(&self, message: Message) -> A2aResult<A2aEvent> {
        let request = JsonRpcRequest::new("message/send", SendMessageParams { message });

        debug!(url = %self.endpoint, "Sending message to agent");

        let response = self
            .apply_auth(self.http.post(self.endpoint.clone()))
            .json(&request)
            .send()
            .await
            .map_err(|e| A2aError::connection_error(format!("Failed to send message: {}", e)))?;

        let envelope: JsonRpcResponse<A2aEvent> = response
            .json()
            .await
            .map_err(|e| A2aError::protocol_error(format!("Failed to parse response: {}", e)))?;

        envelope.into_result()
    }

    /// Send a message and receive a stream of protocol events.
    ///
    /// Uses `message/stream` over Server-Sent Events. Transport errors are
    /// forwarded to the stream as `Err` items and end it.
    pub async fn send_message_streaming(&self, message: Message) -> A2aResult<EventStream> {
        let request = JsonRpcRequest::new("message/stream", SendMessageParams { message });

        debug!(url = %self.endpoint, "Sending message with streaming");

        let response = self
            .apply_auth(
                self.http
                    .post(self.endpoint.clone())
                    .timeout(STREAMING_TIMEOUT)
                    .header("Accept", "text/event-stream"),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                A2aError::connection_error(format!("Failed to send streaming request: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(A2aError::protocol_error(format!("HTTP {}: {}", status, body)));
        }

        // Channel bridging the SSE reader task to the returned stream
        let (tx, rx) = tokio::sync::mpsc::channel::<A2aResult<A2aEvent>>(32);

        tokio::spawn(async move {
            use futures::StreamExt;
            let mut stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = stream.next().await {
                match chunk_result {
                    Ok(chunk) => {
                        let chunk_str = match std::str::from_utf8(&chunk) {
                            Ok(s) => s,
                            Err(e) => {
                                warn!(error = %e, "Invalid UTF-8 in SSE stream");
                                continue;
                            }
                        };

                        buffer.push_str(chunk_str);

                        // Process complete SSE events
                        while let Some(event) = parse_sse_event(&mut buffer) {
                            if tx.send(event).await.is_err() {
                                // Receiver dropped
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx
                            .send(Err(A2aError::connection_error(format!(
                                "Stream error: {}",
                                e
                            ))))
                            .await;
                        return;
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    // =========================================================================
    // Task Management
    // =========================================================================

    /// Get the current state of a task
    pub async fn get_task(&self, task_id: impl Into<String>) -> A2aResult<Task> {
        let task_id = task_id.into();
        let request = JsonRpcRequest::new("tasks/get", TaskIdParams { id: task_id.clone() });

        debug!(task_id = %task_id, "Fetching task");

        let response = self
            .apply_auth(self.http.post(self.endpoint.clone()))
            .json(&request)
            .send()
            .await
            .map_err(|e| A2aError::connection_error(format!("Failed to fetch task: {}", e)))?;

        let envelope: JsonRpcResponse<Task> = response
            .json()
            .await
            .map_err(|e| A2aError::protocol_error(format!("Failed to parse task: {}", e)))?;

        envelope.into_result()
    }

    /// Cancel a running task
    pub async fn cancel_task(&self, task_id: impl Into<String>) -> A2aResult<Task> {
        let task_id = task_id.into();
        let request = JsonRpcRequest::new("tasks/cancel", TaskIdParams { id: task_id.clone() });

        debug!(task_id = %task_id, "Cancelling task");

        let response = self
            .apply_auth(self.http.post(self.endpoint.clone()))
            .json(&request)
            .send()
            .await
            .map_err(|e| A2aError::connection_error(format!("Failed to cancel task: {}", e)))?;

        let envelope: JsonRpcResponse<Task> = response.json().await.map_err(|e| {
            A2aError::protocol_error(format!("Failed to parse cancelled task: {}", e))
        })?;

        envelope.into_result()
    }
}

/// Wrap a single non-streaming response event in a synthetic event stream.
pub fn single_event_stream(event: A2aEvent) -> EventStream {
    Box::pin(futures::stream::iter([Ok(event)]))
}

// =============================================================================
// JSON-RPC envelope
// =============================================================================

#[derive(Debug, Serialize)]
struct JsonRpcRequest<P> {
    jsonrpc: &'static str,
    id: String,
    method: &'static str,
    params: P,
}

impl<P> JsonRpcRequest<P> {
    fn new(method: &'static str, params: P) -> Self {
        Self {
            jsonrpc: "2.0",
            id: Uuid::new_v4().to_string(),
            method,
            params,
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMessageParams {
    message: Message,
}

#[derive(Debug, Serialize)]
struct TaskIdParams {
    id: String,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    #[serde(default = "Option::default")]
    result: Option<T>,
    #[serde(default = "Option::default")]
    error: Option<ErrorResponse>,
}

impl<T> JsonRpcResponse<T> {
    fn into_result(self) -> A2aResult<T> {
        if let Some(error) = self.error {
            return Err(A2aError::protocol_error(format!(
                "Agent returned error {}: {}",
                error.code, error.message
            )));
        }
        self.result
            .ok_or_else(|| A2aError::protocol_error("Response carried neither result nor error"))
    }
}

/// Parse the next SSE data event from a buffer.
///
/// Returns the next complete data-bearing event if available, removing it
/// from the buffer. Data-less events (comments, keep-alives such as
/// `: keep-alive\n\n`) are consumed and skipped rather than reported, so a
/// complete data event sitting behind one in the same buffer is still
/// found. `None` means the buffer holds no further complete event.
///
/// Each SSE `data:` payload is a JSON-RPC response envelope whose
/// `result` is the protocol event.
fn parse_sse_event(buffer: &mut String) -> Option<A2aResult<A2aEvent>> {
    loop {
        // SSE events are separated by double newlines
        let event_end = buffer.find("\n\n")?;
        let event_str = buffer[..event_end].to_string();
        buffer.drain(..event_end + 2);

        let mut data = String::new();
        for line in event_str.lines() {
            if let Some(value) = line.strip_prefix("data:") {
                if !data.is_empty() {
                    data.push('\n');
                }
                data.push_str(value.trim());
            }
        }

        if data.is_empty() {
            // Comment or keep-alive event; keep scanning.
            continue;
        }

        return match serde_json::from_str::<JsonRpcResponse<A2aEvent>>(&data) {
            Ok(envelope) => Some(envelope.into_result()),
            Err(e) => {
                warn!(error = %e, "Failed to parse SSE event");
                Some(Err(A2aError::protocol_error(format!(
                    "Failed to parse streaming event: {}",
                    e
                ))))
            }
        };
    }
}
