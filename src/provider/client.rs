//! Streaming chat-completions client
//!
//! Sends one request per call and relays text deltas as they arrive.
//! Calls are independent: the only shared state is the read-only settings
//! and the `reqwest` connection pool.

use super::decode::{decode_frame, FrameBuffer, StreamChunk};
use super::request::{ChatRequest, RequestBuilder};
use super::{GenerationConfig, ProviderConfig};
use crate::config::Config;
use crate::error::RelayError;
use crate::events::{RelayState, StreamDelta, StreamOutcome};
use crate::message::ChatTurn;
use crate::prompt::PromptTemplate;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

/// Rejected responses are kept for diagnostics up to this size
const MAX_ERROR_BODY: usize = 64 * 1024;

#[derive(Debug)]
struct Settings {
    provider: ProviderConfig,
    prompt: PromptTemplate,
    generation: GenerationConfig,
}

/// Client for the provider's streaming chat endpoint
#[derive(Clone)]
pub struct ProviderClient {
    settings: Arc<Settings>,
    http_client: reqwest::Client,
}

/// Handle to a relay call running in the background.
///
/// Dropping the handle detaches the call; it keeps running and still
/// invokes its callbacks.
#[derive(Debug)]
pub struct StreamHandle {
    cancel: CancellationToken,
    task: JoinHandle<StreamOutcome>,
}

impl StreamHandle {
    /// Abort the HTTP exchange.
    ///
    /// A callback already running when this is called may still finish, but
    /// the relay starts no further callback once it sees the cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the call to reach a terminal state
    pub async fn join(self) -> StreamOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => StreamOutcome::Cancelled,
            Err(e) => {
                tracing::error!(target: "llm", error = %e, "Relay task panicked");
                StreamOutcome::Failed
            }
        }
    }
}

#[derive(Debug, Default)]
struct FrameStats {
    frames: usize,
    chunks: usize,
    malformed: usize,
}

impl ProviderClient {
    /// Create a client; the HTTP connection pool is built here once
    pub fn new(
        provider: ProviderConfig,
        prompt: PromptTemplate,
        generation: GenerationConfig,
    ) -> Result<Self, RelayError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("deepdimension/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(RelayError::Client)?;

        Ok(Self {
            settings: Arc::new(Settings {
                provider,
                prompt,
                generation,
            }),
            http_client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, RelayError> {
        Self::new(
            config.provider.clone(),
            config.prompt.clone(),
            config.generation,
        )
    }

    /// Get the provider config
    pub fn config(&self) -> &ProviderConfig {
        &self.settings.provider
    }

    /// Build the request body for one call without sending it
    pub fn build_request(
        &self,
        user_message: &str,
        context: Option<&str>,
        history: Option<&[ChatTurn]>,
    ) -> ChatRequest {
        RequestBuilder::new(
            &self.settings.provider.model,
            &self.settings.prompt,
            &self.settings.generation,
        )
        .build(user_message, context, history)
    }

    /// Start a streaming call and return immediately.
    ///
    /// `on_chunk` receives each non-empty text delta in arrival order.
    /// `on_error` fires at most once, on transport failure, and never after
    /// a clean end of stream or a cancellation. Must be called from within
    /// a Tokio runtime.
    pub fn stream<F, E>(
        &self,
        user_message: &str,
        context: Option<&str>,
        history: Option<&[ChatTurn]>,
        on_chunk: F,
        on_error: E,
    ) -> StreamHandle
    where
        F: FnMut(String) + Send + 'static,
        E: FnOnce(RelayError) + Send + 'static,
    {
        let request = self.build_request(user_message, context, history);
        self.spawn_relay(request, on_chunk, move |result| {
            if let Err(e) = result {
                on_error(e);
            }
        })
    }

    /// Start a streaming call whose output is delivered over a channel.
    ///
    /// The receiver yields `Text` items followed by exactly one `Done` or
    /// `Error`. A cancelled call closes the channel without a final item.
    pub fn stream_events(
        &self,
        user_message: &str,
        context: Option<&str>,
        history: Option<&[ChatTurn]>,
    ) -> (mpsc::UnboundedReceiver<StreamDelta>, StreamHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let chunk_tx = tx.clone();
        let request = self.build_request(user_message, context, history);

        let handle = self.spawn_relay(
            request,
            move |text| {
                let _ = chunk_tx.send(StreamDelta::Text(text));
            },
            move |result| match result {
                Ok(StreamOutcome::Completed { .. }) => {
                    let _ = tx.send(StreamDelta::Done);
                }
                Ok(_) => {}
                Err(e) => {
                    let _ = tx.send(StreamDelta::Error(e.to_string()));
                }
            },
        );

        (rx, handle)
    }

    fn spawn_relay<F, D>(&self, request: ChatRequest, mut on_chunk: F, on_finish: D) -> StreamHandle
    where
        F: FnMut(String) + Send + 'static,
        D: FnOnce(Result<StreamOutcome, RelayError>) + Send + 'static,
    {
        let client = self.clone();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let result = client.relay(&request, &token, &mut on_chunk).await;
            // checked last so a cancellation landing after the relay returned
            // still silences the final callback
            let result = match result {
                Err(e) if token.is_cancelled() => {
                    tracing::debug!(target: "llm", error = %e, "Suppressing error after cancellation");
                    Ok(StreamOutcome::Cancelled)
                }
                Ok(StreamOutcome::Completed { .. }) if token.is_cancelled() => {
                    tracing::debug!(target: "llm", "Suppressing completion after cancellation");
                    Ok(StreamOutcome::Cancelled)
                }
                other => other,
            };
            let outcome = match &result {
                Ok(outcome) => *outcome,
                Err(_) => StreamOutcome::Failed,
            };
            on_finish(result);
            outcome
        });

        StreamHandle { cancel, task }
    }

    /// Send a streaming chat completion request and relay its deltas.
    ///
    /// Runs on the caller's task. Malformed frames are logged and skipped;
    /// only transport failures are returned as errors.
    pub async fn relay<F>(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
        mut on_chunk: F,
    ) -> Result<StreamOutcome, RelayError>
    where
        F: FnMut(String),
    {
        let call_id = Uuid::new_v4();
        let span = tracing::info_span!(
            target: "llm",
            "chat_stream",
            %call_id,
            model = %request.model,
            messages = request.messages.len()
        );

        self.relay_inner(request, cancel, &mut on_chunk)
            .instrument(span)
            .await
    }

    async fn relay_inner<F>(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
        on_chunk: &mut F,
    ) -> Result<StreamOutcome, RelayError>
    where
        F: FnMut(String),
    {
        let start = Instant::now();
        let mut state = RelayState::Idle;

        let mut request_builder = self
            .http_client
            .post(self.settings.provider.chat_completions_url())
            .header("Content-Type", "application/json")
            .json(request);

        if let Some(api_key) = self.settings.provider.api_key() {
            request_builder = request_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        state.advance(RelayState::Sending);
        tracing::info!(target: "llm", "Starting streaming LLM call");

        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = request_builder.send() => Some(result),
        };

        let response = match sent {
            None => {
                state.advance(RelayState::Cancelled);
                tracing::info!(target: "llm", "Request cancelled before response");
                return Ok(StreamOutcome::Cancelled);
            }
            Some(Err(e)) => {
                state.advance(RelayState::Failed);
                tracing::error!(target: "llm", error = %e, "Streaming LLM call failed");
                return Err(RelayError::Request(e));
            }
            Some(Ok(response)) => response,
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = match Self::read_error_body(response, cancel).await {
                Some(body) => body,
                None => {
                    state.advance(RelayState::Cancelled);
                    tracing::info!(target: "llm", status = %status, "Cancelled while reading error body");
                    return Ok(StreamOutcome::Cancelled);
                }
            };
            state.advance(RelayState::Failed);
            tracing::error!(
                target: "llm",
                status = %status,
                error = %body,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Streaming LLM call returned error"
            );
            return Err(RelayError::Status { status, body });
        }

        state.advance(RelayState::Streaming);

        let mut stream = response.bytes_stream();
        let mut buffer = FrameBuffer::new();
        let mut stats = FrameStats::default();
        let mut done = false;

        while !done {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                item = stream.next() => Some(item),
            };

            let bytes = match next {
                None => {
                    state.advance(RelayState::Cancelled);
                    tracing::info!(
                        target: "llm",
                        chunks = stats.chunks,
                        "Stream cancelled"
                    );
                    return Ok(StreamOutcome::Cancelled);
                }
                Some(None) => break,
                Some(Some(Err(e))) => {
                    state.advance(RelayState::Failed);
                    tracing::error!(
                        target: "llm",
                        error = %e,
                        chunks = stats.chunks,
                        "Stream read error"
                    );
                    return Err(RelayError::Read(e));
                }
                Some(Some(Ok(bytes))) => bytes,
            };

            for frame in buffer.push(&bytes) {
                if cancel.is_cancelled() {
                    state.advance(RelayState::Cancelled);
                    return Ok(StreamOutcome::Cancelled);
                }
                if Self::dispatch_frame(&frame, on_chunk, &mut stats) {
                    done = true;
                    break;
                }
            }
        }

        if !done {
            if let Some(frame) = buffer.finish() {
                Self::dispatch_frame(&frame, on_chunk, &mut stats);
            }
        }

        state.advance(RelayState::Completed);
        tracing::info!(
            target: "llm",
            elapsed_ms = start.elapsed().as_millis() as u64,
            frames = stats.frames,
            chunks = stats.chunks,
            malformed = stats.malformed,
            sentinel = done,
            "Streaming LLM call completed"
        );

        Ok(StreamOutcome::Completed {
            chunks: stats.chunks,
        })
    }

    /// Collect up to `MAX_ERROR_BODY` bytes of a rejected response for
    /// diagnostics. `None` if the call was cancelled first; a read failure
    /// keeps whatever arrived.
    async fn read_error_body(response: reqwest::Response, cancel: &CancellationToken) -> Option<String> {
        let mut stream = response.bytes_stream();
        let mut body = Vec::new();

        while body.len() < MAX_ERROR_BODY {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                item = stream.next() => item,
            };
            match next {
                Some(Ok(bytes)) => body.extend_from_slice(&bytes),
                Some(Err(e)) => {
                    tracing::debug!(target: "llm", error = %e, "Error body read failed");
                    break;
                }
                None => break,
            }
        }

        body.truncate(MAX_ERROR_BODY);
        Some(String::from_utf8_lossy(&body).into_owned())
    }

    /// Decode one frame and hand its text to the callback.
    /// Returns true on the end-of-stream sentinel.
    fn dispatch_frame<F>(frame: &str, on_chunk: &mut F, stats: &mut FrameStats) -> bool
    where
        F: FnMut(String),
    {
        stats.frames += 1;
        match decode_frame(frame) {
            StreamChunk::Done => {
                tracing::debug!(target: "llm", "Received end-of-stream sentinel");
                true
            }
            StreamChunk::Delta(text) => {
                if !text.is_empty() {
                    stats.chunks += 1;
                    on_chunk(text);
                }
                false
            }
            StreamChunk::Malformed(reason) => {
                stats.malformed += 1;
                tracing::warn!(target: "llm", error = %reason, frame = %frame, "Skipping malformed stream frame");
                false
            }
        }
    }
}
