//! DeepDimension chat relay
//!
//! This crate provides:
//! - Request construction for the DeepSeek chat-completions API
//!   (rules + retrieved context as one system turn, history, user turn)
//! - A streaming relay that forwards text deltas to callbacks or a channel
//! - Configuration loading and logging setup for the `deepdimension` CLI

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod telemetry;

pub use auth::AuthConfig;
pub use config::Config;
pub use error::RelayError;
pub use events::{RelayState, StreamDelta, StreamOutcome};
pub use message::{ChatRole, ChatTurn, Conversation};
pub use prompt::PromptTemplate;
pub use provider::{
    ChatRequest, GenerationConfig, ProviderClient, ProviderConfig, RequestBuilder, StreamChunk,
    StreamHandle,
};
pub use telemetry::Telemetry;
