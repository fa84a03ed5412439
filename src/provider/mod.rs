//! LLM Provider layer
//!
//! OpenAI-style streaming chat completions against DeepSeek (or any
//! endpoint speaking the same contract).

mod client;
mod config;
pub mod decode;
mod request;

pub use client::*;
pub use config::*;
pub use decode::{decode_frame, StreamChunk};
pub use request::*;
