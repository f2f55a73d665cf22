//! Model-backed Java → Kotlin conversion for the evaluation pipeline
//!
//! - `config`: endpoint, batch, verifier and metric settings (env + TOML)
//! - `converter`: [`ModelConverter`], an Ollama / OpenAI-compatible client
//!   implementing `evaluation::batch::Converter`
//! - `prompts`: translation prompts

pub mod config;
pub mod converter;
pub mod prompts;

pub use config::{ApiFlavor, ConfigError, EndpointConfig, J2kConfig};
pub use converter::ModelConverter;
