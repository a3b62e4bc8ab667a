//! Generative text features
//!
//! - [`TextGenerator`]: the seam to the generative text service
//! - [`GeminiClient`]: REST implementation
//! - [`ChatAssistant`]: visitor chat over the current snapshot
//! - [`assist`]: admin writing helpers and resume extraction

pub mod assist;
mod assistant;
mod client;

pub use assist::{ResumeExtract, MAX_TECH_SUGGESTIONS};
pub use assistant::{ChatAssistant, EMPTY_REPLY, NO_KEY_REPLY, SERVICE_ERROR_REPLY};
pub use client::{AiError, Attachment, GeminiClient, GenerateRequest, TextGenerator};

use std::sync::Arc;

use tracing::info;

use crate::config::Config;

/// The configured generator, or None when no API key is set
pub fn generator_from_config(config: &Config) -> Option<Arc<dyn TextGenerator>> {
    match GeminiClient::from_config(config) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            info!("AI features disabled: {}", e);
            None
        }
    }
}
