//! Question and reply generation behind a pluggable trait.
//!
//! `RemoteGenerator` talks to the model through `llm_client`; `FallbackGenerator` is
//! deterministic and needs no network. `AppState` holds an `Arc<dyn Generator>` picked once
//! at startup by `build_generator`, based on whether a model credential is configured.
//!
//! Neither implementation fails its caller: every remote failure is mapped to fallback
//! content inside the generator.

pub mod fallback;
pub mod prompts;
pub mod remote;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::llm_client::{LlmClient, LlmError, MODEL};
use crate::models::transcript::Message;

pub use fallback::FallbackGenerator;
pub use remote::RemoteGenerator;

/// Questions produced per session.
pub const QUESTION_COUNT: usize = 4;

/// Transcript messages forwarded to the model with each chat turn.
pub const HISTORY_WINDOW: usize = 6;

const APOLOGY: &str = "I apologize, but I had a connection hiccup. Let's move on.";
const SUBMIT_PROMPT: &str = "Please submit your interview.";

/// The generator trait. Implement this to swap backends without touching the
/// dialogue controller or the handlers.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Ordered interview questions for `tech_stack`. Never empty.
    async fn generate_questions(&self, tech_stack: &str, language: &str) -> Vec<String>;

    /// Next assistant reply. When `next_question` is present the reply contains it verbatim;
    /// otherwise it announces that the questions are done and asks for submission.
    async fn chat_response(
        &self,
        history: &[Message],
        user_input: &str,
        language: &str,
        next_question: Option<&str>,
    ) -> String;

    /// "remote" or "fallback", reported in API responses.
    fn backend(&self) -> &'static str;
}

/// Anything that went wrong talking to the model. Never leaves this module.
#[derive(Debug, Error)]
pub(crate) enum GeneratorFailure {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("model returned no usable questions")]
    NoQuestions,
}

/// Reply used when a remote chat turn fails. Still carries the conversation forward.
pub(crate) fn apology(next_question: Option<&str>) -> String {
    match next_question {
        Some(question) => format!("{APOLOGY} {question}"),
        None => format!("{APOLOGY} {SUBMIT_PROMPT}"),
    }
}

/// Picks the generator backend once, from credential presence.
pub fn build_generator(config: &Config) -> Arc<dyn Generator> {
    let Some(api_key) = config.openai_api_key.as_deref() else {
        info!("No model credential configured, using fallback generator");
        return Arc::new(FallbackGenerator);
    };

    match LlmClient::new(api_key.to_string(), &config.openai_base_url) {
        Ok(llm) => {
            info!("Remote generator initialized (model: {MODEL})");
            Arc::new(RemoteGenerator::new(llm))
        }
        Err(e) => {
            warn!("Failed to initialize model client, using fallback generator: {e}");
            Arc::new(FallbackGenerator)
        }
    }
}
