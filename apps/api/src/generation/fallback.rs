//! Deterministic generator used when no model credential is configured, and as the
//! substitute content whenever the remote model fails.
//!
//! Language-agnostic: questions and replies are always English, whatever the hint says.

use async_trait::async_trait;

use crate::generation::Generator;
use crate::models::transcript::Message;

const ACKNOWLEDGEMENT: &str = "That's a great point. Now, let's move on.";
const CLOSING: &str = "Thank you for all your detailed answers! You have completed the \
    technical screening. Please submit your interview to finish.";

pub struct FallbackGenerator;

impl FallbackGenerator {
    /// The fixed question list, each question anchored to `tech_stack`.
    pub fn questions_for(tech_stack: &str) -> Vec<String> {
        let stack = match tech_stack.trim() {
            "" => "your tech stack",
            trimmed => trimmed,
        };
        vec![
            format!(
                "Can you explain the core principles of one of the main technologies in your stack: {stack}?"
            ),
            format!(
                "Describe a challenging bug you faced recently while working with {stack} and how you resolved it."
            ),
            format!(
                "How do you handle state management and data flow in projects built with {stack}?"
            ),
            format!("What security best practices do you follow when building APIs with {stack}?"),
        ]
    }

    pub fn reply_for(next_question: Option<&str>) -> String {
        match next_question {
            Some(question) => format!("{ACKNOWLEDGEMENT}\n\n{question}"),
            None => CLOSING.to_string(),
        }
    }
}

#[async_trait]
impl Generator for FallbackGenerator {
    async fn generate_questions(&self, tech_stack: &str, _language: &str) -> Vec<String> {
        Self::questions_for(tech_stack)
    }

    async fn chat_response(
        &self,
        _history: &[Message],
        _user_input: &str,
        _language: &str,
        next_question: Option<&str>,
    ) -> String {
        Self::reply_for(next_question)
    }

    fn backend(&self) -> &'static str {
        "fallback"
    }
}
