//! Model-backed generator. All calls go through `LlmClient`; every failure is logged and
//! replaced with `FallbackGenerator` content or the fixed apology.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::generation::prompts::{
    CLOSING_INSTRUCTION, NEXT_QUESTION_INSTRUCTION, QUESTION_PROMPT_TEMPLATE,
};
use crate::generation::{
    apology, FallbackGenerator, Generator, GeneratorFailure, HISTORY_WINDOW, QUESTION_COUNT,
};
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, RECRUITER_PERSONA};
use crate::llm_client::{ChatMessage, ChatRole, LlmClient};
use crate::models::transcript::{Message, Role};

pub struct RemoteGenerator {
    llm: LlmClient,
}

impl RemoteGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    async fn request_questions(
        &self,
        tech_stack: &str,
        language: &str,
    ) -> Result<Vec<String>, GeneratorFailure> {
        let prompt = QUESTION_PROMPT_TEMPLATE
            .replace("{tech_stack}", tech_stack)
            .replace("{language}", language)
            .replace("{count}", &QUESTION_COUNT.to_string());
        let messages = [ChatMessage {
            role: ChatRole::User,
            content: &prompt,
        }];

        let raw: Vec<String> = self.llm.call_json(JSON_ONLY_SYSTEM, &messages).await?;

        let questions: Vec<String> = raw
            .iter()
            .map(|q| strip_ordinal(q.trim()).to_string())
            .filter(|q| !q.is_empty())
            .take(QUESTION_COUNT)
            .collect();

        if questions.is_empty() {
            return Err(GeneratorFailure::NoQuestions);
        }
        Ok(questions)
    }
}

#[async_trait]
impl Generator for RemoteGenerator {
    async fn generate_questions(&self, tech_stack: &str, language: &str) -> Vec<String> {
        match self.request_questions(tech_stack, language).await {
            Ok(questions) => {
                debug!("Model produced {} questions", questions.len());
                questions
            }
            Err(e) => {
                warn!("Question generation failed, using fallback questions: {e}");
                FallbackGenerator::questions_for(tech_stack)
            }
        }
    }

    async fn chat_response(
        &self,
        history: &[Message],
        user_input: &str,
        language: &str,
        next_question: Option<&str>,
    ) -> String {
        let system = chat_system_instruction(language, next_question);
        let messages = history_window(history, user_input);

        match self.llm.call_text(&system, &messages).await {
            Ok(reply) => ensure_question(reply, next_question),
            Err(e) => {
                warn!("Chat response failed, using apology reply: {e}");
                apology(next_question)
            }
        }
    }

    fn backend(&self) -> &'static str {
        "remote"
    }
}

fn chat_system_instruction(language: &str, next_question: Option<&str>) -> String {
    let tail = match next_question {
        Some(question) => NEXT_QUESTION_INSTRUCTION
            .replace("{language}", language)
            .replace("{next_question}", question),
        None => CLOSING_INSTRUCTION.replace("{language}", language),
    };
    format!("{RECRUITER_PERSONA}{tail}")
}

/// The last `HISTORY_WINDOW` transcript messages, followed by `user_input` unless the
/// window already ends with that exact user turn.
fn history_window<'a>(history: &'a [Message], user_input: &'a str) -> Vec<ChatMessage<'a>> {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let mut messages: Vec<ChatMessage<'a>> = history[start..]
        .iter()
        .map(|m| ChatMessage {
            role: match m.role {
                Role::Assistant => ChatRole::Assistant,
                Role::User => ChatRole::User,
            },
            content: &m.content,
        })
        .collect();

    let already_last = messages
        .last()
        .is_some_and(|m| m.role == ChatRole::User && m.content == user_input);
    if !already_last {
        messages.push(ChatMessage {
            role: ChatRole::User,
            content: user_input,
        });
    }
    messages
}

/// Appends `next_question` when the model paraphrased or dropped it.
fn ensure_question(reply: String, next_question: Option<&str>) -> String {
    match next_question {
        Some(question) if !reply.contains(question) => format!("{reply}\n\n{question}"),
        _ => reply,
    }
}

/// Drops a leading "1." / "2)" numbering the model sometimes adds despite instructions.
fn strip_ordinal(question: &str) -> &str {
    let rest = question.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == question.len() {
        return question;
    }
    match rest.strip_prefix(['.', ')']) {
        Some(after) if after.starts_with(' ') => after.trim_start(),
        _ => question,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    use super::*;

    fn completion(content: &str) -> Value {
        json!({
            "choices": [{"message": {"role": "assistant", "content": content}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 8}
        })
    }

    /// Serves a canned response on `/chat/completions` and records the last request body.
    async fn stub_model(status: StatusCode, body: Value) -> (String, Arc<Mutex<Option<Value>>>) {
        let seen = Arc::new(Mutex::new(None));
        let recorder = Arc::clone(&seen);
        let app = Router::new().route(
            "/chat/completions",
            post(move |Json(request): Json<Value>| {
                let body = body.clone();
                let recorder = Arc::clone(&recorder);
                async move {
                    *recorder.lock().unwrap() = Some(request);
                    (status, Json(body))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), seen)
    }

    fn generator(base_url: &str) -> RemoteGenerator {
        RemoteGenerator::new(LlmClient::new("sk-test".to_string(), base_url).unwrap())
    }

    #[tokio::test]
    async fn test_questions_parsed_from_fenced_json() {
        let content = "```json\n[\"What is a borrow?\", \"2. What is Send?\", \"\", \"Why Pin?\"]\n```";
        let (url, seen) = stub_model(StatusCode::OK, completion(content)).await;

        let questions = generator(&url)
            .generate_questions("Rust, Tokio", "French")
            .await;

        assert_eq!(
            questions,
            vec!["What is a borrow?", "What is Send?", "Why Pin?"]
        );

        let request = seen.lock().unwrap().clone().unwrap();
        assert_eq!(request["temperature"], json!(0.7));
        assert_eq!(request["messages"][0]["role"], "system");
        let prompt = request["messages"][1]["content"].as_str().unwrap();
        assert!(prompt.contains("Rust, Tokio"));
        assert!(prompt.contains("French"));
    }

    #[tokio::test]
    async fn test_malformed_questions_fall_back() {
        let (url, _) = stub_model(StatusCode::OK, completion("Here are some questions!")).await;
        let questions = generator(&url)
            .generate_questions("Python, Docker", "English")
            .await;
        assert_eq!(questions, FallbackGenerator::questions_for("Python, Docker"));
    }

    #[tokio::test]
    async fn test_empty_question_array_falls_back() {
        let (url, _) = stub_model(StatusCode::OK, completion("[]")).await;
        let questions = generator(&url).generate_questions("Go", "English").await;
        assert_eq!(questions.len(), QUESTION_COUNT);
    }

    #[tokio::test]
    async fn test_server_error_falls_back() {
        let (url, _) = stub_model(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": {"message": "overloaded"}}),
        )
        .await;
        let questions = generator(&url).generate_questions("Go", "English").await;
        assert_eq!(questions, FallbackGenerator::questions_for("Go"));
    }

    #[tokio::test]
    async fn test_unreachable_model_yields_apology_with_next_question() {
        let next = "**3. Explain Docker layers.**";
        let reply = generator("http://127.0.0.1:1")
            .chat_response(&[], "answer", "English", Some(next))
            .await;
        assert!(reply.contains(next));
        assert!(reply.starts_with("I apologize"));
    }

    #[tokio::test]
    async fn test_reply_gets_next_question_appended_when_missing() {
        let (url, seen) = stub_model(StatusCode::OK, completion("Nice answer.")).await;
        let history = vec![
            Message::assistant("**1. What is GIL?**"),
            Message::user("A global lock"),
        ];
        let next = "**2. What is asyncio?**";

        let reply = generator(&url)
            .chat_response(&history, "A global lock", "English", Some(next))
            .await;

        assert_eq!(reply, format!("Nice answer.\n\n{next}"));

        let request = seen.lock().unwrap().clone().unwrap();
        let messages = request["messages"].as_array().unwrap();
        // system + the two history messages; the latest user turn is not duplicated
        assert_eq!(messages.len(), 3);
        assert!(messages[0]["content"].as_str().unwrap().contains(next));
    }

    #[test]
    fn test_history_window_keeps_latest_messages() {
        let history: Vec<Message> = (0..10).map(|i| Message::user(format!("m{i}"))).collect();
        let window = history_window(&history, "new answer");
        assert_eq!(window.len(), HISTORY_WINDOW + 1);
        assert_eq!(window[0].content, "m4");
        assert_eq!(window.last().unwrap().content, "new answer");
    }

    #[test]
    fn test_closing_instruction_when_no_next_question() {
        let system = chat_system_instruction("German", None);
        assert!(system.contains("German"));
        assert!(system.contains("finished"));
    }

    #[test]
    fn test_strip_ordinal() {
        assert_eq!(strip_ordinal("1. What is X?"), "What is X?");
        assert_eq!(strip_ordinal("12) Why?"), "Why?");
        assert_eq!(strip_ordinal("2FA flows?"), "2FA flows?");
        assert_eq!(strip_ordinal("3.5 vs 4?"), "3.5 vs 4?");
        assert_eq!(strip_ordinal("Plain"), "Plain");
    }
}
