//! Dialogue controller: the linear state machine behind a screening session.
//!
//! Intake → Questioning → Completed, or Intake → Questioning → Terminated (exit keyword or
//! finishing with questions still open). Terminal states are absorbing.
//!
//! Only `DialogueError` reaches the caller. Generator problems are absorbed inside the
//! generator; persistence problems are logged here and the conversation carries on.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::dialogue::state::{Phase, SessionState};
use crate::generation::Generator;
use crate::models::candidate::{CandidateProfile, ProfileForm};
use crate::models::summary::{AnsweredQuestion, SessionOutcome, SessionSummary};
use crate::models::transcript::Message;
use crate::storage::{SessionSink, StorageError};

/// Case-insensitive substrings that end the interview immediately.
pub const EXIT_KEYWORDS: [&str; 4] = ["quit", "exit", "bye", "end conversation"];

/// Used only if a generator ever hands back an empty list.
const DEFAULT_OPENING_QUESTION: &str = "Tell me about your experience.";

const FAREWELL: &str = "Thank you for your time! We have recorded your responses. \
    Our team will be in touch soon.";

#[derive(Debug, Error)]
pub enum DialogueError {
    #[error("Please fill in the required fields: {}", .missing.join(", "))]
    Validation { missing: Vec<&'static str> },

    #[error("Cannot {operation} while the session is {phase}")]
    InvalidState {
        operation: &'static str,
        phase: Phase,
    },

    #[error("All questions have been answered; finish the session to submit it")]
    AwaitingFinish,
}

/// What a submitted answer led to.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// The reply poses question `progress_index + 1`.
    NextQuestion { reply: String, progress_index: usize },
    /// The last question was answered; the session is ready to finish.
    QuestionsExhausted { reply: String },
    /// An exit keyword ended the session.
    Terminated { farewell: String },
}

pub fn is_exit_request(text: &str) -> bool {
    let lowered = text.to_lowercase();
    EXIT_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

/// Question as shown to the candidate: bold, with its 1-based ordinal.
pub fn format_question(ordinal: usize, question: &str) -> String {
    format!("**{ordinal}. {question}**")
}

/// Message shown on the end screen.
pub fn closing_note(profile: &CandidateProfile) -> String {
    format!(
        "Dear {}, we appreciate the time you took to complete this screening. \
        Your responses regarding {} have been saved. Our recruitment team will review \
        your profile and get back to you at {} within 48 hours.",
        profile.name, profile.tech_stack, profile.email
    )
}

fn greeting(profile: &CandidateProfile, first_question: &str) -> String {
    format!(
        "Hi {}! Thanks for sharing your details. Based on your experience with **{}**, \
        I'd like to ask you a few questions.\n\nLet's start:\n\n{}",
        profile.name,
        profile.tech_stack,
        format_question(1, first_question)
    )
}

pub struct DialogueController {
    generator: Arc<dyn Generator>,
    sink: Arc<dyn SessionSink>,
    language: String,
    session: Option<SessionState>,
}

impl DialogueController {
    pub fn new(
        generator: Arc<dyn Generator>,
        sink: Arc<dyn SessionSink>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            generator,
            sink,
            language: language.into(),
            session: None,
        }
    }

    pub fn phase(&self) -> Phase {
        match &self.session {
            None => Phase::Intake,
            Some(session) => session.outcome.map_or(Phase::Questioning, Phase::from),
        }
    }

    pub fn session(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    pub fn backend(&self) -> &'static str {
        self.generator.backend()
    }

    /// True once every question is answered and the session is still open.
    pub fn can_finish(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.outcome.is_none() && !s.questions_remaining())
    }

    /// Validates the profile, generates questions, seeds the transcript with question 1
    /// and saves the profile.
    pub async fn start(&mut self, form: ProfileForm) -> Result<&SessionState, DialogueError> {
        if self.session.is_some() {
            return Err(DialogueError::InvalidState {
                operation: "start",
                phase: self.phase(),
            });
        }

        let missing = form.missing_fields();
        if !missing.is_empty() {
            return Err(DialogueError::Validation { missing });
        }

        let profile = form.into_profile(Utc::now());
        let mut questions = self
            .generator
            .generate_questions(&profile.tech_stack, &self.language)
            .await;
        if questions.is_empty() {
            questions.push(DEFAULT_OPENING_QUESTION.to_string());
        }

        let session = SessionState {
            session_id: Uuid::new_v4(),
            language: self.language.clone(),
            transcript: vec![Message::assistant(greeting(&profile, &questions[0]))],
            questions,
            progress_index: 0,
            answers: Vec::new(),
            outcome: None,
            started_at: profile.created_at,
            ended_at: None,
            profile,
        };

        info!(
            "Session {} started for {} with {} questions ({} generator)",
            session.session_id,
            session.profile.email,
            session.questions.len(),
            self.generator.backend()
        );

        self.persist_profile(session.profile.clone()).await;
        Ok(&*self.session.insert(session))
    }

    /// Records an answer and advances to the next question, or ends the session on an
    /// exit keyword.
    pub async fn submit_answer(&mut self, text: &str) -> Result<TurnOutcome, DialogueError> {
        let phase = self.phase();
        let session = match self.session.as_mut() {
            Some(session) if session.outcome.is_none() => session,
            _ => {
                return Err(DialogueError::InvalidState {
                    operation: "submit an answer",
                    phase,
                })
            }
        };
        if text.trim().is_empty() {
            return Err(DialogueError::Validation {
                missing: vec!["answer"],
            });
        }

        // An exit keyword ends the session even once every question is answered.
        if is_exit_request(text) {
            session.transcript.push(Message::user(text));
            session.transcript.push(Message::assistant(FAREWELL));
            session.outcome = Some(SessionOutcome::Terminated);
            session.ended_at = Some(Utc::now());
            info!(
                "Session {} terminated by candidate after {} answers",
                session.session_id,
                session.answers.len()
            );
            let summary = session.summary();
            if let Some(summary) = summary {
                self.persist_summary(summary).await;
            }
            return Ok(TurnOutcome::Terminated {
                farewell: FAREWELL.to_string(),
            });
        }

        if !session.questions_remaining() {
            return Err(DialogueError::AwaitingFinish);
        }
        session.transcript.push(Message::user(text));

        let question = session.questions[session.progress_index].clone();
        session.answers.push(AnsweredQuestion {
            question,
            answer: text.to_string(),
        });
        session.progress_index += 1;

        let next_question = session
            .questions
            .get(session.progress_index)
            .map(|q| format_question(session.progress_index + 1, q));

        let reply = self
            .generator
            .chat_response(
                &session.transcript,
                text,
                &session.language,
                next_question.as_deref(),
            )
            .await;
        session.transcript.push(Message::assistant(reply.clone()));

        debug!(
            "Session {} at question index {}/{}",
            session.session_id,
            session.progress_index,
            session.questions.len()
        );

        Ok(match next_question {
            Some(_) => TurnOutcome::NextQuestion {
                reply,
                progress_index: session.progress_index,
            },
            None => TurnOutcome::QuestionsExhausted { reply },
        })
    }

    /// Ends the session: `Completed` when every question was answered, otherwise
    /// `Terminated` as an early exit.
    pub async fn finish(&mut self) -> Result<SessionOutcome, DialogueError> {
        let phase = self.phase();
        let Some(session) = self.session.as_mut().filter(|s| s.outcome.is_none()) else {
            return Err(DialogueError::InvalidState {
                operation: "finish",
                phase,
            });
        };

        let outcome = if session.questions_remaining() {
            SessionOutcome::Terminated
        } else {
            SessionOutcome::Completed
        };
        session.outcome = Some(outcome);
        session.ended_at = Some(Utc::now());
        info!(
            "Session {} {outcome} with {}/{} questions answered",
            session.session_id,
            session.answers.len(),
            session.questions.len()
        );

        let summary = session.summary();
        if let Some(summary) = summary {
            self.persist_summary(summary).await;
        }
        Ok(outcome)
    }

    async fn persist_profile(&self, profile: CandidateProfile) {
        let sink = Arc::clone(&self.sink);
        let result = tokio::task::spawn_blocking(move || sink.save_profile(&profile)).await;
        log_persistence("candidate profile", result);
    }

    async fn persist_summary(&self, summary: SessionSummary) {
        let sink = Arc::clone(&self.sink);
        let result = tokio::task::spawn_blocking(move || sink.save_summary(&summary)).await;
        log_persistence("session summary", result);
    }
}

fn log_persistence(what: &str, result: Result<Result<(), StorageError>, JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Failed to persist {what}: {e}"),
        Err(e) => error!("Persistence task for {what} failed: {e}"),
    }
}
