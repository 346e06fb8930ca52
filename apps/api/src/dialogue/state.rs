use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::candidate::CandidateProfile;
use crate::models::summary::{AnsweredQuestion, SessionOutcome, SessionSummary};
use crate::models::transcript::Message;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Intake,
    Questioning,
    Completed,
    Terminated,
}

impl From<SessionOutcome> for Phase {
    fn from(outcome: SessionOutcome) -> Self {
        match outcome {
            SessionOutcome::Completed => Phase::Completed,
            SessionOutcome::Terminated => Phase::Terminated,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Intake => "intake",
            Phase::Questioning => "questioning",
            Phase::Completed => "completed",
            Phase::Terminated => "terminated",
        };
        f.write_str(label)
    }
}

/// Everything one screening session knows. Owned by its `DialogueController` and mutated
/// only through it.
///
/// Invariant: `progress_index <= questions.len()`; `transcript` only grows.
#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    pub session_id: Uuid,
    pub profile: CandidateProfile,
    pub language: String,
    pub questions: Vec<String>,
    /// Index of the next unanswered question.
    pub progress_index: usize,
    pub transcript: Vec<Message>,
    pub answers: Vec<AnsweredQuestion>,
    /// Set once the session reaches a terminal state.
    pub outcome: Option<SessionOutcome>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn questions_remaining(&self) -> bool {
        self.progress_index < self.questions.len()
    }

    pub fn current_question(&self) -> Option<&str> {
        self.questions
            .get(self.progress_index)
            .map(String::as_str)
    }

    pub fn latest_user_message(&self) -> Option<&Message> {
        self.transcript
            .iter()
            .rev()
            .find(|m| m.role == crate::models::transcript::Role::User)
    }

    /// Summary record for the session log. `None` until the session has ended.
    pub fn summary(&self) -> Option<SessionSummary> {
        let outcome = self.outcome?;
        Some(SessionSummary {
            session_id: self.session_id,
            name: self.profile.name.clone(),
            email: self.profile.email.clone(),
            outcome,
            questions: self.questions.clone(),
            answers: self.answers.clone(),
            questions_answered: self.answers.len(),
            started_at: self.started_at,
            ended_at: self.ended_at.unwrap_or_else(Utc::now),
        })
    }
}
