use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a session reached its terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    /// Every question answered, then finished.
    Completed,
    /// Exit keyword or finished with questions still open.
    Terminated,
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionOutcome::Completed => f.write_str("completed"),
            SessionOutcome::Terminated => f.write_str("terminated"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnsweredQuestion {
    pub question: String,
    pub answer: String,
}

/// Record appended to the session log when a session ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub name: String,
    pub email: String,
    pub outcome: SessionOutcome,
    pub questions: Vec<String>,
    pub answers: Vec<AnsweredQuestion>,
    pub questions_answered: usize,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}
