use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::dialogue::DialogueController;

/// One live session. The mutex keeps a session to a single in-flight request.
pub type SessionHandle = Arc<Mutex<DialogueController>>;

/// Live sessions keyed by session id. Nothing here outlives the process.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl SessionRegistry {
    pub async fn insert(&self, session_id: Uuid, controller: DialogueController) -> SessionHandle {
        let handle = Arc::new(Mutex::new(controller));
        self.sessions
            .write()
            .await
            .insert(session_id, Arc::clone(&handle));
        handle
    }

    pub async fn get(&self, session_id: Uuid) -> Option<SessionHandle> {
        self.sessions.read().await.get(&session_id).cloned()
    }

    /// Drops the session; returns false if it was not registered.
    pub async fn remove(&self, session_id: Uuid) -> bool {
        self.sessions.write().await.remove(&session_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
