// Screening dialogue: session state, the controller state machine, the in-memory
// registry of live sessions, and the HTTP handlers that drive them.

pub mod controller;
pub mod handlers;
pub mod registry;
pub mod state;

pub use controller::{DialogueController, DialogueError, TurnOutcome};
pub use registry::SessionRegistry;
pub use state::Phase;
