pub mod models;
pub mod tracker;

pub use models::{SessionData, SessionEvent, SessionEventType, SessionStats};
pub use tracker::{SessionTracker, SESSIONS_KEY};
