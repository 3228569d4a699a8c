use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use crate::storage::PersistentStore;

use super::{SessionData, SessionEvent, SessionEventType, SessionStats};

/// Storage key holding the JSON array of every recorded session.
pub const SESSIONS_KEY: &str = "patent_evidence_sessions";

struct TrackerInner {
    store: Arc<dyn PersistentStore>,
    current: Mutex<Option<String>>,
    /// Held across every load-modify-save of the stored history.
    history: Mutex<()>,
}

/// Appends interaction events for the current session to the store.
///
/// Storage problems are logged and swallowed: the tracker is a demo
/// gimmick and must never get in the way of the dashboard.
#[derive(Clone)]
pub struct SessionTracker {
    inner: Arc<TrackerInner>,
}

impl SessionTracker {
    pub fn new(store: Arc<dyn PersistentStore>) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                store,
                current: Mutex::new(None),
                history: Mutex::new(()),
            }),
        }
    }

    fn current(&self) -> MutexGuard<'_, Option<String>> {
        match self.inner.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn history(&self) -> MutexGuard<'_, ()> {
        match self.inner.history.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn session_id(&self) -> Option<String> {
        self.current().clone()
    }

    /// Opens a new session and records its `session_start` event.
    pub fn start_session(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let session = SessionData {
            session_id: session_id.clone(),
            start_time: now,
            last_activity: now,
            events: vec![SessionEvent {
                timestamp: now,
                event_type: SessionEventType::SessionStart,
                details: "dashboard opened".into(),
                route: None,
            }],
        };

        {
            let _history = self.history();
            let mut sessions = self.load();
            sessions.push(session);
            self.persist(&sessions);
        }

        *self.current() = Some(session_id.clone());
        log::info!("session {session_id} started");
        session_id
    }

    /// Records `session_end` and detaches from the session.
    pub fn end_session(&self) {
        self.append(SessionEventType::SessionEnd, "dashboard closed", None);
        if let Some(session_id) = self.current().take() {
            log::info!("session {session_id} ended");
        }
    }

    /// Appends one event to the current session. Ignored when no session is open.
    pub fn append(&self, event_type: SessionEventType, details: &str, route: Option<String>) {
        let Some(session_id) = self.session_id() else {
            return;
        };
        let _history = self.history();
        let now = Utc::now();
        let mut sessions = self.load();

        let index = match sessions.iter().position(|s| s.session_id == session_id) {
            Some(index) => index,
            None => {
                // History was cleared mid-session; start a fresh record for it.
                sessions.push(SessionData {
                    session_id: session_id.clone(),
                    start_time: now,
                    last_activity: now,
                    events: Vec::new(),
                });
                sessions.len() - 1
            }
        };

        let session = &mut sessions[index];
        session.events.push(SessionEvent {
            timestamp: now,
            event_type,
            details: details.to_string(),
            route,
        });
        session.last_activity = now;
        self.persist(&sessions);
    }

    /// Every stored session, oldest first. Unreadable data reads as empty.
    pub fn load(&self) -> Vec<SessionData> {
        match self.try_load() {
            Ok(sessions) => sessions,
            Err(err) => {
                log::warn!("ignoring unreadable session history: {err:#}");
                Vec::new()
            }
        }
    }

    pub fn clear(&self) {
        let _history = self.history();
        if let Err(err) = self.inner.store.clear(SESSIONS_KEY) {
            log::warn!("could not clear session history: {err:#}");
        }
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats::from_sessions(&self.load())
    }

    fn try_load(&self) -> Result<Vec<SessionData>> {
        let Some(raw) = self.inner.store.load(SESSIONS_KEY)? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).context("session history is not valid JSON")
    }

    fn persist(&self, sessions: &[SessionData]) {
        let result = serde_json::to_string(sessions)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.inner.store.save(SESSIONS_KEY, &json));
        if let Err(err) = result {
            log::warn!("could not persist session history: {err:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{JsonFileStore, MemoryStore};

    fn tracker() -> (Arc<MemoryStore>, SessionTracker) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), SessionTracker::new(store))
    }

    #[test]
    fn events_append_in_order() {
        let (_store, tracker) = tracker();
        tracker.start_session();
        tracker.append(SessionEventType::PageView, "Patient Cards", Some("/patients".into()));
        tracker.append(SessionEventType::FeatureUse, "toggle_demo", None);
        tracker.end_session();

        let sessions = tracker.load();
        assert_eq!(sessions.len(), 1);
        let types: Vec<SessionEventType> =
            sessions[0].events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            types,
            vec![
                SessionEventType::SessionStart,
                SessionEventType::PageView,
                SessionEventType::FeatureUse,
                SessionEventType::SessionEnd
            ]
        );
        assert!(tracker.session_id().is_none());
    }

    #[test]
    fn sessions_accumulate_across_trackers() {
        let (store, first) = tracker();
        first.start_session();
        first.end_session();

        let second = SessionTracker::new(store);
        second.start_session();
        assert_eq!(second.load().len(), 2);
        assert_eq!(second.stats().total_sessions, 2);
    }

    #[test]
    fn cleared_history_reports_zero_stats() {
        let (_store, tracker) = tracker();
        tracker.start_session();
        tracker.append(SessionEventType::Interaction, "print_attempt", None);
        tracker.end_session();
        assert_eq!(tracker.stats().interactions, 1);

        tracker.clear();
        assert!(tracker.load().is_empty());
        assert_eq!(tracker.stats(), SessionStats::default());
    }

    #[test]
    fn corrupted_history_reads_as_empty() {
        let (store, tracker) = tracker();
        store.save(SESSIONS_KEY, "{not json").unwrap();
        assert!(tracker.load().is_empty());

        tracker.start_session();
        assert_eq!(tracker.load().len(), 1);
    }

    #[test]
    fn append_without_session_is_ignored() {
        let (store, tracker) = tracker();
        tracker.append(SessionEventType::PageView, "x", None);
        assert!(store.load(SESSIONS_KEY).unwrap().is_none());
    }

    #[test]
    fn appends_from_two_threads_are_all_kept() {
        let (_store, tracker) = tracker();
        tracker.start_session();

        let workers: Vec<_> = (0..2)
            .map(|_| {
                let tracker = tracker.clone();
                std::thread::spawn(move || {
                    for _ in 0..300 {
                        tracker.append(SessionEventType::PageView, "Risk Dashboard", None);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let sessions = tracker.load();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].events.len(), 601);
        assert_eq!(tracker.stats().page_views, 600);
    }

    #[test]
    fn file_backed_history_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileStore::new(dir.path()).unwrap());
        let tracker = SessionTracker::new(store);
        let id = tracker.start_session();
        tracker.end_session();

        let reopened = SessionTracker::new(Arc::new(JsonFileStore::new(dir.path()).unwrap()));
        let sessions = reopened.load();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session_id, id);
        assert_eq!(sessions[0].events.len(), 2);
    }
}
