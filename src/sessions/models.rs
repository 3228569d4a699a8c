//! Local interaction log shown in the session history viewer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventType {
    SessionStart,
    SessionEnd,
    PageView,
    FeatureUse,
    Interaction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: SessionEventType,
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub events: Vec<SessionEvent>,
}

impl SessionData {
    pub fn duration_ms(&self) -> u64 {
        (self.last_activity - self.start_time)
            .num_milliseconds()
            .max(0) as u64
    }

    pub fn count(&self, event_type: SessionEventType) -> usize {
        self.events
            .iter()
            .filter(|event| event.event_type == event_type)
            .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_sessions: usize,
    pub total_events: usize,
    pub page_views: usize,
    pub feature_uses: usize,
    pub interactions: usize,
    pub average_duration_ms: u64,
}

impl SessionStats {
    pub fn from_sessions(sessions: &[SessionData]) -> Self {
        if sessions.is_empty() {
            return Self::default();
        }
        let total_duration: u64 = sessions.iter().map(SessionData::duration_ms).sum();
        Self {
            total_sessions: sessions.len(),
            total_events: sessions.iter().map(|s| s.events.len()).sum(),
            page_views: sessions.iter().map(|s| s.count(SessionEventType::PageView)).sum(),
            feature_uses: sessions.iter().map(|s| s.count(SessionEventType::FeatureUse)).sum(),
            interactions: sessions.iter().map(|s| s.count(SessionEventType::Interaction)).sum(),
            average_duration_ms: total_duration / sessions.len() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_json_matches_stored_layout() {
        let event = SessionEvent {
            timestamp: DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
                .unwrap()
                .with_timezone(&Utc),
            event_type: SessionEventType::PageView,
            details: "Risk Dashboard".into(),
            route: Some("/dashboard".into()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "page_view");
        assert_eq!(json["route"], "/dashboard");

        let bare = SessionEvent { route: None, ..event };
        let json = serde_json::to_value(&bare).unwrap();
        assert!(json.get("route").is_none());
    }

    #[test]
    fn stats_of_nothing_are_zero() {
        assert_eq!(SessionStats::from_sessions(&[]), SessionStats::default());
    }
}
