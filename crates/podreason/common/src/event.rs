// Podreason
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Audit operations and cluster events, merged into one time-ordered record stream

use crate::pod::PodSnapshot;
use crate::window::AnalysisWindow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Origin of a record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// API server audit entry for a write or read against the pod
    #[default]
    Operation,
    /// Cluster event whose involved object is the pod
    Event,
}

/// One entry of the pod's audit/event history
///
/// Records are immutable once ingested and shared read-only between all
/// diagnosis modules of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRecord {
    pub stage_timestamp: DateTime<Utc>,
    pub kind: RecordKind,
    pub verb: String,
    /// Event reason, empty for plain operations
    pub reason: String,
    /// Event message, empty for plain operations
    pub message: String,
    pub user_agent: String,
    pub response_code: u16,
    pub request_object: Option<PodSnapshot>,
    pub response_object: Option<PodSnapshot>,
}

impl EventRecord {
    /// Creates an event-kind record with the given reason and message
    pub fn event(stage_timestamp: DateTime<Utc>, reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage_timestamp,
            kind: RecordKind::Event,
            reason: reason.into(),
            message: message.into(),
            ..Default::default()
        }
    }

    /// Creates an operation-kind record whose response carries a pod snapshot
    pub fn operation(stage_timestamp: DateTime<Utc>, verb: impl Into<String>, pod: PodSnapshot) -> Self {
        Self {
            stage_timestamp,
            kind: RecordKind::Operation,
            verb: verb.into(),
            response_code: 200,
            response_object: Some(pod),
            ..Default::default()
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_request_object(mut self, pod: PodSnapshot) -> Self {
        self.request_object = Some(pod);
        self
    }

    pub fn has_reason(&self, reason: &str) -> bool {
        self.reason == reason
    }
}

/// Latest pod snapshot visible inside `window`
///
/// Walks the history backwards, skipping records stamped after the window
/// end, and returns the first response object found.
pub fn latest_pod<'a>(events: &'a [EventRecord], window: &AnalysisWindow) -> Option<&'a PodSnapshot> {
    events
        .iter()
        .rev()
        .filter(|record| window.admits(record.stage_timestamp))
        .find_map(|record| record.response_object.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, secs).unwrap()
    }

    fn pod(name: &str) -> PodSnapshot {
        PodSnapshot { name: name.to_string(), ..Default::default() }
    }

    #[test]
    fn test_latest_pod_skips_records_after_window_end() {
        let events = vec![
            EventRecord::operation(ts(1), "create", pod("first")),
            EventRecord::event(ts(2), "Scheduled", "assigned"),
            EventRecord::operation(ts(3), "patch", pod("second")),
            EventRecord::operation(ts(9), "patch", pod("late")),
        ];

        let window = AnalysisWindow::new(None, Some(ts(5)));
        assert_eq!(latest_pod(&events, &window).map(|p| p.name.as_str()), Some("second"));
        assert_eq!(latest_pod(&events, &AnalysisWindow::unbounded()).map(|p| p.name.as_str()), Some("late"));
    }

    #[test]
    fn test_latest_pod_none_without_snapshots() {
        let events = vec![EventRecord::event(ts(1), "Pulling", "Pulling image \"nginx\"")];
        assert!(latest_pod(&events, &AnalysisWindow::unbounded()).is_none());
        assert!(latest_pod(&[], &AnalysisWindow::unbounded()).is_none());
    }

    #[test]
    fn test_record_deserializes_with_defaults() {
        let raw = r#"{ "stage_timestamp": "2024-05-01T10:00:00Z", "kind": "event", "reason": "Pulled" }"#;
        let record: EventRecord = serde_json::from_str(raw).unwrap();

        assert_eq!(record.kind, RecordKind::Event);
        assert!(record.has_reason("Pulled"));
        assert!(record.response_object.is_none());
        assert_eq!(record.response_code, 0);
    }
}
