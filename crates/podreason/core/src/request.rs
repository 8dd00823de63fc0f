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

//! Input of a single diagnosis run

use chrono::{DateTime, Utc};
use podreason_common::{AnalysisWindow, EventRecord, Span};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisRequest {
    pub pod_name: String,
    pub pod_uid: String,
    /// History in ascending stage-timestamp order
    pub events: Vec<EventRecord>,
    /// Phase spans in producer order; only create and upgrade runs use them
    pub spans: Vec<Span>,
    pub window_begin: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
}

impl AnalysisRequest {
    pub fn new(pod_name: impl Into<String>, pod_uid: impl Into<String>) -> Self {
        Self {
            pod_name: pod_name.into(),
            pod_uid: pod_uid.into(),
            ..Default::default()
        }
    }

    pub fn with_events(mut self, events: Vec<EventRecord>) -> Self {
        self.events = events;
        self
    }

    pub fn with_spans(mut self, spans: Vec<Span>) -> Self {
        self.spans = spans;
        self
    }

    pub fn with_window(mut self, begin: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.window_begin = begin;
        self.window_end = end;
        self
    }

    pub fn window(&self) -> AnalysisWindow {
        AnalysisWindow::new(self.window_begin, self.window_end)
    }
}
