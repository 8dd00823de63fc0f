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

//! Observation window bounding an analysis run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Optional begin/end bounds; records stamped after `end` are invisible to every module
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub begin: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl AnalysisWindow {
    pub fn new(begin: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { begin, end }
    }

    /// Unbounded window
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Whether a record stamped at `timestamp` is visible
    pub fn admits(&self, timestamp: DateTime<Utc>) -> bool {
        match self.end {
            Some(end) => timestamp <= end,
            None => true,
        }
    }

    /// Whether `timestamp` lies strictly after the window begin
    ///
    /// An unset begin admits everything.
    pub fn started_before(&self, timestamp: DateTime<Utc>) -> bool {
        match self.begin {
            Some(begin) => timestamp > begin,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_admits_respects_end_inclusive() {
        let end = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let window = AnalysisWindow::new(None, Some(end));

        assert!(window.admits(end));
        assert!(window.admits(end - chrono::Duration::seconds(1)));
        assert!(!window.admits(end + chrono::Duration::seconds(1)));
        assert!(AnalysisWindow::unbounded().admits(end + chrono::Duration::days(365)));
    }
}
