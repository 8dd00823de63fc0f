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

//! Kubelet never picked up the pod

use super::newest_first;
use podreason_common::{AnalysisWindow, EventRecord, Finding, latest_pod};

fn is_kubelet_agent(user_agent: &str) -> bool {
    let agent = user_agent.to_lowercase();
    agent.contains("kubelet") && agent.contains("kubernetes")
}

/// `KubeletDelay` unless some in-window record was written by a kubelet
pub fn diagnose(events: &[EventRecord], window: &AnalysisWindow) -> Finding {
    if latest_pod(events, window).is_none() {
        return Finding::none();
    }

    if newest_first(events, window).any(|record| is_kubelet_agent(&record.user_agent)) {
        Finding::none()
    } else {
        Finding::error("KubeletDelay")
    }
}
