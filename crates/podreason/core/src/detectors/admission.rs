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

//! Kubelet admission rejections and node-condition evictions

use super::patterns::node_condition;
use super::{oldest_first, sandbox_ready};
use podreason_common::{AnalysisWindow, EventRecord, Finding, PodSnapshot, latest_pod};

fn classify_admission(message: &str) -> Option<&'static str> {
    if message.contains("read-only file system, which is unexpected") {
        Some("FileSystemReadOnly")
    } else if message.contains("devices unavailable for nvidia.com") {
        Some("DeviceUnavailable")
    } else if message.contains("no space left on device") {
        Some("NoDiskSpace")
    } else {
        None
    }
}

fn eviction(message: &str) -> Option<Finding> {
    if !message.contains("The node had condition") {
        return None;
    }
    node_condition(message).map(|condition| Finding::error(format!("{}Evicted", condition)))
}

fn pod_eviction(pod: &PodSnapshot) -> Option<Finding> {
    if pod.status.reason == "Evicted" { eviction(&pod.status.message) } else { None }
}

pub fn diagnose(events: &[EventRecord], window: &AnalysisWindow) -> Finding {
    let Some(pod) = latest_pod(events, window) else {
        return Finding::none();
    };

    for record in oldest_first(events, window) {
        if sandbox_ready(record) {
            return Finding::none();
        }

        if record.has_reason("UnexpectedAdmissionError") {
            if let Some(label) = classify_admission(&record.message) {
                return Finding::error(label);
            }
        }
        if record.has_reason("Evicted") {
            if let Some(finding) = eviction(&record.message) {
                return finding;
            }
        }
        if let Some(finding) = pod_eviction(pod) {
            return finding;
        }
    }
    Finding::none()
}
