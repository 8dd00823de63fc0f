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

//! Pod sandbox and network setup failures

use super::patterns::is_sandbox_network_failure;
use super::{newest_first, sandbox_ready};
use podreason_common::{AnalysisWindow, EventRecord, Finding, latest_pod};

const FAILED_CREATE_SANDBOX: &str = "FailedCreatePodSandBox";

fn classify_network(message: &str) -> Option<&'static str> {
    if message.contains("timeout to allocate ip for pod") {
        return Some("AllocateIPTimeout");
    }
    if message.contains("failed to setup network for sandbox") {
        if message.contains("Can not find host nic by mac address") || message.contains("no nic found") {
            return Some("NotFoundNicByMac");
        }
        if message.contains("fail to allocate ip") {
            return Some("FailedAllocateIP");
        }
        return Some("FailedSetNetwork");
    }
    if is_sandbox_network_failure(message) {
        if message.contains("exchange full") {
            return Some("BridgeExchangeFull");
        }
        return Some("FailedSetNetwork");
    }
    None
}

/// Newest sandbox failure caused by IP allocation or CNI setup
pub fn diagnose(events: &[EventRecord], window: &AnalysisWindow) -> Finding {
    if latest_pod(events, window).is_none() {
        return Finding::none();
    }

    for record in newest_first(events, window) {
        if sandbox_ready(record) {
            return Finding::none();
        }
        if record.has_reason(FAILED_CREATE_SANDBOX) {
            if let Some(label) = classify_network(&record.message) {
                return Finding::error(label);
            }
        }
    }
    Finding::none()
}

/// Newest sandbox creation failure of any cause
pub fn diagnose_sandbox(events: &[EventRecord], window: &AnalysisWindow) -> Finding {
    if latest_pod(events, window).is_none() {
        return Finding::none();
    }

    for record in newest_first(events, window) {
        if sandbox_ready(record) {
            return Finding::none();
        }
        if record.has_reason(FAILED_CREATE_SANDBOX) {
            if record.message.contains("context deadline exceeded") {
                return Finding::error("CreatePodSandBoxTimeout");
            }
            return Finding::error("FailedCreatePodSandBox");
        }
    }
    Finding::none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::{at, event, snapshot};
    use podreason_common::PodSnapshot;

    fn history(failure: &str) -> Vec<EventRecord> {
        vec![snapshot(0, PodSnapshot::default()), event(1, "Scheduled", "assigned"), event(2, FAILED_CREATE_SANDBOX, failure)]
    }

    #[test]
    fn test_network_labels() {
        let window = AnalysisWindow::unbounded();
        let cases = [
            ("timeout to allocate ip for pod web-0", "AllocateIPTimeout"),
            ("failed to setup network for sandbox: Can not find host nic by mac address", "NotFoundNicByMac"),
            ("failed to setup network for sandbox: fail to allocate ip", "FailedAllocateIP"),
            ("failed to setup network for sandbox: plugin error", "FailedSetNetwork"),
            (r#"failed to set up sandbox container "c1" network for pod "web-0": exchange full"#, "BridgeExchangeFull"),
            (r#"failed to set up sandbox container "c1" network for pod "web-0": cni failed"#, "FailedSetNetwork"),
        ];
        for (message, label) in cases {
            assert_eq!(diagnose(&history(message), &window), Finding::error(label), "{}", message);
        }
        assert_eq!(diagnose(&history("rpc error: context deadline exceeded"), &window), Finding::none());
    }

    #[test]
    fn test_sandbox_labels() {
        let window = AnalysisWindow::unbounded();
        assert_eq!(diagnose_sandbox(&history("rpc error: context deadline exceeded"), &window), Finding::error("CreatePodSandBoxTimeout"));
        assert_eq!(diagnose_sandbox(&history("runtime not ready"), &window), Finding::error("FailedCreatePodSandBox"));
    }

    #[test]
    fn test_later_success_clears_failure() {
        let mut events = history("timeout to allocate ip for pod web-0");
        events.push(event(3, "SuccessfulCreatePodSandBox", "ok"));
        let window = AnalysisWindow::unbounded();
        assert_eq!(diagnose(&events, &window), Finding::none());
        assert_eq!(diagnose_sandbox(&events, &window), Finding::none());

        // the success is outside the window, so the failure stands
        assert_eq!(diagnose(&events, &AnalysisWindow::new(None, Some(at(2)))), Finding::error("AllocateIPTimeout"));
    }
}
