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

//! Volume mount failures

use super::patterns::bracketed;
use super::{newest_first, sandbox_ready};
use podreason_common::{AnalysisWindow, EventRecord, Finding, latest_pod};
use std::collections::HashSet;

const MOUNT_VOLUME: &str = "MountVolume";

fn classify_mount_failure(message: &str) -> &'static str {
    if message.contains("hostPath type check failed") {
        "InvalidMountConfig"
    } else if message.contains("no relationship found between node") {
        "AccessError"
    } else if message.contains("requested NFS version or transport protocol is not supported") {
        "NFSError"
    } else if message.contains("no space left on device") {
        "NoSpaceLeftOnDevice"
    } else {
        "FailedMount"
    }
}

/// Newest mount failure for a volume that was not mounted successfully afterwards
pub fn diagnose(events: &[EventRecord], window: &AnalysisWindow) -> Finding {
    if latest_pod(events, window).is_none() {
        return Finding::none();
    }

    let mut mounted: HashSet<&str> = HashSet::new();
    for record in newest_first(events, window) {
        if sandbox_ready(record) || record.has_reason("SuccessfulAttachOrMountVolume") {
            return Finding::none();
        }
        if !record.has_reason(MOUNT_VOLUME) {
            continue;
        }

        let volume = bracketed(&record.message).unwrap_or_default();
        if record.message.contains("Successfully mounted") {
            mounted.insert(volume);
        } else if record.message.contains("Failed mounted") && !mounted.contains(volume) {
            return Finding::error(classify_mount_failure(&record.message));
        }
    }
    Finding::none()
}
