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

//! Scheduling failures

use super::patterns::{first_upper, quota_resource};
use podreason_common::{AnalysisWindow, EventRecord, Finding, PodSnapshot, latest_pod};

pub const DEFAULT_SCHEDULER: &str = "default-scheduler";

const POD_SCHEDULED: &str = "PodScheduled";
const UNSCHEDULABLE: &str = "Unschedulable";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScheduleStatus {
    Scheduled,
    Failed,
    Unprocessed,
}

fn schedule_status(pod: &PodSnapshot) -> ScheduleStatus {
    if !pod.spec.node_name.is_empty() {
        return ScheduleStatus::Scheduled;
    }
    for condition in pod.status.conditions.iter().filter(|c| c.condition_type == POD_SCHEDULED) {
        if condition.is_true() {
            return ScheduleStatus::Scheduled;
        }
        if condition.is_false() && condition.reason == UNSCHEDULABLE {
            return ScheduleStatus::Failed;
        }
    }
    ScheduleStatus::Unprocessed
}

pub fn diagnose(events: &[EventRecord], window: &AnalysisWindow) -> Finding {
    let Some(pod) = latest_pod(events, window) else {
        return Finding::none();
    };

    if schedule_status(pod) == ScheduleStatus::Scheduled || pod.spec.scheduler_name != DEFAULT_SCHEDULER {
        return Finding::none();
    }

    let Some(condition) = pod.status.conditions.iter().find(|c| c.condition_type == POD_SCHEDULED && c.is_false()) else {
        return Finding::error("ScheduleDelay");
    };

    if condition.message.contains("quota not enough") {
        return match quota_resource(&condition.message) {
            Some(resource) => Finding::error(format!("{}QuotaNotEnough", first_upper(resource))),
            None => Finding::error("QuotaNotEnough"),
        };
    }
    if condition.message.contains("error getting PVC") {
        return Finding::error("FailedSchedulingFindPVC");
    }
    Finding::error("FailedScheduling")
}
