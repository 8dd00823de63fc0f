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

//! Per-container lifecycle stages: create, start, postStart hook, readiness and kill

use super::newest_first;
use super::patterns::{created_or_started_container, stopped_container};
use podreason_common::{AnalysisWindow, ContainerSpec, ContainerStatus, EventRecord, Finding, PodSnapshot, latest_pod};

const CREATE_CONTAINER_ERROR: &str = "CreateContainerError";

/// Containers in spec order paired with their reported status
fn containers_with_status(pod: &PodSnapshot) -> impl Iterator<Item = (&ContainerSpec, Option<&ContainerStatus>)> {
    let init = pod.spec.init_containers.iter().map(move |c| (c, pod.status.init_container_statuses.iter().find(|cs| cs.name == c.name)));
    let regular = pod.spec.containers.iter().map(move |c| (c, pod.container_status(&c.name)));
    init.chain(regular)
}

/// Started during the window being analyzed
fn started_in_window(status: Option<&ContainerStatus>, window: &AnalysisWindow) -> bool {
    let Some(status) = status else {
        return false;
    };
    status.started == Some(true) && status.state.running_started_at.is_some_and(|started_at| window.started_before(started_at))
}

fn waiting_reason_contains(status: Option<&ContainerStatus>, needle: &str) -> bool {
    status.and_then(|cs| cs.state.waiting_reason.as_deref()).is_some_and(|reason| reason.contains(needle))
}

fn create_failure(container: &ContainerSpec, events: &[EventRecord], window: &AnalysisWindow) -> Option<Finding> {
    for record in newest_first(events, window) {
        if record.has_reason("Created") && created_or_started_container(&record.message) == Some(container.name.as_str()) {
            return None;
        }
        if record.has_reason("Failed") && record.message.contains("failed to create container") && !record.message.contains("start container") {
            return Some(Finding::error(CREATE_CONTAINER_ERROR));
        }
        let requested_status = record.request_object.as_ref().and_then(|pod| pod.container_status(&container.name));
        if waiting_reason_contains(requested_status, CREATE_CONTAINER_ERROR) {
            return Some(Finding::error(CREATE_CONTAINER_ERROR));
        }
    }
    None
}

pub fn diagnose_create(events: &[EventRecord], window: &AnalysisWindow) -> Finding {
    let Some(pod) = latest_pod(events, window) else {
        return Finding::none();
    };
    pod.all_containers().find_map(|container| create_failure(container, events, window)).unwrap_or_default()
}

fn start_failure(container: &ContainerSpec, status: Option<&ContainerStatus>, events: &[EventRecord], window: &AnalysisWindow) -> Option<Finding> {
    if waiting_reason_contains(status, "CrashLoopBackOff") {
        return Some(Finding::error("CrashLoopBackOff"));
    }
    if started_in_window(status, window) {
        return None;
    }

    for record in newest_first(events, window) {
        if record.has_reason("Started") && created_or_started_container(&record.message) == Some(container.name.as_str()) {
            return None;
        }
        if record.has_reason("BackOff") && (record.message.contains("Back-off restarting") || record.message.contains("Back-off failed container")) {
            return Some(Finding::error("CrashLoopBackOff"));
        }
        if record.reason.eq_ignore_ascii_case("Failed")
            && record.message.contains(&container.name)
            && (record.message.contains("failed to start container") || record.message.contains("Error"))
        {
            return Some(Finding::error("RunContainerError"));
        }
    }

    let terminated_with_error = status.and_then(|cs| cs.state.terminated_reason.as_deref()).is_some_and(|reason| reason.contains("Error"));
    terminated_with_error.then(|| Finding::error("RunContainerError"))
}

pub fn diagnose_start(events: &[EventRecord], window: &AnalysisWindow) -> Finding {
    let Some(pod) = latest_pod(events, window) else {
        return Finding::none();
    };
    containers_with_status(pod)
        .filter(|(_, status)| !status.is_some_and(|cs| cs.ready))
        .find_map(|(container, status)| start_failure(container, status, events, window))
        .unwrap_or_default()
}

fn post_start_failure(container: &ContainerSpec, status: Option<&ContainerStatus>, events: &[EventRecord], window: &AnalysisWindow) -> Option<Finding> {
    if !container.has_post_start_hook {
        return None;
    }
    if waiting_reason_contains(status, "PostStartHookError") {
        return Some(Finding::info("FailedPostStartHook"));
    }
    if started_in_window(status, window) {
        return None;
    }

    for record in newest_first(events, window) {
        if !record.message.contains(&container.name) {
            continue;
        }
        match record.reason.as_str() {
            "WithOutPostStartHook" | "SucceedPostStartHook" => return None,
            "FailedPostStartHook" => return Some(Finding::info("FailedPostStartHook")),
            _ => {}
        }
    }
    None
}

/// Hook failures are reported as informational; the container usually restarts past them
pub fn diagnose_post_start(events: &[EventRecord], window: &AnalysisWindow) -> Finding {
    let Some(pod) = latest_pod(events, window) else {
        return Finding::none();
    };
    containers_with_status(pod)
        .filter(|(_, status)| !status.is_some_and(|cs| cs.ready))
        .find_map(|(container, status)| post_start_failure(container, status, events, window))
        .unwrap_or_default()
}

fn containers_not_ready(pod: &PodSnapshot, window: &AnalysisWindow) -> bool {
    if pod.status.init_container_statuses.iter().chain(pod.status.container_statuses.iter()).any(|cs| !cs.ready) {
        return true;
    }
    pod.status.conditions.iter().filter(|c| c.condition_type == "ContainersReady").any(|condition| {
        if condition.is_false() {
            return true;
        }
        matches!((window.begin, condition.last_transition_time), (Some(begin), Some(changed)) if changed < begin)
    })
}

pub fn diagnose_readiness(events: &[EventRecord], window: &AnalysisWindow) -> Finding {
    let Some(pod) = latest_pod(events, window) else {
        return Finding::none();
    };
    if !containers_not_ready(pod, window) {
        return Finding::none();
    }

    let probe_failed = newest_first(events, window).any(|record| {
        let message = record.message.to_lowercase();
        record.has_reason("Unhealthy") && (message.contains("readiness probe failed") || message.contains("readiness probe errored"))
    });

    if probe_failed { Finding::error("ContainerReadinessFailed") } else { Finding::info("ContainerNotReady") }
}

fn kill_failure(container: &ContainerSpec, events: &[EventRecord], window: &AnalysisWindow) -> Option<Finding> {
    for record in newest_first(events, window) {
        if record.has_reason("SucceedKillingContainer") && stopped_container(&record.message) == Some(container.name.as_str()) {
            return None;
        }
        if record.has_reason("FailedKillPod") {
            return Some(Finding::error("KillPodFailed"));
        }
    }
    None
}

pub fn diagnose_kill(events: &[EventRecord], window: &AnalysisWindow) -> Finding {
    let Some(pod) = latest_pod(events, window) else {
        return Finding::none();
    };
    pod.spec.containers.iter().find_map(|container| kill_failure(container, events, window)).unwrap_or_default()
}
