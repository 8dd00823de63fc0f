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

//! Built-in diagnosis functions
//!
//! Each detector is a pure function over the event history. All of them
//! ignore records stamped after the window end and report no finding when
//! no pod snapshot is visible.

pub mod admission;
pub mod container;
pub mod image;
pub mod kubelet;
pub mod network;
pub mod patterns;
pub mod pod;
pub mod scheduler;
pub mod volume;

use crate::catalog::ModuleKind;
use crate::registry::ModuleRegistryBuilder;
use podreason_common::{AnalysisWindow, EventRecord};

/// Registers every built-in detector under its catalog name
pub fn register_builtin(builder: ModuleRegistryBuilder) -> ModuleRegistryBuilder {
    builder
        .register(ModuleKind::Scheduler.as_str(), scheduler::diagnose)
        .register(ModuleKind::Network.as_str(), network::diagnose)
        .register(ModuleKind::Volume.as_str(), volume::diagnose)
        .register(ModuleKind::Admission.as_str(), admission::diagnose)
        .register(ModuleKind::Sandbox.as_str(), network::diagnose_sandbox)
        .register(ModuleKind::KubeletDelay.as_str(), kubelet::diagnose)
        .register(ModuleKind::Image.as_str(), image::diagnose)
        .register(ModuleKind::ContainerCreate.as_str(), container::diagnose_create)
        .register(ModuleKind::ContainerStart.as_str(), container::diagnose_start)
        .register(ModuleKind::ContainerPostStart.as_str(), container::diagnose_post_start)
        .register(ModuleKind::ContainerReadiness.as_str(), container::diagnose_readiness)
        .register(ModuleKind::PodReadiness.as_str(), pod::diagnose_readiness)
        .register(ModuleKind::ContainerKill.as_str(), container::diagnose_kill)
        .register(ModuleKind::Finalizer.as_str(), pod::diagnose_finalizer)
}

/// Records visible inside the window, newest first
pub(crate) fn newest_first<'a>(events: &'a [EventRecord], window: &'a AnalysisWindow) -> impl Iterator<Item = &'a EventRecord> + 'a {
    events.iter().rev().filter(move |record| window.admits(record.stage_timestamp))
}

/// Records visible inside the window, oldest first
pub(crate) fn oldest_first<'a>(events: &'a [EventRecord], window: &'a AnalysisWindow) -> impl Iterator<Item = &'a EventRecord> + 'a {
    events.iter().filter(move |record| window.admits(record.stage_timestamp))
}

/// The sandbox exists once it was reported created or image operations began
pub(crate) fn sandbox_ready(record: &EventRecord) -> bool {
    matches!(record.reason.as_str(), "SuccessfulCreatePodSandBox" | "Pulling" | "Pulled")
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};
    use podreason_common::{EventRecord, PodSnapshot};

    pub fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap() + chrono::Duration::seconds(secs)
    }

    pub fn snapshot(secs: i64, pod: PodSnapshot) -> EventRecord {
        EventRecord::operation(at(secs), "patch", pod)
    }

    pub fn event(secs: i64, reason: &str, message: &str) -> EventRecord {
        EventRecord::event(at(secs), reason, message)
    }
}
