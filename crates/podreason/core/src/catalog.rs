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

//! Catalog of built-in diagnosis modules
//!
//! Maps each module to the team that owns its failures and to a suggested
//! remediation, and maps phase spans back to the module responsible for them.

use podreason_common::SpanType;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModuleKind {
    Scheduler,
    Network,
    Volume,
    Admission,
    Sandbox,
    KubeletDelay,
    Image,
    ContainerCreate,
    ContainerStart,
    ContainerPostStart,
    ContainerReadiness,
    PodReadiness,
    ContainerKill,
    Finalizer,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 14] = [
        ModuleKind::Scheduler,
        ModuleKind::Network,
        ModuleKind::Volume,
        ModuleKind::Admission,
        ModuleKind::Sandbox,
        ModuleKind::KubeletDelay,
        ModuleKind::Image,
        ModuleKind::ContainerCreate,
        ModuleKind::ContainerStart,
        ModuleKind::ContainerPostStart,
        ModuleKind::ContainerReadiness,
        ModuleKind::PodReadiness,
        ModuleKind::ContainerKill,
        ModuleKind::Finalizer,
    ];

    /// Registry name of the module
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Scheduler => "scheduler",
            ModuleKind::Network => "network",
            ModuleKind::Volume => "volume",
            ModuleKind::Admission => "admission",
            ModuleKind::Sandbox => "sandbox",
            ModuleKind::KubeletDelay => "kubelet_delay",
            ModuleKind::Image => "image",
            ModuleKind::ContainerCreate => "container_create",
            ModuleKind::ContainerStart => "container_start",
            ModuleKind::ContainerPostStart => "container_post_start",
            ModuleKind::ContainerReadiness => "container_readiness",
            ModuleKind::PodReadiness => "pod_readiness",
            ModuleKind::ContainerKill => "container_kill",
            ModuleKind::Finalizer => "finalizer",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    pub fn default_owner(&self) -> &'static str {
        match self {
            ModuleKind::Scheduler => "scheduling",
            ModuleKind::Network => "network",
            ModuleKind::Volume => "storage",
            ModuleKind::Admission | ModuleKind::KubeletDelay => "node",
            ModuleKind::Image => "image-registry",
            ModuleKind::Sandbox | ModuleKind::ContainerCreate | ModuleKind::ContainerStart | ModuleKind::ContainerKill => "runtime",
            ModuleKind::ContainerPostStart | ModuleKind::ContainerReadiness | ModuleKind::PodReadiness | ModuleKind::Finalizer => "application",
        }
    }

    pub fn default_action(&self) -> &'static str {
        match self {
            ModuleKind::Scheduler => "1. Check that the application has enough resources; 2. Check affinity and pool configuration; 3. Ask the scheduling team to assist",
            ModuleKind::Network => "1. Check IP pool capacity on the node",
            ModuleKind::Volume => "1. Confirm the mounted volume is healthy; 2. Check the volume configuration; 3. Ask the volume owner to assist",
            ModuleKind::Admission => "1. Check node health and disk space; 2. Check device plugin availability",
            ModuleKind::Sandbox => "1. Contact the runtime owner",
            ModuleKind::KubeletDelay => "1. Check that the kubelet on the node is alive and watching pods",
            ModuleKind::Image => "1. Check the image reference and pull credentials; 2. Use image acceleration for slow pulls",
            ModuleKind::ContainerCreate => "1. Contact the runtime owner",
            ModuleKind::ContainerStart => "1. Application owners check non-zero exit codes; 2. Contact the runtime owner",
            ModuleKind::ContainerPostStart => "1. Application owners check why the postStart hook failed",
            ModuleKind::ContainerReadiness => "1. Application owners check why the readiness probe failed",
            ModuleKind::PodReadiness => "1. Application owners check the readiness gate configuration",
            ModuleKind::ContainerKill => "1. Check the preStop hook and termination grace period; 2. Contact the runtime owner",
            ModuleKind::Finalizer => "1. Check the controller responsible for the remaining finalizer",
        }
    }

    /// Module accountable for a phase span, where one exists
    pub fn for_span(span_type: SpanType) -> Option<Self> {
        match span_type {
            SpanType::DefaultSchedule => Some(ModuleKind::Scheduler),
            SpanType::KubeletDelay => Some(ModuleKind::KubeletDelay),
            SpanType::IpAllocate => Some(ModuleKind::Network),
            SpanType::VolumeMount | SpanType::VolumeAttach | SpanType::TotalVolumeMount => Some(ModuleKind::Volume),
            SpanType::SandboxCreate => Some(ModuleKind::Sandbox),
            SpanType::ImagePull => Some(ModuleKind::Image),
            SpanType::ContainerCreate => Some(ModuleKind::ContainerCreate),
            SpanType::ContainerStart => Some(ModuleKind::ContainerStart),
            SpanType::ContainerPostStart => Some(ModuleKind::ContainerPostStart),
            SpanType::ContainerReadiness => Some(ModuleKind::ContainerReadiness),
            SpanType::PodReadiness => Some(ModuleKind::PodReadiness),
            SpanType::ContainerKill => Some(ModuleKind::ContainerKill),
            SpanType::FinalizerDelete => Some(ModuleKind::Finalizer),
            SpanType::PodInitial | SpanType::PodRunning | SpanType::PodDelete | SpanType::Unknown => None,
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
