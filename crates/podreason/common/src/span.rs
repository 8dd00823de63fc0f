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

//! Lifecycle phase spans
//!
//! A span measures one phase of a pod delivery (scheduling, image pull,
//! container start, ...). Spans are produced upstream in a stable order and
//! are only ever normalized by the timeline analyzer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Closed set of known phase types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpanType {
    #[serde(rename = "default_schedule_span")]
    DefaultSchedule,
    #[serde(rename = "kubelet_delay_span")]
    KubeletDelay,
    #[serde(rename = "ip_allocate_span")]
    IpAllocate,
    #[serde(rename = "volume_mount_span")]
    VolumeMount,
    #[serde(rename = "volume_attach_span")]
    VolumeAttach,
    #[serde(rename = "total_volume_mount_span")]
    TotalVolumeMount,
    #[serde(rename = "sandbox_create_span")]
    SandboxCreate,
    #[serde(rename = "image_pull_span")]
    ImagePull,
    #[serde(rename = "container_create_span")]
    ContainerCreate,
    #[serde(rename = "container_start_span")]
    ContainerStart,
    #[serde(rename = "container_poststart_span")]
    ContainerPostStart,
    #[serde(rename = "pod_init_span")]
    PodInitial,
    #[serde(rename = "container_readiness_span")]
    ContainerReadiness,
    #[serde(rename = "pod_readiness_span")]
    PodReadiness,
    #[serde(rename = "pod_running_span")]
    PodRunning,
    #[serde(rename = "pod_delete_span")]
    PodDelete,
    #[serde(rename = "finalizer_delete_span")]
    FinalizerDelete,
    #[serde(rename = "container_kill_span")]
    ContainerKill,
    /// Any type string the producer emits that this build does not know
    #[serde(rename = "unknown_span", other)]
    Unknown,
}

impl SpanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanType::DefaultSchedule => "default_schedule_span",
            SpanType::KubeletDelay => "kubelet_delay_span",
            SpanType::IpAllocate => "ip_allocate_span",
            SpanType::VolumeMount => "volume_mount_span",
            SpanType::VolumeAttach => "volume_attach_span",
            SpanType::TotalVolumeMount => "total_volume_mount_span",
            SpanType::SandboxCreate => "sandbox_create_span",
            SpanType::ImagePull => "image_pull_span",
            SpanType::ContainerCreate => "container_create_span",
            SpanType::ContainerStart => "container_start_span",
            SpanType::ContainerPostStart => "container_poststart_span",
            SpanType::PodInitial => "pod_init_span",
            SpanType::ContainerReadiness => "container_readiness_span",
            SpanType::PodReadiness => "pod_readiness_span",
            SpanType::PodRunning => "pod_running_span",
            SpanType::PodDelete => "pod_delete_span",
            SpanType::FinalizerDelete => "finalizer_delete_span",
            SpanType::ContainerKill => "container_kill_span",
            SpanType::Unknown => "unknown_span",
        }
    }

    /// Label reported when a span of this type dominates the timeline
    pub fn bottleneck_label(&self) -> Option<&'static str> {
        match self {
            SpanType::DefaultSchedule => Some("DefaultScheduleTooMuchTime"),
            SpanType::KubeletDelay => Some("KubeletDelayTooMuchTime"),
            SpanType::IpAllocate => Some("IpAllocateTooMuchTime"),
            SpanType::VolumeMount => Some("VolumeMountTooMuchTime"),
            SpanType::VolumeAttach => Some("VolumeAttachTooMuchTime"),
            SpanType::SandboxCreate => Some("SandboxCreateTooMuchTime"),
            SpanType::ImagePull => Some("ImagePullTooMuchTime"),
            SpanType::ContainerCreate => Some("ContainerCreateTooMuchTime"),
            SpanType::ContainerStart => Some("ContainerStartTooMuchTime"),
            SpanType::ContainerPostStart => Some("PostStartHookTooMuchTime"),
            SpanType::PodInitial => Some("PodInitialTooMuchTime"),
            SpanType::ContainerReadiness => Some("ContainerReadyTooMuchTime"),
            SpanType::PodReadiness => Some("PodReadyTooMuchTime"),
            SpanType::TotalVolumeMount
            | SpanType::PodRunning
            | SpanType::PodDelete
            | SpanType::FinalizerDelete
            | SpanType::ContainerKill
            | SpanType::Unknown => None,
        }
    }

    pub fn is_volume(&self) -> bool {
        matches!(self, SpanType::VolumeMount | SpanType::VolumeAttach | SpanType::TotalVolumeMount)
    }

    pub fn is_ip_allocation(&self) -> bool {
        matches!(self, SpanType::IpAllocate)
    }

    pub fn is_sandbox(&self) -> bool {
        matches!(self, SpanType::SandboxCreate)
    }
}

impl fmt::Display for SpanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is accountable for a span's phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpanOwner {
    #[serde(rename = "k8s")]
    PlatformOwned,
    #[serde(rename = "custom")]
    CustomOwned,
    #[default]
    #[serde(rename = "others", alias = "")]
    Other,
}

impl SpanOwner {
    /// Only platform and custom spans compete for the bottleneck
    pub fn is_candidate(&self) -> bool {
        matches!(self, SpanOwner::PlatformOwned | SpanOwner::CustomOwned)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub name: String,
    #[serde(rename = "type")]
    pub span_type: SpanType,
    #[serde(default)]
    pub owner: SpanOwner,
    #[serde(default)]
    pub begin: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default, rename = "elapsed_ms", with = "elapsed_ms")]
    pub elapsed: Duration,
}

impl Span {
    pub fn new(name: impl Into<String>, span_type: SpanType, owner: SpanOwner) -> Self {
        Self {
            name: name.into(),
            span_type,
            owner,
            begin: None,
            end: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Sets both bounds and derives the elapsed time from them
    pub fn with_bounds(mut self, begin: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        self.begin = Some(begin);
        self.end = end;
        self.recompute_elapsed();
        self
    }

    /// Stores `elapsed`, clamping negative durations to zero
    pub fn set_elapsed(&mut self, elapsed: chrono::Duration) {
        self.elapsed = elapsed.to_std().unwrap_or(Duration::ZERO);
    }

    /// Recomputes `elapsed = end - begin` when both bounds are set
    pub fn recompute_elapsed(&mut self) {
        if let (Some(begin), Some(end)) = (self.begin, self.end) {
            self.set_elapsed(end - begin);
        }
    }
}

mod elapsed_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        // Producers occasionally emit negative values for spans whose end precedes begin
        let millis = i64::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_set_elapsed_clamps_negative() {
        let mut span = Span::new("pull", SpanType::ImagePull, SpanOwner::PlatformOwned);
        span.set_elapsed(chrono::Duration::milliseconds(-250));
        assert_eq!(span.elapsed, Duration::ZERO);

        span.set_elapsed(chrono::Duration::milliseconds(1500));
        assert_eq!(span.elapsed, Duration::from_millis(1500));
    }

    #[test]
    fn test_with_bounds_derives_elapsed() {
        let begin = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let span = Span::new("sched", SpanType::DefaultSchedule, SpanOwner::PlatformOwned).with_bounds(begin, Some(begin + chrono::Duration::seconds(3)));
        assert_eq!(span.elapsed, Duration::from_secs(3));

        let open = Span::new("sched", SpanType::DefaultSchedule, SpanOwner::PlatformOwned).with_bounds(begin, None);
        assert_eq!(open.elapsed, Duration::ZERO);
        assert!(open.end.is_none());
    }

    #[test]
    fn test_bottleneck_table() {
        assert_eq!(SpanType::ImagePull.bottleneck_label(), Some("ImagePullTooMuchTime"));
        assert_eq!(SpanType::ContainerPostStart.bottleneck_label(), Some("PostStartHookTooMuchTime"));
        assert_eq!(SpanType::TotalVolumeMount.bottleneck_label(), None);
        assert_eq!(SpanType::PodDelete.bottleneck_label(), None);
        assert!(SpanType::TotalVolumeMount.is_volume());
        assert!(!SpanType::SandboxCreate.is_volume());
    }

    #[test]
    fn test_span_deserialization() {
        let raw = r#"[
            { "name": "a", "type": "image_pull_span", "owner": "k8s", "elapsed_ms": 1200 },
            { "name": "b", "type": "some_future_span", "owner": "custom", "elapsed_ms": -5 },
            { "name": "c", "type": "pod_running_span" }
        ]"#;

        let spans: Vec<Span> = serde_json::from_str(raw).unwrap();
        assert_eq!(spans[0].span_type, SpanType::ImagePull);
        assert_eq!(spans[0].owner, SpanOwner::PlatformOwned);
        assert_eq!(spans[0].elapsed, Duration::from_millis(1200));
        assert_eq!(spans[1].span_type, SpanType::Unknown);
        assert_eq!(spans[1].elapsed, Duration::ZERO);
        assert_eq!(spans[2].owner, SpanOwner::Other);
        assert!(!spans[2].owner.is_candidate());
    }
}
