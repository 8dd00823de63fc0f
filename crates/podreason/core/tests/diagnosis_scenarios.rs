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

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use podreason_common::{
    AnalysisWindow, ContainerSpec, ContainerStatus, DeliveryType, EventRecord, Finding, PodCondition, PodSnapshot, PodSpec, PodStatus, Span, SpanOwner, SpanType,
};
use podreason_core::{AnalysisRequest, AnalyzerFactory, DagAnalyzer, DiagnosisConfig, GraphBuilder, ModuleRegistry};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const KUBELET: &str = "kubelet/v1.28.3 (linux/amd64) kubernetes/a8a1abc";

fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap() + ChronoDuration::seconds(secs)
}

fn factory() -> AnalyzerFactory {
    AnalyzerFactory::with_defaults(Arc::new(ModuleRegistry::builtin()), Arc::new(DiagnosisConfig::default()))
}

fn condition(condition_type: &str, status: &str, reason: &str, message: &str) -> PodCondition {
    PodCondition {
        condition_type: condition_type.into(),
        status: status.into(),
        reason: reason.into(),
        message: message.into(),
        last_transition_time: Some(at(20)),
    }
}

fn running_pod() -> PodSnapshot {
    PodSnapshot {
        name: "web-0".into(),
        namespace: "default".into(),
        uid: "uid-web-0".into(),
        spec: PodSpec {
            scheduler_name: "default-scheduler".into(),
            node_name: "node-a".into(),
            containers: vec![ContainerSpec { name: "app".into(), image: "registry.local/app:v1".into(), has_post_start_hook: false }],
            ..Default::default()
        },
        status: PodStatus {
            phase: "Running".into(),
            conditions: vec![condition("PodScheduled", "True", "", ""), condition("ContainersReady", "True", "", ""), condition("Ready", "True", "", "")],
            container_statuses: vec![ContainerStatus { name: "app".into(), ready: true, started: Some(true), ..Default::default() }],
            ..Default::default()
        },
        ..Default::default()
    }
}

fn span(name: &str, span_type: SpanType, begin: i64, end: i64) -> Span {
    Span::new(name, span_type, SpanOwner::PlatformOwned).with_bounds(at(begin), Some(at(end)))
}

#[tokio::test]
async fn test_healthy_create_names_dominating_phase() {
    let events = vec![
        EventRecord::operation(at(1), "create", running_pod()),
        EventRecord::event(at(2), "SuccessfulCreatePodSandBox", "Created pod sandbox").with_user_agent(KUBELET),
        EventRecord::event(at(3), "Pulling", r#"Pulling image "registry.local/app:v1""#).with_user_agent(KUBELET),
        EventRecord::event(at(13), "Pulled", r#"Successfully pulled image "registry.local/app:v1" in 10s"#).with_user_agent(KUBELET),
        EventRecord::operation(at(20), "patch", running_pod()).with_user_agent(KUBELET),
    ];
    let spans = vec![
        span("schedule", SpanType::DefaultSchedule, 0, 1),
        span("sandbox", SpanType::SandboxCreate, 1, 3),
        span("pull app", SpanType::ImagePull, 3, 13),
        span("start app", SpanType::ContainerStart, 13, 15),
    ];
    let request = AnalysisRequest::new("web-0", "uid-web-0").with_events(events).with_spans(spans).with_window(Some(at(0)), Some(at(30)));

    let result = factory().diagnose(DeliveryType::PodCreate, request).await.unwrap();

    assert_eq!(result.result, "ImagePullTooMuchTime");
    assert!(!result.has_error);
    assert_eq!(result.module.as_deref(), Some("image"));
    assert_eq!(result.owner, "image-registry");
    assert_eq!(result.diagnosis["bottleneck"]["elapsed_ms"], 10_000);
    assert_eq!(result.diagnosis["finished_modules"], 12);
    assert_eq!(result.diagnosis["timed_out"], false);
}

#[tokio::test]
async fn test_quota_rejection_stops_everything_downstream() {
    let mut pending = running_pod();
    pending.spec.node_name.clear();
    pending.status = PodStatus {
        phase: "Pending".into(),
        conditions: vec![condition("PodScheduled", "False", "Unschedulable", r#"0/12 nodes are available: quota not enough, resource "cpu" not enough"#)],
        ..Default::default()
    };
    let request = AnalysisRequest::new("web-0", "uid-web-0")
        .with_events(vec![EventRecord::operation(at(1), "create", pending)])
        .with_spans(vec![span("schedule", SpanType::DefaultSchedule, 0, 25)])
        .with_window(Some(at(0)), Some(at(30)));

    let result = factory().diagnose(DeliveryType::PodCreate, request).await.unwrap();

    assert_eq!(result.result, "CpuQuotaNotEnough");
    assert!(result.has_error);
    assert_eq!(result.module.as_deref(), Some("scheduler"));
    assert_eq!(result.owner, "scheduling");
    assert_eq!(result.diagnosis["finished_modules"], 1);
    assert_eq!(result.diagnosis["skipped_modules"].as_array().map(Vec::len), Some(11));
    assert!(result.diagnosis.get("bottleneck").is_none());
}

#[tokio::test]
async fn test_missing_image_on_upgrade() {
    let mut pod = running_pod();
    pod.status.container_statuses[0].ready = false;
    let events = vec![
        EventRecord::operation(at(1), "patch", pod),
        EventRecord::event(at(2), "Pulling", r#"Pulling image "registry.local/app:v2""#).with_user_agent(KUBELET),
        EventRecord::event(at(4), "Failed", r#"Failed to pull image "registry.local/app:v2": manifest unknown"#).with_user_agent(KUBELET),
        EventRecord::event(at(5), "BackOff", r#"Back-off pulling image "registry.local/app:v2""#).with_user_agent(KUBELET),
        EventRecord::event(at(6), "Failed", r#"Failed to pull image "registry.local/app:v2": not found"#).with_user_agent(KUBELET),
    ];
    let request = AnalysisRequest::new("web-0", "uid-web-0").with_events(events).with_window(Some(at(0)), Some(at(30)));

    let result = factory().diagnose(DeliveryType::PodUpgrade, request).await.unwrap();

    assert_eq!(result.result, "ImageNotFound");
    assert!(result.has_error);
    assert_eq!(result.module.as_deref(), Some("image"));
    assert_eq!(result.diagnosis["findings"]["kubelet_delay"], json!({ "label": "", "is_error": false }));
}

#[tokio::test]
async fn test_delete_blocked_by_finalizer() {
    let mut pod = running_pod();
    pod.deletion_timestamp = Some(at(1));
    pod.finalizers = vec!["example.com/backup".into()];
    let events = vec![
        EventRecord::operation(at(1), "delete", pod.clone()),
        EventRecord::event(at(2), "SucceedKillingContainer", "Stopping container app, elapsedTime 1s").with_user_agent(KUBELET),
        EventRecord::operation(at(3), "patch", pod).with_user_agent(KUBELET),
    ];
    let request = AnalysisRequest::new("web-0", "uid-web-0").with_events(events).with_window(Some(at(0)), Some(at(30)));

    let result = factory().diagnose(DeliveryType::PodDelete, request).await.unwrap();

    assert_eq!(result.result, "example.com/backup");
    assert_eq!(result.module.as_deref(), Some("finalizer"));
    assert_eq!(result.diagnosis["delivery_type"], "PodDelete");
}

#[tokio::test]
async fn test_empty_history_yields_empty_result() {
    let request = AnalysisRequest::new("ghost", "uid-ghost").with_window(Some(at(0)), Some(at(30)));
    let result = factory().diagnose(DeliveryType::PodCreate, request).await.unwrap();

    assert!(result.is_empty());
    assert!(!result.has_error);
    assert_eq!(result.diagnosis["finished_modules"], 12);
}

#[tokio::test]
async fn test_deadline_bounds_a_hung_module() {
    let registry = ModuleRegistry::builder()
        .register("quick", |_: &[EventRecord], _: &AnalysisWindow| Finding::none())
        .register("hung", |_: &[EventRecord], _: &AnalysisWindow| {
            std::thread::sleep(Duration::from_secs(2));
            Finding::error("Late")
        })
        .register("never", |_: &[EventRecord], _: &AnalysisWindow| Finding::error("Never"))
        .build();
    let graph = GraphBuilder::new(&registry, DeliveryType::PodCreate).chain(&["quick", "hung", "never"]).build().unwrap();
    let config = DiagnosisConfig::default().with_deadline(Duration::from_millis(300));

    let started = std::time::Instant::now();
    let result = DagAnalyzer::new(graph, Arc::new(config)).analyze(AnalysisRequest::new("web-0", "uid")).await;

    assert!(started.elapsed() < Duration::from_millis(1500));
    assert!(result.is_empty());
    assert_eq!(result.diagnosis["timed_out"], true);
    assert_eq!(result.diagnosis["skipped_modules"], json!(["never"]));
}

#[tokio::test]
async fn test_result_serializes_for_callers() {
    let request = AnalysisRequest::new("ghost", "uid-ghost");
    let result = factory().diagnose(DeliveryType::PodDelete, request).await.unwrap();

    let encoded = serde_json::to_value(&result).unwrap();
    assert_eq!(encoded["pod_name"], "ghost");
    assert_eq!(encoded["has_error"], false);
}
