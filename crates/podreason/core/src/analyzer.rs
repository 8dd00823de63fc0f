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

//! Concurrent DAG orchestrator
//!
//! Launches one task per module and collects completions over a bounded
//! fan-in channel. The definitive finding with the smallest topological rank
//! wins: once one arrives, every later-ranked module is stopped and the run
//! ends as soon as all earlier-ranked modules have reported. The global
//! deadline bounds the whole run. When no definitive error was produced the
//! span timeline names the dominating phase instead.

use crate::config::DiagnosisConfig;
use crate::graph::DeliveryGraph;
use crate::module::{AnalysisModule, ModuleState};
use crate::request::AnalysisRequest;
use crate::timeline::{Bottleneck, SpanTimelineAnalyzer};
use podreason_common::{AnalysisWindow, DeliveryType, DiagnosisResult, EventRecord, Finding};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, instrument, warn};

/// Orchestrator run state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerPhase {
    AwaitingModules,
    Collecting,
    Done,
}

/// A module's report to the orchestrator
///
/// The module finishes (waking its children) only once `ack` fires or is
/// dropped, so the orchestrator's early-exit decision always precedes any
/// child wakeup.
#[derive(Debug)]
struct Completion {
    module: String,
    rank: usize,
    finding: Finding,
    ack: oneshot::Sender<()>,
}

/// Per-run bookkeeping owned by the orchestrator, the single writer of the result
#[derive(Debug)]
struct Collected {
    findings: BTreeMap<String, Finding>,
    /// (rank, module, finding) of the definitive error with the smallest rank
    definitive: Option<(usize, String, Finding)>,
    /// (rank, module, finding) of the informational label with the greatest rank
    informational: Option<(usize, String, Finding)>,
    /// Indexed by rank
    reported: Vec<bool>,
    finished: usize,
}

impl Collected {
    fn new(module_count: usize) -> Self {
        Self {
            findings: BTreeMap::new(),
            definitive: None,
            informational: None,
            reported: vec![false; module_count],
            finished: 0,
        }
    }

    /// Modules ranked below this one can still change the outcome
    fn decisive_rank(&self) -> usize {
        self.definitive.as_ref().map_or(self.reported.len(), |(rank, _, _)| *rank)
    }

    /// Every module that could still change the outcome has reported
    fn is_settled(&self) -> bool {
        self.reported[..self.decisive_rank()].iter().all(|reported| *reported)
    }

    fn record(&mut self, completion: &Completion) {
        self.finished += 1;
        if let Some(reported) = self.reported.get_mut(completion.rank) {
            *reported = true;
        }
        self.findings.insert(completion.module.clone(), completion.finding.clone());

        let candidate = (completion.rank, completion.module.clone(), completion.finding.clone());
        if completion.finding.is_definitive() {
            let replace = match &self.definitive {
                Some((rank, _, _)) => completion.rank < *rank,
                None => true,
            };
            if replace {
                self.definitive = Some(candidate);
            }
        } else if !completion.finding.is_empty() {
            let replace = match &self.informational {
                Some((rank, _, _)) => completion.rank > *rank,
                None => true,
            };
            if replace {
                self.informational = Some(candidate);
            }
        }
    }
}

pub struct DagAnalyzer {
    graph: DeliveryGraph,
    timeline: Option<SpanTimelineAnalyzer>,
    config: Arc<DiagnosisConfig>,
    phase: AnalyzerPhase,
}

impl DagAnalyzer {
    pub fn new(graph: DeliveryGraph, config: Arc<DiagnosisConfig>) -> Self {
        Self {
            graph,
            timeline: None,
            config,
            phase: AnalyzerPhase::AwaitingModules,
        }
    }

    /// Attaches the span timeline fallback
    pub fn with_timeline(mut self, timeline: SpanTimelineAnalyzer) -> Self {
        self.timeline = Some(timeline);
        self
    }

    pub fn delivery_type(&self) -> DeliveryType {
        self.graph.delivery_type()
    }

    pub fn graph(&self) -> &DeliveryGraph {
        &self.graph
    }

    pub fn has_timeline(&self) -> bool {
        self.timeline.is_some()
    }

    fn transition(&mut self, next: AnalyzerPhase) {
        debug!(from = ?self.phase, to = ?next, "Analyzer phase change");
        self.phase = next;
    }

    fn stop_after(&self, rank: usize) {
        for module in self.graph.modules().iter().skip(rank + 1) {
            module.stop();
        }
    }

    fn stop_all(&self) {
        for module in self.graph.modules() {
            module.stop();
        }
    }

    /// Runs the graph once against `request`; never fails
    #[instrument(skip(self, request), fields(pod = %request.pod_name, delivery_type = %self.graph.delivery_type()))]
    pub async fn analyze(mut self, request: AnalysisRequest) -> DiagnosisResult {
        let deadline = Instant::now() + self.config.deadline();
        let window = request.window();
        let AnalysisRequest { pod_name, pod_uid, events, mut spans, .. } = request;
        let events: Arc<[EventRecord]> = Arc::from(events);
        let mut result = DiagnosisResult::new(pod_name, pod_uid);

        let module_count = self.graph.len();
        let (completion_tx, mut completion_rx) = mpsc::channel::<Completion>(module_count.max(1));
        for (rank, module) in self.graph.modules().iter().enumerate() {
            tokio::spawn(drive_module(Arc::clone(module), rank, Arc::clone(&events), window, completion_tx.clone()));
        }
        drop(completion_tx);

        self.transition(AnalyzerPhase::Collecting);
        let mut collected = Collected::new(module_count);
        let collecting = timeout_at(deadline, async {
            while let Some(completion) = completion_rx.recv().await {
                let decisive_before = collected.decisive_rank();
                collected.record(&completion);

                // Modules ranked after the winning definitive finding can no longer win;
                // stop them before the ack lets this module's children start
                let decisive = collected.decisive_rank();
                if decisive < decisive_before {
                    debug!(module = %completion.module, rank = decisive, "Definitive finding, stopping later modules");
                    self.stop_after(decisive);
                }
                let _ = completion.ack.send(());

                if collected.is_settled() {
                    return;
                }
            }
        })
        .await;

        let timed_out = collecting.is_err();
        if timed_out {
            warn!(
                "Timed out waiting for modules of {} after {}ms, modules: {}, finished: {}",
                result.pod_name, self.config.deadline_ms, module_count, collected.finished
            );
        }
        self.stop_all();
        drop(completion_rx);
        self.transition(AnalyzerPhase::Done);

        if let Some((_, module, finding)) = &collected.definitive {
            info!(module = %module, label = %finding.label, "Definitive finding");
            result.result = finding.label.clone();
            result.has_error = true;
            result.module = Some(module.clone());
        } else {
            if let Some((_, module, finding)) = &collected.informational {
                result.result = finding.label.clone();
                result.module = Some(module.clone());
            }
            if let Some(timeline) = &self.timeline {
                if let Some(bottleneck) = timeline.analyze(&mut spans, &events, &window) {
                    if let Some(label) = bottleneck.label {
                        result.result = label.to_string();
                        result.module = bottleneck.module.map(|kind| kind.as_str().to_string());
                    }
                    result.record("bottleneck", bottleneck_payload(&bottleneck));
                }
            }
        }

        if let Some(module) = result.module.clone() {
            result.owner = self.config.owner_for(&module);
            result.action = self.config.action_for(&module);
        }

        let skipped: Vec<Value> = self.graph.modules().iter().filter(|m| m.state() == ModuleState::Pending).map(|m| Value::from(m.name())).collect();
        result.record("findings", findings_payload(&collected.findings));
        result.record("finished_modules", collected.finished);
        result.record("skipped_modules", skipped);
        result.record("timed_out", timed_out);
        result.record("delivery_type", self.graph.delivery_type().as_str());

        result
    }
}

/// Gate, run, report, then finish one module
async fn drive_module(module: Arc<AnalysisModule>, rank: usize, events: Arc<[EventRecord]>, window: AnalysisWindow, completions: mpsc::Sender<Completion>) {
    if !module.can_run().await {
        debug!("Module {} stopped before running", module.name());
        return;
    }

    let finding = match module.run(events, window).await {
        Ok(finding) => finding,
        Err(err) => {
            warn!("Skipping module: {}", err);
            return;
        }
    };

    let (ack, acked) = oneshot::channel();
    let completion = Completion {
        module: module.name().to_string(),
        rank,
        finding,
        ack,
    };
    if completions.send(completion).await.is_ok() {
        let _ = acked.await;
    }

    if let Err(err) = module.finish() {
        warn!("Could not finish module: {}", err);
    }
}

fn findings_payload(findings: &BTreeMap<String, Finding>) -> Value {
    let entries: Map<String, Value> = findings.iter().map(|(module, finding)| (module.clone(), json!({ "label": finding.label, "is_error": finding.is_error }))).collect();
    Value::Object(entries)
}

fn bottleneck_payload(bottleneck: &Bottleneck) -> Value {
    json!({
        "span": bottleneck.span_name,
        "type": bottleneck.span_type.as_str(),
        "elapsed_ms": u64::try_from(bottleneck.elapsed.as_millis()).unwrap_or(u64::MAX),
        "label": bottleneck.label,
    })
}
