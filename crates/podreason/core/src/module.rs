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

//! Diagnosis graph nodes
//!
//! An [`AnalysisModule`] wraps one diagnosis function and its completion
//! state. State lives in a `watch` channel so children can hold a
//! non-owning view of each parent and wake up on every transition without
//! polling.

use podreason_common::{AnalysisWindow, EventRecord, Finding, ModuleError};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// A pure classifier over the event history
///
/// Implementations must not block without bound and must treat their
/// inputs as read-only.
pub trait DiagnosisStrategy: Send + Sync {
    fn diagnose(&self, events: &[EventRecord], window: &AnalysisWindow) -> Finding;
}

impl<F> DiagnosisStrategy for F
where
    F: Fn(&[EventRecord], &AnalysisWindow) -> Finding + Send + Sync,
{
    fn diagnose(&self, events: &[EventRecord], window: &AnalysisWindow) -> Finding {
        self(events, window)
    }
}

/// Lifecycle of a module within one run; transitions only move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ModuleState {
    Pending,
    Running,
    Finished,
}

#[derive(Clone)]
struct ParentLink {
    name: String,
    state: watch::Receiver<ModuleState>,
}

pub struct AnalysisModule {
    name: String,
    strategy: Arc<dyn DiagnosisStrategy>,
    state: watch::Sender<ModuleState>,
    stop: watch::Sender<bool>,
    parents: Vec<ParentLink>,
    children: Vec<String>,
}

impl fmt::Debug for AnalysisModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisModule")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("parents", &self.parent_names())
            .field("children", &self.children)
            .finish()
    }
}

impl AnalysisModule {
    pub fn new(name: impl Into<String>, strategy: Arc<dyn DiagnosisStrategy>) -> Self {
        let (state, _) = watch::channel(ModuleState::Pending);
        let (stop, _) = watch::channel(false);
        Self {
            name: name.into(),
            strategy,
            state,
            stop,
            parents: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ModuleState {
        *self.state.borrow()
    }

    /// Receiver observing this module's state transitions
    pub fn subscribe(&self) -> watch::Receiver<ModuleState> {
        self.state.subscribe()
    }

    pub fn parent_names(&self) -> Vec<&str> {
        self.parents.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn child_names(&self) -> &[String] {
        &self.children
    }

    /// Registers `parent` as a prerequisite; only a state view is retained
    pub fn add_parent(&mut self, parent: &AnalysisModule) {
        self.link_parent(parent.name.clone(), parent.subscribe());
    }

    pub(crate) fn link_parent(&mut self, name: String, state: watch::Receiver<ModuleState>) {
        self.parents.push(ParentLink { name, state });
    }

    pub fn add_child(&mut self, child: impl Into<String>) {
        self.children.push(child.into());
    }

    /// Waits until every parent is `Finished` (true) or a stop signal arrives (false)
    ///
    /// A parent dropped before finishing can never satisfy the gate, so the
    /// module then waits for the stop signal alone.
    pub async fn can_run(&self) -> bool {
        let mut parents: Vec<watch::Receiver<ModuleState>> = self.parents.iter().map(|p| p.state.clone()).collect();
        let mut stop_rx = self.stop.subscribe();

        loop {
            if *stop_rx.borrow_and_update() {
                return false;
            }

            if parents.iter_mut().all(|rx| *rx.borrow_and_update() == ModuleState::Finished) {
                return true;
            }

            let waiting: Vec<_> = parents.iter_mut().filter(|rx| *rx.borrow() != ModuleState::Finished).map(|rx| Box::pin(rx.changed())).collect();
            if waiting.is_empty() {
                continue;
            }

            tokio::select! {
                (changed, _, _) = futures::future::select_all(waiting) => {
                    if changed.is_err() {
                        debug!("Parent of module {} went away before finishing", self.name);
                        let _ = stop_rx.wait_for(|stopped| *stopped).await;
                        return false;
                    }
                }
                _ = stop_rx.changed() => {}
            }
        }
    }

    /// Invokes the diagnosis function exactly once
    ///
    /// The function runs on the blocking pool; a panic inside it is caught
    /// here and reported as no finding.
    pub async fn run(&self, events: Arc<[EventRecord]>, window: AnalysisWindow) -> Result<Finding, ModuleError> {
        let started = self.state.send_if_modified(|state| {
            if *state == ModuleState::Pending {
                *state = ModuleState::Running;
                true
            } else {
                false
            }
        });
        if !started {
            return Err(ModuleError::AlreadyStarted(self.name.clone()));
        }

        let strategy = Arc::clone(&self.strategy);
        let outcome = tokio::task::spawn_blocking(move || catch_unwind(AssertUnwindSafe(|| strategy.diagnose(&events, &window)))).await;

        let finding = match outcome {
            Ok(Ok(finding)) => finding,
            Ok(Err(_)) => {
                warn!("Diagnosis module {} panicked, treating as no finding", self.name);
                Finding::none()
            }
            Err(join_error) => {
                warn!("Diagnosis module {} did not complete: {}", self.name, join_error);
                Finding::none()
            }
        };

        debug!(module = %self.name, label = %finding.label, is_error = finding.is_error, "Module finished diagnosis");
        Ok(finding)
    }

    /// Marks the module `Finished`, waking every child
    pub fn finish(&self) -> Result<(), ModuleError> {
        let finished = self.state.send_if_modified(|state| {
            if *state == ModuleState::Running {
                *state = ModuleState::Finished;
                true
            } else {
                false
            }
        });
        if finished { Ok(()) } else { Err(ModuleError::NotRunning(self.name.clone())) }
    }

    /// Unblocks a pending `can_run`; idempotent
    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }
}
