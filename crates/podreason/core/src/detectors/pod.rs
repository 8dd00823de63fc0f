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

//! Pod-level readiness gates and deletion finalizers

use podreason_common::{AnalysisWindow, EventRecord, Finding, latest_pod};

/// Reports the last readiness gate that is missing or false, once containers are ready
pub fn diagnose_readiness(events: &[EventRecord], window: &AnalysisWindow) -> Finding {
    let Some(pod) = latest_pod(events, window) else {
        return Finding::none();
    };

    if pod.condition("ContainersReady").is_some_and(|condition| !condition.is_true()) {
        return Finding::none();
    }

    let unmet = pod.spec.readiness_gates.iter().filter(|gate| match pod.condition(gate) {
        Some(condition) => condition.status.eq_ignore_ascii_case("false"),
        None => true,
    });

    match unmet.last() {
        Some(gate) => Finding::error(format!("{}_NotReady", gate)),
        None => Finding::none(),
    }
}

/// Names the first finalizer still holding a pod that is marked for deletion
pub fn diagnose_finalizer(events: &[EventRecord], window: &AnalysisWindow) -> Finding {
    let Some(pod) = latest_pod(events, window) else {
        return Finding::none();
    };

    if !pod.is_marked_for_deletion() {
        return Finding::none();
    }
    pod.finalizers.first().map(|finalizer| Finding::error(finalizer.clone())).unwrap_or_default()
}
