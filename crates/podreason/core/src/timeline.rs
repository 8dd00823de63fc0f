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

//! Sequential fallback naming the phase that consumed the most time
//!
//! Runs only after module execution is complete or abandoned, so it is the
//! sole writer of the spans it normalizes.

use crate::catalog::ModuleKind;
use chrono::{DateTime, Utc};
use podreason_common::{AnalysisWindow, EventRecord, Span, SpanType, latest_pod};
use std::time::Duration;
use tracing::debug;

/// The dominating span of a timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bottleneck {
    pub span_name: String,
    pub span_type: SpanType,
    pub elapsed: Duration,
    /// `None` when the span type has no bottleneck label
    pub label: Option<&'static str>,
    pub module: Option<ModuleKind>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SpanTimelineAnalyzer;

impl SpanTimelineAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Normalizes `spans` in place and returns the dominating one
    ///
    /// Without a window end no span can be closed, so no bottleneck is named.
    pub fn analyze(&self, spans: &mut [Span], events: &[EventRecord], window: &AnalysisWindow) -> Option<Bottleneck> {
        let window_end = window.end?;
        let host_network = latest_pod(events, window).is_some_and(|pod| pod.spec.host_network);

        normalize(spans, window_end, host_network);

        let winner = select_dominant(spans)?;
        let bottleneck = Bottleneck {
            span_name: winner.name.clone(),
            span_type: winner.span_type,
            elapsed: winner.elapsed,
            label: winner.span_type.bottleneck_label(),
            module: ModuleKind::for_span(winner.span_type),
        };

        if bottleneck.label.is_none() {
            debug!(span = %bottleneck.span_name, span_type = %bottleneck.span_type, "Dominating span has no bottleneck label");
        }
        Some(bottleneck)
    }
}

/// Latest end among volume and IP allocation spans
///
/// The sandbox cannot start before networking and storage are ready.
pub fn causal_floor(spans: &[Span]) -> Option<DateTime<Utc>> {
    spans.iter().filter(|span| span.span_type.is_volume() || span.span_type.is_ip_allocation()).filter_map(|span| span.end).max()
}

/// Clamps sandbox begins to the causal floor, closes open spans at `window_end`
/// and recomputes elapsed for every span touched
pub fn normalize(spans: &mut [Span], window_end: DateTime<Utc>, host_network: bool) {
    let floor = causal_floor(spans);

    for span in spans.iter_mut() {
        let mut touched = false;

        // Only a recorded begin is clamped; a sandbox span without one stays unset on purpose
        if let (true, Some(floor), Some(begin)) = (span.span_type.is_sandbox(), floor, span.begin) {
            if begin < floor {
                span.begin = Some(floor);
                touched = true;
            }
        }

        if span.begin.is_some() && span.end.is_none() {
            span.end = Some(window_end);
            touched = true;
        }

        if touched {
            span.recompute_elapsed();
        }

        if host_network && span.span_type.is_ip_allocation() {
            span.elapsed = Duration::ZERO;
        }
    }
}

/// Platform- or custom-owned span with the strictly greatest elapsed; the first one wins ties
pub fn select_dominant(spans: &[Span]) -> Option<&Span> {
    let mut best: Option<&Span> = None;
    for span in spans.iter().filter(|span| span.owner.is_candidate()) {
        match best {
            Some(current) if span.elapsed <= current.elapsed => {}
            _ => best = Some(span),
        }
    }
    best
}
