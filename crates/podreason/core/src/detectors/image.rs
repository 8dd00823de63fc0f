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

//! Image pull failures

use super::oldest_first;
use super::patterns::image_name;
use podreason_common::{AnalysisWindow, EventRecord, Finding, latest_pod};

/// Per-image failure state in first-failure order
#[derive(Debug, Default)]
struct FailedPulls<'a> {
    entries: Vec<(&'a str, &'static str)>,
}

impl<'a> FailedPulls<'a> {
    fn record(&mut self, image: &'a str, label: &'static str) {
        match self.entries.iter_mut().find(|(name, _)| *name == image) {
            Some(entry) => entry.1 = label,
            None => self.entries.push((image, label)),
        }
    }

    fn clear(&mut self, image: &str) {
        self.entries.retain(|(name, _)| *name != image);
    }

    fn first(&self) -> Option<&'static str> {
        self.entries.first().map(|(_, label)| *label)
    }
}

fn classify_pull_failure(message: &str) -> &'static str {
    if message.contains("pull access denied") {
        "ImagePullAccessDenied"
    } else if message.contains("not found") || message.contains("manifest unknown") {
        "ImageNotFound"
    } else {
        "FailedPullImage"
    }
}

/// First image, in event order, whose failure was not cleared by a later successful pull
pub fn diagnose(events: &[EventRecord], window: &AnalysisWindow) -> Finding {
    if latest_pod(events, window).is_none() {
        return Finding::none();
    }

    let mut failed = FailedPulls::default();
    for record in oldest_first(events, window) {
        let message = record.message.as_str();
        let Some(image) = image_name(message) else {
            continue;
        };

        match record.reason.as_str() {
            "Pulled" => failed.clear(image),
            "Failed" if message.contains("Failed to pull image") => failed.record(image, classify_pull_failure(message)),
            "InspectFailed" if message.contains("Failed to inspect image") => failed.record(image, "InspectImageFailed"),
            "BackOff" if message.contains("Back-off pulling image") => failed.record(image, "ImagePullBackOff"),
            _ => {}
        }
    }

    failed.first().map(Finding::error).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::{event, snapshot};
    use podreason_common::PodSnapshot;

    fn run(records: Vec<EventRecord>) -> Finding {
        let mut events = vec![snapshot(0, PodSnapshot::default())];
        events.extend(records);
        diagnose(&events, &AnalysisWindow::unbounded())
    }

    #[test]
    fn test_image_not_found() {
        let finding = run(vec![
            event(1, "Pulling", r#"Pulling image "registry.local/app:v9""#),
            event(2, "Failed", r#"Failed to pull image "registry.local/app:v9": rpc error: code = NotFound desc = failed to resolve reference: not found"#),
        ]);
        assert_eq!(finding, Finding::error("ImageNotFound"));
    }

    #[test]
    fn test_failure_labels() {
        assert_eq!(run(vec![event(1, "BackOff", r#"Back-off pulling image "busybox""#)]), Finding::error("ImagePullBackOff"));
        assert_eq!(run(vec![event(1, "InspectFailed", r#"Failed to inspect image "busybox": rpc error"#)]), Finding::error("InspectImageFailed"));
        assert_eq!(
            run(vec![event(1, "Failed", r#"Failed to pull image "private/app": pull access denied, repository does not exist"#)]),
            Finding::error("ImagePullAccessDenied")
        );
        assert_eq!(run(vec![event(1, "Failed", r#"Failed to pull image "app": i/o timeout"#)]), Finding::error("FailedPullImage"));
    }

    #[test]
    fn test_successful_pull_clears_failure() {
        let finding = run(vec![
            event(1, "BackOff", r#"Back-off pulling image "busybox""#),
            event(2, "Pulled", r#"Successfully pulled image "busybox" in 2.1s"#),
        ]);
        assert_eq!(finding, Finding::none());
    }

    #[test]
    fn test_first_failing_image_wins() {
        let finding = run(vec![
            event(1, "Failed", r#"Failed to pull image "a": not found"#),
            event(2, "BackOff", r#"Back-off pulling image "b""#),
            event(3, "BackOff", r#"Back-off pulling image "a""#),
        ]);
        assert_eq!(finding, Finding::error("ImagePullBackOff"));

        let finding = run(vec![
            event(1, "BackOff", r#"Back-off pulling image "b""#),
            event(2, "Failed", r#"Failed to pull image "a": not found"#),
        ]);
        assert_eq!(finding, Finding::error("ImagePullBackOff"));

        let finding = run(vec![
            event(1, "Failed", r#"Failed to pull image "a": not found"#),
            event(2, "BackOff", r#"Back-off pulling image "b""#),
            event(3, "Pulled", r#"Successfully pulled image "a" in 1s"#),
        ]);
        assert_eq!(finding, Finding::error("ImagePullBackOff"));
    }
}
