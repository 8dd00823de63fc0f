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

//! Message extractors shared by the detectors

use regex::Regex;
use std::sync::LazyLock;

static QUOTA_RESOURCE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r#"resource "([^"]*)" not enough"#).ok());
static NODE_CONDITION: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"The node had condition: \[(.*)\]").ok());
static BRACKETED: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\[(.*?)\]").ok());
static SANDBOX_NETWORK: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r#"failed to set up sandbox container "(.+)" network for pod"#).ok());

static IMAGE_PRESENT: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r#""([^"]+)" already present on machine"#).ok());
static IMAGE_PULLED: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r#"Successfully pulled image "([^"]+)""#).ok());
static IMAGE_PULLING: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r#"Pulling image "([^"]+)""#).ok());
static IMAGE_PULL_FAILED: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r#"Failed to pull image "([^"]+)":"#).ok());
static IMAGE_BACK_OFF: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r#"Back-off pulling image "([^"]+)""#).ok());
static IMAGE_INSPECT_FAILED: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r#"Failed to inspect image "([^"]*)":"#).ok());

static CREATED_TIMED: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"Created container (.+), elapsedTime (.+)").ok());
static STARTED_TIMED: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"Started container (.+), elapsedTime (.+)").ok());
static CREATED: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"Created container (.+)").ok());
static STARTED: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"Started container (.+)").ok());
static STOPPING: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"Stopping container (.+), elapsedTime (.+)").ok());

fn first_capture<'a>(pattern: &LazyLock<Option<Regex>>, text: &'a str) -> Option<&'a str> {
    let regex = pattern.as_ref()?;
    regex.captures(text)?.get(1).map(|m| m.as_str())
}

/// Resource named in a quota rejection, e.g. `cpu` for `resource "cpu" not enough`
pub fn quota_resource(message: &str) -> Option<&str> {
    first_capture(&QUOTA_RESOURCE, message).filter(|resource| !resource.is_empty())
}

pub fn first_upper(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Condition list of a node-condition eviction message
pub fn node_condition(message: &str) -> Option<&str> {
    first_capture(&NODE_CONDITION, message)
}

/// First bracketed token, used for volume names in mount messages
pub fn bracketed(message: &str) -> Option<&str> {
    first_capture(&BRACKETED, message)
}

pub fn is_sandbox_network_failure(message: &str) -> bool {
    first_capture(&SANDBOX_NETWORK, message).is_some()
}

/// Image reference mentioned by an image lifecycle message
pub fn image_name(message: &str) -> Option<&str> {
    if message.contains("already present on machine") {
        first_capture(&IMAGE_PRESENT, message)
    } else if message.contains("Successfully pulled image") {
        first_capture(&IMAGE_PULLED, message)
    } else if message.contains("Pulling image") {
        first_capture(&IMAGE_PULLING, message)
    } else if message.contains("Failed to pull image") {
        first_capture(&IMAGE_PULL_FAILED, message)
    } else if message.contains("Back-off pulling image") {
        first_capture(&IMAGE_BACK_OFF, message)
    } else if message.contains("Failed to inspect image") {
        first_capture(&IMAGE_INSPECT_FAILED, message)
    } else {
        None
    }
}

/// Container named by a `Created container ...` or `Started container ...` message
///
/// Older kubelets omit the `elapsedTime` suffix.
pub fn created_or_started_container(message: &str) -> Option<&str> {
    first_capture(&CREATED_TIMED, message)
        .or_else(|| first_capture(&STARTED_TIMED, message))
        .or_else(|| first_capture(&CREATED, message))
        .or_else(|| first_capture(&STARTED, message))
}

/// Container named by a `Stopping container ..., elapsedTime ...` message
pub fn stopped_container(message: &str) -> Option<&str> {
    first_capture(&STOPPING, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_resource() {
        let message = r#"0/12 nodes are available: quota not enough, resource "cpu" not enough"#;
        assert_eq!(quota_resource(message), Some("cpu"));
        assert_eq!(quota_resource("quota not enough"), None);
        assert_eq!(first_upper("cpu"), "Cpu");
        assert_eq!(first_upper(""), "");
    }

    #[test]
    fn test_image_name_variants() {
        assert_eq!(image_name(r#"Pulling image "nginx:1.25""#), Some("nginx:1.25"));
        assert_eq!(image_name(r#"Successfully pulled image "nginx:1.25" in 3.2s"#), Some("nginx:1.25"));
        assert_eq!(image_name(r#"Failed to pull image "ghcr.io/acme/api:v2": rpc error: code = NotFound desc = "ghcr.io/acme/api:v2": not found"#), Some("ghcr.io/acme/api:v2"));
        assert_eq!(image_name(r#"Back-off pulling image "busybox""#), Some("busybox"));
        assert_eq!(image_name(r#"Failed to inspect image "redis": rpc error"#), Some("redis"));
        assert_eq!(image_name(r#"Container image "redis:7" already present on machine"#), Some("redis:7"));
        assert_eq!(image_name("Created container app"), None);
    }

    #[test]
    fn test_container_names() {
        assert_eq!(created_or_started_container("Created container task, elapsedTime 65.729783ms"), Some("task"));
        assert_eq!(created_or_started_container("Started container task, elapsedTime 261.205298ms"), Some("task"));
        assert_eq!(created_or_started_container("Started container sidecar"), Some("sidecar"));
        assert_eq!(created_or_started_container(""), None);
        assert_eq!(stopped_container("Stopping container app, elapsedTime 1.2s"), Some("app"));
        assert_eq!(stopped_container("Stopping container app"), None);
    }

    #[test]
    fn test_misc_extractors() {
        assert_eq!(node_condition("The node had condition: [DiskPressure]. "), Some("DiskPressure"));
        assert_eq!(bracketed("MountVolume.SetUp failed for volume [config] : hostPath type check failed"), Some("config"));
        assert!(is_sandbox_network_failure(r#"failed to set up sandbox container "abc123" network for pod "web-0": exchange full"#));
    }
}
