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

//! Resolved pod representation carried by audit records
//!
//! Only the spec/status fields the diagnosis modules consult are kept; the
//! upstream decoder is responsible for projecting a full pod object onto
//! this shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Condition status value meaning the condition holds
pub const CONDITION_TRUE: &str = "True";

/// Condition status value meaning the condition does not hold
pub const CONDITION_FALSE: &str = "False";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodSnapshot {
    pub name: String,
    pub namespace: String,
    pub uid: String,
    pub finalizers: Vec<String>,
    pub deletion_timestamp: Option<DateTime<Utc>>,
    pub spec: PodSpec,
    pub status: PodStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodSpec {
    pub scheduler_name: String,
    pub node_name: String,
    pub host_network: bool,
    pub init_containers: Vec<ContainerSpec>,
    pub containers: Vec<ContainerSpec>,
    /// Condition types listed under `readinessGates`
    pub readiness_gates: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub has_post_start_hook: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodStatus {
    pub phase: String,
    pub reason: String,
    pub message: String,
    pub conditions: Vec<PodCondition>,
    pub init_container_statuses: Vec<ContainerStatus>,
    pub container_statuses: Vec<ContainerStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    pub reason: String,
    pub message: String,
    pub last_transition_time: Option<DateTime<Utc>>,
}

impl PodCondition {
    pub fn is_true(&self) -> bool {
        self.status == CONDITION_TRUE
    }

    pub fn is_false(&self) -> bool {
        self.status == CONDITION_FALSE
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerStatus {
    pub name: String,
    pub ready: bool,
    pub started: Option<bool>,
    pub state: ContainerState,
}

/// Mirrors the one-of `waiting` / `running` / `terminated` container state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerState {
    pub waiting_reason: Option<String>,
    pub running_started_at: Option<DateTime<Utc>>,
    pub terminated_reason: Option<String>,
}

impl PodSnapshot {
    /// Finds the condition with the given type
    pub fn condition(&self, condition_type: &str) -> Option<&PodCondition> {
        self.status.conditions.iter().find(|c| c.condition_type == condition_type)
    }

    /// Status of a regular container by name
    pub fn container_status(&self, container_name: &str) -> Option<&ContainerStatus> {
        self.status.container_statuses.iter().find(|cs| cs.name == container_name)
    }

    /// Init containers followed by regular containers, in spec order
    pub fn all_containers(&self) -> impl Iterator<Item = &ContainerSpec> {
        self.spec.init_containers.iter().chain(self.spec.containers.iter())
    }

    pub fn is_marked_for_deletion(&self) -> bool {
        self.deletion_timestamp.is_some()
    }
}
