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

//! Delivery types and the diagnosis result record

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Pod lifecycle operation being diagnosed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeliveryType {
    PodCreate,
    PodDelete,
    PodUpgrade,
}

impl DeliveryType {
    pub const ALL: [DeliveryType; 3] = [DeliveryType::PodCreate, DeliveryType::PodDelete, DeliveryType::PodUpgrade];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryType::PodCreate => "PodCreate",
            DeliveryType::PodDelete => "PodDelete",
            DeliveryType::PodUpgrade => "PodUpgrade",
        }
    }
}

impl fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryType {
    type Err = String;

    /// Accepts both the short CLI form (`create`) and the canonical tag (`PodCreate`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "create" | "podcreate" => Ok(DeliveryType::PodCreate),
            "delete" | "poddelete" => Ok(DeliveryType::PodDelete),
            "upgrade" | "podupgrade" => Ok(DeliveryType::PodUpgrade),
            other => Err(format!("unknown delivery type: {}", other)),
        }
    }
}

/// Outcome of one diagnosis run, serialized as a flat record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub pod_name: String,
    pub pod_uid: String,
    /// Root-cause or bottleneck label, empty when nothing was found
    pub result: String,
    /// Module (or bottleneck span's owning module) that produced `result`
    pub module: Option<String>,
    pub has_error: bool,
    pub owner: String,
    pub action: String,
    pub diagnosis: BTreeMap<String, Value>,
}

impl DiagnosisResult {
    pub fn new(pod_name: impl Into<String>, pod_uid: impl Into<String>) -> Self {
        Self {
            pod_name: pod_name.into(),
            pod_uid: pod_uid.into(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }

    /// Holds a definitive error
    pub fn is_definitive(&self) -> bool {
        !self.result.is_empty() && self.has_error
    }

    pub fn record(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.diagnosis.insert(key.into(), value.into());
    }
}
