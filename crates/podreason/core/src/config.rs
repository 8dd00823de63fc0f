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

//! Diagnosis engine configuration

use crate::catalog::ModuleKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::warn;

/// Environment variable overriding the global deadline, in milliseconds
pub const DEADLINE_ENV: &str = "PODREASON_DEADLINE_MS";

pub const DEFAULT_DEADLINE_MS: u64 = 20_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosisConfig {
    /// Wall-clock budget for one orchestrator run
    pub deadline_ms: u64,
    /// Module name -> owning team, overriding the catalog defaults
    pub owners: BTreeMap<String, String>,
    /// Module name -> suggested action, overriding the catalog defaults
    pub actions: BTreeMap<String, String>,
}

impl Default for DiagnosisConfig {
    fn default() -> Self {
        Self {
            deadline_ms: DEFAULT_DEADLINE_MS,
            owners: BTreeMap::new(),
            actions: BTreeMap::new(),
        }
    }
}

impl DiagnosisConfig {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Applies `PODREASON_DEADLINE_MS` on top of `self`
    pub fn with_env_overrides(self) -> Self {
        let raw = std::env::var(DEADLINE_ENV).ok();
        self.with_deadline_override(raw.as_deref())
    }

    /// Applies a raw deadline override; unparsable or zero values are ignored with a warning
    pub fn with_deadline_override(mut self, raw: Option<&str>) -> Self {
        if let Some(raw) = raw {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.deadline_ms = ms,
                _ => warn!("Invalid {} '{}', keeping {}ms", DEADLINE_ENV, raw, self.deadline_ms),
            }
        }
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    /// Owning team for a module name, falling back to the catalog default
    pub fn owner_for(&self, module: &str) -> String {
        if let Some(owner) = self.owners.get(module) {
            return owner.clone();
        }
        ModuleKind::from_name(module).map(|kind| kind.default_owner().to_string()).unwrap_or_default()
    }

    /// Suggested action for a module name, falling back to the catalog default
    pub fn action_for(&self, module: &str) -> String {
        if let Some(action) = self.actions.get(module) {
            return action.clone();
        }
        ModuleKind::from_name(module).map(|kind| kind.default_action().to_string()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_deadline_is_twenty_seconds() {
        assert_eq!(DiagnosisConfig::default().deadline(), Duration::from_secs(20));
    }

    #[test]
    fn test_deadline_override() {
        let config = DiagnosisConfig::default().with_deadline_override(Some("1500"));
        assert_eq!(config.deadline(), Duration::from_millis(1500));

        let config = DiagnosisConfig::default().with_deadline_override(Some("soon"));
        assert_eq!(config.deadline_ms, DEFAULT_DEADLINE_MS);

        let config = DiagnosisConfig::default().with_deadline_override(Some("0"));
        assert_eq!(config.deadline_ms, DEFAULT_DEADLINE_MS);

        let config = DiagnosisConfig::default().with_deadline_override(None);
        assert_eq!(config.deadline_ms, DEFAULT_DEADLINE_MS);
    }

    #[test]
    fn test_owner_override_and_fallback() {
        let mut config = DiagnosisConfig::default();
        config.owners.insert("image".to_string(), "registry-team".to_string());

        assert_eq!(config.owner_for("image"), "registry-team");
        assert_eq!(config.owner_for("scheduler"), ModuleKind::Scheduler.default_owner());
        assert_eq!(config.owner_for("no_such_module"), "");
        assert_eq!(config.action_for("volume"), ModuleKind::Volume.default_action());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: DiagnosisConfig = serde_json::from_str(r#"{ "owners": { "network": "net-team" } }"#).unwrap();
        assert_eq!(config.deadline_ms, DEFAULT_DEADLINE_MS);
        assert_eq!(config.owner_for("network"), "net-team");
    }
}
