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

//! Module name -> constructor table
//!
//! Populated once through [`ModuleRegistryBuilder`] and read-only afterwards;
//! every graph build asks it for fresh module instances.

use crate::detectors;
use crate::module::{AnalysisModule, DiagnosisStrategy};
use podreason_common::GraphError;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

type ModuleConstructor = Arc<dyn Fn() -> AnalysisModule + Send + Sync>;

#[derive(Clone, Default)]
pub struct ModuleRegistry {
    constructors: BTreeMap<String, ModuleConstructor>,
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry").field("modules", &self.names()).finish()
    }
}

#[derive(Default)]
pub struct ModuleRegistryBuilder {
    constructors: BTreeMap<String, ModuleConstructor>,
}

impl ModuleRegistryBuilder {
    /// Registers a diagnosis strategy under `name`; a later registration replaces an earlier one
    pub fn register<S>(mut self, name: impl Into<String>, strategy: S) -> Self
    where
        S: DiagnosisStrategy + 'static,
    {
        let name = name.into();
        let strategy: Arc<dyn DiagnosisStrategy> = Arc::new(strategy);
        let module_name = name.clone();
        self.constructors.insert(name, Arc::new(move || AnalysisModule::new(module_name.clone(), Arc::clone(&strategy))));
        self
    }

    pub fn build(self) -> ModuleRegistry {
        ModuleRegistry { constructors: self.constructors }
    }
}

impl ModuleRegistry {
    pub fn builder() -> ModuleRegistryBuilder {
        ModuleRegistryBuilder::default()
    }

    /// Registry holding every built-in detector under its catalog name
    pub fn builtin() -> Self {
        detectors::register_builtin(Self::builder()).build()
    }

    /// Builds a fresh, unwired module instance
    pub fn construct(&self, name: &str) -> Result<AnalysisModule, GraphError> {
        self.constructors.get(name).map(|ctor| ctor()).ok_or_else(|| GraphError::UnknownModule(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModuleKind;
    use crate::module::ModuleState;
    use podreason_common::{AnalysisWindow, EventRecord, Finding};

    #[test]
    fn test_construct_returns_fresh_instances() {
        let registry = ModuleRegistry::builder().register("probe", |_: &[EventRecord], _: &AnalysisWindow| Finding::info("seen")).build();

        let first = registry.construct("probe").unwrap();
        let second = registry.construct("probe").unwrap();
        assert_eq!(first.name(), "probe");
        assert_eq!(first.state(), ModuleState::Pending);

        first.stop();
        assert!(first.is_stopped());
        assert!(!second.is_stopped());
    }

    #[test]
    fn test_unknown_module() {
        let registry = ModuleRegistry::builder().build();
        assert!(registry.is_empty());
        assert_eq!(registry.construct("scheduler").unwrap_err(), GraphError::UnknownModule("scheduler".to_string()));
    }

    #[test]
    fn test_builtin_covers_catalog() {
        let registry = ModuleRegistry::builtin();
        for kind in ModuleKind::ALL {
            assert!(registry.contains(kind.as_str()), "missing {}", kind);
        }
        assert_eq!(registry.len(), ModuleKind::ALL.len());
    }
}
