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

//! Delivery-type keyed analyzer construction

use crate::analyzer::DagAnalyzer;
use crate::config::DiagnosisConfig;
use crate::graph::DeliveryGraph;
use crate::registry::ModuleRegistry;
use crate::request::AnalysisRequest;
use crate::timeline::SpanTimelineAnalyzer;
use crate::topology;
use podreason_common::{DeliveryType, DiagnosisResult, GraphError, ReasonError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Builds a fresh analyzer bound to a freshly built graph
pub type AnalyzerConstructor = Arc<dyn Fn(&ModuleRegistry, Arc<DiagnosisConfig>) -> Result<DagAnalyzer, GraphError> + Send + Sync>;

/// Constructs one analyzer per diagnosis request
///
/// Analyzers and their graphs are never reused across requests; every
/// [`AnalyzerFactory::build`] call yields new module instances.
#[derive(Clone)]
pub struct AnalyzerFactory {
    registry: Arc<ModuleRegistry>,
    config: Arc<DiagnosisConfig>,
    constructors: HashMap<DeliveryType, AnalyzerConstructor>,
}

impl std::fmt::Debug for AnalyzerFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut registered: Vec<&DeliveryType> = self.constructors.keys().collect();
        registered.sort_by_key(|dt| dt.as_str());
        f.debug_struct("AnalyzerFactory").field("registry", &self.registry).field("config", &self.config).field("delivery_types", &registered).finish()
    }
}

impl AnalyzerFactory {
    /// Empty factory; every delivery type must be registered explicitly
    pub fn new(registry: Arc<ModuleRegistry>, config: Arc<DiagnosisConfig>) -> Self {
        Self {
            registry,
            config,
            constructors: HashMap::new(),
        }
    }

    /// Factory with the built-in topologies; create and upgrade runs carry the span timeline fallback
    pub fn with_defaults(registry: Arc<ModuleRegistry>, config: Arc<DiagnosisConfig>) -> Self {
        Self::new(registry, config)
            .register(DeliveryType::PodCreate, with_timeline(topology::pod_create))
            .register(DeliveryType::PodUpgrade, with_timeline(topology::pod_upgrade))
            .register(DeliveryType::PodDelete, Arc::new(|registry: &ModuleRegistry, config: Arc<DiagnosisConfig>| -> Result<DagAnalyzer, GraphError> {
                Ok(DagAnalyzer::new(topology::pod_delete(registry)?, config))
            }))
    }

    /// Built-in registry, built-in topologies and configuration from the environment
    pub fn from_env() -> Self {
        Self::with_defaults(Arc::new(ModuleRegistry::builtin()), Arc::new(DiagnosisConfig::from_env()))
    }

    /// Binds a constructor to a delivery type, replacing any earlier one
    pub fn register(mut self, delivery_type: DeliveryType, constructor: AnalyzerConstructor) -> Self {
        self.constructors.insert(delivery_type, constructor);
        self
    }

    pub fn supports(&self, delivery_type: DeliveryType) -> bool {
        self.constructors.contains_key(&delivery_type)
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DiagnosisConfig {
        &self.config
    }

    pub fn build(&self, delivery_type: DeliveryType) -> Result<DagAnalyzer, ReasonError> {
        let constructor = self.constructors.get(&delivery_type).ok_or(ReasonError::UnregisteredDeliveryType(delivery_type))?;
        let analyzer = constructor(&self.registry, Arc::clone(&self.config))?;
        debug!(delivery_type = %delivery_type, modules = analyzer.graph().len(), "Built analyzer");
        Ok(analyzer)
    }

    /// Builds an analyzer for `delivery_type` and runs it once
    #[instrument(skip(self, request), fields(pod = %request.pod_name))]
    pub async fn diagnose(&self, delivery_type: DeliveryType, request: AnalysisRequest) -> Result<DiagnosisResult, ReasonError> {
        let analyzer = self.build(delivery_type)?;
        Ok(analyzer.analyze(request).await)
    }
}

fn with_timeline(topology: fn(&ModuleRegistry) -> Result<DeliveryGraph, GraphError>) -> AnalyzerConstructor {
    Arc::new(move |registry: &ModuleRegistry, config: Arc<DiagnosisConfig>| -> Result<DagAnalyzer, GraphError> {
        Ok(DagAnalyzer::new(topology(registry)?, config).with_timeline(SpanTimelineAnalyzer::new()))
    })
}
