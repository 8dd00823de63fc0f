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

//! Static delivery topologies
//!
//! Each function is a pure function of the registry contents and returns a
//! freshly instantiated graph for a single run.

use crate::catalog::ModuleKind;
use crate::graph::{DeliveryGraph, GraphBuilder};
use crate::registry::ModuleRegistry;
use podreason_common::{DeliveryType, GraphError};

/// scheduler -> {network, volume, admission} -> sandbox -> kubelet_delay -> image -> container stages -> pod_readiness
pub fn pod_create(registry: &ModuleRegistry) -> Result<DeliveryGraph, GraphError> {
    let scheduler = ModuleKind::Scheduler.as_str();
    let sandbox = ModuleKind::Sandbox.as_str();
    let fan_out = [ModuleKind::Network, ModuleKind::Volume, ModuleKind::Admission];

    let mut builder = GraphBuilder::new(registry, DeliveryType::PodCreate).module(scheduler);
    for kind in fan_out {
        builder = builder.module(kind.as_str()).edge(scheduler, kind.as_str()).edge(kind.as_str(), sandbox);
    }

    builder
        .chain(&[
            sandbox,
            ModuleKind::KubeletDelay.as_str(),
            ModuleKind::Image.as_str(),
            ModuleKind::ContainerCreate.as_str(),
            ModuleKind::ContainerStart.as_str(),
            ModuleKind::ContainerPostStart.as_str(),
            ModuleKind::ContainerReadiness.as_str(),
            ModuleKind::PodReadiness.as_str(),
        ])
        .build()
}

/// kubelet_delay -> image -> container_kill -> container stages -> pod_readiness
pub fn pod_upgrade(registry: &ModuleRegistry) -> Result<DeliveryGraph, GraphError> {
    GraphBuilder::new(registry, DeliveryType::PodUpgrade)
        .chain(&[
            ModuleKind::KubeletDelay.as_str(),
            ModuleKind::Image.as_str(),
            ModuleKind::ContainerKill.as_str(),
            ModuleKind::ContainerCreate.as_str(),
            ModuleKind::ContainerStart.as_str(),
            ModuleKind::ContainerPostStart.as_str(),
            ModuleKind::ContainerReadiness.as_str(),
            ModuleKind::PodReadiness.as_str(),
        ])
        .build()
}

/// container_kill -> finalizer
pub fn pod_delete(registry: &ModuleRegistry) -> Result<DeliveryGraph, GraphError> {
    GraphBuilder::new(registry, DeliveryType::PodDelete).chain(&[ModuleKind::ContainerKill.as_str(), ModuleKind::Finalizer.as_str()]).build()
}

pub fn for_delivery(registry: &ModuleRegistry, delivery_type: DeliveryType) -> Result<DeliveryGraph, GraphError> {
    match delivery_type {
        DeliveryType::PodCreate => pod_create(registry),
        DeliveryType::PodUpgrade => pod_upgrade(registry),
        DeliveryType::PodDelete => pod_delete(registry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pod_create_shape() {
        let registry = ModuleRegistry::builtin();
        let graph = pod_create(&registry).unwrap();

        assert_eq!(graph.root(), "scheduler");
        assert_eq!(graph.len(), 12);
        assert_eq!(graph.get("sandbox").unwrap().parent_names(), vec!["network", "volume", "admission"]);
        assert_eq!(graph.get("scheduler").unwrap().child_names().len(), 3);
        assert_eq!(graph.get("kubelet_delay").unwrap().parent_names(), vec!["sandbox"]);
        assert_eq!(graph.names().last(), Some(&"pod_readiness"));

        for child in ["network", "volume", "admission"] {
            assert!(graph.rank(child) < graph.rank("sandbox"));
            assert!(graph.rank("scheduler") < graph.rank(child));
        }
    }

    #[test]
    fn test_pod_upgrade_shape() {
        let registry = ModuleRegistry::builtin();
        let graph = pod_upgrade(&registry).unwrap();

        assert_eq!(graph.root(), "kubelet_delay");
        assert_eq!(
            graph.names(),
            vec!["kubelet_delay", "image", "container_kill", "container_create", "container_start", "container_post_start", "container_readiness", "pod_readiness"]
        );
        assert!(graph.get("scheduler").is_none());
    }

    #[test]
    fn test_pod_delete_shape() {
        let registry = ModuleRegistry::builtin();
        let graph = for_delivery(&registry, DeliveryType::PodDelete).unwrap();
        assert_eq!(graph.names(), vec!["container_kill", "finalizer"]);
        assert_eq!(graph.delivery_type(), DeliveryType::PodDelete);
    }

    #[test]
    fn test_missing_registration_fails_build() {
        let registry = ModuleRegistry::builder().build();
        assert_eq!(pod_delete(&registry).unwrap_err(), GraphError::UnknownModule("container_kill".to_string()));
    }

    #[test]
    fn test_each_build_is_fresh() {
        let registry = ModuleRegistry::builtin();
        let first = pod_delete(&registry).unwrap();
        first.get("finalizer").unwrap().stop();

        let second = pod_delete(&registry).unwrap();
        assert!(!second.get("finalizer").unwrap().is_stopped());
    }
}
