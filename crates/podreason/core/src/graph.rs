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

//! Delivery graph construction and validation
//!
//! Builds one wired DAG of fresh module instances from the registry.
//! Acyclicity, the single-root shape and edge consistency are verified
//! once, at build time, using a petgraph mirror of the declared topology.

use crate::module::AnalysisModule;
use crate::registry::ModuleRegistry;
use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use podreason_common::{DeliveryType, GraphError};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Declarative description of a delivery graph, resolved against a registry on `build`
#[derive(Debug)]
pub struct GraphBuilder<'r> {
    registry: &'r ModuleRegistry,
    delivery_type: DeliveryType,
    modules: Vec<String>,
    edges: Vec<(String, String)>,
}

impl<'r> GraphBuilder<'r> {
    pub fn new(registry: &'r ModuleRegistry, delivery_type: DeliveryType) -> Self {
        Self {
            registry,
            delivery_type,
            modules: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn module(mut self, name: impl Into<String>) -> Self {
        self.modules.push(name.into());
        self
    }

    /// Declares `parent -> child`; both ends must be declared as modules
    pub fn edge(mut self, parent: impl Into<String>, child: impl Into<String>) -> Self {
        self.edges.push((parent.into(), child.into()));
        self
    }

    /// Declares every name as a module and links them in sequence
    pub fn chain(mut self, names: &[&str]) -> Self {
        for name in names {
            if !self.modules.iter().any(|m| m == name) {
                self.modules.push((*name).to_string());
            }
        }
        for pair in names.windows(2) {
            self.edges.push((pair[0].to_string(), pair[1].to_string()));
        }
        self
    }

    pub fn build(self) -> Result<DeliveryGraph, GraphError> {
        let mut graph: DiGraph<String, ()> = DiGraph::new();
        let mut node_indices: HashMap<String, NodeIndex> = HashMap::new();

        for name in &self.modules {
            if node_indices.contains_key(name) {
                return Err(GraphError::DuplicateModule(name.clone()));
            }
            let index = graph.add_node(name.clone());
            node_indices.insert(name.clone(), index);
        }

        let mut seen_edges = HashSet::new();
        for (parent, child) in &self.edges {
            let (Some(&from), Some(&to)) = (node_indices.get(parent), node_indices.get(child)) else {
                return Err(GraphError::DanglingEdge {
                    parent: parent.clone(),
                    child: child.clone(),
                });
            };
            if seen_edges.insert((from, to)) {
                graph.add_edge(from, to, ());
            }
        }

        let order = toposort(&graph, None).map_err(|cycle| GraphError::CycleDetected(graph[cycle.node_id()].clone()))?;

        let roots: Vec<String> = graph.node_indices().filter(|&idx| graph.neighbors_directed(idx, Direction::Incoming).next().is_none()).map(|idx| graph[idx].clone()).collect();
        let root = match roots.len() {
            0 => return Err(GraphError::NoRoot),
            1 => roots[0].clone(),
            _ => return Err(GraphError::MultipleRoots(roots)),
        };

        // Instantiate in declaration order, then wire edges in declaration order so
        // each module's parent list matches the topology definition.
        let mut instances: Vec<AnalysisModule> = Vec::with_capacity(self.modules.len());
        for name in &self.modules {
            instances.push(self.registry.construct(name)?);
        }
        let position: HashMap<NodeIndex, usize> = graph.node_indices().enumerate().map(|(pos, idx)| (idx, pos)).collect();

        let mut wired = HashSet::new();
        for (parent, child) in &self.edges {
            let from = position[&node_indices[parent]];
            let to = position[&node_indices[child]];
            if !wired.insert((from, to)) {
                continue;
            }
            let parent_state = instances[from].subscribe();
            let parent_name = instances[from].name().to_string();
            let child_name = instances[to].name().to_string();
            instances[to].link_parent(parent_name, parent_state);
            instances[from].add_child(child_name);
        }

        let mut slots: Vec<Option<AnalysisModule>> = instances.into_iter().map(Some).collect();
        let mut modules = Vec::with_capacity(order.len());
        let mut ranks = HashMap::with_capacity(order.len());
        for (rank, idx) in order.into_iter().enumerate() {
            if let Some(module) = slots[position[&idx]].take() {
                ranks.insert(module.name().to_string(), rank);
                modules.push(Arc::new(module));
            }
        }

        debug!(delivery_type = %self.delivery_type, root = %root, modules = modules.len(), "Built delivery graph");

        Ok(DeliveryGraph {
            delivery_type: self.delivery_type,
            root,
            modules,
            ranks,
        })
    }
}

/// A validated, wired module DAG for one run
#[derive(Debug)]
pub struct DeliveryGraph {
    delivery_type: DeliveryType,
    root: String,
    /// Modules in topological order
    modules: Vec<Arc<AnalysisModule>>,
    ranks: HashMap<String, usize>,
}

impl DeliveryGraph {
    pub fn delivery_type(&self) -> DeliveryType {
        self.delivery_type
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Modules in topological order, root first
    pub fn modules(&self) -> &[Arc<AnalysisModule>] {
        &self.modules
    }

    pub fn get(&self, name: &str) -> Option<&Arc<AnalysisModule>> {
        self.ranks.get(name).map(|&rank| &self.modules[rank])
    }

    /// Position of a module in the topological order
    pub fn rank(&self, name: &str) -> Option<usize> {
        self.ranks.get(name).copied()
    }

    pub fn names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
