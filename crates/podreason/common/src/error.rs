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

//! Error types for graph construction and module execution

use crate::result::DeliveryType;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Module registered twice in one graph: {0}")]
    DuplicateModule(String),

    #[error("Module not found in registry: {0}")]
    UnknownModule(String),

    #[error("Edge references a module missing from the graph: {parent} -> {child}")]
    DanglingEdge { parent: String, child: String },

    #[error("Circular dependency detected at module: {0}")]
    CycleDetected(String),

    #[error("Graph has no root module")]
    NoRoot,

    #[error("Graph has more than one root module: {0:?}")]
    MultipleRoots(Vec<String>),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModuleError {
    #[error("Module {0} has already been started")]
    AlreadyStarted(String),

    #[error("Module {0} is not running")]
    NotRunning(String),
}

#[derive(Debug, Error)]
pub enum ReasonError {
    #[error("Graph construction failed: {0}")]
    Graph(#[from] GraphError),

    #[error("No analyzer registered for delivery type {0}")]
    UnregisteredDeliveryType(DeliveryType),
}
