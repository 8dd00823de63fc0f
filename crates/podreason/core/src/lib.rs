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

//! Pod lifecycle root-cause diagnosis engine
//!
//! A [`DeliveryGraph`] of [`AnalysisModule`]s is built per request by the
//! [`AnalyzerFactory`] and executed once by a [`DagAnalyzer`]. Modules run
//! concurrently as soon as all of their parents have finished; the earliest
//! ranked definitive error wins and stops every module ranked after it.

pub mod analyzer;
pub mod catalog;
pub mod config;
pub mod detectors;
pub mod factory;
pub mod graph;
pub mod module;
pub mod registry;
pub mod request;
pub mod timeline;
pub mod topology;

pub use analyzer::{AnalyzerPhase, DagAnalyzer};
pub use catalog::ModuleKind;
pub use config::DiagnosisConfig;
pub use factory::{AnalyzerConstructor, AnalyzerFactory};
pub use graph::{DeliveryGraph, GraphBuilder};
pub use module::{AnalysisModule, DiagnosisStrategy, ModuleState};
pub use registry::{ModuleRegistry, ModuleRegistryBuilder};
pub use request::AnalysisRequest;
pub use timeline::{Bottleneck, SpanTimelineAnalyzer};
