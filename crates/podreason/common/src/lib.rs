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

//! Shared data model for pod lifecycle diagnosis
//!
//! Everything the diagnosis engine reads (audit/event records, pod snapshots,
//! phase spans) and the single value it produces (`DiagnosisResult`).

pub mod error;
pub mod event;
pub mod finding;
pub mod pod;
pub mod result;
pub mod span;
pub mod window;

pub use error::{GraphError, ModuleError, ReasonError};
pub use event::{EventRecord, RecordKind, latest_pod};
pub use finding::Finding;
pub use pod::{ContainerSpec, ContainerState, ContainerStatus, PodCondition, PodSnapshot, PodSpec, PodStatus};
pub use result::{DeliveryType, DiagnosisResult};
pub use span::{Span, SpanOwner, SpanType};
pub use window::AnalysisWindow;
