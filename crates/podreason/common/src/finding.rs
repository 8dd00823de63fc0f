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

//! Output of a single diagnosis function

use serde::{Deserialize, Serialize};

/// A `(label, is_error)` pair
///
/// - empty label: no finding
/// - non-empty label with `is_error`: definitive, ends the run early
/// - non-empty label without `is_error`: informational only
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    pub label: String,
    pub is_error: bool,
}

impl Finding {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn error(label: impl Into<String>) -> Self {
        Self { label: label.into(), is_error: true }
    }

    pub fn info(label: impl Into<String>) -> Self {
        Self { label: label.into(), is_error: false }
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_empty()
    }

    /// Non-empty and flagged as an error
    pub fn is_definitive(&self) -> bool {
        !self.label.is_empty() && self.is_error
    }
}

impl From<(String, bool)> for Finding {
    fn from((label, is_error): (String, bool)) -> Self {
        Self { label, is_error }
    }
}
