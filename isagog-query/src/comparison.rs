// Copyright 2025 Isagog Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Comparison methods for atomic clauses

use crate::error::{QueryError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How an atomic clause compares its property value against its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = "exact_match")]
    Exact,
    /// Fetch the value, whatever it is
    #[default]
    #[serde(rename = "any")]
    Any,
    /// Case-insensitive regular expression match
    #[serde(rename = "regex")]
    Regex,
    /// Full-text search binding the relevance score
    #[serde(rename = "keyword_search")]
    Keyword,
    #[serde(rename = "greater_than")]
    Greater,
    #[serde(rename = "lesser_than")]
    Lesser,
    /// Declared by the service API, not rendered by any generator yet
    #[serde(rename = "similarity")]
    Similarity,
}

impl Comparison {
    pub const ALL: [Comparison; 7] = [
        Comparison::Exact,
        Comparison::Any,
        Comparison::Regex,
        Comparison::Keyword,
        Comparison::Greater,
        Comparison::Lesser,
        Comparison::Similarity,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Exact => "exact_match",
            Comparison::Any => "any",
            Comparison::Regex => "regex",
            Comparison::Keyword => "keyword_search",
            Comparison::Greater => "greater_than",
            Comparison::Lesser => "lesser_than",
            Comparison::Similarity => "similarity",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Comparison {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        Comparison::ALL
            .iter()
            .copied()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| QueryError::UnknownMethod(s.to_string()))
    }
}
