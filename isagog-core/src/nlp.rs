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

//! NLP service records
//!
//! Fields the records do not declare are ignored when reading service output.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

/// A word of an analyzed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub id: i64,
    pub text: String,
    /// Part of speech tag
    pub pos: String,
    #[serde(default)]
    pub lemma: String,
    #[serde(default)]
    pub span: Map<String, Json>,
}

/// A named entity found in a text. Not a knowledge graph entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedEntity {
    pub kind: String,
    pub text: String,
    #[serde(default)]
    pub span: Map<String, Json>,
}

/// Keeps the words whose part of speech is in `pos_filter`.
pub fn filter_pos<I>(words: I, pos_filter: &[String]) -> Vec<Word>
where
    I: IntoIterator<Item = Word>,
{
    words
        .into_iter()
        .filter(|w| pos_filter.iter().any(|pos| *pos == w.pos))
        .collect()
}
