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

//! Query generators
//!
//! A [`Generator`] renders a [`SelectQuery`] into the text of a target query
//! language. [`SparqlGenerator`] is the SPARQL implementation.

mod sparql;

pub use sparql::SparqlGenerator;

use crate::clause::Clause;
use crate::error::Result;
use crate::query::SelectQuery;

/// Renders queries into a query language.
pub trait Generator {
    /// Name of the target language
    fn language(&self) -> &str;

    fn generate_query(&self, query: &SelectQuery) -> Result<String>;

    /// Renders one clause on its own, with a fresh variable session.
    fn generate_clause(&self, clause: &Clause) -> Result<String>;
}
