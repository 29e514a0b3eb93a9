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

//! Isagog Query
//!
//! Select query model for the Isagog knowledge graph: typed terms, the clause
//! tree, select query builders, the service dict form and SPARQL generation.
//!
//! ```
//! use isagog_query::{Generator, Identifier, SparqlGenerator, UnarySelectQuery};
//!
//! let mut query = UnarySelectQuery::for_subject(Identifier::new("http://ex.org/alice").unwrap());
//! query.add_fetch_clause(Identifier::new("http://ex.org/age").unwrap());
//! let sparql = query.generate(&SparqlGenerator::new()).unwrap();
//! assert!(sparql.contains("OPTIONAL {"));
//! ```

pub mod clause;
pub mod comparison;
pub mod error;
pub mod generator;
pub mod query;
pub mod term;
pub mod wire;

pub use clause::{AtomicClause, Clause, ClauseKind, ClauseVisitor, ConjunctiveClause, DisjunctiveClause};
pub use comparison::Comparison;
pub use error::{QueryError, Result};
pub use generator::{Generator, SparqlGenerator};
pub use query::{
    default_prefixes, ClauseSource, SelectQuery, UnarySelectQuery, DEFAULT_GRAPH, DEFAULT_LANG,
    KIND_VARIABLE, SCORE_VARIABLE, UNLIMITED,
};
pub use term::{Identifier, Subject, Term, Value, Variable, VariableSupply};
pub use wire::{ApiVersion, QUERY_SUBJECT, SUBJECT_VARIABLE};
