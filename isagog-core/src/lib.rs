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

//! Isagog Core
//!
//! Records exchanged with the Isagog knowledge graph and NLP services, and a
//! small in-memory ontology index.

pub mod error;
pub mod model;
pub mod nlp;
pub mod ontology;
pub mod vocab;

pub use error::{ModelError, Result};
pub use model::{
    uri_label, Assertion, Attribute, AttributeInstance, Concept, Entity, Individual, OwlKind,
    Relation, RelationInstance,
};
pub use nlp::{filter_pos, NamedEntity, Word};
pub use ontology::{Ontology, OntologyFormat};
