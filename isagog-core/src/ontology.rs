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

//! In-memory ontology index
//!
//! Loads an RDF ontology and indexes its classes, properties and declared
//! `rdfs:subClassOf` edges. Subclass lookup is the only reasoning performed.

use crate::error::{ModelError, Result};
use crate::model::{Attribute, Concept, Relation};
use crate::vocab::{
    OWL_ANNOTATION_PROPERTY, OWL_CLASS, OWL_DATATYPE_PROPERTY, OWL_OBJECT_PROPERTY, RDFS_SUBCLASS_OF,
    RDF_TYPE,
};
use sophia_api::source::TripleSource;
use sophia_api::term::{SimpleTerm, Term};
use sophia_turtle::parser::{nt, turtle};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Serialization of an ontology source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OntologyFormat {
    #[default]
    Turtle,
    NTriples,
}

impl FromStr for OntologyFormat {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "turtle" | "ttl" => Ok(OntologyFormat::Turtle),
            "nt" | "ntriples" | "n-triples" => Ok(OntologyFormat::NTriples),
            other => Err(ModelError::UnknownFormat(other.to_string())),
        }
    }
}

type Triple = [SimpleTerm<'static>; 3];

fn iri_of(term: &SimpleTerm<'static>) -> Option<String> {
    term.iri().map(|iri| iri.as_str().to_string())
}

/// A read-only ontology.
#[derive(Debug, Clone)]
pub struct Ontology {
    iri: String,
    concepts: Vec<Concept>,
    relations: Vec<Relation>,
    /// Datatype and annotation properties
    attributes: Vec<Attribute>,
    /// Direct subclasses by superclass IRI
    subclasses: BTreeMap<String, Vec<String>>,
}

impl Ontology {
    /// Parses `source` as an ontology published at `public_iri`.
    pub fn parse(source: &str, public_iri: impl Into<String>, format: OntologyFormat) -> Result<Self> {
        let triples: Vec<Triple> = match format {
            OntologyFormat::Turtle => turtle::parse_str(source)
                .collect_triples()
                .map_err(|e| ModelError::Parse(e.to_string()))?,
            OntologyFormat::NTriples => nt::parse_str(source)
                .collect_triples()
                .map_err(|e| ModelError::Parse(e.to_string()))?,
        };

        let ontology = Self::index(public_iri.into(), &triples);
        info!(
            iri = %ontology.iri,
            triples = triples.len(),
            concepts = ontology.concepts.len(),
            relations = ontology.relations.len(),
            attributes = ontology.attributes.len(),
            "ontology loaded"
        );
        Ok(ontology)
    }

    /// Reads and parses an ontology file.
    pub fn from_file(path: impl AsRef<Path>, public_iri: impl Into<String>, format: OntologyFormat) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading ontology");
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source, public_iri, format)
    }

    fn index(iri: String, triples: &[Triple]) -> Self {
        let mut ontology = Ontology {
            iri,
            concepts: Vec::new(),
            relations: Vec::new(),
            attributes: Vec::new(),
            subclasses: BTreeMap::new(),
        };

        for [s, p, o] in triples {
            let (Some(subject), Some(predicate), Some(object)) = (iri_of(s), iri_of(p), iri_of(o)) else {
                continue;
            };
            match (predicate.as_str(), object.as_str()) {
                (RDF_TYPE, OWL_CLASS) => ontology.concepts.push(Concept::new(&subject)),
                (RDF_TYPE, OWL_OBJECT_PROPERTY) => ontology.relations.push(Relation::new(&subject)),
                (RDF_TYPE, OWL_DATATYPE_PROPERTY) | (RDF_TYPE, OWL_ANNOTATION_PROPERTY) => {
                    ontology.attributes.push(Attribute::new(&subject))
                }
                (RDFS_SUBCLASS_OF, _) => ontology
                    .subclasses
                    .entry(object.clone())
                    .or_default()
                    .push(subject.clone()),
                _ => {}
            }
        }
        ontology
    }

    pub fn iri(&self) -> &str {
        &self.iri
    }

    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Direct subclasses of `sup`.
    pub fn subclasses(&self, sup: &Concept) -> Vec<Concept> {
        self.subclasses
            .get(&sup.id)
            .map(|subs| subs.iter().map(Concept::new).collect())
            .unwrap_or_default()
    }

    /// Whether `sub` is `sup` or one of its direct or indirect subclasses.
    pub fn is_subclass(&self, sub: &Concept, sup: &Concept) -> bool {
        if sub == sup {
            return true;
        }
        let mut seen = HashSet::new();
        let mut pending = vec![sup.id.as_str()];
        while let Some(current) = pending.pop() {
            if !seen.insert(current) {
                continue;
            }
            for child in self.subclasses.get(current).into_iter().flatten() {
                if *child == sub.id {
                    return true;
                }
                pending.push(child.as_str());
            }
        }
        false
    }
}
