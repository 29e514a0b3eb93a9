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

//! Knowledge graph records
//!
//! Entities mirror the OWL terms of an ontology; [`Individual`] and the
//! assertion instances mirror the records returned by the knowledge graph
//! service.

use crate::error::ModelError;
use crate::vocab::{OWL_CLASS, OWL_DATATYPE_PROPERTY, OWL_OBJECT_PROPERTY, OWL_THING, PROFILE};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::{BTreeMap, HashMap};

/// The local name of an IRI: the part after the last `#` or `/`.
pub fn uri_label(uri: &str) -> &str {
    uri.rsplit(|c: char| c == '#' || c == '/')
        .next()
        .unwrap_or(uri)
}

fn strip_brackets(id: &str) -> String {
    id.trim_start_matches('<').trim_end_matches('>').to_string()
}

fn owl_thing() -> Vec<String> {
    vec![OWL_THING.to_string()]
}

fn thing() -> String {
    OWL_THING.to_string()
}

/// OWL term kind of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwlKind {
    Axiom,
    NamedIndividual,
    ObjectProperty,
    DatatypeProperty,
    Class,
}

impl OwlKind {
    pub fn iri(&self) -> &'static str {
        match self {
            OwlKind::Axiom => "http://www.w3.org/2002/07/owl#Axiom",
            OwlKind::NamedIndividual => "http://www.w3.org/2002/07/owl#NamedIndividual",
            OwlKind::ObjectProperty => OWL_OBJECT_PROPERTY,
            OwlKind::DatatypeProperty => OWL_DATATYPE_PROPERTY,
            OwlKind::Class => OWL_CLASS,
        }
    }
}

/// Any identified knowledge entity.
pub trait Entity {
    /// The IRI, without angle brackets
    fn id(&self) -> &str;

    fn owl_kind(&self) -> OwlKind;

    fn n3(&self) -> String {
        format!("<{}>", self.id())
    }

    fn label(&self) -> &str {
        uri_label(self.id())
    }
}

/// A unary predicate, `owl:Class`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub ontology: String,
    #[serde(default = "owl_thing")]
    pub parents: Vec<String>,
}

impl Concept {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self {
            id: strip_brackets(id.as_ref()),
            comment: String::new(),
            ontology: String::new(),
            parents: owl_thing(),
        }
    }

    pub fn thing() -> Self {
        Self::new(OWL_THING)
    }
}

impl Entity for Concept {
    fn id(&self) -> &str {
        &self.id
    }

    fn owl_kind(&self) -> OwlKind {
        OwlKind::Class
    }
}

/// Concepts are the same concept when their IRIs are.
impl PartialEq for Concept {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Concept {}

impl std::hash::Hash for Concept {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A property ranging on concrete values, `owl:DatatypeProperty`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: String,
    #[serde(default = "thing")]
    pub domain: String,
}

impl Attribute {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self {
            id: strip_brackets(id.as_ref()),
            domain: thing(),
        }
    }
}

impl Entity for Attribute {
    fn id(&self) -> &str {
        &self.id
    }

    fn owl_kind(&self) -> OwlKind {
        OwlKind::DatatypeProperty
    }
}

/// A property ranging on individuals, `owl:ObjectProperty`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub id: String,
    #[serde(default)]
    pub inverse: Option<String>,
    #[serde(default = "thing")]
    pub domain: String,
    #[serde(default = "thing")]
    pub range: String,
    #[serde(default)]
    pub label: String,
}

impl Relation {
    pub fn new(id: impl AsRef<str>) -> Self {
        let id = strip_brackets(id.as_ref());
        Self {
            label: uri_label(&id).to_string(),
            id,
            inverse: None,
            domain: thing(),
            range: thing(),
        }
    }
}

impl Entity for Relation {
    fn id(&self) -> &str {
        &self.id
    }

    fn owl_kind(&self) -> OwlKind {
        OwlKind::ObjectProperty
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// `property(subject, values)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    pub property: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub values: Vec<Json>,
}

impl Assertion {
    pub fn new(property: impl AsRef<str>, subject: Option<&str>, values: Vec<Json>) -> Self {
        Self {
            property: strip_brackets(property.as_ref()),
            subject: subject.map(strip_brackets),
            values,
        }
    }
}

fn default_value_type() -> String {
    "string".to_string()
}

// strings without their JSON quotes
fn value_text(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Values of one attribute of an individual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeInstance {
    #[serde(alias = "id")]
    pub property: String,
    #[serde(default)]
    pub values: Vec<Json>,
    #[serde(rename = "type", default = "default_value_type")]
    pub value_type: String,
}

impl AttributeInstance {
    pub fn new(property: impl AsRef<str>, values: Vec<Json>) -> Self {
        Self {
            property: strip_brackets(property.as_ref()),
            values,
            value_type: default_value_type(),
        }
    }

    /// Values joined by newlines.
    pub fn all_values_as_string(&self) -> String {
        self.values.iter().map(value_text).collect::<Vec<_>>().join("\n")
    }

    pub fn first_value(&self) -> Option<&Json> {
        self.values.first()
    }

    /// No values, or the service's `"None"` placeholder.
    pub fn is_empty(&self) -> bool {
        match self.values.first() {
            None => true,
            Some(first) => first.as_str() == Some("None"),
        }
    }
}

/// Individuals related to an individual through one relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationInstance {
    #[serde(alias = "id")]
    pub property: String,
    #[serde(default)]
    pub values: Vec<Individual>,
}

impl RelationInstance {
    pub fn new(property: impl AsRef<str>, values: Vec<Individual>) -> Self {
        Self {
            property: strip_brackets(property.as_ref()),
            values,
        }
    }

    pub fn all_values(&self) -> Vec<&str> {
        self.values.iter().map(|ind| ind.id.as_str()).collect()
    }

    pub fn first_value(&self) -> Option<&Individual> {
        self.values.first()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Related individuals grouped by each of their kinds.
    pub fn kind_map(&self) -> BTreeMap<&str, Vec<&Individual>> {
        let mut map: BTreeMap<&str, Vec<&Individual>> = BTreeMap::new();
        for individual in &self.values {
            for kind in &individual.kinds {
                map.entry(kind.as_str()).or_default().push(individual);
            }
        }
        map
    }
}

/// The wire shape of an individual; defaults are filled in by the conversion.
#[derive(Deserialize)]
struct IndividualRecord {
    id: String,
    label: Option<String>,
    kinds: Option<Vec<String>>,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    attributes: Vec<AttributeInstance>,
    #[serde(default)]
    relations: Vec<RelationInstance>,
    score: Option<f64>,
}

/// An individual as returned by the knowledge graph service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IndividualRecord")]
pub struct Individual {
    pub id: String,
    pub label: String,
    pub kinds: Vec<String>,
    pub comment: String,
    pub attributes: Vec<AttributeInstance>,
    pub relations: Vec<RelationInstance>,
    pub score: f64,
    /// `key=count` entries of the profile attribute
    pub profile: HashMap<String, i64>,
}

impl TryFrom<IndividualRecord> for Individual {
    type Error = ModelError;

    fn try_from(record: IndividualRecord) -> Result<Self, ModelError> {
        let id = strip_brackets(&record.id);
        let mut individual = Individual {
            label: record.label.unwrap_or_else(|| uri_label(&id).to_string()),
            id,
            kinds: record.kinds.unwrap_or_else(owl_thing),
            comment: record.comment,
            attributes: record.attributes,
            relations: record.relations,
            score: record.score.unwrap_or(0.0),
            profile: HashMap::new(),
        };
        individual.profile = individual.parse_profile()?;
        Ok(individual)
    }
}

impl Individual {
    pub fn new(id: impl AsRef<str>) -> Self {
        let id = strip_brackets(id.as_ref());
        Self {
            label: uri_label(&id).to_string(),
            id,
            kinds: owl_thing(),
            comment: String::new(),
            attributes: Vec::new(),
            relations: Vec::new(),
            score: 0.0,
            profile: HashMap::new(),
        }
    }

    fn parse_profile(&self) -> Result<HashMap<String, i64>, ModelError> {
        let Some(profile) = self.get_attribute(PROFILE) else {
            return Ok(HashMap::new());
        };
        profile
            .values
            .iter()
            .map(|value| -> Result<(String, i64), ModelError> {
                let entry = value_text(value);
                let (key, count) = entry.split_once('=').ok_or_else(|| ModelError::InvalidProfile {
                    entry: entry.clone(),
                    reason: "expected key=count".to_string(),
                })?;
                let count = count.trim().parse::<i64>().map_err(|e| ModelError::InvalidProfile {
                    entry: entry.clone(),
                    reason: e.to_string(),
                })?;
                Ok((key.trim().to_string(), count))
            })
            .collect()
    }

    /// Whether the attribute is present with at least one value.
    pub fn has_attribute(&self, attribute_id: &str) -> bool {
        self.get_attribute(attribute_id).is_some()
    }

    pub fn get_attribute(&self, attribute_id: &str) -> Option<&AttributeInstance> {
        self.attributes
            .iter()
            .find(|a| a.property == attribute_id)
            .filter(|a| !a.is_empty())
    }

    pub fn has_relation(&self, relation_id: &str) -> bool {
        self.get_relation(relation_id).is_some()
    }

    pub fn get_relation(&self, relation_id: &str) -> Option<&RelationInstance> {
        self.relations
            .iter()
            .find(|r| r.property == relation_id)
            .filter(|r| !r.is_empty())
    }

    pub fn set_score(&mut self, score: f64) {
        self.score = score;
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn profile(&self) -> &HashMap<String, i64> {
        &self.profile
    }
}

impl Entity for Individual {
    fn id(&self) -> &str {
        &self.id
    }

    fn owl_kind(&self) -> OwlKind {
        OwlKind::NamedIndividual
    }

    fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_uri_label() {
        assert_eq!(uri_label("http://ex.org/onto#Person"), "Person");
        assert_eq!(uri_label("http://ex.org/people/alice"), "alice");
        assert_eq!(uri_label("alice"), "alice");
    }

    #[test]
    fn test_entity_ids_drop_brackets() {
        let concept = Concept::new("<http://ex.org/Person>");
        assert_eq!(concept.id(), "http://ex.org/Person");
        assert_eq!(concept.n3(), "<http://ex.org/Person>");
        assert_eq!(concept.parents, vec![OWL_THING.to_string()]);

        let relation = Relation::new("http://ex.org/onto#knows");
        assert_eq!(relation.label(), "knows");
        assert_eq!(relation.owl_kind(), OwlKind::ObjectProperty);
    }

    #[test]
    fn test_individual_defaults() {
        let ind: Individual = serde_json::from_value(json!({"id": "http://ex.org/alice"})).unwrap();
        assert_eq!(ind.label, "alice");
        assert_eq!(ind.kinds, vec![OWL_THING.to_string()]);
        assert_eq!(ind.score(), 0.0);
        assert!(ind.profile().is_empty());
    }

    #[test]
    fn test_individual_profile() {
        let ind: Individual = serde_json::from_value(json!({
            "id": "http://ex.org/alice",
            "attributes": [
                {"id": PROFILE, "values": ["sport=3", "music=1"]},
                {"property": "http://ex.org/nick", "values": ["None"]}
            ]
        }))
        .unwrap();
        assert_eq!(ind.profile().get("sport"), Some(&3));
        assert_eq!(ind.profile().get("music"), Some(&1));
        assert!(!ind.has_attribute("http://ex.org/nick"));
        assert!(ind.get_attribute("http://ex.org/missing").is_none());
    }

    #[test]
    fn test_bad_profile_rejected() {
        let result: Result<Individual, _> = serde_json::from_value(json!({
            "id": "http://ex.org/alice",
            "attributes": [{"id": PROFILE, "values": ["sport=lots"]}]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_attribute_values() {
        let attr = AttributeInstance::new("http://ex.org/alias", vec![json!("Ada"), json!(3)]);
        assert_eq!(attr.all_values_as_string(), "Ada\n3");
        assert_eq!(attr.first_value(), Some(&json!("Ada")));
        assert!(!attr.is_empty());
        assert!(AttributeInstance::new("http://ex.org/alias", Vec::new()).is_empty());
    }

    #[test]
    fn test_relation_kind_map() {
        let mut bob = Individual::new("http://ex.org/bob");
        bob.kinds = vec!["http://ex.org/Person".into(), "http://ex.org/Climber".into()];
        let mut acme = Individual::new("http://ex.org/acme");
        acme.kinds = vec!["http://ex.org/Company".into()];
        let carol = {
            let mut carol = Individual::new("http://ex.org/carol");
            carol.kinds = vec!["http://ex.org/Person".into()];
            carol
        };

        let rel = RelationInstance::new("http://ex.org/knows", vec![bob, acme, carol]);
        let map = rel.kind_map();
        assert_eq!(map["http://ex.org/Person"].len(), 2);
        assert_eq!(map["http://ex.org/Company"].len(), 1);
        assert_eq!(rel.all_values()[0], "http://ex.org/bob");
        assert_eq!(rel.first_value().map(|i| i.id.as_str()), Some("http://ex.org/bob"));
    }
}
