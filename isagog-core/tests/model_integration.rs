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

//! Integration tests for knowledge graph records

use isagog_core::vocab::{OWL_THING, PROFILE};
use isagog_core::{uri_label, Entity, Individual, Ontology, OntologyFormat};
use proptest::prelude::*;
use serde_json::json;

/// A full service record with nested related individuals
#[test]
fn test_individual_record() {
    let record = json!({
        "id": "<http://ex.org/alice>",
        "label": "Alice",
        "kinds": ["http://ex.org/Person"],
        "comment": "climber",
        "score": 0.75,
        "attributes": [
            {"property": "http://ex.org/age", "values": [42], "type": "integer"},
            {"id": PROFILE, "values": ["alpine=4"]}
        ],
        "relations": [{
            "id": "http://ex.org/knows",
            "values": [
                {"id": "http://ex.org/bob", "kinds": ["http://ex.org/Person"]},
                {"id": "http://ex.org/acme"}
            ]
        }]
    });

    let alice: Individual = serde_json::from_value(record).unwrap();
    assert_eq!(alice.id(), "http://ex.org/alice");
    assert_eq!(alice.label(), "Alice");
    assert_eq!(alice.score(), 0.75);
    assert_eq!(alice.profile().get("alpine"), Some(&4));

    let age = alice.get_attribute("http://ex.org/age").unwrap();
    assert_eq!(age.value_type, "integer");
    assert_eq!(age.first_value(), Some(&json!(42)));

    let knows = alice.get_relation("http://ex.org/knows").unwrap();
    assert_eq!(knows.all_values(), vec!["http://ex.org/bob", "http://ex.org/acme"]);
    let kinds = knows.kind_map();
    assert_eq!(kinds["http://ex.org/Person"].len(), 1);
    assert_eq!(kinds[OWL_THING][0].label, "acme");
    assert!(!alice.has_relation("http://ex.org/owns"));
}

/// Ontologies load from disk
#[test]
fn test_ontology_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("onto.nt");
    std::fs::write(
        &path,
        "<http://ex.org/Dog> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/2002/07/owl#Class> .\n",
    )
    .unwrap();

    let onto = Ontology::from_file(&path, "http://ex.org", OntologyFormat::NTriples).unwrap();
    assert_eq!(onto.concepts().len(), 1);
    assert_eq!(onto.iri(), "http://ex.org");

    assert!(Ontology::from_file(dir.path().join("missing.ttl"), "http://ex.org", OntologyFormat::Turtle).is_err());
}

proptest! {
    /// The label never contains a separator
    #[test]
    fn prop_uri_label_is_local(uri in "[a-z:/#.]{0,40}") {
        let label = uri_label(&uri);
        prop_assert!(!label.contains('#') && !label.contains('/'));
        prop_assert!(uri.ends_with(label));
    }
}
