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

//! Knowledge graph service client

use crate::config::KgConfig;
use crate::error::{ClientError, Result};
use crate::http::{build_client, send};
use isagog_core::{Assertion, Individual, Ontology};
use isagog_query::{
    AtomicClause, Comparison, DisjunctiveClause, Identifier, UnarySelectQuery, Value,
};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::Value as Json;
use tracing::{debug, warn};

/// Proxy for one knowledge graph endpoint.
pub struct KnowledgeBase {
    config: KgConfig,
    http: HttpClient,
    ontology: Option<Ontology>,
}

#[derive(Deserialize)]
struct AssertionRecord {
    #[serde(default)]
    attributes: Vec<PropertyRecord>,
}

#[derive(Deserialize)]
struct PropertyRecord {
    id: String,
    values: Option<Vec<Json>>,
}

impl KnowledgeBase {
    pub fn new(config: KgConfig) -> Result<Self> {
        let http = build_client(config.timeout())?;
        Ok(Self {
            config,
            http,
            ontology: None,
        })
    }

    pub fn with_ontology(mut self, ontology: Ontology) -> Self {
        self.ontology = Some(ontology);
        self
    }

    pub fn config(&self) -> &KgConfig {
        &self.config
    }

    pub fn ontology(&self) -> Option<&Ontology> {
        self.ontology.as_ref()
    }

    /// Gets all the data of an individual.
    pub async fn fetch_entity(&self, id: &str) -> Result<Individual> {
        if id.is_empty() {
            return Err(ClientError::InvalidRequest("empty entity id".to_string()));
        }

        let mut params = vec![("id", id), ("expand", "true")];
        if let Some(dataset) = &self.config.dataset {
            params.push(("dataset", dataset.as_str()));
        }

        let mut record: Json = send(self.http.get(&self.config.route).query(&params), "fetch_entity").await?;
        // the service may omit the id it was asked for
        if let Json::Object(map) = &mut record {
            map.entry("id").or_insert_with(|| Json::String(id.to_string()));
        }

        let individual = serde_json::from_value(record)?;
        debug!("Fetched {}", id);
        Ok(individual)
    }

    /// Query fetching each of `properties` for `subject`.
    pub fn assertions_query(subject: Identifier, properties: &[Identifier]) -> UnarySelectQuery {
        let mut query = UnarySelectQuery::for_subject(subject);
        for property in properties {
            query.add_fetch_clause(property.clone());
        }
        query
    }

    /// Values of `properties` on `subject`, one assertion per property in
    /// the order given.
    pub async fn query_assertions(
        &self,
        subject: &Individual,
        properties: &[Identifier],
    ) -> Result<Vec<Assertion>> {
        if properties.is_empty() {
            return Err(ClientError::InvalidRequest("no properties to query".to_string()));
        }

        let query = Self::assertions_query(Identifier::new(&subject.id)?, properties);
        let records: Vec<AssertionRecord> = self.post_query(&query, "query_assertions").await?;

        let Some(record) = records.into_iter().next() else {
            warn!("Void attribute query on {}", subject.id);
            return Ok(Vec::new());
        };

        properties
            .iter()
            .map(|property| -> Result<Assertion> {
                let found = record
                    .attributes
                    .iter()
                    .find(|attr| attr.id.trim_start_matches('<').trim_end_matches('>') == property.as_str())
                    .ok_or_else(|| {
                        ClientError::MalformedResponse(format!("incomplete response: {} not found", property))
                    })?;
                let values = found.values.clone().ok_or_else(|| {
                    ClientError::MalformedResponse(format!("no values for {}", property))
                })?;
                Ok(Assertion::new(property.as_str(), Some(&subject.id), values))
            })
            .collect()
    }

    /// Query matching individuals of any of `kinds` whose attributes match
    /// any of the `(attribute, pattern)` pairs.
    pub fn search_query(kinds: &[Identifier], search_values: &[(Identifier, Value)]) -> Result<UnarySelectQuery> {
        if kinds.is_empty() && search_values.is_empty() {
            return Err(ClientError::InvalidRequest(
                "search needs kinds or search values".to_string(),
            ));
        }

        let mut query = UnarySelectQuery::new();
        query.add_kinds(kinds.iter().cloned());

        match search_values {
            [] => {}
            [(attribute, value)] => {
                let clause = AtomicClause::new(attribute.clone())
                    .with_argument(value.clone())
                    .with_method(Comparison::Regex);
                query.add(clause)?;
            }
            pairs => {
                let mut union = DisjunctiveClause::with_subject(query.subject().clone());
                for (attribute, value) in pairs {
                    union.add_atomic_clause(attribute.clone(), value.clone(), Comparison::Regex, true, false);
                }
                query.add(union)?;
            }
        }
        Ok(query)
    }

    pub async fn search_individuals(
        &self,
        kinds: &[Identifier],
        search_values: &[(Identifier, Value)],
    ) -> Result<Vec<Individual>> {
        let query = Self::search_query(kinds, search_values)?;
        self.query_individuals(&query).await
    }

    pub async fn query_individuals(&self, query: &UnarySelectQuery) -> Result<Vec<Individual>> {
        let individuals: Vec<Individual> = self.post_query(query, "query_individuals").await?;
        debug!("Query returned {} individuals", individuals.len());
        Ok(individuals)
    }

    /// The dict POSTed for `query`: its dict form plus the dataset, if any.
    pub fn request_body(&self, query: &UnarySelectQuery) -> Result<Json> {
        let mut body = query.to_dict(self.config.version)?;
        if let (Some(dataset), Json::Object(map)) = (&self.config.dataset, &mut body) {
            map.insert("dataset".to_string(), Json::String(dataset.clone()));
        }
        Ok(body)
    }

    async fn post_query<T: serde::de::DeserializeOwned>(
        &self,
        query: &UnarySelectQuery,
        operation: &str,
    ) -> Result<T> {
        let body = self.request_body(query)?;
        debug!(operation, subject = %query.subject(), "posting query");
        send(self.http.post(&self.config.route).json(&body), operation).await
    }
}
