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

//! NLP service client

use crate::config::NlpConfig;
use crate::error::{ClientError, Result};
use crate::http::{build_client, send};
use isagog_core::{filter_pos, NamedEntity, Word};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{json, Value as Json};
use tracing::debug;

pub struct NlpClient {
    config: NlpConfig,
    http: HttpClient,
}

#[derive(Deserialize)]
struct KeywordResponse {
    keyword: Vec<Vec<Json>>,
}

#[derive(Deserialize)]
struct WordsResponse {
    words: Vec<Word>,
}

#[derive(Deserialize)]
struct AnalysisResponse {
    words: Vec<Word>,
    #[serde(default)]
    entities: Vec<NamedEntity>,
}

impl NlpClient {
    pub fn new(config: NlpConfig) -> Result<Self> {
        let http = build_client(config.timeout())?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &NlpConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.route.trim_end_matches('/'), path)
    }

    /// Ranks `candidates` by similarity to `target`; pairs of candidate
    /// index and score, as ordered by the service.
    pub async fn similarity_ranking(&self, target: &str, candidates: &[String]) -> Result<Vec<(usize, f64)>> {
        let body = json!({
            "target": target,
            "candidates": candidates,
        });
        let ranking: Vec<(usize, f64)> =
            send(self.http.post(self.endpoint("rank")).json(&body), "similarity_ranking").await?;

        if let Some((index, _)) = ranking.iter().find(|(index, _)| *index >= candidates.len()) {
            return Err(ClientError::MalformedResponse(format!(
                "rank index {} out of {} candidates",
                index,
                candidates.len()
            )));
        }
        Ok(ranking)
    }

    /// The `number` most relevant keywords of `text`.
    pub async fn extract_keywords(&self, text: &str, number: usize) -> Result<Vec<String>> {
        let body = json!({
            "text": text,
            "tasks": ["keyword"],
            "keyword_number": number,
        });
        let response: KeywordResponse = self.analyze(&body, "extract_keywords").await?;

        response
            .keyword
            .into_iter()
            .map(|entry| match entry.into_iter().next() {
                Some(Json::String(word)) => Ok(word),
                other => Err(ClientError::MalformedResponse(format!("bad keyword entry {:?}", other))),
            })
            .collect()
    }

    /// Texts of the words of `text` whose part of speech passes the filter;
    /// the configured search parts of speech when `pos_filter` is `None`.
    pub async fn extract_words(&self, text: &str, pos_filter: Option<&[String]>) -> Result<Vec<String>> {
        let body = json!({
            "text": text,
            "tasks": ["word"],
        });
        let response: WordsResponse = self.analyze(&body, "extract_words").await?;

        let filter = pos_filter.unwrap_or(self.config.search_pos.as_slice());
        Ok(filter_pos(response.words, filter)
            .into_iter()
            .map(|word| word.text)
            .collect())
    }

    /// Words and named entities of `text`. Words are filtered by
    /// `pos_filter`, or the configured lexical parts of speech.
    pub async fn extract_words_entities(
        &self,
        text: &str,
        pos_filter: Option<&[String]>,
    ) -> Result<(Vec<Word>, Vec<NamedEntity>)> {
        let body = json!({
            "text": text,
            "tasks": ["word", "entity"],
        });
        let response: AnalysisResponse = self.analyze(&body, "extract_words_entities").await?;

        let filter = pos_filter.unwrap_or(self.config.lexical_pos.as_slice());
        Ok((filter_pos(response.words, filter), response.entities))
    }

    async fn analyze<T: serde::de::DeserializeOwned>(&self, body: &Json, operation: &str) -> Result<T> {
        debug!(operation, "analyzing text");
        send(self.http.post(self.endpoint("analyze")).json(body), operation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_join() {
        let client = NlpClient::new(NlpConfig::new("http://nlp.test/api/")).unwrap();
        assert_eq!(client.endpoint("rank"), "http://nlp.test/api/rank");

        let client = NlpClient::new(NlpConfig::new("http://nlp.test/api")).unwrap();
        assert_eq!(client.endpoint("analyze"), "http://nlp.test/api/analyze");
    }

    #[test]
    fn test_keyword_response_shape() {
        let response: KeywordResponse =
            serde_json::from_value(json!({"keyword": [["cinema", 0.9], ["film", 0.4]]})).unwrap();
        assert_eq!(response.keyword.len(), 2);
        assert_eq!(response.keyword[0][0], json!("cinema"));
    }
}
