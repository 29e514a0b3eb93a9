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

//! NLP client against a mock service

use isagog_client::{ClientError, NlpClient, NlpConfig};
use mockito::{Matcher, Server};
use serde_json::json;

fn client(server: &Server) -> NlpClient {
    NlpClient::new(NlpConfig::new(server.url())).unwrap()
}

fn analysis_body() -> String {
    json!({
        "words": [
            {"id": 0, "text": "Anna", "pos": "PROPN", "lemma": "Anna"},
            {"id": 1, "text": "watches", "pos": "VERB", "lemma": "watch"},
            {"id": 2, "text": "old", "pos": "ADJ", "lemma": "old"},
            {"id": 3, "text": "films", "pos": "NOUN", "lemma": "film"}
        ],
        "entities": [
            {"kind": "PER", "text": "Anna"}
        ]
    })
    .to_string()
}

#[tokio::test]
async fn similarity_ranking_pairs() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/rank")
        .match_body(Matcher::Json(json!({
            "target": "cinema",
            "candidates": ["films", "books"]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[[0, 0.92], [1, 0.13]]")
        .create_async()
        .await;

    let ranking = client(&server)
        .similarity_ranking("cinema", &["films".to_string(), "books".to_string()])
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(ranking, vec![(0, 0.92), (1, 0.13)]);
}

#[tokio::test]
async fn similarity_ranking_bad_index() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/rank")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[[4, 0.5]]")
        .create_async()
        .await;

    let result = client(&server).similarity_ranking("cinema", &["films".to_string()]).await;
    assert!(matches!(result, Err(ClientError::MalformedResponse(_))));
}

#[tokio::test]
async fn extract_keywords_first_column() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/analyze")
        .match_header("accept", "application/json")
        .match_body(Matcher::Json(json!({
            "text": "Anna watches old films",
            "tasks": ["keyword"],
            "keyword_number": 2
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"keyword": [["films", 0.8], ["Anna", 0.5]]}).to_string())
        .create_async()
        .await;

    let keywords = client(&server).extract_keywords("Anna watches old films", 2).await.unwrap();

    mock.assert_async().await;
    assert_eq!(keywords, vec!["films", "Anna"]);
}

#[tokio::test]
async fn extract_words_default_filter() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/analyze")
        .match_body(Matcher::PartialJson(json!({"tasks": ["word"]})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(analysis_body())
        .create_async()
        .await;

    let words = client(&server).extract_words("Anna watches old films", None).await.unwrap();
    assert_eq!(words, vec!["Anna", "films"]);
}

#[tokio::test]
async fn extract_words_custom_filter() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/analyze")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(analysis_body())
        .create_async()
        .await;

    let filter = vec!["VERB".to_string()];
    let words = client(&server)
        .extract_words("Anna watches old films", Some(filter.as_slice()))
        .await
        .unwrap();
    assert_eq!(words, vec!["watches"]);
}

#[tokio::test]
async fn extract_words_entities_lexical() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/analyze")
        .match_body(Matcher::PartialJson(json!({"tasks": ["word", "entity"]})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(analysis_body())
        .create_async()
        .await;

    let (words, entities) = client(&server)
        .extract_words_entities("Anna watches old films", None)
        .await
        .unwrap();

    let texts: Vec<_> = words.iter().map(|w| w.text.as_str()).collect();
    assert_eq!(texts, vec!["Anna", "watches", "old", "films"]);
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].kind, "PER");
}

#[tokio::test]
async fn analyze_failure_is_api_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/analyze")
        .with_status(503)
        .with_body("overloaded")
        .create_async()
        .await;

    match client(&server).extract_keywords("text", 5).await {
        Err(ClientError::Api { status, .. }) => assert_eq!(status, 503),
        other => panic!("expected api error, got {:?}", other),
    }
}
