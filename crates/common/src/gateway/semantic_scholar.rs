//! Semantic Scholar Graph API client
//!
//! Plain transport: one HTTP request per call, status mapped to
//! `ProviderError`. Pacing, retries and the breaker live in the gateway.

use super::provider::{
    AcademicProvider, AuthorCandidate, AuthorProfile, Paper, ProviderError, ProviderResult,
    RelationDirection,
};
use crate::config::SourceConfig;
use crate::errors::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

const AUTHOR_FIELDS: &str = "authorId,name,affiliations,hIndex,citationCount,paperCount,homepage";
const PROFILE_FIELDS: &str = "authorId,name,affiliations,hIndex,citationCount,paperCount,homepage,\
papers.paperId,papers.title,papers.abstract,papers.year,papers.authors";
const PAPER_FIELDS: &str = "paperId,title,abstract,year,authors";
const SEARCH_PAPER_FIELDS: &str = "paperId,title,abstract,year,authors.authorId,authors.name,authors.affiliations";

#[derive(Deserialize)]
struct DataPage<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CitingEntry {
    citing_paper: Option<Paper>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CitedEntry {
    cited_paper: Option<Paper>,
}

pub struct SemanticScholarClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl SemanticScholarClient {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("piscout/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    /// GET a JSON document. 404 is `Ok(None)`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ProviderResult<Option<T>> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url).query(query);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ProviderError::from_status(status.as_u16()));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| ProviderError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl AcademicProvider for SemanticScholarClient {
    fn name(&self) -> &str {
        "semantic_scholar"
    }

    async fn search_author(&self, name: &str, limit: usize) -> ProviderResult<Vec<AuthorCandidate>> {
        let page: Option<DataPage<AuthorCandidate>> = self
            .get_json(
                "/author/search",
                &[
                    ("query", name.to_string()),
                    ("fields", AUTHOR_FIELDS.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(page.map(|p| p.data).unwrap_or_default())
    }

    async fn get_author_profile(&self, author_id: &str) -> ProviderResult<Option<AuthorProfile>> {
        self.get_json(
            &format!("/author/{}", author_id),
            &[("fields", PROFILE_FIELDS.to_string())],
        )
        .await
    }

    async fn get_paper_relations(
        &self,
        paper_id: &str,
        direction: RelationDirection,
        limit: usize,
    ) -> ProviderResult<Vec<Paper>> {
        let query = [
            ("fields", PAPER_FIELDS.to_string()),
            ("limit", limit.to_string()),
        ];
        let papers = match direction {
            RelationDirection::Citing => {
                let page: Option<DataPage<CitingEntry>> = self
                    .get_json(&format!("/paper/{}/citations", paper_id), &query)
                    .await?;
                page.map(|p| p.data.into_iter().filter_map(|e| e.citing_paper).collect::<Vec<_>>())
            }
            RelationDirection::Cited => {
                let page: Option<DataPage<CitedEntry>> = self
                    .get_json(&format!("/paper/{}/references", paper_id), &query)
                    .await?;
                page.map(|p| p.data.into_iter().filter_map(|e| e.cited_paper).collect())
            }
        };
        Ok(papers
            .unwrap_or_default()
            .into_iter()
            .filter(|p: &Paper| !p.paper_id.is_empty())
            .collect())
    }

    async fn search_papers(
        &self,
        query: &str,
        since_year: Option<i32>,
        limit: usize,
    ) -> ProviderResult<Vec<Paper>> {
        let mut params = vec![
            ("query", query.to_string()),
            ("fields", SEARCH_PAPER_FIELDS.to_string()),
        ];
        if let Some(year) = since_year {
            params.push(("year", format!("{}-", year)));
        }
        let page: Option<DataPage<Paper>> = self.get_json("/paper/search/bulk", &params).await?;
        Ok(page
            .map(|p| p.data.into_iter().take(limit).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer, api_key: Option<&str>) -> SemanticScholarClient {
        let config = SourceConfig {
            base_url: server.uri(),
            api_key: api_key.map(String::from),
            timeout_secs: 5,
            ..Default::default()
        };
        SemanticScholarClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_author_search_sends_key_and_parses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/author/search"))
            .and(query_param("query", "Feng Zhang"))
            .and(header("x-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total": 2,
                "data": [
                    {"authorId": "1", "name": "Feng Zhang", "hIndex": 122, "affiliations": ["Broad Institute"]},
                    {"authorId": "2", "name": "Feng Zhang", "hIndex": 15, "affiliations": null}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("secret")).await;
        let hits = client.search_author("Feng Zhang", 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].h_index, Some(122));
        assert!(hits[1].affiliations.is_empty());
    }

    #[tokio::test]
    async fn test_missing_author_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/author/404"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server, None).await;
        assert!(client.get_author_profile("404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_citations_unwrap_citing_paper() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/paper/p1/citations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"citingPaper": {"paperId": "c1", "title": "Cas12 in thermophiles", "year": 2024,
                                     "authors": [{"authorId": "9", "name": "Li Wei"}]}},
                    {"citingPaper": {"paperId": null, "title": "unresolved"}}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, None).await;
        let papers = client
            .get_paper_relations("p1", RelationDirection::Citing, 50)
            .await
            .unwrap();
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].authors[0].name, "Li Wei");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/paper/p1/references"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/paper/p2/references"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/paper/p3/references"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = client_for(&server, None).await;
        let throttled = client.get_paper_relations("p1", RelationDirection::Cited, 5).await;
        assert!(matches!(throttled, Err(ProviderError::Throttled { status: 429 })));
        let failed = client.get_paper_relations("p2", RelationDirection::Cited, 5).await;
        assert!(matches!(failed, Err(ProviderError::Status { status: 500 })));
        let malformed = client.get_paper_relations("p3", RelationDirection::Cited, 5).await;
        assert!(matches!(malformed, Err(ProviderError::Malformed(_))));
    }
}
