use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::Retriever;
use crate::error::{QuizError, QuizResult};
use crate::ingest::Document;

const MAX_QUERY_LENGTH: usize = 300;

#[derive(Debug, Clone)]
pub struct WikipediaRetriever {
    client: reqwest::Client,
    pub lang: String,
    pub top_k_results: usize,
    /// Page content is cut to this many characters
    pub doc_content_chars_max: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    query: Option<PageQuery>,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    pages: HashMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    extract: Option<String>,
    fullurl: Option<String>,
    missing: Option<serde_json::Value>,
}

impl Default for WikipediaRetriever {
    fn default() -> Self {
        Self::new(2)
    }
}

impl WikipediaRetriever {
    pub fn new(top_k_results: usize) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("quizgpt/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            lang: "en".to_string(),
            top_k_results,
            doc_content_chars_max: 4000,
        }
    }

    fn api_url(&self) -> String {
        format!("https://{}.wikipedia.org/w/api.php", self.lang)
    }

    async fn search_titles(&self, query: &str) -> QuizResult<Vec<String>> {
        let limit = self.top_k_results.to_string();
        let response = self
            .client
            .get(self.api_url())
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("format", "json"),
                ("srprop", ""),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(QuizError::Retrieval(format!(
                "search returned {}",
                response.status()
            )));
        }

        let parsed: SearchResponse = response.json().await?;
        Ok(parsed
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default())
    }

    async fn fetch_page(&self, title: &str) -> QuizResult<Option<Document>> {
        let response = self
            .client
            .get(self.api_url())
            .query(&[
                ("action", "query"),
                ("prop", "extracts|info"),
                ("inprop", "url"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("format", "json"),
                ("titles", title),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(QuizError::Retrieval(format!(
                "page '{}' returned {}",
                title,
                response.status()
            )));
        }

        let parsed: PageResponse = response.json().await?;
        let page = parsed
            .query
            .and_then(|q| q.pages.into_values().next())
            .filter(|p| p.missing.is_none());

        Ok(page.and_then(|p| page_to_document(p, self.doc_content_chars_max)))
    }
}

fn page_to_document(page: Page, max_chars: usize) -> Option<Document> {
    let extract = page.extract.filter(|e| !e.trim().is_empty())?;
    let summary = extract
        .split("\n\n")
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();
    let content: String = extract.chars().take(max_chars).collect();

    let mut doc = Document::new(content)
        .with_metadata("title", page.title)
        .with_metadata("summary", summary);
    if let Some(url) = page.fullurl {
        doc = doc.with_metadata("source", url);
    }
    Some(doc)
}

#[async_trait]
impl Retriever for WikipediaRetriever {
    async fn get_relevant_documents(&self, query: &str) -> QuizResult<Vec<Document>> {
        let query: String = query.chars().take(MAX_QUERY_LENGTH).collect();
        info!(%query, top_k = self.top_k_results, "searching Wikipedia");

        let titles = self.search_titles(&query).await?;
        debug!(?titles, "search results");

        let mut docs = Vec::new();
        for title in titles.iter().take(self.top_k_results) {
            match self.fetch_page(title).await {
                Ok(Some(doc)) => docs.push(doc),
                Ok(None) => debug!(%title, "page has no text"),
                Err(e) => warn!(%title, error = %e, "skipping page"),
            }
        }

        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_to_document_truncates_and_tags() {
        let page = Page {
            title: "Paris".to_string(),
            extract: Some(format!("Paris is a city.\n\n{}", "x".repeat(5000))),
            fullurl: Some("https://en.wikipedia.org/wiki/Paris".to_string()),
            missing: None,
        };

        let doc = page_to_document(page, 4000).unwrap();
        assert_eq!(doc.page_content.chars().count(), 4000);
        assert_eq!(doc.metadata["title"], "Paris");
        assert_eq!(doc.metadata["summary"], "Paris is a city.");
        assert_eq!(doc.source(), Some("https://en.wikipedia.org/wiki/Paris"));
    }

    #[test]
    fn test_page_without_extract_is_skipped() {
        let page = Page {
            title: "Empty".to_string(),
            extract: Some("  ".to_string()),
            fullurl: None,
            missing: None,
        };
        assert!(page_to_document(page, 4000).is_none());
    }

    #[test]
    fn test_parses_search_response() {
        let raw = r#"{"batchcomplete":"","query":{"searchinfo":{"totalhits":1},"search":[{"ns":0,"title":"Paris"},{"ns":0,"title":"Paris Hilton"}]}}"#;
        let parsed: SearchResponse = serde_json::from_str(raw).unwrap();
        let titles: Vec<String> = parsed.query.unwrap().search.into_iter().map(|h| h.title).collect();
        assert_eq!(titles, vec!["Paris", "Paris Hilton"]);
    }

    #[test]
    fn test_parses_page_response() {
        let raw = r#"{"query":{"pages":{"22989":{"pageid":22989,"ns":0,"title":"Paris","extract":"Paris is the capital of France.","fullurl":"https://en.wikipedia.org/wiki/Paris"}}}}"#;
        let parsed: PageResponse = serde_json::from_str(raw).unwrap();
        let page = parsed.query.unwrap().pages.into_values().next().unwrap();
        assert_eq!(page.title, "Paris");
        assert!(page.missing.is_none());
    }
}
