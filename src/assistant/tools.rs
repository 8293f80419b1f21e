use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use super::tool_registry::{query_arg, query_schema, Tool};
use crate::extract::{rewrite, Payload, ResultSanitizer, UrlHarvester};

const SERPAPI_URL: &str = "https://serpapi.com/search.json";
const WIKIPEDIA_API_URL: &str = "https://en.wikipedia.org/w/api.php";
const WIKIPEDIA_SUMMARY_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";
const WIKI_MAX_CHARS: usize = 800;
const MAX_ORGANIC_SNIPPETS: usize = 5;
const IMAGE_QUERY_SUFFIX: &str = " smartphone India";

const NO_QUERY: &str = "Please provide a search query.";
const NO_SEARCH_RESULT: &str = "No good search result found";
const NO_WIKI_RESULT: &str = "No good Wikipedia Search Result was found";
const NO_IMAGES: &str = "No images found.";

/// Build the HTTP client shared by every search tool.
pub fn build_http_client(timeout: std::time::Duration) -> Result<Client> {
    Client::builder()
        .user_agent(concat!("phonebot/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .context("failed to build search reqwest client")
}

/// SerpAPI search endpoint plus credentials, shared by the SerpAPI-backed tools.
///
/// The key travels in the query string, so every transport error is stripped
/// of its URL before it can reach logs, the model or the user.
#[derive(Clone)]
pub struct SerpApiClient {
    http: Client,
    search_url: String,
    api_key: Option<String>,
}

impl SerpApiClient {
    pub fn new(http: Client, api_key: Option<String>) -> Self {
        Self {
            http,
            search_url: SERPAPI_URL.to_string(),
            api_key,
        }
    }

    #[cfg(test)]
    fn with_search_url(mut self, search_url: &str) -> Self {
        self.search_url = search_url.to_string();
        self
    }

    async fn get(&self, params: &[(&str, &str)]) -> Result<Value> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("SERPAPI_API_KEY is not configured"))?;

        let mut url = Url::parse(&self.search_url).context("invalid SerpAPI URL")?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            query.append_pair("api_key", api_key);
        }

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!(e.without_url()))
            .context("failed to call SerpAPI")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read body>".to_string());
            return Err(anyhow!(
                "SerpAPI returned {} (body: {})",
                status,
                body.replace(api_key, "<redacted>")
            ));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| anyhow!(e.without_url()))
            .context("failed to parse SerpAPI response JSON")?;

        if let Some(error) = payload.get("error").and_then(|v| v.as_str()) {
            return Err(anyhow!("Got error from SerpAPI: {}", error));
        }
        Ok(payload)
    }
}

/// Live price and review search (SerpAPI, Google India).
pub struct SerpSearchTool {
    serpapi: SerpApiClient,
    sanitizer: Arc<ResultSanitizer>,
}

impl SerpSearchTool {
    pub fn new(serpapi: SerpApiClient, sanitizer: Arc<ResultSanitizer>) -> Self {
        Self { serpapi, sanitizer }
    }

    async fn search(&self, query: &str) -> Result<String> {
        let rewritten = rewrite(query);
        info!(tool = "SerpSearch", query = %rewritten, "tool start");
        let payload = self
            .serpapi
            .get(&[
                ("engine", "google"),
                ("q", rewritten.as_str()),
                ("gl", "IN"),
                ("google_domain", "google.co.in"),
                ("hl", "en"),
            ])
            .await?;
        Ok(summarize_search_results(&payload))
    }
}

#[async_trait]
impl Tool for SerpSearchTool {
    fn name(&self) -> &str {
        "SerpSearch"
    }

    fn description(&self) -> &str {
        "Use for live price and reviews searches. Example: 'phones under 20000 rupees'"
    }

    fn parameters(&self) -> Value {
        query_schema("What to search for, e.g. 'phones under 20000 rupees'")
    }

    async fn execute(&self, args: &Value) -> Result<String> {
        let Some(query) = query_arg(args) else {
            return Ok(NO_QUERY.to_string());
        };
        match self.search(&query).await {
            Ok(text) => Ok(self.sanitizer.sanitize(&text)),
            Err(e) => {
                warn!(tool = "SerpSearch", error = %e, "tool failed");
                Ok(format!("SerpAPI text search error: {:#}", e))
            }
        }
    }
}

/// Condense a SerpAPI Google response into plain text.
pub fn summarize_search_results(payload: &Value) -> String {
    let mut lines: Vec<String> = Vec::new();

    if let Some(answer_box) = payload.get("answer_box") {
        let answer = ["answer", "snippet"]
            .iter()
            .find_map(|key| answer_box.get(*key).and_then(|v| v.as_str()));
        if let Some(answer) = answer {
            lines.push(answer.to_string());
        } else if let Some(words) = answer_box
            .get("snippet_highlighted_words")
            .and_then(|v| v.as_array())
        {
            let joined: Vec<&str> = words.iter().filter_map(|w| w.as_str()).collect();
            if !joined.is_empty() {
                lines.push(joined.join(", "));
            }
        }
    }

    if let Some(kg) = payload.get("knowledge_graph") {
        if let Some(description) = kg.get("description").and_then(|v| v.as_str()) {
            match kg.get("title").and_then(|v| v.as_str()) {
                Some(title) => lines.push(format!("{}: {}", title, description)),
                None => lines.push(description.to_string()),
            }
        }
    }

    if let Some(organic) = payload.get("organic_results").and_then(|v| v.as_array()) {
        for result in organic.iter().take(MAX_ORGANIC_SNIPPETS) {
            if let Some(snippet) = result.get("snippet").and_then(|v| v.as_str()) {
                match result.get("title").and_then(|v| v.as_str()) {
                    Some(title) => lines.push(format!("{} - {}", title, snippet)),
                    None => lines.push(snippet.to_string()),
                }
            }
        }
    }

    if lines.is_empty() {
        NO_SEARCH_RESULT.to_string()
    } else {
        lines.join("\n")
    }
}

/// Phone specifications from Wikipedia (top result summary).
pub struct WikiSpecsTool {
    http: Client,
    sanitizer: Arc<ResultSanitizer>,
}

impl WikiSpecsTool {
    pub fn new(http: Client, sanitizer: Arc<ResultSanitizer>) -> Self {
        Self { http, sanitizer }
    }

    async fn lookup(&self, query: &str) -> Result<String> {
        info!(tool = "WikiSpecs", %query, "tool start");

        let search: Value = self
            .http
            .get(WIKIPEDIA_API_URL)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", "1"),
                ("format", "json"),
            ])
            .send()
            .await
            .context("failed to call Wikipedia search")?
            .error_for_status()
            .context("Wikipedia search failed")?
            .json()
            .await
            .context("failed to parse Wikipedia search JSON")?;

        let Some(title) = first_search_title(&search) else {
            return Ok(NO_WIKI_RESULT.to_string());
        };

        let mut url = Url::parse(WIKIPEDIA_SUMMARY_URL).context("invalid Wikipedia URL")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Wikipedia URL cannot be a base"))?
            .push(&title.replace(' ', "_"));

        let summary: Value = self
            .http
            .get(url)
            .send()
            .await
            .context("failed to call Wikipedia summary")?
            .error_for_status()
            .context("Wikipedia summary failed")?
            .json()
            .await
            .context("failed to parse Wikipedia summary JSON")?;

        let extract = summary
            .get("extract")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        if extract.trim().is_empty() {
            return Ok(NO_WIKI_RESULT.to_string());
        }
        Ok(format_wiki_summary(&title, extract, WIKI_MAX_CHARS))
    }
}

#[async_trait]
impl Tool for WikiSpecsTool {
    fn name(&self) -> &str {
        "WikiSpecs"
    }

    fn description(&self) -> &str {
        "Use to fetch phone specifications (camera, battery, display, storage)."
    }

    fn parameters(&self) -> Value {
        query_schema("Phone model name, e.g. 'Google Pixel 8a'")
    }

    async fn execute(&self, args: &Value) -> Result<String> {
        let Some(query) = query_arg(args) else {
            return Ok(NO_QUERY.to_string());
        };
        match self.lookup(&query).await {
            Ok(text) => Ok(self.sanitizer.sanitize(&text)),
            Err(e) => {
                warn!(tool = "WikiSpecs", error = %e, "tool failed");
                Ok(format!("Wikipedia error: {:#}", e))
            }
        }
    }
}

pub fn first_search_title(search: &Value) -> Option<String> {
    search
        .get("query")?
        .get("search")?
        .as_array()?
        .first()?
        .get("title")?
        .as_str()
        .map(str::to_string)
}

/// `Page: ...\nSummary: ...`, capped at `max_chars` characters.
pub fn format_wiki_summary(title: &str, extract: &str, max_chars: usize) -> String {
    let text = format!("Page: {}\nSummary: {}", title, extract.trim());
    if text.chars().count() <= max_chars {
        return text;
    }
    text.chars().take(max_chars).collect()
}

/// Phone images (SerpAPI Google Images).
pub struct PhoneImagesTool {
    serpapi: SerpApiClient,
    sanitizer: Arc<ResultSanitizer>,
    max_images: usize,
}

impl PhoneImagesTool {
    pub fn new(serpapi: SerpApiClient, sanitizer: Arc<ResultSanitizer>, max_images: usize) -> Self {
        Self {
            serpapi,
            sanitizer,
            max_images,
        }
    }

    async fn find_images(&self, query: &str) -> Result<String> {
        let image_query = format!("{}{}", query, IMAGE_QUERY_SUFFIX);
        info!(tool = "PhoneImages", query = %image_query, "tool start");
        let payload = self
            .serpapi
            .get(&[
                ("engine", "google_images"),
                ("q", image_query.as_str()),
                ("gl", "IN"),
                ("hl", "en"),
            ])
            .await?;
        Ok(format_image_links(&Payload::Structured(payload), self.max_images))
    }
}

#[async_trait]
impl Tool for PhoneImagesTool {
    fn name(&self) -> &str {
        "PhoneImages"
    }

    fn description(&self) -> &str {
        "Use to fetch phone images. Example: 'show me images of iPhone 13'"
    }

    fn parameters(&self) -> Value {
        query_schema("Phone model to find pictures of, e.g. 'iPhone 13'")
    }

    async fn execute(&self, args: &Value) -> Result<String> {
        let Some(query) = query_arg(args) else {
            return Ok(NO_QUERY.to_string());
        };
        match self.find_images(&query).await {
            Ok(text) => Ok(self.sanitizer.sanitize(&text)),
            Err(e) => {
                warn!(tool = "PhoneImages", error = %e, "tool failed");
                Ok(format!("Image search error: {:#}", e))
            }
        }
    }
}

/// Newline-separated image links, or a fixed message when there are none.
pub fn format_image_links(payload: &Payload, max_images: usize) -> String {
    let urls = UrlHarvester::links().harvest(payload, max_images);
    if urls.is_empty() {
        NO_IMAGES.to_string()
    } else {
        urls.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sanitizer() -> Arc<ResultSanitizer> {
        Arc::new(ResultSanitizer::new())
    }

    #[test]
    fn test_summarize_prefers_answer_box_then_organic() {
        let payload = json!({
            "answer_box": {"answer": "₹17,999"},
            "knowledge_graph": {"title": "Redmi Note 13", "description": "Android smartphone by Xiaomi"},
            "organic_results": [
                {"title": "Redmi Note 13 5G price", "snippet": "Starts at ₹17,999 in India"},
                {"title": "No snippet here"},
                {"snippet": "Review: great display"}
            ]
        });
        let text = summarize_search_results(&payload);
        assert_eq!(
            text,
            "₹17,999\nRedmi Note 13: Android smartphone by Xiaomi\nRedmi Note 13 5G price - Starts at ₹17,999 in India\nReview: great display"
        );
    }

    #[test]
    fn test_summarize_caps_organic_results() {
        let organic: Vec<Value> = (0..8)
            .map(|i| json!({"snippet": format!("result {}", i)}))
            .collect();
        let text = summarize_search_results(&json!({ "organic_results": organic }));
        assert_eq!(text.lines().count(), MAX_ORGANIC_SNIPPETS);
    }

    #[test]
    fn test_summarize_empty_payload() {
        assert_eq!(summarize_search_results(&json!({})), NO_SEARCH_RESULT);
    }

    #[test]
    fn test_first_search_title() {
        let search = json!({"query": {"search": [{"title": "Pixel 8a"}, {"title": "Pixel 8"}]}});
        assert_eq!(first_search_title(&search), Some("Pixel 8a".to_string()));
        assert_eq!(first_search_title(&json!({"query": {"search": []}})), None);
    }

    #[test]
    fn test_format_wiki_summary_truncates_on_char_boundary() {
        let extract = "é".repeat(1000);
        let text = format_wiki_summary("Phone", &extract, WIKI_MAX_CHARS);
        assert_eq!(text.chars().count(), WIKI_MAX_CHARS);
        assert!(text.starts_with("Page: Phone\nSummary: "));

        let short = format_wiki_summary("iPhone 13", " A phone. ", WIKI_MAX_CHARS);
        assert_eq!(short, "Page: iPhone 13\nSummary: A phone.");
    }

    #[test]
    fn test_format_image_links() {
        let payload = Payload::Structured(json!({
            "images_results": [
                {"original": "https://img.example.com/1.jpg", "thumbnail": "https://t.example.com/1"},
                {"thumbnail": "https://t.example.com/2"},
                {"original": "https://img.example.com/3.jpg"},
                {"original": "https://img.example.com/4.jpg"}
            ]
        }));
        assert_eq!(
            format_image_links(&payload, 3),
            "https://img.example.com/1.jpg\nhttps://t.example.com/2\nhttps://img.example.com/3.jpg"
        );
        assert_eq!(
            format_image_links(&Payload::Structured(json!({"images_results": []})), 3),
            NO_IMAGES
        );
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected_without_network() {
        let serpapi = SerpApiClient::new(Client::new(), None);
        let tool = SerpSearchTool::new(serpapi.clone(), sanitizer());
        assert_eq!(tool.execute(&json!({"query": "  "})).await.unwrap(), NO_QUERY);

        let images = PhoneImagesTool::new(serpapi, sanitizer(), 3);
        assert_eq!(images.execute(&json!({})).await.unwrap(), NO_QUERY);
    }

    #[tokio::test]
    async fn test_missing_api_key_becomes_error_text() {
        let serpapi = SerpApiClient::new(Client::new(), None);
        let tool = SerpSearchTool::new(serpapi.clone(), sanitizer());
        let out = tool.execute(&json!({"query": "Pixel 8a"})).await.unwrap();
        assert!(out.starts_with("SerpAPI text search error:"));
        assert!(out.contains("SERPAPI_API_KEY"));

        let images = PhoneImagesTool::new(serpapi, sanitizer(), 3);
        let out = images.execute(&json!("iPhone 13")).await.unwrap();
        assert!(out.starts_with("Image search error:"));
    }

    #[tokio::test]
    async fn test_transport_error_does_not_expose_api_key() {
        let secret = "SUPERSECRETKEY123";
        // Nothing listens on port 1, so the request fails before any response.
        let serpapi = SerpApiClient::new(Client::new(), Some(secret.to_string()))
            .with_search_url("http://127.0.0.1:1/search.json");

        let tool = SerpSearchTool::new(serpapi.clone(), sanitizer());
        let out = tool.execute(&json!({"query": "Pixel 8a"})).await.unwrap();
        assert!(out.starts_with("SerpAPI text search error: failed to call SerpAPI"));
        assert!(!out.contains(secret));
        assert!(!out.contains("api_key"));

        let images = PhoneImagesTool::new(serpapi, sanitizer(), 3);
        let out = images.execute(&json!({"query": "iPhone 13"})).await.unwrap();
        assert!(out.starts_with("Image search error: failed to call SerpAPI"));
        assert!(!out.contains(secret));
    }
}
