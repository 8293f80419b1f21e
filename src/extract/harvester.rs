use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Fields that mark an entry as an image search result, in the order they
/// are consulted. Kept to the fields seen in real provider payloads.
pub const IMAGE_FIELDS: &[&str] = &["original", "thumbnail", "link"];

pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp", ".gif"];

const BLOCKED_PREFIXES: &[&str] = &["data:", "javascript:"];

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s"'<>]+"#).expect("url pattern compiles"));

/// Text or JSON returned by a collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Structured(Value),
}

impl Payload {
    /// Promote tool output to structured form when it is a JSON object or array.
    pub fn from_tool_output(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
                if value.is_object() || value.is_array() {
                    return Payload::Structured(value);
                }
            }
        }
        Payload::Text(raw.to_string())
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Structured(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestMode {
    /// Any valid http(s) URL.
    Links,
    /// Only URLs whose path ends in a known image extension.
    Images,
}

#[derive(Debug, Clone, Copy)]
pub struct UrlHarvester {
    mode: HarvestMode,
}

impl UrlHarvester {
    pub fn new(mode: HarvestMode) -> Self {
        Self { mode }
    }

    pub fn links() -> Self {
        Self::new(HarvestMode::Links)
    }

    pub fn images() -> Self {
        Self::new(HarvestMode::Images)
    }

    /// Extract at most `max_results` distinct URLs from `payload`.
    ///
    /// Structured image-result entries win over a free-text scan; the scan
    /// only runs when no entry produced a candidate.
    pub fn harvest(&self, payload: &Payload, max_results: usize) -> Vec<String> {
        if max_results == 0 {
            return Vec::new();
        }

        let mut candidates = match payload {
            Payload::Structured(value) => structured_candidates(value),
            Payload::Text(_) => Vec::new(),
        };

        if candidates.is_empty() {
            candidates = match payload {
                Payload::Text(text) => scan_text(text),
                Payload::Structured(value) => scan_text(&value.to_string()),
            };
        }

        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        for candidate in candidates {
            let Some(url) = clean_url(&candidate) else {
                continue;
            };
            if self.mode == HarvestMode::Images && !has_image_extension(&url) {
                continue;
            }
            if seen.insert(url.clone()) {
                urls.push(url);
                if urls.len() == max_results {
                    break;
                }
            }
        }

        debug!(mode = ?self.mode, count = urls.len(), "Harvested urls");
        urls
    }
}

/// Depth-first search for the first list that looks like image results.
fn find_image_results(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => {
            let looks_like_results = items.iter().any(|item| {
                item.as_object()
                    .map(|obj| IMAGE_FIELDS.iter().any(|field| obj.contains_key(*field)))
                    .unwrap_or(false)
            });
            if looks_like_results {
                return Some(items);
            }
            items.iter().find_map(find_image_results)
        }
        Value::Object(map) => map.values().find_map(find_image_results),
        _ => None,
    }
}

fn structured_candidates(value: &Value) -> Vec<String> {
    let Some(entries) = find_image_results(value) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let obj = entry.as_object()?;
            IMAGE_FIELDS.iter().find_map(|field| {
                obj.get(*field)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
        })
        .collect()
}

fn scan_text(text: &str) -> Vec<String> {
    URL_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Strip wrapping artifacts and return the URL if it is an absolute http(s)
/// URL with a host.
pub fn clean_url(raw: &str) -> Option<String> {
    let trimmed = raw
        .trim()
        .trim_start_matches(|c: char| matches!(c, '(' | '[' | '{' | '<' | '"' | '\''))
        .trim_end_matches(|c: char| {
            matches!(
                c,
                ')' | ']' | '}' | '>' | '"' | '\'' | '.' | ',' | ';' | ':' | '!' | '?' | '*'
            )
        });

    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if BLOCKED_PREFIXES.iter().any(|prefix| lower.starts_with(prefix)) {
        return None;
    }

    let parsed = Url::parse(trimmed).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return None;
    }
    Some(trimmed.to_string())
}

fn has_image_extension(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let path = parsed.path().to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_image_results_in_order() {
        let payload = Payload::from(json!({
            "images_results": [
                {"original": "http://x.com/a.jpg"},
                {"thumbnail": "http://x.com/b.png"}
            ]
        }));
        let urls = UrlHarvester::links().harvest(&payload, 5);
        assert_eq!(urls, vec!["http://x.com/a.jpg", "http://x.com/b.png"]);
    }

    #[test]
    fn test_field_priority_prefers_original() {
        let payload = Payload::from(json!({
            "images_results": [{
                "link": "https://shop.example.com/pixel",
                "thumbnail": "https://cdn.example.com/t.jpg",
                "original": "https://cdn.example.com/o.jpg"
            }]
        }));
        let urls = UrlHarvester::links().harvest(&payload, 5);
        assert_eq!(urls, vec!["https://cdn.example.com/o.jpg"]);
    }

    #[test]
    fn test_text_scan_with_image_filter() {
        let payload = Payload::from("see https://x.com/p.png and https://bad.com/page");
        let urls = UrlHarvester::images().harvest(&payload, 5);
        assert_eq!(urls, vec!["https://x.com/p.png"]);
    }

    #[test]
    fn test_markdown_and_punctuation_are_stripped() {
        let payload = Payload::from(
            "Here: ![phone](https://img.example.com/p1.JPG). Also (https://img.example.com/p2.webp), done.",
        );
        let urls = UrlHarvester::images().harvest(&payload, 5);
        assert_eq!(
            urls,
            vec!["https://img.example.com/p1.JPG", "https://img.example.com/p2.webp"]
        );
    }

    #[test]
    fn test_dedup_and_truncate() {
        let payload = Payload::from(
            "https://a.com/1.png https://a.com/1.png https://a.com/2.png https://a.com/3.png",
        );
        let urls = UrlHarvester::images().harvest(&payload, 2);
        assert_eq!(urls, vec!["https://a.com/1.png", "https://a.com/2.png"]);
        assert!(UrlHarvester::images().harvest(&payload, 0).is_empty());
    }

    #[test]
    fn test_blocked_schemes_and_empty_entries_rejected() {
        let payload = Payload::from(json!({
            "images_results": [
                {"original": "data:image/png;base64,AAAA"},
                {"original": "javascript:alert(1)"},
                {"original": ""},
                {"original": null, "thumbnail": "https://ok.com/t.png"}
            ]
        }));
        let urls = UrlHarvester::links().harvest(&payload, 5);
        assert_eq!(urls, vec!["https://ok.com/t.png"]);
    }

    #[test]
    fn test_structured_without_results_falls_back_to_scan() {
        let payload = Payload::from(json!({
            "answer": "Photo at https://img.example.com/pixel.png",
            "count": 1
        }));
        let urls = UrlHarvester::images().harvest(&payload, 3);
        assert_eq!(urls, vec!["https://img.example.com/pixel.png"]);
    }

    #[test]
    fn test_nested_results_list_is_found() {
        let payload = Payload::from(json!({
            "search_metadata": {"status": "Success"},
            "data": {"images": [{"thumbnail": "https://t.example.com/1.webp"}]}
        }));
        let urls = UrlHarvester::images().harvest(&payload, 3);
        assert_eq!(urls, vec!["https://t.example.com/1.webp"]);
    }

    #[test]
    fn test_from_tool_output_promotes_json() {
        let payload = Payload::from_tool_output(r#"{"images_results": []}"#);
        assert!(matches!(payload, Payload::Structured(_)));
        let payload = Payload::from_tool_output("{not json");
        assert_eq!(payload, Payload::Text("{not json".to_string()));
    }

    #[test]
    fn test_garbage_yields_empty() {
        for text in ["", "no links here", "http://", "https:// spaced.com"] {
            assert!(UrlHarvester::links().harvest(&Payload::from(text), 5).is_empty());
        }
    }

    #[test]
    fn test_clean_url() {
        assert_eq!(
            clean_url("<https://x.com/a.png>"),
            Some("https://x.com/a.png".to_string())
        );
        assert_eq!(clean_url("ftp://x.com/a.png"), None);
        assert_eq!(clean_url("JavaScript:void(0)"), None);
        assert_eq!(clean_url("   "), None);
    }
}
