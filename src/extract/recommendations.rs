use serde_json::Value;
use tracing::{debug, warn};

use crate::shared::models::Recommendation;

/// Terminal state of a parse attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The whole (trimmed) text was a JSON array.
    Strict,
    /// A bracketed span inside the text was a JSON array.
    Extracted,
    /// Neither attempt produced an array.
    Empty,
}

/// Parse model output that should be a JSON array of `{name, price}`.
///
/// Never fails: unusable text yields an empty list and malformed elements
/// are dropped individually.
pub fn parse_recommendations(raw: &str) -> Vec<Recommendation> {
    parse_with_outcome(raw).0
}

pub fn parse_with_outcome(raw: &str) -> (Vec<Recommendation>, ParseOutcome) {
    let trimmed = raw.trim();

    let (items, outcome) = if let Some(items) = parse_array(trimmed) {
        (items, ParseOutcome::Strict)
    } else if let Some(items) = bracketed_span(trimmed).and_then(parse_array) {
        (items, ParseOutcome::Extracted)
    } else {
        warn!(len = raw.len(), "Model output did not contain a JSON array");
        return (Vec::new(), ParseOutcome::Empty);
    };

    let total = items.len();
    let recommendations: Vec<Recommendation> = items.iter().filter_map(to_recommendation).collect();
    if recommendations.len() < total {
        debug!(
            dropped = total - recommendations.len(),
            kept = recommendations.len(),
            "Dropped invalid recommendation entries"
        );
    }
    (recommendations, outcome)
}

fn parse_array(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => Some(items),
        _ => None,
    }
}

/// From the first `[` to the last `]`, across newlines.
fn bracketed_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end <= start {
        return None;
    }
    text.get(start..=end)
}

fn to_recommendation(item: &Value) -> Option<Recommendation> {
    let obj = item.as_object()?;
    let name = obj.get("name")?.as_str()?;
    let price = obj.get("price")?.as_f64()?;
    Recommendation::new(name, price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_array() {
        let (recs, outcome) = parse_with_outcome(r#"[{"name":"A","price":10}]"#);
        assert_eq!(outcome, ParseOutcome::Strict);
        assert_eq!(
            recs,
            vec![Recommendation {
                name: "A".to_string(),
                price: 10.0
            }]
        );
    }

    #[test]
    fn test_prose_around_array_is_extracted() {
        let (recs, outcome) =
            parse_with_outcome(r#"here you go: [{"name":"A","price":10}] thanks"#);
        assert_eq!(outcome, ParseOutcome::Extracted);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].name, "A");
    }

    #[test]
    fn test_code_fence_and_multiline_array() {
        let raw = "```json\n[\n  {\"name\": \"Motorola G54\", \"price\": 13999},\n  {\"name\": \"Samsung Galaxy M34\", \"price\": 15999.5}\n]\n```";
        let recs = parse_recommendations(raw);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[1].price, 15999.5);
    }

    #[test]
    fn test_wrapped_object_falls_back_to_inner_array() {
        let raw = r#"{"recommendations": [{"name": "iQOO Z9", "price": 19999}]}"#;
        let (recs, outcome) = parse_with_outcome(raw);
        assert_eq!(outcome, ParseOutcome::Extracted);
        assert_eq!(recs[0].name, "iQOO Z9");
    }

    #[test]
    fn test_not_json_is_empty() {
        let (recs, outcome) = parse_with_outcome("not json at all");
        assert!(recs.is_empty());
        assert_eq!(outcome, ParseOutcome::Empty);
        assert!(parse_recommendations("] backwards [").is_empty());
        assert!(parse_recommendations("").is_empty());
    }

    #[test]
    fn test_non_numeric_price_is_dropped() {
        assert!(parse_recommendations(r#"[{"name":"A","price":"free"}]"#).is_empty());
    }

    #[test]
    fn test_partial_success_keeps_valid_entries_in_order() {
        let raw = r#"[
            {"name": "B", "price": 20},
            {"name": "", "price": 5},
            {"price": 7},
            {"name": "C", "price": -1},
            "junk",
            {"name": "A", "price": 0, "extra": true}
        ]"#;
        let names: Vec<String> = parse_recommendations(raw)
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_empty_array_is_strict_success() {
        let (recs, outcome) = parse_with_outcome("  []  ");
        assert!(recs.is_empty());
        assert_eq!(outcome, ParseOutcome::Strict);
    }
}
