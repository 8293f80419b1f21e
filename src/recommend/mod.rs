//! One-shot catalog recommender.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{error, info, warn};

use crate::extract::{parse_with_outcome, ParseOutcome};
use crate::shared::models::{catalog, ChatMessage, Recommendation};
use crate::shared::{ChatModel, Config, InferenceClient};

const NO_RECOMMENDATIONS: &str = "No recommendations found.";

/// Smaller numbers in a request are model names ("5g", "Nord CE 4"), not budgets.
const MIN_BUDGET: u32 = 1000;

pub const SYSTEM_PROMPT: &str = "You recommend smartphones from a fixed catalog for shoppers in India. \
Reply with only a JSON array of objects with keys \"name\" (string) and \"price\" (number, rupees). \
No prose, no markdown.";

static BUDGET_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d[\d,]*)\s*(k\b)?").expect("budget pattern compiles"));

/// User prompt embedding the catalog as JSON.
pub fn build_prompt(request: &str) -> crate::shared::Result<String> {
    let products = serde_json::to_string_pretty(catalog())?;
    Ok(format!(
        "Catalog:\n{products}\n\nRequest: {}\n\n\
Pick the catalog phones that best match the request, best match first. \
Respond with only a JSON array like [{{\"name\": \"...\", \"price\": 12345}}]. \
Use an empty array if nothing fits.",
        request.trim()
    ))
}

/// Ask the model for picks and validate its answer.
pub async fn recommend(model: &dyn ChatModel, request: &str) -> crate::shared::Result<Vec<Recommendation>> {
    let prompt = build_prompt(request)?;
    let response = model
        .complete(&[ChatMessage::user(prompt)], Some(SYSTEM_PROMPT), &[])
        .await?;

    let raw = response.content.unwrap_or_default();
    let (recommendations, outcome) = parse_with_outcome(&raw);
    match outcome {
        ParseOutcome::Strict => info!(count = recommendations.len(), "Parsed recommendations"),
        ParseOutcome::Extracted => info!(
            count = recommendations.len(),
            "Parsed recommendations from surrounding text"
        ),
        ParseOutcome::Empty => warn!("Model reply had no usable recommendations"),
    }
    Ok(recommendations)
}

/// First amount of at least ₹1000 in the text. Commas are digit separators
/// and a `k` suffix multiplies by a thousand.
pub fn parse_budget(request: &str) -> Option<u32> {
    BUDGET_PATTERN.captures_iter(request).find_map(|caps| {
        let amount = caps[1].replace(',', "").parse::<u32>().ok()?;
        let amount = if caps.get(2).is_some() {
            amount.checked_mul(1000)?
        } else {
            amount
        };
        (amount >= MIN_BUDGET).then_some(amount)
    })
}

/// Catalog picks at or under the request's budget, cheapest first. Without a
/// budget every product is returned.
pub fn recommend_offline(request: &str) -> Vec<Recommendation> {
    let budget = parse_budget(request);
    let mut products: Vec<_> = catalog()
        .iter()
        .filter(|p| budget.map_or(true, |limit| p.price <= limit))
        .collect();
    products.sort_by_key(|p| p.price);

    products
        .into_iter()
        .filter_map(|p| Recommendation::new(p.name, f64::from(p.price)))
        .collect()
}

pub fn render(recommendations: &[Recommendation]) -> String {
    if recommendations.is_empty() {
        return NO_RECOMMENDATIONS.to_string();
    }
    recommendations
        .iter()
        .map(|r| format!("{} - ₹{}", r.name, r.price))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rendered picks for `request`. A failed model call becomes a short message.
pub async fn recommendation_text(model: &dyn ChatModel, request: &str) -> String {
    match recommend(model, request).await {
        Ok(recommendations) => render(&recommendations),
        Err(e) => {
            error!("Recommendation request failed: {}", e);
            format!("Could not get recommendations: {}", e)
        }
    }
}

pub async fn run(config: Config, request: &str, offline: bool) -> Result<()> {
    info!("Starting phonebot recommender...");

    let text = if offline {
        info!("Offline mode: filtering catalog locally");
        render(&recommend_offline(request))
    } else {
        config.log_summary();
        let model = InferenceClient::new(&config)?;
        recommendation_text(&model, request).await
    };

    println!("{}", text);
    Ok(())
}
