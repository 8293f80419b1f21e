/// Appended when the query names a rupee budget.
pub const BUDGET_SUFFIX: &str = " best smartphones India 2025 price in INR specs reviews";
/// Appended to every other query.
pub const GENERIC_SUFFIX: &str = " India 2025 price reviews specs";

const BUDGET_CUES: &[&str] = &["under", "below"];
const CURRENCY_CUES: &[&str] = &["rupee", "inr", "₹"];

/// Turn a free-form question into a search-engine query.
///
/// The result is the original text, casing untouched, followed by a locale
/// and intent suffix. Matching is done on a lower-cased copy.
pub fn rewrite(query: &str) -> String {
    let lower = query.to_lowercase();
    let has_budget = BUDGET_CUES.iter().any(|cue| lower.contains(cue));
    let has_currency = CURRENCY_CUES.iter().any(|cue| lower.contains(cue));

    let suffix = if has_budget && has_currency {
        BUDGET_SUFFIX
    } else {
        GENERIC_SUFFIX
    };

    let mut rewritten = String::with_capacity(query.len() + suffix.len());
    rewritten.push_str(query);
    rewritten.push_str(suffix);
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_and_currency_use_budget_suffix() {
        let query = "phones under 20000 rupees";
        let out = rewrite(query);
        assert!(out.starts_with(query));
        assert!(out.ends_with(BUDGET_SUFFIX));
    }

    #[test]
    fn test_cues_match_case_insensitively_and_keep_casing() {
        let out = rewrite("Best Camera Phone BELOW ₹30000");
        assert_eq!(out, format!("Best Camera Phone BELOW ₹30000{}", BUDGET_SUFFIX));

        let out = rewrite("Gaming phone under 25k INR");
        assert!(out.ends_with(BUDGET_SUFFIX));
    }

    #[test]
    fn test_budget_without_currency_is_generic() {
        assert!(rewrite("phones under 20000").ends_with(GENERIC_SUFFIX));
        assert!(rewrite("20000 rupees phones").ends_with(GENERIC_SUFFIX));
    }

    #[test]
    fn test_empty_query_still_gets_suffix() {
        assert_eq!(rewrite(""), GENERIC_SUFFIX);
    }

    #[test]
    fn test_output_never_shorter_than_input() {
        for query in ["iPhone 13", "", "Pixel 8a specs", "under ₹"] {
            let out = rewrite(query);
            assert!(out.len() > query.len());
            assert!(out.starts_with(query));
        }
    }
}
