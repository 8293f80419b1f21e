use tracing::{debug, warn};

/// Replacement text for anything that fails the denylist check.
pub const NO_SAFE_RESULTS: &str = "No safe results found.";

const DEFAULT_DENYLIST: &[&str] = &[
    "porn", "xxx", "nsfw", "nude", "naked", "sex", "escort", "hentai", "onlyfans", "gore",
];

/// Coarse denylist filter for search results and model answers.
///
/// Matching is a case-insensitive substring test, so legitimate text that
/// happens to contain a term (for example "Sussex" contains "sex") is
/// rejected too. That is a known limitation of the filter and is not
/// special-cased.
#[derive(Debug, Clone)]
pub struct ResultSanitizer {
    denylist: Vec<String>,
}

impl ResultSanitizer {
    pub fn new() -> Self {
        Self {
            denylist: DEFAULT_DENYLIST.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Add caller-supplied terms on top of the default list.
    pub fn with_extra_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for term in terms {
            let term = term.as_ref().trim().to_lowercase();
            if !term.is_empty() && !self.denylist.contains(&term) {
                self.denylist.push(term);
            }
        }
        self
    }

    pub fn denylist(&self) -> &[String] {
        &self.denylist
    }

    /// First denylisted term found in `text`, if any.
    pub fn matched_term(&self, text: &str) -> Option<&str> {
        let lower = text.to_lowercase();
        self.denylist
            .iter()
            .find(|term| lower.contains(term.as_str()))
            .map(|term| term.as_str())
    }

    pub fn is_safe(&self, text: &str) -> bool {
        self.matched_term(text).is_none()
    }

    /// Return `text` unchanged when safe, otherwise the sentinel.
    pub fn sanitize(&self, text: &str) -> String {
        match self.matched_term(text) {
            Some(term) => {
                warn!(term, "Unsafe content detected; replacing result");
                NO_SAFE_RESULTS.to_string()
            }
            None => {
                debug!(len = text.len(), "Result passed denylist check");
                text.to_string()
            }
        }
    }

    /// Absent text is treated as empty.
    pub fn sanitize_option(&self, text: Option<&str>) -> String {
        self.sanitize(text.unwrap_or_default())
    }
}

impl Default for ResultSanitizer {
    fn default() -> Self {
        Self::new()
    }
}
