//! Extraction and validation of untrusted model and tool output.
//!
//! Every function here is pure: no I/O, no shared mutable state, and no
//! input makes them fail. Bad input degrades to an empty or neutral result.

pub mod harvester;
pub mod query;
pub mod recommendations;
pub mod sanitizer;

pub use harvester::{HarvestMode, Payload, UrlHarvester};
pub use query::rewrite;
pub use recommendations::{parse_recommendations, parse_with_outcome, ParseOutcome};
pub use sanitizer::{ResultSanitizer, NO_SAFE_RESULTS};
