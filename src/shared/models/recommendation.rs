use serde::{Deserialize, Serialize};

/// A single product pick returned by the model.
///
/// Instances built by the recommendation parser always have a non-empty
/// `name` and a finite, non-negative `price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub name: String,
    pub price: f64,
}

impl Recommendation {
    /// Build a record only when both invariants hold.
    pub fn new(name: &str, price: f64) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() || !price.is_finite() || price < 0.0 {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_enforces_invariants() {
        assert!(Recommendation::new("Pixel 8a", 39999.0).is_some());
        assert!(Recommendation::new("   ", 100.0).is_none());
        assert!(Recommendation::new("Pixel 8a", -1.0).is_none());
        assert!(Recommendation::new("Pixel 8a", f64::NAN).is_none());
    }

    #[test]
    fn test_name_is_trimmed() {
        let rec = Recommendation::new("  Redmi Note 13  ", 0.0).unwrap();
        assert_eq!(rec.name, "Redmi Note 13");
        assert_eq!(rec.price, 0.0);
    }
}
