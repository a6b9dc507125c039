// Static seed data for the catalog

use crate::models::CatalogItem;

static FLOWERS_JSON: &str = include_str!("../../assets/flowers.json");

/// Parse the embedded flower list. Loaded once at startup; the catalog
/// never gains items afterwards.
pub fn load() -> Result<Vec<CatalogItem>, serde_json::Error> {
    serde_json::from_str(FLOWERS_JSON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn seed_parses_with_unique_ids() {
        let flowers = load().unwrap();
        assert!(!flowers.is_empty());

        let ids: HashSet<u32> = flowers.iter().map(|f| f.id).collect();
        assert_eq!(ids.len(), flowers.len());
    }

    #[test]
    fn seed_prices_are_positive() {
        for flower in load().unwrap() {
            assert!(flower.price > 0, "{} has no price", flower.title);
        }
    }
}
