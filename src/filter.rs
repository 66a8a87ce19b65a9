//! Marketplace eligibility filtering.

use crate::models::{ProductRecord, SearchFilters};

/// Domain fragment that marks a source as belonging to the local market.
const DEFAULT_MARKET_FRAGMENT: &str = ".kz";

/// Filtering strategy, resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterPolicy {
    /// Keep records whose source contains any of these patterns
    /// (lowercased at construction).
    AllowList(Vec<String>),
    /// Keep records whose source carries the local-market fragment.
    DefaultMarket,
}

impl FilterPolicy {
    pub fn from_filters(filters: &SearchFilters) -> Self {
        if filters.marketplaces.is_empty() {
            Self::DefaultMarket
        } else {
            Self::AllowList(
                filters
                    .marketplaces
                    .iter()
                    .map(|pattern| pattern.to_lowercase())
                    .collect(),
            )
        }
    }

    /// Case-insensitive substring containment; a match anywhere in the
    /// source qualifies, deliberately not domain-aware.
    pub fn matches(&self, source: &str) -> bool {
        let source = source.to_lowercase();
        match self {
            Self::AllowList(patterns) => patterns.iter().any(|pattern| source.contains(pattern)),
            Self::DefaultMarket => source.contains(DEFAULT_MARKET_FRAGMENT),
        }
    }
}

/// Order-preserving subsequence projection.
pub fn apply(records: Vec<ProductRecord>, policy: &FilterPolicy) -> Vec<ProductRecord> {
    records
        .into_iter()
        .filter(|record| policy.matches(&record.source))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(source: &str) -> ProductRecord {
        ProductRecord {
            title: None,
            link: format!("https://{source}/item"),
            image_link: None,
            price: None,
            source: source.to_string(),
            logo_url: None,
            rating: 0.0,
            free_delivery: false,
            product_id: None,
        }
    }

    fn filters(marketplaces: &[&str]) -> SearchFilters {
        SearchFilters {
            marketplaces: marketplaces.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn allow_list_matches_case_insensitively() {
        let policy = FilterPolicy::from_filters(&filters(&["kaspi", "OZON"]));
        let records = vec![record("Kaspi.kz"), record("ozon.kz"), record("amazon.com")];
        let kept = apply(records, &policy);
        let sources: Vec<_> = kept.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, vec!["Kaspi.kz", "ozon.kz"]);
    }

    #[test]
    fn empty_filters_fall_back_to_local_market() {
        let policy = FilterPolicy::from_filters(&SearchFilters::default());
        assert_eq!(policy, FilterPolicy::DefaultMarket);
        let kept = apply(vec![record("shop.kz"), record("shop.com")], &policy);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].source, "shop.kz");
    }

    #[test]
    fn substring_match_anywhere_qualifies() {
        let policy = FilterPolicy::from_filters(&filters(&["ozon"]));
        assert!(policy.matches("amazon-vs-OZON comparison shop"));
        assert!(!policy.matches("wildberries.ru"));
    }

    #[test]
    fn filtering_is_idempotent() {
        let policy = FilterPolicy::from_filters(&filters(&["kaspi"]));
        let once = apply(
            vec![record("kaspi.kz"), record("ozon.kz"), record("Kaspi.kz")],
            &policy,
        );
        let twice = apply(once.clone(), &policy);
        assert_eq!(once, twice);
    }
}
