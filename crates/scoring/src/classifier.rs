//! Tier classifier — maps a composite score onto the active tier catalog.

use std::cmp::Ordering;

use tierwise_core::tier::CustomerTier;

/// Threshold/priority tier selection.
///
/// Among active tiers whose `minimum_score` the score meets, the highest
/// priority wins; equal priorities break to the lexicographically-first
/// name so classification stays deterministic. When no tier qualifies the
/// lowest-priority active tier is the fallback; an empty active catalog
/// leaves the customer unclassified.
pub struct TierClassifier;

impl TierClassifier {
    pub fn classify<'a>(score: f64, tiers: &'a [CustomerTier]) -> Option<&'a CustomerTier> {
        let active = || tiers.iter().filter(|t| t.is_active);

        let qualified = active()
            .filter(|t| t.minimum_score <= score)
            .reduce(|best, t| match t.priority.cmp(&best.priority) {
                Ordering::Greater => t,
                Ordering::Less => best,
                Ordering::Equal => {
                    if t.name < best.name {
                        t
                    } else {
                        best
                    }
                }
            });

        qualified.or_else(|| {
            active().reduce(|best, t| match t.priority.cmp(&best.priority) {
                Ordering::Less => t,
                Ordering::Greater => best,
                Ordering::Equal => {
                    if t.name < best.name {
                        t
                    } else {
                        best
                    }
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn tier(name: &str, minimum_score: f64, priority: i32, active: bool) -> CustomerTier {
        CustomerTier {
            id: Uuid::new_v4(),
            name: name.to_string(),
            minimum_score,
            priority,
            discount_percentage: 5.0,
            min_order_amount: 0.0,
            scoring_weights: None,
            is_active: active,
        }
    }

    fn catalog() -> Vec<CustomerTier> {
        vec![
            tier("bronze", 0.0, 1, true),
            tier("silver", 0.4, 2, true),
            tier("gold", 0.7, 3, true),
        ]
    }

    #[test]
    fn test_highest_priority_qualifying_tier_wins() {
        let tiers = catalog();
        assert_eq!(TierClassifier::classify(0.75, &tiers).unwrap().name, "gold");
        assert_eq!(
            TierClassifier::classify(0.5, &tiers).unwrap().name,
            "silver"
        );
        assert_eq!(TierClassifier::classify(0.1, &tiers).unwrap().name, "bronze");
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let tiers = catalog();
        assert_eq!(TierClassifier::classify(0.7, &tiers).unwrap().name, "gold");
    }

    #[test]
    fn test_priority_tie_breaks_lexicographically() {
        let tiers = vec![
            tier("platinum", 0.5, 5, true),
            tier("obsidian", 0.5, 5, true),
        ];
        assert_eq!(
            TierClassifier::classify(0.9, &tiers).unwrap().name,
            "obsidian"
        );
    }

    #[test]
    fn test_below_all_thresholds_falls_back_to_lowest_priority() {
        let tiers = vec![tier("silver", 0.4, 2, true), tier("gold", 0.7, 3, true)];
        assert_eq!(
            TierClassifier::classify(0.1, &tiers).unwrap().name,
            "silver"
        );
    }

    #[test]
    fn test_inactive_tiers_ignored() {
        let tiers = vec![tier("gold", 0.0, 9, false), tier("bronze", 0.0, 1, true)];
        assert_eq!(
            TierClassifier::classify(0.9, &tiers).unwrap().name,
            "bronze"
        );
    }

    #[test]
    fn test_empty_catalog_is_unclassified() {
        assert!(TierClassifier::classify(0.5, &[]).is_none());
        let all_inactive = vec![tier("gold", 0.0, 1, false)];
        assert!(TierClassifier::classify(0.5, &all_inactive).is_none());
    }

    #[test]
    fn test_classification_monotonic_in_score() {
        // A higher score never selects a tier with a lower minimum_score
        // than a lower score does, given a fixed catalog.
        let tiers = catalog();
        let mut prev_min = f64::MIN;
        for score in [0.0, 0.2, 0.4, 0.6, 0.7, 0.9, 1.0] {
            let min = TierClassifier::classify(score, &tiers).unwrap().minimum_score;
            assert!(min >= prev_min);
            prev_min = min;
        }
    }
}
