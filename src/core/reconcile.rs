use crate::core::catalog::Catalog;
use crate::core::matcher::SimilarityMatcher;
use crate::domain::model::{CartLine, ExtractedMention, ReconciliationResult};
use crate::domain::ports::NameMatcher;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOptions {
    /// Fold matched lines that resolve to the same record into one line.
    #[serde(default)]
    pub merge_duplicates: bool,
}

/// Resolves extracted mentions against a catalog and clamps them to stock.
pub struct Reconciler<'c, M: NameMatcher = SimilarityMatcher> {
    catalog: &'c Catalog,
    matcher: M,
    options: ReconcileOptions,
}

impl<'c> Reconciler<'c, SimilarityMatcher> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            matcher: SimilarityMatcher,
            options: ReconcileOptions::default(),
        }
    }
}

impl<'c, M: NameMatcher> Reconciler<'c, M> {
    pub fn with_matcher(catalog: &'c Catalog, matcher: M) -> Self {
        Self {
            catalog,
            matcher,
            options: ReconcileOptions::default(),
        }
    }

    pub fn options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn reconcile(&self, mentions: &[ExtractedMention]) -> ReconciliationResult<'c> {
        let mut result = ReconciliationResult::empty();

        for mention in mentions {
            let Some(medicine) = self.catalog.find_match_with(mention, &self.matcher) else {
                tracing::debug!("No catalog match for '{}'", mention.name);
                result.unmatched.push(mention.clone());
                continue;
            };

            let granted = mention.requested_quantity().min(medicine.stock);
            if granted == 0 {
                // 缺貨與查無此藥對呼叫端來說一樣
                tracing::debug!("'{}' matched {} but it is out of stock", mention.name, medicine.id);
                result.unmatched.push(mention.clone());
                continue;
            }

            if granted < mention.requested_quantity() {
                tracing::debug!(
                    "Clamped '{}' from {} to {} (stock)",
                    medicine.name,
                    mention.requested_quantity(),
                    granted
                );
            }

            result.matched.push(CartLine {
                medicine,
                quantity: granted,
            });
        }

        if self.options.merge_duplicates {
            result.matched = merge_by_record(result.matched);
        }

        tracing::info!(
            "Reconciled {} mentions: {} matched, {} unmatched",
            mentions.len(),
            result.matched.len(),
            result.unmatched.len()
        );
        result
    }
}

/// Reconciles with the default matcher and no duplicate merging.
pub fn reconcile<'c>(
    catalog: &'c Catalog,
    mentions: &[ExtractedMention],
) -> ReconciliationResult<'c> {
    Reconciler::new(catalog).reconcile(mentions)
}

fn merge_by_record(lines: Vec<CartLine<'_>>) -> Vec<CartLine<'_>> {
    let mut merged: Vec<CartLine<'_>> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.iter_mut().find(|m| m.medicine.id == line.medicine.id) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .saturating_add(line.quantity)
                    .min(existing.medicine.stock);
            }
            None => merged.push(line),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::MedicineRecord;

    struct ExactMatcher;

    impl NameMatcher for ExactMatcher {
        fn matches(&self, query: &str, candidate: &str) -> bool {
            query.eq_ignore_ascii_case(candidate)
        }
    }

    #[test]
    fn test_zero_quantity_defaults_to_one() {
        let catalog = Catalog::sample();
        let mention = ExtractedMention {
            name: "Aspirin".to_string(),
            dosage: None,
            quantity: Some(0),
        };
        let result = reconcile(&catalog, &[mention]);
        assert_eq!(result.matched[0].quantity, 1);
    }

    #[test]
    fn test_duplicates_kept_by_default() {
        let catalog = Catalog::sample();
        let mentions = vec![
            ExtractedMention::new("Ibuprofen").with_quantity(2),
            ExtractedMention::new("Ibuprofen 400mg").with_quantity(1),
        ];
        let result = reconcile(&catalog, &mentions);
        assert_eq!(result.matched.len(), 2);
        assert!(result.matched.iter().all(|l| l.medicine.id == "8"));
    }

    #[test]
    fn test_merge_duplicates_reclamps_to_stock() {
        let catalog = Catalog::sample();
        let mentions = vec![
            ExtractedMention::new("Ranitidine").with_quantity(2),
            ExtractedMention::new("Aspirin"),
            ExtractedMention::new("Ranitidine 150mg").with_quantity(2),
        ];
        let result = Reconciler::new(&catalog)
            .options(ReconcileOptions {
                merge_duplicates: true,
            })
            .reconcile(&mentions);

        assert_eq!(result.matched.len(), 2);
        assert_eq!(result.matched[0].medicine.id, "9");
        assert_eq!(result.matched[0].quantity, 3);
        assert_eq!(result.matched[1].medicine.id, "11");
        assert!(result.unmatched.is_empty());
    }

    #[test]
    fn test_custom_matcher_is_used() {
        let catalog = Catalog::new(vec![MedicineRecord::new(
            "x",
            "Aspirin 75mg",
            12.0,
            "strip",
            5,
        )])
        .unwrap();

        let mentions = vec![
            ExtractedMention::new("Aspirin"),
            ExtractedMention::new("aspirin 75MG"),
        ];
        let result = Reconciler::with_matcher(&catalog, ExactMatcher).reconcile(&mentions);
        assert_eq!(result.matched.len(), 1);
        assert_eq!(result.unmatched, vec![ExtractedMention::new("Aspirin")]);
    }
}
