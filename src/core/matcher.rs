use crate::core::normalize::{base_name, normalize};
use crate::domain::ports::NameMatcher;

/// Loose name comparison used to resolve prescription mentions.
///
/// Rules, first hit wins:
/// 1. normalized forms are equal (two empty strings count as equal);
/// 2. one non-empty normalized form contains the other;
/// 3. both base names are non-empty and equal.
pub fn is_similar(a: &str, b: &str) -> bool {
    let left = normalize(a);
    let right = normalize(b);

    if left == right {
        return true;
    }

    // 處理 "Paracetamol" 與 "Paracetamol 500mg" 這類差異
    if !left.is_empty() && !right.is_empty() && (left.contains(&right) || right.contains(&left)) {
        return true;
    }

    let left_base = base_name(a);
    let right_base = base_name(b);
    !left_base.is_empty() && left_base == right_base
}

/// Default [`NameMatcher`] backed by [`is_similar`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityMatcher;

impl NameMatcher for SimilarityMatcher {
    fn matches(&self, query: &str, candidate: &str) -> bool {
        is_similar(query, candidate)
    }
}
