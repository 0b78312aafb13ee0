use crate::domain::model::ExtractedMention;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Reads medicine mentions off an uploaded prescription (image or PDF).
#[async_trait]
pub trait ExtractionGateway: Send + Sync {
    async fn extract(&self, file: &[u8], mime_type: &str) -> Result<Vec<ExtractedMention>>;
}

/// Decides whether a catalog name and a query name denote the same medicine.
pub trait NameMatcher: Send + Sync {
    fn matches(&self, query: &str, candidate: &str) -> bool;
}
