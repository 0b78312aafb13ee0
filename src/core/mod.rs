pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod matcher;
pub mod normalize;
pub mod prescription;
pub mod reconcile;

pub use crate::domain::model::{
    CartLine, ExtractedMention, MedicineRecord, PrescriptionOutcome, ReconciliationResult,
};
pub use crate::domain::ports::{ExtractionGateway, NameMatcher};
pub use crate::utils::error::Result;
