pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::AppConfig;
pub use crate::core::{
    cart::Cart,
    catalog::Catalog,
    checkout::PaymentProcessor,
    matcher::{is_similar, SimilarityMatcher},
    normalize::normalize,
    prescription::PrescriptionService,
    reconcile::{reconcile, ReconcileOptions, Reconciler},
};
pub use utils::error::{PharmacyError, Result};
