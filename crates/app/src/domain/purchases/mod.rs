//! Purchases

pub mod certificates;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod reconciler;
pub mod repository;

pub use certificates::CertificateLocator;
pub use errors::PurchaseError;
pub use models::{
    CheckoutReceipt, FollowUp, NewPurchase, PurchaseReceipt, PurchaseRecord, Replenishment,
};
pub use orchestrator::{PurchaseOrchestrator, REPLENISH_FLOOR};
pub use reconciler::{
    DEFAULT_GRACE, ReconciliationReport, Reconciler, RepairFailure, RepairStep,
};
pub use repository::{MockPurchasesRepository, PurchasesRepository, RestPurchasesRepository};
