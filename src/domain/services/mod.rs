pub mod activation;
pub mod crowdsale;
pub mod dex;
pub mod ledger;
pub mod payload;
pub mod registry;
pub mod sender;
pub mod sto;

pub use activation::{ActivationManager, ActivationOutcome, GraceWindow};
pub use crowdsale::{calculate_purchase, CrowdsaleBook, PurchaseInput, PurchaseQuote};
pub use dex::{AcceptOutcome, DexBook, OfferTerms};
pub use ledger::Ledger;
pub use registry::{IssueRequest, PropertyRegistry};
