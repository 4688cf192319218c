pub mod activation;
pub mod amount;
pub mod balance;
pub mod block;
pub mod crowdsale;
pub mod offer;
pub mod property;
pub mod sto;
pub mod transaction;
pub mod undo;

pub use activation::FeatureActivation;
pub use amount::{format_amount, parse_amount, COIN, MAX_TOKENS};
pub use balance::Balance;
pub use block::{BlockTip, ChainBlock, ChainTx};
pub use crowdsale::{Crowdsale, CrowdsaleParticipation};
pub use offer::{DexOffer, OfferAction};
pub use property::{
    Ecosystem, Property, PropertyId, PropertyKind, PropertyMetadata, MAIN_ECOSYSTEM_LAST_ID,
    PROPERTY_HOST_COIN, PROPERTY_MAIN_TOKEN, PROPERTY_TEST_TOKEN, TEST_ECOSYSTEM_FIRST_ID,
};
pub use sto::{StoReceipt, StoRecipient};
pub use transaction::{CrowdsalePurchase, SubSend, TransactionRecord, TxDetails};
pub use undo::{BlockUndo, UndoLog, UndoOp};
