pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod fees;
pub mod gateway;
pub mod ledger;
pub mod offer;
pub mod types;

// re-export key types
pub use config::PawnConfig;
pub use engine::{ApplyQuote, CreateOfferRequest, PawnShop};
pub use errors::{ErrorKind, PawnError, Result};
pub use events::{Event, EventStore};
pub use fees::{quote_fees, FeeQuote, FeeScheduleRegistry, RateSchedule, SECONDS_PER_YEAR};
pub use gateway::{AssetTransferGateway, FungibleTransfer, InMemoryGateway, TransferError};
pub use ledger::OfferLedger;
pub use offer::{Offer, OfferFingerprint};
pub use types::{AccountId, AssetId, AssetKind, CollateralRef, CollectionId, OfferId, OfferState};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use uuid::Uuid;
