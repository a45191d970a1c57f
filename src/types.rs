use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// unique identifier for an offer, supplied by the borrower at creation
pub type OfferId = Uuid;

/// account identity for borrowers, lenders, treasury and admin
pub type AccountId = String;

/// identifier of a collateral collection (an NFT contract or series)
pub type CollectionId = String;

/// identifier of a fungible asset
pub type AssetId = String;

/// kind of fungible asset used for principal and fees
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    /// the chain's native currency; transfers carry an attached value
    Native,
    /// a fungible token identified by its asset id
    Token(AssetId),
}

impl AssetKind {
    pub fn is_native(&self) -> bool {
        matches!(self, AssetKind::Native)
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::Native => write!(f, "native"),
            AssetKind::Token(id) => write!(f, "{}", id),
        }
    }
}

/// reference to a collateral position: collection, item and quantity
///
/// quantity is 1 for single-owner collateral and N for quantity-based
/// collateral; the (collection, item) pair is the exclusivity slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralRef {
    pub collection: CollectionId,
    pub item: u64,
    pub quantity: u64,
}

impl CollateralRef {
    pub fn new(collection: impl Into<CollectionId>, item: u64, quantity: u64) -> Self {
        Self {
            collection: collection.into(),
            item,
            quantity,
        }
    }

    /// the slot key locking this collateral to at most one live offer
    pub fn slot(&self) -> (CollectionId, u64) {
        (self.collection.clone(), self.item)
    }
}

/// offer lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferState {
    /// created, collateral escrowed, waiting for a lender
    Open,
    /// matched by a lender, loan running
    InProgress,
    /// principal repaid, collateral returned
    Repaid,
    /// withdrawn by the borrower before any match
    Cancelled,
    /// collateral seized after the loan matured unpaid
    Claimed,
}

impl OfferState {
    /// terminal states keep their record for audit but reject every mutation
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OfferState::Repaid | OfferState::Cancelled | OfferState::Claimed
        )
    }
}

impl std::fmt::Display for OfferState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OfferState::Open => "open",
            OfferState::InProgress => "in-progress",
            OfferState::Repaid => "repaid",
            OfferState::Cancelled => "cancelled",
            OfferState::Claimed => "claimed",
        };
        write!(f, "{}", s)
    }
}
