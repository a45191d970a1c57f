use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AccountId, AssetKind, CollateralRef, OfferId, OfferState};

/// content hash of an offer's mutable terms
///
/// lenders compute a quote against a fingerprint and pass it back with
/// apply; the engine recomputes from the stored offer and aborts on any
/// mismatch, so an apply can never execute on terms the borrower changed
/// after the quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferFingerprint(String);

impl OfferFingerprint {
    fn compute(id: &OfferId, principal_amount: u128, borrow_period_secs: u64, lender_fee_rate: u32) -> Self {
        let canonical = format!(
            "{}:{}:{}:{}",
            id, principal_amount, borrow_period_secs, lender_fee_rate
        );
        OfferFingerprint(sha256::digest(canonical))
    }
}

impl std::fmt::Display for OfferFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// a proposed or active pawn loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    // identity, immutable after creation
    pub id: OfferId,
    pub owner: AccountId,
    pub collateral: CollateralRef,
    pub principal_asset: AssetKind,
    /// receives the net principal on match; may differ from owner
    pub destination: AccountId,

    // terms, mutable while open only
    pub principal_amount: u128,
    pub borrow_period_secs: u64,
    pub lender_fee_rate: u32,
    pub service_fee_rate: u32,

    // apply window, immutable
    pub apply_window_start: DateTime<Utc>,
    pub apply_window_end: DateTime<Utc>,

    // lifecycle
    pub state: OfferState,
    pub lender: Option<AccountId>,
    pub start_lending_at: Option<DateTime<Utc>>,
    pub end_lending_at: Option<DateTime<Utc>>,
    pub liquidation_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl Offer {
    /// fingerprint over the fields a borrower can still change while open
    pub fn fingerprint(&self) -> OfferFingerprint {
        OfferFingerprint::compute(
            &self.id,
            self.principal_amount,
            self.borrow_period_secs,
            self.lender_fee_rate,
        )
    }

    pub fn is_open(&self) -> bool {
        self.state == OfferState::Open
    }

    pub fn is_in_progress(&self) -> bool {
        self.state == OfferState::InProgress
    }
}
