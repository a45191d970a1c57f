use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::gateway::TransferError;
use crate::types::{AssetKind, OfferState};

/// broad failure categories, one per recovery strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// bad input shape; retry with corrected input
    Validation,
    /// wrong caller for the action
    Authorization,
    /// operation invalid for the offer's current lifecycle state
    State,
    /// stored offer no longer matches the quoted fingerprint; re-quote
    Concurrency,
    /// asset movement failed; surfaced verbatim from the gateway
    Transfer,
}

#[derive(Error, Debug)]
pub enum PawnError {
    #[error("amount must be greater than 0")]
    InvalidAmount { amount: u128 },

    #[error("invalid borrow period: {period_secs}")]
    InvalidPeriod { period_secs: u64 },

    #[error("fee computation overflows for principal {principal} over {period_secs}s")]
    FeeOverflow { principal: u128, period_secs: u64 },

    #[error("invalid payment asset: {asset}")]
    UnsupportedAsset { asset: AssetKind },

    #[error("invalid apply window: start {start}, end {end}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("required minimum lender fee")]
    FeeBelowMinimum { principal: u128, rate_ppm: u32 },

    #[error("offer already exists: {id}")]
    DuplicateOffer { id: Uuid },

    #[error("collateral slot already locked by offer {holder}")]
    SlotOccupied { holder: Uuid },

    #[error("offer not found: {id}")]
    OfferNotFound { id: Uuid },

    #[error("only owner can perform this action")]
    NotOwner,

    #[error("only admin can perform this action")]
    NotAdmin,

    #[error("offer is not open: current state is {state}")]
    NotOpen { state: OfferState },

    #[error("offer is not in progress: current state is {state}")]
    NotInProgress { state: OfferState },

    #[error("expired order: apply window closed at {window_end}")]
    Expired { window_end: DateTime<Utc> },

    #[error("offer terms have changed since quoting")]
    StaleApply,

    #[error("supplied amount {supplied} does not match required {required}")]
    AmountMismatch { supplied: u128, required: u128 },

    #[error("attached value does not match transfer amount")]
    ValueMismatch {
        attached: Option<u128>,
        required: u128,
    },

    #[error("overdue loan: lending ended at {end_lending_at}")]
    Overdue { end_lending_at: DateTime<Utc> },

    #[error("lending time closed")]
    LendingWindowClosed { end_lending_at: DateTime<Utc> },

    #[error("extension exceeds maximum total lending period")]
    OverMaxExtension {
        requested_secs: u64,
        max_total_secs: u64,
    },

    #[error("can not claim in lending period")]
    StillLending { end_lending_at: DateTime<Utc> },

    #[error("only lender can claim at this time")]
    NotAuthorizedAtThisTime { liquidation_at: DateTime<Utc> },

    #[error("invalid claimant")]
    InvalidClaimant,

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error(transparent)]
    Transfer(#[from] TransferError),
}

impl PawnError {
    /// map each failure to its recovery category
    pub fn kind(&self) -> ErrorKind {
        use PawnError::*;
        match self {
            InvalidAmount { .. }
            | InvalidPeriod { .. }
            | UnsupportedAsset { .. }
            | InvalidWindow { .. }
            | FeeBelowMinimum { .. }
            | FeeOverflow { .. }
            | DuplicateOffer { .. }
            | OfferNotFound { .. }
            | AmountMismatch { .. }
            | ValueMismatch { .. }
            | InvalidConfiguration { .. } => ErrorKind::Validation,
            NotOwner | NotAdmin | NotAuthorizedAtThisTime { .. } | InvalidClaimant => {
                ErrorKind::Authorization
            }
            SlotOccupied { .. }
            | NotOpen { .. }
            | NotInProgress { .. }
            | Expired { .. }
            | Overdue { .. }
            | LendingWindowClosed { .. }
            | OverMaxExtension { .. }
            | StillLending { .. } => ErrorKind::State,
            StaleApply => ErrorKind::Concurrency,
            Transfer(_) => ErrorKind::Transfer,
        }
    }
}

pub type Result<T> = std::result::Result<T, PawnError>;
