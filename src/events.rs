use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AccountId, AssetKind, CollateralRef, OfferId};

/// all events emitted by the engine, one per mutating operation
///
/// each event carries the operation's key computed values exactly as the
/// corresponding quote function returns them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    OfferCreated {
        offer_id: OfferId,
        collateral: CollateralRef,
        owner: AccountId,
        destination: AccountId,
        principal_amount: u128,
        principal_asset: AssetKind,
        apply_window_start: DateTime<Utc>,
        apply_window_end: DateTime<Utc>,
    },
    OfferUpdated {
        offer_id: OfferId,
        collateral: CollateralRef,
        principal_amount: u128,
        borrow_period_secs: u64,
        lender_fee_rate: u32,
    },
    OfferCancelled {
        offer_id: OfferId,
        collateral: CollateralRef,
        timestamp: DateTime<Utc>,
    },
    OfferApplied {
        offer_id: OfferId,
        collateral: CollateralRef,
        lender: AccountId,
        lender_fee: u128,
        service_fee: u128,
        net_to_borrower: u128,
        start_lending_at: DateTime<Utc>,
        end_lending_at: DateTime<Utc>,
        liquidation_at: DateTime<Utc>,
    },
    Repay {
        offer_id: OfferId,
        collateral: CollateralRef,
        borrower: AccountId,
        repaid_amount: u128,
        timestamp: DateTime<Utc>,
    },
    ExtendLendingTimeRequested {
        offer_id: OfferId,
        collateral: CollateralRef,
        end_lending_at: DateTime<Utc>,
        liquidation_at: DateTime<Utc>,
        lender_fee: u128,
        service_fee: u128,
    },
    NFTClaim {
        offer_id: OfferId,
        collateral: CollateralRef,
        claimant: AccountId,
        timestamp: DateTime<Utc>,
    },
    RatesChanged {
        asset: AssetKind,
        lender_fee_rate: u32,
        service_fee_rate: u32,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
