use std::collections::HashMap;

use crate::errors::{PawnError, Result};
use crate::offer::Offer;
use crate::types::{AccountId, CollectionId, OfferId};

/// single source of truth for offer records
///
/// records are never deleted: terminal offers stay for audit. The slot
/// index holds at most one live offer per (collection, item) pair, which
/// is the engine's exclusivity invariant.
#[derive(Debug, Default)]
pub struct OfferLedger {
    offers: HashMap<OfferId, Offer>,
    active_slots: HashMap<(CollectionId, u64), OfferId>,
}

impl OfferLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// persist a freshly created offer, locking its collateral slot
    pub fn insert(&mut self, offer: Offer) -> Result<()> {
        if self.offers.contains_key(&offer.id) {
            return Err(PawnError::DuplicateOffer { id: offer.id });
        }
        let slot = offer.collateral.slot();
        if let Some(holder) = self.active_slots.get(&slot) {
            return Err(PawnError::SlotOccupied { holder: *holder });
        }
        self.active_slots.insert(slot, offer.id);
        self.offers.insert(offer.id, offer);
        Ok(())
    }

    pub fn get(&self, id: &OfferId) -> Result<&Offer> {
        self.offers
            .get(id)
            .ok_or(PawnError::OfferNotFound { id: *id })
    }

    pub fn get_mut(&mut self, id: &OfferId) -> Result<&mut Offer> {
        self.offers
            .get_mut(id)
            .ok_or(PawnError::OfferNotFound { id: *id })
    }

    /// unlock an offer's collateral slot once it reaches a terminal state
    pub fn release_slot(&mut self, id: &OfferId) {
        if let Some(offer) = self.offers.get(id) {
            let slot = offer.collateral.slot();
            if self.active_slots.get(&slot) == Some(id) {
                self.active_slots.remove(&slot);
            }
        }
    }

    /// the live offer currently locking a collateral slot, if any
    pub fn active_offer_on(&self, collection: &str, item: u64) -> Option<&Offer> {
        self.active_slots
            .get(&(collection.to_string(), item))
            .and_then(|id| self.offers.get(id))
    }

    pub fn offers_for_owner<'a>(&'a self, owner: &'a AccountId) -> impl Iterator<Item = &'a Offer> {
        self.offers.values().filter(move |o| &o.owner == owner)
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    /// audit export of every record, terminal ones included
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut records: Vec<&Offer> = self.offers.values().collect();
        records.sort_by_key(|o| o.created_at);
        serde_json::to_string_pretty(&records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssetKind, CollateralRef, OfferState};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn offer_on(collection: &str, item: u64) -> Offer {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Offer {
            id: Uuid::new_v4(),
            owner: "borrower".into(),
            collateral: CollateralRef::new(collection, item, 1),
            principal_asset: AssetKind::Token("usdc".into()),
            destination: "borrower".into(),
            principal_amount: 100_000_000,
            borrow_period_secs: 604_800,
            lender_fee_rate: 100_000,
            service_fee_rate: 20_000,
            apply_window_start: t0,
            apply_window_end: t0 + chrono::Duration::days(7),
            state: OfferState::Open,
            lender: None,
            start_lending_at: None,
            end_lending_at: None,
            liquidation_at: None,
            created_at: t0,
        }
    }

    #[test]
    fn test_slot_exclusivity() {
        let mut ledger = OfferLedger::new();
        let first = offer_on("punks", 1);
        let first_id = first.id;
        ledger.insert(first).unwrap();

        let err = ledger.insert(offer_on("punks", 1)).unwrap_err();
        assert!(matches!(err, PawnError::SlotOccupied { holder } if holder == first_id));

        // a different item in the same collection is a different slot
        ledger.insert(offer_on("punks", 2)).unwrap();
    }

    #[test]
    fn test_slot_reusable_after_release() {
        let mut ledger = OfferLedger::new();
        let offer = offer_on("punks", 1);
        let id = offer.id;
        ledger.insert(offer).unwrap();

        ledger.get_mut(&id).unwrap().state = OfferState::Cancelled;
        ledger.release_slot(&id);

        ledger.insert(offer_on("punks", 1)).unwrap();
        // the cancelled record is retained for audit
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.get(&id).unwrap().state, OfferState::Cancelled);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut ledger = OfferLedger::new();
        let offer = offer_on("punks", 1);
        let mut dup = offer.clone();
        dup.collateral = CollateralRef::new("punks", 2, 1);
        ledger.insert(offer).unwrap();
        let err = ledger.insert(dup).unwrap_err();
        assert!(matches!(err, PawnError::DuplicateOffer { .. }));
    }

    #[test]
    fn test_json_export() {
        let mut ledger = OfferLedger::new();
        ledger.insert(offer_on("punks", 1)).unwrap();
        let json = ledger.to_json().unwrap();
        assert!(json.contains("punks"));
    }
}
