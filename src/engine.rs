use chrono::{DateTime, Duration, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::config::PawnConfig;
use crate::errors::{PawnError, Result};
use crate::events::{Event, EventStore};
use crate::fees::{quote_fees, FeeQuote, FeeScheduleRegistry};
use crate::gateway::{AssetTransferGateway, FungibleTransfer};
use crate::ledger::OfferLedger;
use crate::offer::{Offer, OfferFingerprint};
use crate::types::{AccountId, AssetKind, CollateralRef, OfferId, OfferState};

/// parameters for creating an offer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOfferRequest {
    pub id: OfferId,
    pub collateral: CollateralRef,
    /// receives the net principal on match; usually the borrower
    pub destination: AccountId,
    pub principal_amount: u128,
    pub principal_asset: AssetKind,
    pub borrow_period_secs: u64,
    pub apply_window_start: DateTime<Utc>,
    pub apply_window_end: DateTime<Utc>,
    /// lender rate chosen by the borrower; defaults to the registry rate
    pub lender_fee_rate: Option<u32>,
}

/// everything a lender needs to fund an offer on exact terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyQuote {
    pub lender_fee: u128,
    pub service_fee: u128,
    /// principal minus both fees, delivered to the offer's destination
    pub net_to_borrower: u128,
    /// passed back with apply; any term change in between aborts the call
    pub fingerprint: OfferFingerprint,
}

/// the offer lifecycle engine
///
/// single writer over the ledger: every transition validates against the
/// current time, asks the gateway to move assets, and only then writes
/// state, so a failed transfer leaves nothing behind.
pub struct PawnShop<G: AssetTransferGateway> {
    pub config: PawnConfig,
    pub registry: FeeScheduleRegistry,
    pub ledger: OfferLedger,
    pub gateway: G,
    pub events: EventStore,
}

impl<G: AssetTransferGateway> PawnShop<G> {
    pub fn new(config: PawnConfig, registry: FeeScheduleRegistry, gateway: G) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry,
            ledger: OfferLedger::new(),
            gateway,
            events: EventStore::new(),
        })
    }

    /// read access to a stored offer
    pub fn offer(&self, id: &OfferId) -> Result<&Offer> {
        self.ledger.get(id)
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    // ------------------------------------------------------------------
    // admin surface
    // ------------------------------------------------------------------

    /// set default rates for an asset; affects offers created afterwards only
    pub fn set_rates(
        &mut self,
        caller: &str,
        asset: AssetKind,
        lender_fee_rate: u32,
        service_fee_rate: u32,
        time: &SafeTimeProvider,
    ) -> Result<()> {
        if caller != self.config.admin {
            return Err(PawnError::NotAdmin);
        }
        self.registry
            .set_rates(asset.clone(), lender_fee_rate, service_fee_rate);
        self.events.emit(Event::RatesChanged {
            asset,
            lender_fee_rate,
            service_fee_rate,
            timestamp: time.now(),
        });
        Ok(())
    }

    /// register a newly supported principal asset with its default rates
    pub fn add_supported_asset(
        &mut self,
        caller: &str,
        asset: AssetKind,
        lender_fee_rate: u32,
        service_fee_rate: u32,
        time: &SafeTimeProvider,
    ) -> Result<()> {
        self.set_rates(caller, asset, lender_fee_rate, service_fee_rate, time)
    }

    /// drop an asset from the supported set; running offers keep their rates
    pub fn remove_supported_asset(&mut self, caller: &str, asset: &AssetKind) -> Result<()> {
        if caller != self.config.admin {
            return Err(PawnError::NotAdmin);
        }
        self.registry.remove_asset(asset);
        Ok(())
    }

    // ------------------------------------------------------------------
    // quote projections
    // ------------------------------------------------------------------

    /// fees for an arbitrary period on an offer's snapshotted rates
    pub fn quote_offer_fees(&self, id: &OfferId, period_secs: u64) -> Result<FeeQuote> {
        let offer = self.ledger.get(id)?;
        checked_quote(
            offer.principal_amount,
            offer.lender_fee_rate,
            offer.service_fee_rate,
            period_secs,
        )
    }

    /// exact transfer amounts an apply on current terms would produce
    pub fn quote_apply_amounts(&self, id: &OfferId) -> Result<ApplyQuote> {
        let offer = self.ledger.get(id)?;
        if !offer.is_open() {
            return Err(PawnError::NotOpen { state: offer.state });
        }
        let quote = checked_quote(
            offer.principal_amount,
            offer.lender_fee_rate,
            offer.service_fee_rate,
            offer.borrow_period_secs,
        )?;
        let net = offer
            .principal_amount
            .checked_sub(quote.total())
            .ok_or(PawnError::FeeBelowMinimum {
                principal: offer.principal_amount,
                rate_ppm: offer.lender_fee_rate,
            })?;
        Ok(ApplyQuote {
            lender_fee: quote.lender_fee,
            service_fee: quote.service_fee,
            net_to_borrower: net,
            fingerprint: offer.fingerprint(),
        })
    }

    /// fees a proposed extension would charge, on the frozen rates
    pub fn quote_extend_fees(&self, id: &OfferId, additional_secs: u64) -> Result<FeeQuote> {
        let offer = self.ledger.get(id)?;
        if !offer.is_in_progress() {
            return Err(PawnError::NotInProgress { state: offer.state });
        }
        checked_quote(
            offer.principal_amount,
            offer.lender_fee_rate,
            offer.service_fee_rate,
            additional_secs,
        )
    }

    // ------------------------------------------------------------------
    // lifecycle operations
    // ------------------------------------------------------------------

    /// create an offer: validate terms, escrow collateral, persist as open
    pub fn create_offer(
        &mut self,
        caller: &str,
        request: CreateOfferRequest,
        time: &SafeTimeProvider,
    ) -> Result<OfferFingerprint> {
        let now = time.now();

        if request.principal_amount == 0 {
            return Err(PawnError::InvalidAmount {
                amount: request.principal_amount,
            });
        }
        self.check_borrow_period(request.borrow_period_secs)?;
        if request.apply_window_end <= now || request.apply_window_end <= request.apply_window_start
        {
            return Err(PawnError::InvalidWindow {
                start: request.apply_window_start,
                end: request.apply_window_end,
            });
        }

        // snapshot rates now; registry changes never touch this offer again
        let defaults = self.registry.get_rates(&request.principal_asset)?;
        let lender_fee_rate = request.lender_fee_rate.unwrap_or(defaults.lender_fee_rate);
        let service_fee_rate = defaults.service_fee_rate;

        // a principal too small to yield any lender fee over the minimum
        // period can never pay out; reject it up front
        let minimum = checked_quote(
            request.principal_amount,
            lender_fee_rate,
            service_fee_rate,
            self.config.min_borrow_period_secs,
        )?;
        if minimum.lender_fee == 0 {
            return Err(PawnError::FeeBelowMinimum {
                principal: request.principal_amount,
                rate_ppm: lender_fee_rate,
            });
        }

        if self.ledger.get(&request.id).is_ok() {
            return Err(PawnError::DuplicateOffer { id: request.id });
        }
        if let Some(holder) = self
            .ledger
            .active_offer_on(&request.collateral.collection, request.collateral.item)
        {
            return Err(PawnError::SlotOccupied { holder: holder.id });
        }

        self.gateway.escrow_collateral(caller, &request.collateral)?;

        let offer = Offer {
            id: request.id,
            owner: caller.to_string(),
            collateral: request.collateral.clone(),
            principal_asset: request.principal_asset.clone(),
            destination: request.destination.clone(),
            principal_amount: request.principal_amount,
            borrow_period_secs: request.borrow_period_secs,
            lender_fee_rate,
            service_fee_rate,
            apply_window_start: request.apply_window_start,
            apply_window_end: request.apply_window_end,
            state: OfferState::Open,
            lender: None,
            start_lending_at: None,
            end_lending_at: None,
            liquidation_at: None,
            created_at: now,
        };
        let fingerprint = offer.fingerprint();
        self.ledger.insert(offer)?;

        self.events.emit(Event::OfferCreated {
            offer_id: request.id,
            collateral: request.collateral,
            owner: caller.to_string(),
            destination: request.destination,
            principal_amount: request.principal_amount,
            principal_asset: request.principal_asset,
            apply_window_start: request.apply_window_start,
            apply_window_end: request.apply_window_end,
        });
        Ok(fingerprint)
    }

    /// change amount, period or lender rate of an open offer; `None`
    /// fields are left untouched
    pub fn update_offer(
        &mut self,
        caller: &str,
        id: &OfferId,
        new_amount: Option<u128>,
        new_period_secs: Option<u64>,
        new_lender_rate: Option<u32>,
    ) -> Result<OfferFingerprint> {
        // validate every field before touching the record, so a rejected
        // update leaves the offer exactly as quoted
        if let Some(amount) = new_amount {
            if amount == 0 {
                return Err(PawnError::InvalidAmount { amount });
            }
        }
        if let Some(period) = new_period_secs {
            self.check_borrow_period(period)?;
        }
        let offer = self.ledger.get_mut(id)?;
        if offer.owner != caller {
            return Err(PawnError::NotOwner);
        }
        if !offer.is_open() {
            return Err(PawnError::NotOpen { state: offer.state });
        }
        if let Some(amount) = new_amount {
            offer.principal_amount = amount;
        }
        if let Some(period) = new_period_secs {
            offer.borrow_period_secs = period;
        }
        if let Some(rate) = new_lender_rate {
            offer.lender_fee_rate = rate;
        }
        let fingerprint = offer.fingerprint();
        let event = Event::OfferUpdated {
            offer_id: *id,
            collateral: offer.collateral.clone(),
            principal_amount: offer.principal_amount,
            borrow_period_secs: offer.borrow_period_secs,
            lender_fee_rate: offer.lender_fee_rate,
        };
        self.events.emit(event);
        Ok(fingerprint)
    }

    /// withdraw an open offer and take the collateral back
    pub fn cancel_offer(
        &mut self,
        caller: &str,
        id: &OfferId,
        time: &SafeTimeProvider,
    ) -> Result<()> {
        let offer = self.ledger.get(id)?;
        if offer.owner != caller {
            return Err(PawnError::NotOwner);
        }
        if !offer.is_open() {
            return Err(PawnError::NotOpen { state: offer.state });
        }
        let collateral = offer.collateral.clone();
        let owner = offer.owner.clone();

        self.gateway.release_collateral(&collateral, &owner)?;

        let offer = self.ledger.get_mut(id)?;
        offer.state = OfferState::Cancelled;
        self.ledger.release_slot(id);

        self.events.emit(Event::OfferCancelled {
            offer_id: *id,
            collateral,
            timestamp: time.now(),
        });
        Ok(())
    }

    /// fund an open offer as its lender
    ///
    /// `attached` is the native value sent with the call; required to
    /// match `supplied` exactly for native-currency principal and absent
    /// for token principal.
    pub fn apply_offer(
        &mut self,
        caller: &str,
        id: &OfferId,
        fingerprint: &OfferFingerprint,
        supplied: u128,
        attached: Option<u128>,
        time: &SafeTimeProvider,
    ) -> Result<()> {
        let now = time.now();
        let offer = self.ledger.get(id)?;
        if !offer.is_open() {
            return Err(PawnError::NotOpen { state: offer.state });
        }
        if now > offer.apply_window_end {
            return Err(PawnError::Expired {
                window_end: offer.apply_window_end,
            });
        }
        // anti-front-running guard: terms must be the ones quoted against
        if *fingerprint != offer.fingerprint() {
            return Err(PawnError::StaleApply);
        }
        if supplied != offer.principal_amount {
            return Err(PawnError::AmountMismatch {
                supplied,
                required: offer.principal_amount,
            });
        }
        check_attached_value(&offer.principal_asset, attached, supplied)?;

        let quote = self.quote_apply_amounts(id)?;
        let offer = self.ledger.get(id)?;
        let asset = offer.principal_asset.clone();
        let collateral = offer.collateral.clone();
        let destination = offer.destination.clone();
        let period = offer.borrow_period_secs;

        // the lender fee never moves: it is the lender's day-one yield,
        // deducted from what the borrower receives
        self.gateway.transfer_fungible_batch(&[
            FungibleTransfer {
                asset: asset.clone(),
                from: caller.to_string(),
                to: destination,
                amount: quote.net_to_borrower,
            },
            FungibleTransfer {
                asset,
                from: caller.to_string(),
                to: self.config.treasury.clone(),
                amount: quote.service_fee,
            },
        ])?;

        let end_lending_at = now + Duration::seconds(period as i64);
        let liquidation_at =
            end_lending_at + Duration::seconds(self.config.liquidation_period_secs as i64);

        let offer = self.ledger.get_mut(id)?;
        offer.state = OfferState::InProgress;
        offer.lender = Some(caller.to_string());
        offer.start_lending_at = Some(now);
        offer.end_lending_at = Some(end_lending_at);
        offer.liquidation_at = Some(liquidation_at);

        self.events.emit(Event::OfferApplied {
            offer_id: *id,
            collateral,
            lender: caller.to_string(),
            lender_fee: quote.lender_fee,
            service_fee: quote.service_fee,
            net_to_borrower: quote.net_to_borrower,
            start_lending_at: now,
            end_lending_at,
            liquidation_at,
        });
        Ok(())
    }

    /// repay a running loan before it matures and take the collateral back
    pub fn repay(
        &mut self,
        caller: &str,
        id: &OfferId,
        supplied: u128,
        attached: Option<u128>,
        time: &SafeTimeProvider,
    ) -> Result<()> {
        let now = time.now();
        let offer = self.ledger.get(id)?;
        if !offer.is_in_progress() {
            return Err(PawnError::NotInProgress { state: offer.state });
        }
        if offer.owner != caller {
            return Err(PawnError::NotOwner);
        }
        let end_lending_at = offer.end_lending_at.expect("in-progress offer has end time");
        if now > end_lending_at {
            // an overdue loan cannot be repaid; it goes through claim
            return Err(PawnError::Overdue { end_lending_at });
        }
        if supplied != offer.principal_amount {
            return Err(PawnError::AmountMismatch {
                supplied,
                required: offer.principal_amount,
            });
        }
        check_attached_value(&offer.principal_asset, attached, supplied)?;

        let asset = offer.principal_asset.clone();
        let collateral = offer.collateral.clone();
        let owner = offer.owner.clone();
        let lender = offer.lender.clone().expect("in-progress offer has lender");
        let principal = offer.principal_amount;

        self.gateway
            .transfer_fungible(&asset, caller, &lender, principal)?;
        self.gateway.release_collateral(&collateral, &owner)?;

        let offer = self.ledger.get_mut(id)?;
        offer.state = OfferState::Repaid;
        // zero the money fields to signal closure
        offer.principal_amount = 0;
        offer.lender = None;
        self.ledger.release_slot(id);

        self.events.emit(Event::Repay {
            offer_id: *id,
            collateral,
            borrower: owner,
            repaid_amount: principal,
            timestamp: now,
        });
        Ok(())
    }

    /// lengthen a running loan, paying extension fees up front
    ///
    /// fees use the rates frozen at creation, never the registry's
    /// current defaults. `attached` must cover the total fee for
    /// native-currency principal.
    pub fn extend_lending_time(
        &mut self,
        caller: &str,
        id: &OfferId,
        additional_secs: u64,
        attached: Option<u128>,
        time: &SafeTimeProvider,
    ) -> Result<()> {
        let now = time.now();
        let offer = self.ledger.get(id)?;
        if !offer.is_in_progress() {
            return Err(PawnError::NotInProgress { state: offer.state });
        }
        if offer.owner != caller {
            return Err(PawnError::NotOwner);
        }
        if additional_secs == 0 {
            return Err(PawnError::InvalidPeriod {
                period_secs: additional_secs,
            });
        }
        // an extension longer than the total cap can never fit; reject it
        // before any datetime arithmetic on it
        if additional_secs > self.config.max_total_lending_secs {
            return Err(PawnError::OverMaxExtension {
                requested_secs: additional_secs,
                max_total_secs: self.config.max_total_lending_secs,
            });
        }
        let end_lending_at = offer.end_lending_at.expect("in-progress offer has end time");
        if now > end_lending_at {
            return Err(PawnError::LendingWindowClosed { end_lending_at });
        }

        let start_lending_at = offer
            .start_lending_at
            .expect("in-progress offer has start time");
        let new_end = end_lending_at + Duration::seconds(additional_secs as i64);
        let total_secs = (new_end - start_lending_at).num_seconds() as u64;
        if total_secs > self.config.max_total_lending_secs {
            return Err(PawnError::OverMaxExtension {
                requested_secs: total_secs,
                max_total_secs: self.config.max_total_lending_secs,
            });
        }

        let quote = self.quote_extend_fees(id, additional_secs)?;
        let offer = self.ledger.get(id)?;
        check_attached_value(&offer.principal_asset, attached, quote.total())?;

        let asset = offer.principal_asset.clone();
        let collateral = offer.collateral.clone();
        let lender = offer.lender.clone().expect("in-progress offer has lender");

        self.gateway.transfer_fungible_batch(&[
            FungibleTransfer {
                asset: asset.clone(),
                from: caller.to_string(),
                to: lender,
                amount: quote.lender_fee,
            },
            FungibleTransfer {
                asset,
                from: caller.to_string(),
                to: self.config.treasury.clone(),
                amount: quote.service_fee,
            },
        ])?;

        let liquidation_at =
            new_end + Duration::seconds(self.config.liquidation_period_secs as i64);
        let offer = self.ledger.get_mut(id)?;
        offer.end_lending_at = Some(new_end);
        offer.liquidation_at = Some(liquidation_at);

        self.events.emit(Event::ExtendLendingTimeRequested {
            offer_id: *id,
            collateral,
            end_lending_at: new_end,
            liquidation_at,
            lender_fee: quote.lender_fee,
            service_fee: quote.service_fee,
        });
        Ok(())
    }

    /// seize the collateral of a matured, unpaid loan
    ///
    /// in the liquidation window only the lender may claim; after it the
    /// claimant set widens to admin, lender or borrower. The collateral
    /// goes to whoever claims.
    pub fn claim(&mut self, caller: &str, id: &OfferId, time: &SafeTimeProvider) -> Result<()> {
        let now = time.now();
        let offer = self.ledger.get(id)?;
        if !offer.is_in_progress() {
            return Err(PawnError::NotInProgress { state: offer.state });
        }
        let end_lending_at = offer.end_lending_at.expect("in-progress offer has end time");
        let liquidation_at = offer
            .liquidation_at
            .expect("in-progress offer has liquidation time");
        if now <= end_lending_at {
            return Err(PawnError::StillLending { end_lending_at });
        }

        let lender = offer.lender.as_deref().expect("in-progress offer has lender");
        if now <= liquidation_at {
            if caller != lender {
                return Err(PawnError::NotAuthorizedAtThisTime { liquidation_at });
            }
        } else if caller != lender && caller != offer.owner && caller != self.config.admin {
            return Err(PawnError::InvalidClaimant);
        }

        let collateral = offer.collateral.clone();
        self.gateway.release_collateral(&collateral, caller)?;

        let offer = self.ledger.get_mut(id)?;
        offer.state = OfferState::Claimed;
        self.ledger.release_slot(id);

        self.events.emit(Event::NFTClaim {
            offer_id: *id,
            collateral,
            claimant: caller.to_string(),
            timestamp: now,
        });
        Ok(())
    }

    /// a borrow period must be non-zero and fit inside the total lending
    /// cap; the cap also keeps end-date arithmetic on it in range
    fn check_borrow_period(&self, period_secs: u64) -> Result<()> {
        if period_secs == 0 || period_secs > self.config.max_total_lending_secs {
            return Err(PawnError::InvalidPeriod { period_secs });
        }
        Ok(())
    }
}

/// fee quote surfacing magnitude overflow as a validation error
fn checked_quote(
    principal: u128,
    lender_rate_ppm: u32,
    service_rate_ppm: u32,
    period_secs: u64,
) -> Result<FeeQuote> {
    quote_fees(principal, lender_rate_ppm, service_rate_ppm, period_secs).ok_or(
        PawnError::FeeOverflow {
            principal,
            period_secs,
        },
    )
}

/// native principal must arrive with a matching attached value; token
/// principal must not carry one
fn check_attached_value(asset: &AssetKind, attached: Option<u128>, required: u128) -> Result<()> {
    let valid = match asset {
        AssetKind::Native => attached == Some(required),
        AssetKind::Token(_) => attached.is_none(),
    };
    if valid {
        Ok(())
    } else {
        Err(PawnError::ValueMismatch { attached, required })
    }
}
