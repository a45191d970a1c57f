use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{PawnError, Result};
use crate::types::AssetKind;

/// default fee rates for one principal asset, parts-per-million
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSchedule {
    pub lender_fee_rate: u32,
    pub service_fee_rate: u32,
}

/// current default fee rates per supported principal asset
///
/// rates are snapshotted onto offers at creation; changing them here
/// never touches open or running loans.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeeScheduleRegistry {
    rates: HashMap<AssetKind, RateSchedule>,
}

impl FeeScheduleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// register an asset with its default rates; overwrites existing rates
    pub fn set_rates(&mut self, asset: AssetKind, lender_fee_rate: u32, service_fee_rate: u32) {
        self.rates.insert(
            asset,
            RateSchedule {
                lender_fee_rate,
                service_fee_rate,
            },
        );
    }

    /// drop an asset from the supported set
    pub fn remove_asset(&mut self, asset: &AssetKind) {
        self.rates.remove(asset);
    }

    pub fn is_supported(&self, asset: &AssetKind) -> bool {
        self.rates.contains_key(asset)
    }

    /// current default rates for an asset
    pub fn get_rates(&self, asset: &AssetKind) -> Result<RateSchedule> {
        self.rates
            .get(asset)
            .copied()
            .ok_or_else(|| PawnError::UnsupportedAsset {
                asset: asset.clone(),
            })
    }
}
