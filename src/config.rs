use serde::{Deserialize, Serialize};

use crate::errors::{PawnError, Result};
use crate::fees::SECONDS_PER_YEAR;
use crate::types::AccountId;

/// upper bound on any configured window; keeps every datetime offset
/// derived from config well inside chrono's representable range
const MAX_WINDOW_SECS: u64 = 100 * SECONDS_PER_YEAR;

/// engine configuration
///
/// window constants are fixed for the engine's lifetime; per-offer fee
/// rates live in the fee schedule registry instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PawnConfig {
    /// receives service fees
    pub treasury: AccountId,
    /// may change fee schedules and claim in the post-liquidation window
    pub admin: AccountId,
    /// liquidation window length after the lending period ends
    pub liquidation_period_secs: u64,
    /// shortest allowed lending period; also the period the minimum
    /// lender fee is quoted against at creation
    pub min_borrow_period_secs: u64,
    /// cap on end_lending_at measured from start_lending_at
    pub max_total_lending_secs: u64,
}

impl PawnConfig {
    pub fn new(treasury: impl Into<AccountId>, admin: impl Into<AccountId>) -> Self {
        Self {
            treasury: treasury.into(),
            admin: admin.into(),
            liquidation_period_secs: 259_200,
            min_borrow_period_secs: 604_800,
            max_total_lending_secs: SECONDS_PER_YEAR,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.liquidation_period_secs == 0 {
            return Err(PawnError::InvalidConfiguration {
                message: "liquidation period must be greater than 0".to_string(),
            });
        }
        if self.min_borrow_period_secs == 0 {
            return Err(PawnError::InvalidConfiguration {
                message: "minimum borrow period must be greater than 0".to_string(),
            });
        }
        if self.max_total_lending_secs < self.min_borrow_period_secs {
            return Err(PawnError::InvalidConfiguration {
                message: "maximum lending period below minimum borrow period".to_string(),
            });
        }
        if self.max_total_lending_secs > MAX_WINDOW_SECS
            || self.liquidation_period_secs > MAX_WINDOW_SECS
        {
            return Err(PawnError::InvalidConfiguration {
                message: "window exceeds 100 years".to_string(),
            });
        }
        Ok(())
    }
}
