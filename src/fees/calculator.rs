use serde::{Deserialize, Serialize};

/// year length used by every fee computation, quoting and execution alike
pub const SECONDS_PER_YEAR: u64 = 31_556_926;

/// parts-per-million denominator for fee rates (100_000 = 10%)
pub const RATE_DENOMINATOR: u64 = 1_000_000;

/// lender and service fee for one period, in principal-asset base units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeeQuote {
    pub lender_fee: u128,
    pub service_fee: u128,
}

impl FeeQuote {
    pub fn total(&self) -> u128 {
        self.lender_fee + self.service_fee
    }
}

/// time-prorated fee for a single rate
///
/// fee = floor(period * principal * rate / SECONDS_PER_YEAR / 1_000_000),
/// rate in parts-per-million. Returns `None` when the intermediate
/// product exceeds u128, so callers surface a validation error instead
/// of panicking on adversarial magnitudes.
pub fn prorated_fee(principal: u128, rate_ppm: u32, period_secs: u64) -> Option<u128> {
    let scaled = principal
        .checked_mul(rate_ppm as u128)?
        .checked_mul(period_secs as u128)?;
    Some(scaled / SECONDS_PER_YEAR as u128 / RATE_DENOMINATOR as u128)
}

/// quote both origination-style fees for a principal over a period
///
/// pure projection: callers rely on the mutating operations reproducing
/// these exact numbers.
pub fn quote_fees(
    principal: u128,
    lender_rate_ppm: u32,
    service_rate_ppm: u32,
    period_secs: u64,
) -> Option<FeeQuote> {
    Some(FeeQuote {
        lender_fee: prorated_fee(principal, lender_rate_ppm, period_secs)?,
        service_fee: prorated_fee(principal, service_rate_ppm, period_secs)?,
    })
}
