pub mod calculator;
pub mod schedule;

pub use calculator::{quote_fees, FeeQuote, SECONDS_PER_YEAR};
pub use schedule::{FeeScheduleRegistry, RateSchedule};
