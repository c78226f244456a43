//! Parking fee computation.
//!
//! The tariff charges per started hour: the first hour is the base charge,
//! and every further started hour adds a flat amount on top.

use crate::currency::Rupiah;
use chrono::{DateTime, Utc};

const SECONDS_PER_HOUR: i64 = 3600;

/// A flat per-started-hour tariff.
///
/// The fee for a stay is `base + (started_hours - 1) * per_additional_hour`,
/// where `started_hours` is the elapsed time rounded up to whole hours and
/// never less than one. A stay of zero (or negative, from clock skew)
/// duration is charged the base amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    /// Charge for the first started hour.
    pub base: Rupiah,

    /// Charge for each started hour after the first.
    pub per_additional_hour: Rupiah,
}

impl Default for FeeSchedule {
    /// The deployed tariff: Rp3.000 for the first hour, Rp3.000 per started
    /// hour after that.
    fn default() -> Self {
        FeeSchedule {
            base: Rupiah::new(3000),
            per_additional_hour: Rupiah::new(3000),
        }
    }
}

impl FeeSchedule {
    /// Computes the fee for a stay that began at `entry` and ends now.
    ///
    /// Pure: the caller supplies `now` so the result is fixed at the instant
    /// the computation is made and is never silently re-evaluated.
    pub fn fee_for(&self, entry: DateTime<Utc>, now: DateTime<Utc>) -> Rupiah {
        let hours = Self::started_hours(entry, now);
        self.base + self.per_additional_hour * (hours - 1)
    }

    /// Elapsed time rounded up to whole hours, minimum one.
    fn started_hours(entry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        let elapsed_secs = (now - entry).num_seconds();
        if elapsed_secs <= 0 {
            return 1;
        }
        ((elapsed_secs + SECONDS_PER_HOUR - 1) / SECONDS_PER_HOUR).max(1)
    }
}
