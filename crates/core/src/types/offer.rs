//! Time-bounded percentage discounts attached to products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`SpecialOffer`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum SpecialOfferError {
    /// The discount percentage is outside 0-100.
    #[error("discount percentage must be between 0 and 100, got {0}")]
    PercentageOutOfRange(i16),
    /// The offer window ends before it starts.
    #[error("offer end must be after offer start")]
    EndBeforeStart,
}

/// A time-bounded percentage discount.
///
/// An offer is *active* only if its percentage is greater than zero and the
/// current time falls within `[start, end)`. A missing bound leaves that side
/// of the window open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialOffer {
    /// Discount percentage, 0-100.
    pub discount_percentage: i16,
    /// Inclusive start of the offer window.
    pub offer_start: Option<DateTime<Utc>>,
    /// Exclusive end of the offer window.
    pub offer_end: Option<DateTime<Utc>>,
}

impl SpecialOffer {
    /// Create a new offer, validating the percentage and window.
    ///
    /// # Errors
    ///
    /// Returns an error if the percentage is outside 0-100 or the window is
    /// inverted.
    pub fn new(
        discount_percentage: i16,
        offer_start: Option<DateTime<Utc>>,
        offer_end: Option<DateTime<Utc>>,
    ) -> Result<Self, SpecialOfferError> {
        if !(0..=100).contains(&discount_percentage) {
            return Err(SpecialOfferError::PercentageOutOfRange(discount_percentage));
        }
        if let (Some(start), Some(end)) = (offer_start, offer_end)
            && end <= start
        {
            return Err(SpecialOfferError::EndBeforeStart);
        }
        Ok(Self {
            discount_percentage,
            offer_start,
            offer_end,
        })
    }

    /// Whether the offer is active at `now`.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        if self.discount_percentage <= 0 {
            return false;
        }
        if let Some(start) = self.offer_start
            && now < start
        {
            return false;
        }
        if let Some(end) = self.offer_end
            && now >= end
        {
            return false;
        }
        true
    }

    /// The discounted unit price, if the offer is active at `now`.
    ///
    /// Returns `None` for inactive offers so callers fall back to the base
    /// price.
    #[must_use]
    pub fn discounted_price(&self, price: Decimal, now: DateTime<Utc>) -> Option<Decimal> {
        if !self.is_active(now) {
            return None;
        }
        let factor = (Decimal::ONE_HUNDRED - Decimal::from(self.discount_percentage))
            / Decimal::ONE_HUNDRED;
        Some((price * factor).round_dp(2))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(SpecialOffer::new(-1, None, None).is_err());
        assert!(SpecialOffer::new(101, None, None).is_err());
        assert!(SpecialOffer::new(0, None, None).is_ok());
        assert!(SpecialOffer::new(100, None, None).is_ok());
    }

    #[test]
    fn test_inverted_window_rejected() {
        assert!(SpecialOffer::new(10, Some(ts(100)), Some(ts(50))).is_err());
        assert!(SpecialOffer::new(10, Some(ts(100)), Some(ts(100))).is_err());
    }

    #[test]
    fn test_zero_percentage_never_active() {
        let offer = SpecialOffer::new(0, None, None).unwrap();
        assert!(!offer.is_active(ts(0)));
    }

    #[test]
    fn test_window_half_open() {
        let offer = SpecialOffer::new(25, Some(ts(100)), Some(ts(200))).unwrap();
        assert!(!offer.is_active(ts(99)));
        assert!(offer.is_active(ts(100)));
        assert!(offer.is_active(ts(199)));
        // End is exclusive
        assert!(!offer.is_active(ts(200)));
    }

    #[test]
    fn test_unbounded_sides() {
        let open_start = SpecialOffer::new(10, None, Some(ts(200))).unwrap();
        assert!(open_start.is_active(ts(0)));
        let open_end = SpecialOffer::new(10, Some(ts(100)), None).unwrap();
        assert!(open_end.is_active(ts(1_000_000)));
    }

    #[test]
    fn test_discounted_price() {
        let offer = SpecialOffer::new(25, None, None).unwrap();
        let price = Decimal::new(20000, 2); // 200.00
        assert_eq!(
            offer.discounted_price(price, ts(0)),
            Some(Decimal::new(15000, 2))
        );

        let expired = SpecialOffer::new(25, Some(ts(0)), Some(ts(1))).unwrap();
        assert_eq!(expired.discounted_price(price, ts(5)), None);
    }
}
