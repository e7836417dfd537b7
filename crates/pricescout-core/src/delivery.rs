//! Delivery-time bucket estimation from logistics and seller reputation.

use crate::listing::{LogisticsTier, SellerTier};

/// A delivery bucket label plus whether the estimate can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryEstimate {
    pub label: &'static str,
    pub confident: bool,
}

impl DeliveryEstimate {
    const fn confident(label: &'static str) -> Self {
        Self {
            label,
            confident: true,
        }
    }

    const fn uncertain(label: &'static str) -> Self {
        Self {
            label,
            confident: false,
        }
    }
}

/// Maps `(logistics, seller_tier)` to a delivery bucket.
///
/// Platform fulfillment always wins the shortest bucket. Drop-off and
/// cross-docking shorten for high-reputation sellers. Unknown logistics is
/// never confident: with a known reputation signal the caller is asked to
/// verify, without one the bucket is flagged as uncertain.
#[must_use]
pub fn estimate_delivery(logistics: LogisticsTier, seller_tier: SellerTier) -> DeliveryEstimate {
    match logistics {
        LogisticsTier::Fulfillment => DeliveryEstimate::confident("≤3 dias"),
        LogisticsTier::DropOff if seller_tier.is_high_reputation() => {
            DeliveryEstimate::confident("≤5 dias")
        }
        LogisticsTier::DropOff => DeliveryEstimate::confident("≤7 dias"),
        LogisticsTier::CrossDocking if seller_tier.is_high_reputation() => {
            DeliveryEstimate::confident("≤7 dias")
        }
        LogisticsTier::CrossDocking => DeliveryEstimate::confident("≤12 dias"),
        LogisticsTier::Unknown if seller_tier == SellerTier::Regular => {
            DeliveryEstimate::uncertain("⚠️ prazo incerto")
        }
        LogisticsTier::Unknown => DeliveryEstimate::uncertain("⚠️ verificar"),
    }
}
