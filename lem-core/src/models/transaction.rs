use super::BidId;

/// A bilateral trade: `quantity` kWh delivered from `seller_id` to `buyer_id` at `price`.
///
/// Both clearing steps produce transactions of this shape, and the final ledger is
/// simply their concatenation. This is the only contract with downstream consumers
/// such as a value-sharing module.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transaction {
    /// The buying bid
    pub buyer_id: BidId,
    /// The selling bid
    pub seller_id: BidId,
    /// The price per kWh
    pub price: f64,
    /// The energy traded (kWh, positive)
    pub quantity: f64,
}

impl Transaction {
    /// The cash flow of the trade
    pub fn value(&self) -> f64 {
        self.price * self.quantity
    }
}
