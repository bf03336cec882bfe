use std::fmt;

/// A newtype wrapper for the identifier of a market participant's bid
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
#[repr(transparent)]
pub struct BidId(String);

impl BidId {
    /// View the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BidId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for BidId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for BidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which side of the market a bid is on
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Side {
    /// The participant wants to import energy (a deficit)
    Buy,
    /// The participant wants to export energy (a surplus)
    Sell,
}

/// An offer to buy or sell a quantity of energy (kWh) at a limit price (currency/kWh).
///
/// A bid is immutable once admitted: the only way to obtain a bid with a different
/// quantity is [`Bid::split`], which is how the clearing engine represents the
/// unmatched remainder of a partially filled bid.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "BidDto", into = "BidDto")
)]
pub struct Bid {
    id: BidId,
    side: Side,
    price: f64,
    quantity: f64,
}

impl Bid {
    /// Creates a new bid, validating the price and quantity
    pub fn new(
        id: impl Into<BidId>,
        side: Side,
        price: f64,
        quantity: f64,
    ) -> Result<Self, BidError> {
        Self::try_from(BidDto {
            id: id.into(),
            side,
            price,
            quantity,
        })
    }

    /// Convenience constructor for a buy bid
    pub fn buy(id: impl Into<BidId>, price: f64, quantity: f64) -> Result<Self, BidError> {
        Self::new(id, Side::Buy, price, quantity)
    }

    /// Convenience constructor for a sell bid
    pub fn sell(id: impl Into<BidId>, price: f64, quantity: f64) -> Result<Self, BidError> {
        Self::new(id, Side::Sell, price, quantity)
    }

    /// The bid identifier
    pub fn id(&self) -> &BidId {
        &self.id
    }

    /// The side of the market
    pub fn side(&self) -> Side {
        self.side
    }

    /// The limit price
    pub fn price(&self) -> f64 {
        self.price
    }

    /// The offered quantity
    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    /// True if this is a buy bid
    pub fn is_buy(&self) -> bool {
        self.side == Side::Buy
    }

    /// Returns a copy of this bid restricted to `quantity`.
    ///
    /// Yields `None` unless `0 < quantity <= self.quantity()`, so a split can never
    /// manufacture energy the participant did not offer.
    pub fn split(&self, quantity: f64) -> Option<Self> {
        if quantity > 0.0 && quantity <= self.quantity {
            Some(Self {
                id: self.id.clone(),
                side: self.side,
                price: self.price,
                quantity,
            })
        } else {
            None
        }
    }

    /// Returns a copy of this bid at a different limit price.
    ///
    /// Used by mechanisms that re-auction adjusted bids; the price must remain
    /// finite and non-negative.
    pub fn reprice(&self, price: f64) -> Result<Self, BidError> {
        Self::new(self.id.clone(), self.side, price, self.quantity)
    }
}

/// A DTO to ensure that we always validate when we deserialize from an untrusted source
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug)]
pub struct BidDto {
    /// The bid identifier (must be non-empty)
    pub id: BidId,
    /// Buy or sell
    pub side: Side,
    /// The limit price (finite, non-negative)
    pub price: f64,
    /// The quantity (finite, strictly positive)
    pub quantity: f64,
}

impl From<Bid> for BidDto {
    fn from(value: Bid) -> Self {
        Self {
            id: value.id,
            side: value.side,
            price: value.price,
            quantity: value.quantity,
        }
    }
}

impl TryFrom<BidDto> for Bid {
    type Error = BidError;

    fn try_from(value: BidDto) -> Result<Self, Self::Error> {
        let BidDto {
            id,
            side,
            price,
            quantity,
        } = value;

        if id.0.is_empty() {
            return Err(BidError::EmptyId);
        }
        if price.is_nan() || quantity.is_nan() {
            return Err(BidError::NaN(id));
        }
        if price.is_infinite() || quantity.is_infinite() {
            return Err(BidError::Infinity(id));
        }
        if quantity <= 0.0 {
            return Err(BidError::NonPositiveQuantity { id, quantity });
        }
        if price < 0.0 {
            return Err(BidError::NegativePrice { id, price });
        }

        Ok(Self {
            id,
            side,
            price,
            quantity,
        })
    }
}

/// The ways in which a bid can be inadmissible
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum BidError {
    /// Error when the identifier is empty
    #[error("bid id cannot be empty")]
    EmptyId,
    /// Error when the price or quantity is NaN
    #[error("bid {0}: NaN value encountered")]
    NaN(BidId),
    /// Error when the price or quantity is infinite
    #[error("bid {0}: prices and quantities cannot be infinite")]
    Infinity(BidId),
    /// Error when the quantity is zero or negative
    #[error("bid {id}: quantity must be positive, got {quantity}")]
    NonPositiveQuantity {
        /// The offending bid
        id: BidId,
        /// The submitted quantity
        quantity: f64,
    },
    /// Error when the price is negative
    #[error("bid {id}: price must be non-negative, got {price}")]
    NegativePrice {
        /// The offending bid
        id: BidId,
        /// The submitted price
        price: f64,
    },
    /// Error when the price exceeds the admissible cap
    #[error("bid {id}: price {price} exceeds the cap {cap}")]
    AboveCap {
        /// The offending bid
        id: BidId,
        /// The submitted price
        price: f64,
        /// The admissible cap
        cap: f64,
    },
    /// Error when two bids in the same period share an identifier
    #[error("duplicate bid id {0}")]
    DuplicateId(BidId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive_quantity() {
        assert_eq!(
            Bid::buy("a", 0.2, 0.0).unwrap_err(),
            BidError::NonPositiveQuantity {
                id: "a".into(),
                quantity: 0.0
            }
        );
        assert!(Bid::sell("a", 0.2, -1.0).is_err());
    }

    #[test]
    fn test_rejects_bad_prices() {
        assert_eq!(
            Bid::buy("a", -0.1, 1.0).unwrap_err(),
            BidError::NegativePrice {
                id: "a".into(),
                price: -0.1
            }
        );
        assert_eq!(
            Bid::buy("a", f64::NAN, 1.0).unwrap_err(),
            BidError::NaN("a".into())
        );
        assert_eq!(
            Bid::sell("a", f64::INFINITY, 1.0).unwrap_err(),
            BidError::Infinity("a".into())
        );
        assert_eq!(Bid::sell("", 0.1, 1.0).unwrap_err(), BidError::EmptyId);
    }

    #[test]
    fn test_split_cannot_grow() {
        let bid = Bid::buy("a", 0.2, 5.0).unwrap();
        assert_eq!(bid.split(2.0).unwrap().quantity(), 2.0);
        assert!(bid.split(5.5).is_none());
        assert!(bid.split(0.0).is_none());
    }

    #[test]
    fn test_deserialize_validates() {
        let raw = r#"{ "id": "h1", "side": "buy", "price": 0.2, "quantity": 15.0 }"#;
        let bid = serde_json::from_str::<Bid>(raw).unwrap();
        assert!(bid.is_buy());
        assert_eq!(bid.quantity(), 15.0);

        let raw = r#"{ "id": "h2", "side": "sell", "price": 0.2, "quantity": -3.0 }"#;
        assert!(serde_json::from_str::<Bid>(raw).is_err());
    }
}
