use super::{Bid, BidError, map::Set};

/// An immutable snapshot of the bids submitted for one trading period.
///
/// Construction guarantees that every bid is individually valid (see [`Bid::new`])
/// and that identifiers are unique. The price cap is a clearing parameter rather
/// than a property of the snapshot, so it is checked separately by [`BidSet::check_cap`].
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<Bid>", into = "Vec<Bid>")
)]
pub struct BidSet(Vec<Bid>);

impl BidSet {
    /// Collect the bids into a set, rejecting duplicate identifiers
    pub fn new(bids: impl IntoIterator<Item = Bid>) -> Result<Self, BidError> {
        let bids = bids.into_iter().collect::<Vec<_>>();
        let mut seen = Set::with_capacity_and_hasher(bids.len(), Default::default());
        for bid in bids.iter() {
            if !seen.insert(bid.id()) {
                return Err(BidError::DuplicateId(bid.id().clone()));
            }
        }
        Ok(Self(bids))
    }

    /// Verify that every price lies in [0, cap]
    pub fn check_cap(&self, cap: f64) -> Result<(), BidError> {
        match self.0.iter().find(|bid| bid.price() > cap) {
            Some(bid) => Err(BidError::AboveCap {
                id: bid.id().clone(),
                price: bid.price(),
                cap,
            }),
            None => Ok(()),
        }
    }

    /// Iterate over all bids in submission order
    pub fn iter(&self) -> impl Iterator<Item = &Bid> {
        self.0.iter()
    }

    /// Iterate over the buy bids in submission order
    pub fn buys(&self) -> impl Iterator<Item = &Bid> {
        self.0.iter().filter(|bid| bid.is_buy())
    }

    /// Iterate over the sell bids in submission order
    pub fn sells(&self) -> impl Iterator<Item = &Bid> {
        self.0.iter().filter(|bid| !bid.is_buy())
    }

    /// The number of bids
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the period received no bids at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<Bid>> for BidSet {
    type Error = BidError;

    fn try_from(value: Vec<Bid>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BidSet> for Vec<Bid> {
    fn from(value: BidSet) -> Self {
        value.0
    }
}
