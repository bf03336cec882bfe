use super::{Bid, BidId, Transaction};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use std::hash::Hash;

/// An insertion-ordered map, by default from a key to a real value.
///
/// Clearing the same bids twice must report identical diagnostics, so iteration
/// follows insertion order rather than hash order. Per-participant values
/// (traded quantities, Shapley shares, participant prices) are `Map<BidId>`,
/// which adds a few constructors for the shapes the mechanisms produce.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Map<K: Eq + Hash, V = f64>(IndexMap<K, V, FxBuildHasher>);

/// An insertion-ordered set with the same hasher as [`Map`]
pub(crate) type Set<T> = indexmap::IndexSet<T, FxBuildHasher>;

impl<K: Eq + Hash, V> Default for Map<K, V> {
    fn default() -> Self {
        Self(IndexMap::default())
    }
}

impl<K: Eq + Hash, V> std::ops::Deref for Map<K, V> {
    type Target = IndexMap<K, V, FxBuildHasher>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<K: Eq + Hash, V> std::ops::DerefMut for Map<K, V> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<K: Eq + Hash, V> IntoIterator for Map<K, V> {
    type Item = (K, V);
    type IntoIter = indexmap::map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K: Eq + Hash, V> FromIterator<(K, V)> for Map<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(IndexMap::from_iter(iter))
    }
}

impl<K: Eq + Hash> Map<K> {
    /// Add `amount` to the value under `key`, which starts at zero
    pub fn accumulate(&mut self, key: K, amount: f64) {
        *self.0.entry(key).or_default() += amount;
    }

    /// The sum of all values
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }
}

impl Map<BidId> {
    /// Key `values` by the ids of `bids`, position by position
    pub fn per_bid<'a>(
        bids: impl IntoIterator<Item = &'a Bid>,
        values: impl IntoIterator<Item = f64>,
    ) -> Self {
        bids.into_iter()
            .zip(values)
            .map(|(bid, value)| (bid.id().clone(), value))
            .collect()
    }

    /// The quantity each buyer and seller trades across `transactions`
    pub fn traded<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let mut traded = Self::default();
        for transaction in transactions {
            traded.accumulate(transaction.buyer_id.clone(), transaction.quantity);
            traded.accumulate(transaction.seller_id.clone(), transaction.quantity);
        }
        traded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traded_counts_both_sides() {
        let trade = |buyer: &str, seller: &str, quantity| Transaction {
            buyer_id: buyer.into(),
            seller_id: seller.into(),
            price: 0.15,
            quantity,
        };
        let traded = Map::traded(&[trade("b1", "s1", 2.0), trade("b1", "s2", 1.5)]);

        assert_eq!(traded[&BidId::from("b1")], 3.5);
        assert_eq!(traded[&BidId::from("s2")], 1.5);
        // First appearance fixes the order
        let ids = traded.keys().map(BidId::as_str).collect::<Vec<_>>();
        assert_eq!(ids, ["b1", "s1", "s2"]);
        assert_eq!(traded.total(), 7.0);
    }

    #[test]
    fn test_per_bid_follows_positions() {
        let bids = [
            Bid::buy("b", 0.2, 1.0).unwrap(),
            Bid::sell("s", 0.1, 1.0).unwrap(),
        ];
        let shares = Map::per_bid(&bids, [0.3, 0.1]);
        assert_eq!(shares[&BidId::from("s")], 0.1);
        assert!((shares.total() - 0.4).abs() < 1e-12);
    }
}
