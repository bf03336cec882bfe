use crate::QUANTITY_TOLERANCE;
use lem_core::models::{Bid, BidError, BidSet, ClearingOutcome, MechanismParams, Transaction};
use tracing::{Level, event};

/// The uniform-price double auction.
///
/// Buys are ranked by descending price and sells by ascending price. Every
/// submitted price is a candidate clearing price; the clearer picks the lowest
/// candidate that maximizes the tradable volume `min(demand(p), supply(p))`,
/// where `demand(p)` sums the buys priced at or above `p` and `supply(p)` the
/// sells priced at or below it. Admitted bids are paired in merit order at that
/// single price until the volume is exhausted; whatever is left over, including
/// the unfilled part of a marginal bid, is returned as the uncovered residual.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformPriceClearer;

impl UniformPriceClearer {
    /// Clear a bid set. Fails only if a bid is priced above `params.cap`.
    pub fn clear(
        &self,
        bids: &BidSet,
        params: &MechanismParams,
    ) -> Result<ClearingOutcome, BidError> {
        bids.check_cap(params.cap)?;
        let outcome = clear_refs(bids.buys().collect(), bids.sells().collect());

        event!(
            Level::DEBUG,
            price = outcome.clearing_price,
            quantity = outcome.clearing_quantity,
            uncovered_buys = outcome.uncovered_buys.len(),
            uncovered_sells = outcome.uncovered_sells.len(),
            "uniform price step complete"
        );

        Ok(outcome)
    }
}

/// Clear already-validated bids. Shared with the repeated auctions of AUP.
pub(crate) fn clear_refs(mut buys: Vec<&Bid>, mut sells: Vec<&Bid>) -> ClearingOutcome {
    buys.sort_by(|a, b| b.price().total_cmp(&a.price()));
    sells.sort_by(|a, b| a.price().total_cmp(&b.price()));

    let Some((price, volume)) = clearing_point(&buys, &sells) else {
        return ClearingOutcome {
            uncovered_buys: buys.into_iter().cloned().collect(),
            uncovered_sells: sells.into_iter().cloned().collect(),
            ..Default::default()
        };
    };

    // Only bids on the right side of the price take part
    let admitted_buys = buys.iter().take_while(|bid| bid.price() >= price).count();
    let admitted_sells = sells.iter().take_while(|bid| bid.price() <= price).count();

    let mut bought = vec![0.0; buys.len()];
    let mut sold = vec![0.0; sells.len()];
    let mut transactions = Vec::new();

    let (mut i, mut j) = (0, 0);
    let mut remaining = volume;
    while i < admitted_buys && j < admitted_sells && remaining > QUANTITY_TOLERANCE {
        let quantity = (buys[i].quantity() - bought[i])
            .min(sells[j].quantity() - sold[j])
            .min(remaining);

        if quantity > QUANTITY_TOLERANCE {
            transactions.push(Transaction {
                buyer_id: buys[i].id().clone(),
                seller_id: sells[j].id().clone(),
                price,
                quantity,
            });
            bought[i] += quantity;
            sold[j] += quantity;
            remaining -= quantity;
        }

        if buys[i].quantity() - bought[i] <= QUANTITY_TOLERANCE {
            i += 1;
        }
        if sells[j].quantity() - sold[j] <= QUANTITY_TOLERANCE {
            j += 1;
        }
    }

    let clearing_quantity = transactions.iter().map(|t| t.quantity).sum();

    ClearingOutcome {
        clearing_price: Some(price),
        clearing_quantity,
        transactions,
        uncovered_buys: remainders(&buys, &bought),
        uncovered_sells: remainders(&sells, &sold),
    }
}

/// The lowest volume-maximizing price and its volume, or None if no price
/// admits any trade. `buys` must be descending and `sells` ascending.
fn clearing_point(buys: &[&Bid], sells: &[&Bid]) -> Option<(f64, f64)> {
    let mut candidates = buys
        .iter()
        .chain(sells.iter())
        .map(|bid| bid.price())
        .collect::<Vec<_>>();
    candidates.sort_by(f64::total_cmp);
    candidates.dedup();

    let mut best: Option<(f64, f64)> = None;
    for price in candidates {
        let demand = buys
            .iter()
            .take_while(|bid| bid.price() >= price)
            .map(|bid| bid.quantity())
            .sum::<f64>();
        let supply = sells
            .iter()
            .take_while(|bid| bid.price() <= price)
            .map(|bid| bid.quantity())
            .sum::<f64>();
        let volume = demand.min(supply);

        // Strict improvement keeps the lowest price among equal volumes
        let threshold = best.map_or(QUANTITY_TOLERANCE, |(_, v)| v + QUANTITY_TOLERANCE);
        if volume > threshold {
            best = Some((price, volume));
        }
    }
    best
}

fn remainders(bids: &[&Bid], filled: &[f64]) -> Vec<Bid> {
    bids.iter()
        .zip(filled)
        .filter_map(|(bid, filled)| {
            let left = bid.quantity() - filled;
            if left > QUANTITY_TOLERANCE {
                bid.split(left)
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bids(rows: &[(&str, bool, f64, f64)]) -> BidSet {
        BidSet::new(rows.iter().map(|&(id, buy, price, quantity)| {
            if buy {
                Bid::buy(id, price, quantity).unwrap()
            } else {
                Bid::sell(id, price, quantity).unwrap()
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_lowest_price_among_ties() {
        // Volume 5 is attainable at 0.12 and at 0.2
        let set = bids(&[("b", true, 0.2, 5.0), ("s", false, 0.12, 5.0)]);
        let outcome = UniformPriceClearer
            .clear(&set, &MechanismParams::default())
            .unwrap();
        assert_eq!(outcome.clearing_price, Some(0.12));
        assert_eq!(outcome.clearing_quantity, 5.0);
        assert!(outcome.uncovered_buys.is_empty());
        assert!(outcome.uncovered_sells.is_empty());
    }

    #[test]
    fn test_marginal_bid_is_split() {
        let set = bids(&[
            ("b1", true, 0.2, 4.0),
            ("b2", true, 0.18, 4.0),
            ("s1", false, 0.1, 6.0),
        ]);
        let outcome = UniformPriceClearer
            .clear(&set, &MechanismParams::default())
            .unwrap();
        assert_eq!(outcome.clearing_quantity, 6.0);
        assert_eq!(outcome.uncovered_buys.len(), 1);
        assert_eq!(outcome.uncovered_buys[0].id().as_str(), "b2");
        assert_eq!(outcome.uncovered_buys[0].quantity(), 2.0);
        assert_eq!(outcome.uncovered_buys[0].price(), 0.18);
    }

    #[test]
    fn test_no_crossing() {
        let set = bids(&[("b", true, 0.1, 3.0), ("s", false, 0.2, 3.0)]);
        let outcome = UniformPriceClearer
            .clear(&set, &MechanismParams::default())
            .unwrap();
        assert_eq!(outcome.clearing_price, None);
        assert_eq!(outcome.clearing_quantity, 0.0);
        assert!(outcome.transactions.is_empty());
        assert_eq!(outcome.uncovered_buys.len(), 1);
        assert_eq!(outcome.uncovered_sells.len(), 1);
    }

    #[test]
    fn test_one_sided() {
        let set = bids(&[("b", true, 0.2, 3.0)]);
        let outcome = UniformPriceClearer
            .clear(&set, &MechanismParams::default())
            .unwrap();
        assert_eq!(outcome.clearing_price, None);
        assert_eq!(outcome.uncovered_buys.len(), 1);
        assert!(outcome.uncovered_sells.is_empty());
    }

    #[test]
    fn test_cap_is_enforced() {
        let set = bids(&[("b", true, 120.0, 3.0)]);
        let result = UniformPriceClearer.clear(&set, &MechanismParams::default());
        assert!(matches!(result, Err(BidError::AboveCap { .. })));
    }
}
