use lem_core::{models::Bid, ports::Welfare};

/// Trade surplus of the efficient allocation within a coalition.
///
/// The coalition's buys and sells are paired in merit order for as long as the
/// buy price covers the sell price; each unit traded contributes the difference.
#[derive(Clone, Copy, Debug, Default)]
pub struct BidSurplus;

impl Welfare<Bid> for BidSurplus {
    fn value(&self, coalition: &[&Bid]) -> f64 {
        surplus(coalition.iter().copied())
    }
}

/// The efficient trade surplus of a collection of bids
pub fn surplus<'a>(bids: impl IntoIterator<Item = &'a Bid>) -> f64 {
    let (mut buys, mut sells): (Vec<&Bid>, Vec<&Bid>) =
        bids.into_iter().partition(|bid| bid.is_buy());
    buys.sort_by(|a, b| b.price().total_cmp(&a.price()));
    sells.sort_by(|a, b| a.price().total_cmp(&b.price()));

    let mut total = 0.0;
    let (mut i, mut j) = (0, 0);
    let mut buy_left = buys.first().map_or(0.0, |bid| bid.quantity());
    let mut sell_left = sells.first().map_or(0.0, |bid| bid.quantity());

    while i < buys.len() && j < sells.len() && buys[i].price() >= sells[j].price() {
        let quantity = buy_left.min(sell_left);
        total += (buys[i].price() - sells[j].price()) * quantity;
        buy_left -= quantity;
        sell_left -= quantity;
        if buy_left <= 0.0 {
            i += 1;
            buy_left = buys.get(i).map_or(0.0, |bid| bid.quantity());
        }
        if sell_left <= 0.0 {
            j += 1;
            sell_left = sells.get(j).map_or(0.0, |bid| bid.quantity());
        }
    }
    total
}

/// Grid savings of a coalition trading internally.
///
/// Every kWh exchanged between members instead of through the grid saves the
/// tariff spread `TOU - FIT`: the buyer avoids importing at TOU and the seller
/// would otherwise export at FIT. The coalition can exchange at most the smaller
/// of its total demand and total supply.
#[derive(Clone, Copy, Debug)]
pub struct GridSavings {
    spread: f64,
}

impl GridSavings {
    /// Savings at the spread between the two tariffs, never negative
    pub fn new(fit: f64, tou: f64) -> Self {
        Self {
            spread: (tou - fit).max(0.0),
        }
    }
}

impl Welfare<Bid> for GridSavings {
    fn value(&self, coalition: &[&Bid]) -> f64 {
        let (demand, supply) = coalition.iter().fold((0.0, 0.0), |(d, s), bid| {
            if bid.is_buy() {
                (d + bid.quantity(), s)
            } else {
                (d, s + bid.quantity())
            }
        });
        self.spread * demand.min(supply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_surplus_stops_at_unprofitable_pairs() {
        let bids = [
            Bid::buy("b1", 0.22, 4.0).unwrap(),
            Bid::buy("b2", 0.19, 3.0).unwrap(),
            Bid::sell("s1", 0.12, 5.0).unwrap(),
            Bid::sell("s2", 0.20, 4.0).unwrap(),
        ];
        // 4 @ 0.10 + 1 @ 0.07
        assert_abs_diff_eq!(surplus(&bids), 0.47, epsilon = 1e-12);
    }

    #[test]
    fn test_grid_savings() {
        let bids = [
            Bid::buy("b", 0.2, 3.0).unwrap(),
            Bid::sell("s", 0.1, 5.0).unwrap(),
        ];
        let refs = bids.iter().collect::<Vec<_>>();
        let welfare = GridSavings::new(0.1, 0.25);
        assert_abs_diff_eq!(welfare.value(&refs), 0.45, epsilon = 1e-12);
        assert_eq!(welfare.value(&refs[..1]), 0.0);
    }
}
