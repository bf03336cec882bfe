use crate::QUANTITY_TOLERANCE;
use lem_core::models::{Bid, Transaction};

// Relative width of the logistic ramp that replaces each bid's step in the
// smoothed aggregate curves, and its absolute lower bound.
const SMOOTHING: f64 = 0.05;
const MIN_WIDTH: f64 = 1e-4;

/// The uncovered residual arranged in merit order: buys by descending price,
/// sells by ascending price. Ties keep their submission order.
#[derive(Debug)]
pub(crate) struct Book<'a> {
    buys: Vec<&'a Bid>,
    sells: Vec<&'a Bid>,
}

impl<'a> Book<'a> {
    /// Arrange the residual, or return None if either side has nothing to trade
    pub fn new(buys: &'a [Bid], sells: &'a [Bid]) -> Option<Self> {
        Self::from_refs(buys.iter().collect(), sells.iter().collect())
    }

    pub fn from_refs(mut buys: Vec<&'a Bid>, mut sells: Vec<&'a Bid>) -> Option<Self> {
        if buys.is_empty() || sells.is_empty() {
            return None;
        }
        buys.sort_by(|a, b| b.price().total_cmp(&a.price()));
        sells.sort_by(|a, b| a.price().total_cmp(&b.price()));
        Some(Self { buys, sells })
    }

    /// Buys followed by sells
    pub fn participants(&self) -> Vec<&'a Bid> {
        self.buys.iter().chain(self.sells.iter()).copied().collect()
    }

    pub fn buy_quantity(&self) -> f64 {
        self.buys.iter().map(|bid| bid.quantity()).sum()
    }

    pub fn sell_quantity(&self) -> f64 {
        self.sells.iter().map(|bid| bid.quantity()).sum()
    }

    /// The most energy that can change hands without manufacturing any
    pub fn tradable(&self) -> f64 {
        self.buy_quantity().min(self.sell_quantity())
    }

    pub fn max_buy_price(&self) -> f64 {
        self.buys[0].price()
    }

    pub fn min_sell_price(&self) -> f64 {
        self.sells[0].price()
    }

    /// (max_buy + min_sell) / 2
    pub fn marginal_midpoint(&self) -> f64 {
        (self.max_buy_price() + self.min_sell_price()) / 2.0
    }

    pub fn mean_buy_price(&self) -> f64 {
        mean(&self.buys)
    }

    pub fn mean_sell_price(&self) -> f64 {
        mean(&self.sells)
    }

    pub fn weighted_buy_price(&self) -> f64 {
        weighted_mean(&self.buys)
    }

    pub fn weighted_sell_price(&self) -> f64 {
        weighted_mean(&self.sells)
    }

    /// The lowest and highest price on either side
    pub fn price_range(&self) -> (f64, f64) {
        self.buys
            .iter()
            .chain(self.sells.iter())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), bid| {
                (lo.min(bid.price()), hi.max(bid.price()))
            })
    }

    /// The width of the logistic ramp used by [`Book::excess_demand`]
    pub fn smoothing_width(&self) -> f64 {
        let (lo, hi) = self.price_range();
        (SMOOTHING * (hi - lo)).max(MIN_WIDTH)
    }

    /// A price distance spanning the residual, never narrower than twenty ramp widths
    pub fn price_scale(&self) -> f64 {
        self.smoothing_width() / SMOOTHING
    }

    /// Smoothed aggregate demand minus smoothed aggregate supply at `price`.
    ///
    /// The exact curves are step functions, on which neither a derivative nor a
    /// fixed-point iteration is meaningful. Each bid's step is replaced by a
    /// logistic ramp of the given width, which makes the excess demand continuous
    /// and strictly decreasing in price while agreeing with the step curves away
    /// from the bid prices.
    pub fn excess_demand(&self, price: f64, width: f64) -> f64 {
        let demand = self
            .buys
            .iter()
            .map(|bid| bid.quantity() * logistic((bid.price() - price) / width))
            .sum::<f64>();
        let supply = self
            .sells
            .iter()
            .map(|bid| bid.quantity() * logistic((price - bid.price()) / width))
            .sum::<f64>();
        demand - supply
    }

    /// Walk both sides in merit order, pairing the best remaining buy with the
    /// best remaining sell for the smaller of their remaining quantities.
    ///
    /// `price` is asked for each pair; returning None stops the walk (used by
    /// mechanisms that only trade profitable pairs). The matched total never
    /// exceeds [`Book::tradable`].
    pub fn fill<F>(&self, mut price: F) -> Vec<Transaction>
    where
        F: FnMut(&Bid, &Bid) -> Option<f64>,
    {
        let mut transactions = Vec::new();

        let (mut i, mut j) = (0, 0);
        let mut buy_left = self.buys[0].quantity();
        let mut sell_left = self.sells[0].quantity();

        while i < self.buys.len() && j < self.sells.len() {
            let (buyer, seller) = (self.buys[i], self.sells[j]);
            let Some(p) = price(buyer, seller) else {
                break;
            };

            let quantity = buy_left.min(sell_left);
            if quantity > QUANTITY_TOLERANCE {
                transactions.push(Transaction {
                    buyer_id: buyer.id().clone(),
                    seller_id: seller.id().clone(),
                    price: p,
                    quantity,
                });
            }

            buy_left -= quantity;
            sell_left -= quantity;

            if buy_left <= QUANTITY_TOLERANCE {
                i += 1;
                buy_left = self.buys.get(i).map_or(0.0, |bid| bid.quantity());
            }
            if sell_left <= QUANTITY_TOLERANCE {
                j += 1;
                sell_left = self.sells.get(j).map_or(0.0, |bid| bid.quantity());
            }
        }

        transactions
    }

    /// Fill every pair at a single price
    pub fn fill_at(&self, price: f64) -> Vec<Transaction> {
        self.fill(|_, _| Some(price))
    }
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn mean(bids: &[&Bid]) -> f64 {
    bids.iter().map(|bid| bid.price()).sum::<f64>() / bids.len() as f64
}

fn weighted_mean(bids: &[&Bid]) -> f64 {
    let (value, quantity) = bids.iter().fold((0.0, 0.0), |(v, q), bid| {
        (v + bid.price() * bid.quantity(), q + bid.quantity())
    });
    value / quantity
}
