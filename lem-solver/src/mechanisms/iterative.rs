use super::settle_at;
use crate::Book;
use lem_core::{
    models::{Bid, MechanismParams, Metrics, Settlement},
    ports::{SettlementError, SettlementStrategy},
};
use tracing::{Level, event};

/// Iterative price adjustment.
///
/// Starting from the marginal midpoint, the price is moved in proportion to the
/// normalized excess demand of the residual until the imbalance falls below
/// `epsilon`. The step is `theta * r * scale` rather than a fixed `theta`: with
/// prices in a band as narrow as [0.1, 0.25], a fixed step of 0.1 jumps from one
/// bound to the other and never meets the tolerance. The converged price is
/// clipped to the tariff band and the tradable residual is matched at it.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ipa;

impl SettlementStrategy for Ipa {
    fn settle(
        &self,
        buys: &[Bid],
        sells: &[Bid],
        params: &MechanismParams,
    ) -> Result<Settlement, SettlementError> {
        let Some(book) = Book::new(buys, sells) else {
            return Ok(Settlement::default());
        };

        let search = Tatonnement {
            mechanism: "IPA",
            lower: params.fit,
            upper: params.tou,
        };
        let equilibrium = search.run(&book, params)?;

        let metrics = Metrics::default()
            .with("equilibrium_price", equilibrium.price)
            .with("iterations", equilibrium.iterations)
            .with("imbalance", equilibrium.imbalance)
            .with("converged", true)
            .with("bound_active", equilibrium.bound_active);

        Ok(settle_at(&book, params.clip_tariff(equilibrium.price), metrics))
    }
}

/// A bounded tâtonnement over the smoothed residual curves.
///
/// Each iteration applies `p += theta * r(p) * scale`, where `r` is the excess
/// demand divided by the total residual quantity and `scale` spans the residual
/// prices; iterates are kept within `[lower, upper]`. If an iterate is pinned at
/// a bound with the imbalance still pushing outward, no admissible price does
/// better and the bound is returned.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Tatonnement {
    pub mechanism: &'static str,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Equilibrium {
    pub price: f64,
    pub iterations: usize,
    pub imbalance: f64,
    pub bound_active: bool,
}

impl Tatonnement {
    pub fn run(
        &self,
        book: &Book,
        params: &MechanismParams,
    ) -> Result<Equilibrium, SettlementError> {
        let width = book.smoothing_width();
        let scale = book.price_scale();
        let total = book.buy_quantity() + book.sell_quantity();
        let imbalance = |price: f64| book.excess_demand(price, width) / total;

        let mut price = book.marginal_midpoint().clamp(self.lower, self.upper);
        for iteration in 0..params.max_iterations {
            let r = imbalance(price);
            if r.abs() < params.epsilon {
                event!(
                    Level::DEBUG,
                    mechanism = self.mechanism,
                    price,
                    iterations = iteration,
                    "converged"
                );
                return Ok(Equilibrium {
                    price,
                    iterations: iteration,
                    imbalance: r,
                    bound_active: false,
                });
            }

            let next = (price + params.theta * r * scale).clamp(self.lower, self.upper);
            if next == price {
                event!(
                    Level::DEBUG,
                    mechanism = self.mechanism,
                    price,
                    iterations = iteration,
                    "pinned at bound"
                );
                return Ok(Equilibrium {
                    price,
                    iterations: iteration,
                    imbalance: r,
                    bound_active: true,
                });
            }
            price = next;
        }

        let residual = imbalance(price);
        event!(
            Level::WARN,
            mechanism = self.mechanism,
            price,
            residual,
            "iteration bound reached"
        );
        Err(SettlementError::NonConvergence {
            mechanism: self.mechanism,
            iterations: params.max_iterations,
            last_iterate: price,
            residual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moves_toward_excess_supply_price() {
        let buys = [Bid::buy("b", 0.20, 5.0).unwrap()];
        let sells = [Bid::sell("s", 0.12, 10.0).unwrap()];
        let settlement = Ipa
            .settle(&buys, &sells, &MechanismParams::default())
            .unwrap();
        let price = settlement.metrics.number("equilibrium_price").unwrap();
        // Supply exceeds demand, so the price falls to the seller's ask
        assert!((price - 0.12).abs() < 0.01);
        assert_eq!(settlement.quantity(), 5.0);
    }

    #[test]
    fn test_iteration_bound() {
        let buys = [Bid::buy("b", 0.20, 5.0).unwrap()];
        let sells = [Bid::sell("s", 0.12, 10.0).unwrap()];
        let params = MechanismParams {
            max_iterations: 1,
            ..Default::default()
        };
        let result = Ipa.settle(&buys, &sells, &params);
        assert!(matches!(
            result,
            Err(SettlementError::NonConvergence {
                mechanism: "IPA",
                iterations: 1,
                ..
            })
        ));
    }
}
