use super::settle_at;
use crate::Book;
use lem_core::{
    models::{Bid, MechanismParams, Metrics, Settlement},
    ports::{SettlementError, SettlementStrategy},
};
use tracing::{Level, event};

// Ramp widths beyond the extreme bid prices at which the smoothed excess demand
// is certain to have its sign
const BRACKET: f64 = 40.0;

/// Uniform price by Newton-Raphson.
///
/// Solves `demand(p) - supply(p) = 0` on the smoothed residual curves with
/// Newton steps `p - f(p) / f'(p)`, the derivative taken by central finite
/// difference. A bracket around the root is maintained throughout; whenever a
/// Newton step would leave it, the iterate bisects instead. The search stops once
/// `|f(p)| < epsilon` (in kWh) and fails after `max_iterations`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Upnr;

impl SettlementStrategy for Upnr {
    fn settle(
        &self,
        buys: &[Bid],
        sells: &[Bid],
        params: &MechanismParams,
    ) -> Result<Settlement, SettlementError> {
        let Some(book) = Book::new(buys, sells) else {
            return Ok(Settlement::default());
        };

        let width = book.smoothing_width();
        let f = |price: f64| book.excess_demand(price, width);
        let h = width * 1e-3;

        let (min_price, max_price) = book.price_range();
        let (mut lo, mut hi) = (min_price - BRACKET * width, max_price + BRACKET * width);
        let mut price = book.marginal_midpoint();

        for iteration in 0..params.max_iterations {
            let value = f(price);
            if value.abs() < params.epsilon {
                event!(Level::DEBUG, price, iterations = iteration, "newton converged");
                let metrics = Metrics::default()
                    .with("equilibrium_price", price)
                    .with("iterations", iteration)
                    .with("residual", value)
                    .with("converged", true);
                return Ok(settle_at(&book, params.clip_tariff(price), metrics));
            }

            // f is decreasing, so its sign tells which side the root is on
            if value > 0.0 {
                lo = price;
            } else {
                hi = price;
            }

            let slope = (f(price + h) - f(price - h)) / (2.0 * h);
            let step = price - value / slope;
            price = if step.is_finite() && step > lo && step < hi {
                step
            } else {
                (lo + hi) / 2.0
            };
        }

        let residual = f(price);
        event!(Level::WARN, price, residual, "newton iteration bound reached");
        Err(SettlementError::NonConvergence {
            mechanism: "UPNR",
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
    fn test_symmetric_residual() {
        let buys = [Bid::buy("b", 0.20, 5.0).unwrap()];
        let sells = [Bid::sell("s", 0.12, 5.0).unwrap()];
        let settlement = Upnr
            .settle(&buys, &sells, &MechanismParams::default())
            .unwrap();
        let price = settlement.metrics.number("equilibrium_price").unwrap();
        assert!((price - 0.16).abs() < 1e-9);
        assert_eq!(settlement.quantity(), 5.0);
    }

    #[test]
    fn test_converges_with_several_bids() {
        let buys = [
            Bid::buy("b1", 0.24, 3.0).unwrap(),
            Bid::buy("b2", 0.19, 4.0).unwrap(),
        ];
        let sells = [
            Bid::sell("s1", 0.13, 2.0).unwrap(),
            Bid::sell("s2", 0.17, 6.0).unwrap(),
        ];
        let params = MechanismParams::default();
        let settlement = Upnr.settle(&buys, &sells, &params).unwrap();
        let residual = settlement.metrics.number("residual").unwrap();
        assert!(residual.abs() < params.epsilon);
        assert!(settlement.quantity() <= 7.0 + 1e-9);
    }

    #[test]
    fn test_iteration_bound() {
        let buys = [Bid::buy("b", 0.24, 3.0).unwrap()];
        let sells = [Bid::sell("s", 0.13, 2.0).unwrap()];
        let params = MechanismParams {
            max_iterations: 1,
            epsilon: 1e-12,
            ..Default::default()
        };
        let Err(SettlementError::NonConvergence {
            mechanism,
            iterations,
            last_iterate,
            residual,
        }) = Upnr.settle(&buys, &sells, &params)
        else {
            panic!("one step cannot meet the tolerance");
        };
        assert_eq!(mechanism, "UPNR");
        assert_eq!(iterations, 1);
        // The first step leaves the midpoint, staying inside the bracket
        assert!(last_iterate != 0.185);
        assert!(last_iterate > 0.13 - 40.0 * 0.0055 && last_iterate < 0.24 + 40.0 * 0.0055);
        assert!(residual.abs() >= params.epsilon);
    }
}
