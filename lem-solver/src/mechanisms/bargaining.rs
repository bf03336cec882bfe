use super::Tatonnement;
use crate::Book;
use lem_core::{
    models::{Bid, MechanismParams, Metrics, Settlement},
    ports::{SettlementError, SettlementStrategy},
};
use tracing::{Level, event};

/// Nash bargaining over the residual surplus.
///
/// A tâtonnement within `[floor, cap]` first locates the reference price at which
/// the residual would balance. Its position in the tariff band sets the sellers'
/// bargaining power `eta = (reference - FIT) / (TOU - FIT)`, clamped to [0, 1].
/// Profitable merit-order pairs are then formed as in mediation, each trading at
/// the asymmetric Nash solution `d_s + eta * (d_b - d_s)`, where the
/// disagreement points `d_b` and `d_s` are the two bid prices clipped to the
/// tariff band. Pair prices are clipped to `[floor, cap]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Nbs;

impl SettlementStrategy for Nbs {
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
            mechanism: "NBS",
            lower: params.floor,
            upper: params.cap,
        };
        let reference = search.run(&book, params)?;

        let band = params.tou - params.fit;
        let power = if band > 0.0 {
            ((reference.price - params.fit) / band).clamp(0.0, 1.0)
        } else {
            0.5
        };

        let transactions = book.fill(|buyer, seller| {
            (buyer.price() >= seller.price()).then(|| {
                let demand_point = params.clip_tariff(buyer.price());
                let supply_point = params.clip_tariff(seller.price());
                params.clip_floor_cap(supply_point + power * (demand_point - supply_point))
            })
        });

        event!(
            Level::DEBUG,
            reference = reference.price,
            power,
            pairs = transactions.len(),
            "nash bargaining settlement"
        );

        let mut metrics = Metrics::default()
            .with("reference_price", reference.price)
            .with("iterations", reference.iterations)
            .with("seller_power", power);
        if let Some(last) = transactions.last() {
            metrics.insert("last_price", last.price);
        }

        Ok(Settlement {
            transactions,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_follows_reference_price() {
        let buys = [Bid::buy("b", 0.20, 5.0).unwrap()];
        let sells = [Bid::sell("s", 0.12, 5.0).unwrap()];
        let params = MechanismParams {
            floor: 0.0,
            cap: 1.0,
            ..Default::default()
        };
        let settlement = Nbs.settle(&buys, &sells, &params).unwrap();

        // A balanced residual settles at 0.16, 40% of the way up the tariff band
        let power = settlement.metrics.number("seller_power").unwrap();
        assert!((power - 0.4).abs() < 1e-6);
        let price = settlement.transactions[0].price;
        assert!((price - (0.12 + 0.4 * 0.08)).abs() < 1e-6);
    }

    #[test]
    fn test_default_bounds_pin_prices_to_floor() {
        let buys = [Bid::buy("b", 0.20, 5.0).unwrap()];
        let sells = [Bid::sell("s", 0.12, 5.0).unwrap()];
        let settlement = Nbs
            .settle(&buys, &sells, &MechanismParams::default())
            .unwrap();
        assert!(settlement.transactions.iter().all(|t| t.price == 10.0));
    }
}
