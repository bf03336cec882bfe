use super::settle_at;
use crate::Book;
use lem_core::{
    models::{Bid, MechanismParams, Metrics, Settlement},
    ports::{SettlementError, SettlementStrategy},
};
use tracing::{Level, event};

// The single-price mechanisms differ only in the reference price they read off
// the residual. The reference is clipped to the tariff band and the tradable
// residual is matched in merit order at that price.
fn single_price<F>(
    mechanism: &'static str,
    buys: &[Bid],
    sells: &[Bid],
    params: &MechanismParams,
    reference: F,
) -> Settlement
where
    F: FnOnce(&Book<'_>) -> f64,
{
    let Some(book) = Book::new(buys, sells) else {
        return Settlement::default();
    };

    let reference = reference(&book);
    let price = params.clip_tariff(reference);
    event!(
        Level::DEBUG,
        mechanism,
        reference,
        price,
        tradable = book.tradable(),
        "single price settlement"
    );

    settle_at(
        &book,
        price,
        Metrics::default().with("reference_price", reference),
    )
}

/// Average price: the mean of the best uncovered buy and sell prices
#[derive(Clone, Copy, Debug, Default)]
pub struct Apm;

impl SettlementStrategy for Apm {
    fn settle(
        &self,
        buys: &[Bid],
        sells: &[Bid],
        params: &MechanismParams,
    ) -> Result<Settlement, SettlementError> {
        Ok(single_price("APM", buys, sells, params, |book| {
            (book.max_buy_price() + book.min_sell_price()) / 2.0
        }))
    }
}

/// Midpoint adjusted by spread: `mid + alpha * (max_buy - min_sell)`
#[derive(Clone, Copy, Debug, Default)]
pub struct Mpas;

impl SettlementStrategy for Mpas {
    fn settle(
        &self,
        buys: &[Bid],
        sells: &[Bid],
        params: &MechanismParams,
    ) -> Result<Settlement, SettlementError> {
        Ok(single_price("MPAS", buys, sells, params, |book| {
            let spread = book.max_buy_price() - book.min_sell_price();
            book.marginal_midpoint() + params.alpha * spread
        }))
    }
}

/// Central range: the midpoint of the mean buy and mean sell prices
#[derive(Clone, Copy, Debug, Default)]
pub struct Cfrm;

impl SettlementStrategy for Cfrm {
    fn settle(
        &self,
        buys: &[Bid],
        sells: &[Bid],
        params: &MechanismParams,
    ) -> Result<Settlement, SettlementError> {
        Ok(single_price("CFRM", buys, sells, params, |book| {
            (book.mean_buy_price() + book.mean_sell_price()) / 2.0
        }))
    }
}

/// Weighted average: the quantity-weighted mean price of each side, averaged
#[derive(Clone, Copy, Debug, Default)]
pub struct Wam;

impl SettlementStrategy for Wam {
    fn settle(
        &self,
        buys: &[Bid],
        sells: &[Bid],
        params: &MechanismParams,
    ) -> Result<Settlement, SettlementError> {
        Ok(single_price("WAM", buys, sells, params, |book| {
            (book.weighted_buy_price() + book.weighted_sell_price()) / 2.0
        }))
    }
}

/// Marginal midpoint: halfway between the marginal buy and sell prices
#[derive(Clone, Copy, Debug, Default)]
pub struct Mmp;

impl SettlementStrategy for Mmp {
    fn settle(
        &self,
        buys: &[Bid],
        sells: &[Bid],
        params: &MechanismParams,
    ) -> Result<Settlement, SettlementError> {
        Ok(single_price("MMP", buys, sells, params, |book| {
            book.marginal_midpoint()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn residual() -> ([Bid; 2], [Bid; 2]) {
        (
            [
                Bid::buy("b1", 0.24, 1.0).unwrap(),
                Bid::buy("b2", 0.16, 3.0).unwrap(),
            ],
            [
                Bid::sell("s1", 0.12, 2.0).unwrap(),
                Bid::sell("s2", 0.14, 6.0).unwrap(),
            ],
        )
    }

    #[test]
    fn test_central_range() {
        let (buys, sells) = residual();
        let settlement = Cfrm
            .settle(&buys, &sells, &MechanismParams::default())
            .unwrap();
        // (0.20 + 0.13) / 2
        assert!((settlement.metrics.number("last_price").unwrap() - 0.165).abs() < 1e-12);
        assert_eq!(settlement.quantity(), 4.0);
    }

    #[test]
    fn test_weighted_average() {
        let (buys, sells) = residual();
        let settlement = Wam
            .settle(&buys, &sells, &MechanismParams::default())
            .unwrap();
        // buys (0.24 + 0.48) / 4 = 0.18, sells (0.24 + 0.84) / 8 = 0.135
        assert!((settlement.metrics.number("last_price").unwrap() - 0.1575).abs() < 1e-12);
    }

    #[test]
    fn test_clipped_to_tariffs() {
        let (buys, sells) = residual();
        let params = MechanismParams {
            alpha: 1.0,
            ..Default::default()
        };
        // 0.18 + 0.12 exceeds TOU
        let settlement = Mpas.settle(&buys, &sells, &params).unwrap();
        assert_eq!(settlement.metrics.number("last_price"), Some(0.25));
        assert!(settlement.transactions.iter().all(|t| t.price == 0.25));
    }
}
