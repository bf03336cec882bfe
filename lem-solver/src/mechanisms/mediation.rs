use crate::Book;
use lem_core::{
    models::{Bid, MechanismParams, Metrics, Settlement},
    ports::{SettlementError, SettlementStrategy},
};
use tracing::{Level, event};

/// Bilateral mediation.
///
/// The highest remaining buy is paired with the lowest remaining sell for as long
/// as the buy price covers the sell price. Each pair trades the smaller of the two
/// remaining quantities at the average of the two prices, clipped to the tariff band.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mup;

impl SettlementStrategy for Mup {
    fn settle(
        &self,
        buys: &[Bid],
        sells: &[Bid],
        params: &MechanismParams,
    ) -> Result<Settlement, SettlementError> {
        let Some(book) = Book::new(buys, sells) else {
            return Ok(Settlement::default());
        };

        let transactions = book.fill(|buyer, seller| {
            (buyer.price() >= seller.price())
                .then(|| params.clip_tariff((buyer.price() + seller.price()) / 2.0))
        });

        let mut metrics = Metrics::default().with("pairs", transactions.len());
        if let Some(last) = transactions.last() {
            metrics.insert("last_price", last.price);
        }

        event!(Level::DEBUG, pairs = transactions.len(), "mediation complete");

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
    fn test_pairs_at_average_price() {
        let buys = [
            Bid::buy("b1", 0.22, 2.0).unwrap(),
            Bid::buy("b2", 0.14, 2.0).unwrap(),
        ];
        let sells = [
            Bid::sell("s1", 0.12, 3.0).unwrap(),
            Bid::sell("s2", 0.16, 3.0).unwrap(),
        ];
        let settlement = Mup
            .settle(&buys, &sells, &MechanismParams::default())
            .unwrap();

        // b1-s1 for 2 at 0.17, then b2-s1 for 1 at 0.13; b2 cannot afford s2
        assert_eq!(settlement.transactions.len(), 2);
        assert!((settlement.transactions[0].price - 0.17).abs() < 1e-12);
        assert!((settlement.transactions[1].price - 0.13).abs() < 1e-12);
        assert_eq!(settlement.quantity(), 3.0);
    }

    #[test]
    fn test_no_profitable_pair() {
        let buys = [Bid::buy("b", 0.11, 2.0).unwrap()];
        let sells = [Bid::sell("s", 0.2, 2.0).unwrap()];
        let settlement = Mup
            .settle(&buys, &sells, &MechanismParams::default())
            .unwrap();
        assert!(settlement.transactions.is_empty());
    }
}
