use crate::clearing::clear_refs;
use lem_core::{
    models::{Bid, Map, MechanismParams, Metrics, Settlement},
    ports::{SettlementError, SettlementStrategy},
};
use tracing::{Level, event};

/// Adjusted uniform price.
///
/// The residual is re-auctioned for up to `rounds` uniform-price rounds. After
/// each round the bids still unmatched become more accommodating: buy prices are
/// raised by the factor `1 + step` and sell prices lowered by `1 - step`, both
/// clipped to the tariff band. Trades are priced at their round's clearing price,
/// clipped to the same band. A per-round log is reported under `rounds`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Aup;

impl SettlementStrategy for Aup {
    fn settle(
        &self,
        buys: &[Bid],
        sells: &[Bid],
        params: &MechanismParams,
    ) -> Result<Settlement, SettlementError> {
        let mut buys = buys.to_vec();
        let mut sells = sells.to_vec();
        let mut transactions = Vec::new();
        let mut log = Vec::new();

        for round in 1..=params.rounds {
            if buys.is_empty() || sells.is_empty() {
                break;
            }

            let outcome = clear_refs(buys.iter().collect(), sells.iter().collect());
            transactions.extend(outcome.transactions.into_iter().map(|mut transaction| {
                transaction.price = params.clip_tariff(transaction.price);
                transaction
            }));

            // Clipped prices are finite and non-negative, so repricing cannot fail
            buys = outcome
                .uncovered_buys
                .iter()
                .filter_map(|bid| {
                    bid.reprice(params.clip_tariff(bid.price() * (1.0 + params.step)))
                        .ok()
                })
                .collect();
            sells = outcome
                .uncovered_sells
                .iter()
                .filter_map(|bid| {
                    bid.reprice(params.clip_tariff(bid.price() * (1.0 - params.step)))
                        .ok()
                })
                .collect();

            let mut entry = Map::<String, f64>::default();
            entry.insert("round".to_owned(), round as f64);
            if let Some(price) = outcome.clearing_price {
                entry.insert("clearing_price".to_owned(), params.clip_tariff(price));
            }
            entry.insert("cleared_quantity".to_owned(), outcome.clearing_quantity);
            entry.insert(
                "remaining_demand".to_owned(),
                buys.iter().map(|bid| bid.quantity()).sum(),
            );
            entry.insert(
                "remaining_supply".to_owned(),
                sells.iter().map(|bid| bid.quantity()).sum(),
            );
            log.push(entry);

            event!(
                Level::DEBUG,
                round,
                price = outcome.clearing_price,
                quantity = outcome.clearing_quantity,
                "adjusted uniform price round"
            );
        }

        let mut metrics = Metrics::default().with("rounds_run", log.len());
        if let Some(last) = transactions.last() {
            metrics.insert("last_price", last.price);
        }
        metrics.insert("rounds", log);

        Ok(Settlement {
            transactions,
            metrics,
        })
    }
}
