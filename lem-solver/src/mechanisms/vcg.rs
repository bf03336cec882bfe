use crate::{Book, welfare::surplus};
use lem_core::{
    models::{Bid, BidId, Map, MechanismParams, Metrics, Settlement},
    ports::{SettlementError, SettlementStrategy},
};
use tracing::{Level, event};

/// Vickrey-Clarke-Groves pricing.
///
/// The residual is allocated efficiently: merit-order pairs for as long as the
/// buy price covers the sell price. Each matched participant is charged (or paid)
/// so that it keeps exactly its marginal contribution to total surplus:
///
/// - a buyer pays its bid less `(W - W_without) / x` per unit,
/// - a seller receives its ask plus `(W - W_without) / x` per unit,
///
/// where `x` is the participant's traded quantity. Participant prices are clipped
/// to `[floor, cap]` and each pair trades at the midpoint of its two prices. The
/// mechanism is not budget balanced; the deficit is reported.
#[derive(Clone, Copy, Debug, Default)]
pub struct Vcg;

impl SettlementStrategy for Vcg {
    fn settle(
        &self,
        buys: &[Bid],
        sells: &[Bid],
        params: &MechanismParams,
    ) -> Result<Settlement, SettlementError> {
        let Some(book) = Book::new(buys, sells) else {
            return Ok(Settlement::default());
        };

        let mut transactions =
            book.fill(|buyer, seller| (buyer.price() >= seller.price()).then_some(0.0));
        let participants = book.participants();
        let welfare = surplus(participants.iter().copied());
        let traded = Map::traded(&transactions);

        let mut prices = Map::<BidId, f64>::default();
        let mut externalities = Map::<BidId, f64>::default();
        for bid in participants.iter() {
            let Some(&quantity) = traded.get(bid.id()) else {
                continue;
            };
            let without = surplus(
                participants
                    .iter()
                    .copied()
                    .filter(|other| other.id() != bid.id()),
            );
            let externality = welfare - without;
            let price = if bid.is_buy() {
                bid.price() - externality / quantity
            } else {
                bid.price() + externality / quantity
            };
            prices.insert(bid.id().clone(), params.clip_floor_cap(price));
            externalities.insert(bid.id().clone(), externality);
        }

        let mut deficit = 0.0;
        for transaction in transactions.iter_mut() {
            let buyer = prices.get(&transaction.buyer_id).copied().unwrap_or(params.floor);
            let seller = prices.get(&transaction.seller_id).copied().unwrap_or(params.floor);
            transaction.price = params.clip_floor_cap((buyer + seller) / 2.0);
            deficit += (seller - buyer) * transaction.quantity;
        }

        event!(
            Level::DEBUG,
            welfare,
            deficit,
            pairs = transactions.len(),
            "vcg settlement"
        );

        let mut metrics = Metrics::default()
            .with("welfare", welfare)
            .with("budget_deficit", deficit)
            .with("participant_prices", prices)
            .with("externalities", externalities);
        if let Some(last) = transactions.last() {
            metrics.insert("last_price", last.price);
        }

        Ok(Settlement {
            transactions,
            metrics,
        })
    }
}
