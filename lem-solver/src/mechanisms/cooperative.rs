use crate::{Book, ShapleyEvaluator, welfare::GridSavings};
use lem_core::{
    models::{Bid, BidId, Map, MechanismParams, Metrics, Settlement},
    ports::{SettlementError, SettlementStrategy},
};
use tracing::{Level, event};

/// Cooperative settlement with exact Shapley values.
///
/// The game's welfare is the grid savings a coalition realizes by trading
/// internally. Each participant's Shapley share of those savings is converted to
/// a per-unit target: a buyer pays `TOU - share / quantity` and a seller receives
/// `FIT + share / quantity`. Merit-order pairs trade at the mean of their two
/// targets, clipped to `[floor, cap]`. Refused for residuals larger than
/// `max_exact_participants`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Cgt;

impl SettlementStrategy for Cgt {
    fn settle(
        &self,
        buys: &[Bid],
        sells: &[Bid],
        params: &MechanismParams,
    ) -> Result<Settlement, SettlementError> {
        let Some(book) = Book::new(buys, sells) else {
            return Ok(Settlement::default());
        };

        let participants = book.participants();
        let shares = ShapleyEvaluator::new(GridSavings::new(params.fit, params.tou))
            .with_limit(params.max_exact_participants)
            .exact(&participants)?;

        Ok(share_settlement(
            &book,
            Map::per_bid(participants.iter().copied(), shares),
            params,
            Metrics::default(),
        ))
    }
}

/// Cooperative settlement with Monte Carlo Shapley values.
///
/// As [`Cgt`], with the shares estimated from `num_samples` random join orders
/// drawn from a generator seeded with `seed`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Cgts;

impl SettlementStrategy for Cgts {
    fn settle(
        &self,
        buys: &[Bid],
        sells: &[Bid],
        params: &MechanismParams,
    ) -> Result<Settlement, SettlementError> {
        let Some(book) = Book::new(buys, sells) else {
            return Ok(Settlement::default());
        };

        let participants = book.participants();
        let shares = ShapleyEvaluator::new(GridSavings::new(params.fit, params.tou)).sample(
            &participants,
            params.num_samples,
            params.seed,
        );

        Ok(share_settlement(
            &book,
            Map::per_bid(participants.iter().copied(), shares),
            params,
            Metrics::default()
                .with("num_samples", params.num_samples)
                .with("seed", params.seed),
        ))
    }
}

/// The per-unit price a participant's share entitles it to
pub(crate) fn target_price(bid: &Bid, shares: &Map<BidId, f64>, params: &MechanismParams) -> f64 {
    let per_unit = shares.get(bid.id()).copied().unwrap_or(0.0) / bid.quantity();
    if bid.is_buy() {
        params.tou - per_unit
    } else {
        params.fit + per_unit
    }
}

fn share_settlement(
    book: &Book,
    shares: Map<BidId, f64>,
    params: &MechanismParams,
    metrics: Metrics,
) -> Settlement {
    let transactions = book.fill(|buyer, seller| {
        let buyer_price = target_price(buyer, &shares, params);
        let seller_price = target_price(seller, &shares, params);
        Some(params.clip_floor_cap((buyer_price + seller_price) / 2.0))
    });

    let welfare = shares.total();
    event!(
        Level::DEBUG,
        welfare,
        participants = shares.len(),
        pairs = transactions.len(),
        "shapley settlement"
    );

    let mut metrics = metrics
        .with("welfare", welfare)
        .with("shapley_values", shares);
    if let Some(last) = transactions.last() {
        metrics.insert("last_price", last.price);
    }

    Settlement {
        transactions,
        metrics,
    }
}
