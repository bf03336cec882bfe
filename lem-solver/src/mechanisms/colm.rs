use crate::Book;
use lem_core::{
    models::{Bid, MechanismParams, Settlement},
    ports::{SettlementError, SettlementStrategy},
};

/// Constrained optimization toward Shapley targets.
///
/// Every participant that trades in the merit-order allocation receives its own
/// price `p_k`. The prices minimize the volume-weighted squared deviation from
/// the Monte Carlo Shapley targets (see [`super::Cgt`]),
///
/// ```text
/// minimize    sum_k x_k (p_k - t_k)^2
/// subject to  sum_buyers x_i p_i = sum_sellers x_j p_j
///             FIT <= p_k <= TOU
/// ```
///
/// so that what buyers pay is exactly what sellers receive. The program is a
/// convex QP solved with Clarabel; the dual of the balance constraint is reported
/// as the Lagrange multiplier. Each pair trades at the mean of its two
/// participant prices, which preserves the balance in aggregate.
#[derive(Clone, Copy, Debug, Default)]
pub struct Colm;

impl SettlementStrategy for Colm {
    fn settle(
        &self,
        buys: &[Bid],
        sells: &[Bid],
        params: &MechanismParams,
    ) -> Result<Settlement, SettlementError> {
        let Some(book) = Book::new(buys, sells) else {
            return Ok(Settlement::default());
        };

        #[cfg(feature = "clarabel")]
        {
            optimize(&book, params)
        }

        #[cfg(not(feature = "clarabel"))]
        {
            let _ = (book, params);
            Err(SettlementError::BackendUnavailable("COLM"))
        }
    }
}

#[cfg(feature = "clarabel")]
fn optimize(book: &Book, params: &MechanismParams) -> Result<Settlement, SettlementError> {
    use super::cooperative::target_price;
    use crate::{ShapleyEvaluator, welfare::GridSavings};
    use clarabel::{algebra::*, solver::*};
    use lem_core::models::{BidId, Map, Metrics};
    use tracing::{Level, event};

    let participants = book.participants();
    let shares = ShapleyEvaluator::new(GridSavings::new(params.fit, params.tou)).sample(
        &participants,
        params.num_samples,
        params.seed,
    );
    let shares = Map::per_bid(participants.iter().copied(), shares);

    // The allocation is fixed up front; only the prices are optimized
    let mut transactions = book.fill_at(params.fit);
    let traded = Map::traded(&transactions);
    let active = participants
        .iter()
        .filter_map(|bid| traded.get(bid.id()).map(|&quantity| (*bid, quantity)))
        .collect::<Vec<_>>();
    let targets = active
        .iter()
        .map(|(bid, _)| target_price(bid, &shares, params))
        .collect::<Vec<_>>();

    // The objective is diagonal: x (p - t)^2 = 1/2 (2x) p^2 - 2xt p + const
    let mut p = Vec::with_capacity(active.len());
    let mut q = Vec::with_capacity(active.len());

    // Row 0 is the balance equality, then a lower and upper bound row per price.
    // Lower bounds are negated since the cone requires Ax + s = b with s >= 0.
    let mut b = vec![0.0];
    let mut a_nzval = Vec::new();
    let mut a_rowval = Vec::new();
    let mut a_colptr = Vec::new();

    for ((bid, quantity), target) in active.iter().zip(targets.iter()) {
        p.push(2.0 * quantity);
        q.push(-2.0 * quantity * target);

        a_colptr.push(a_nzval.len());

        a_nzval.push(if bid.is_buy() { *quantity } else { -quantity });
        a_rowval.push(0);

        a_nzval.push(-1.0);
        a_rowval.push(b.len());
        b.push(-params.fit);

        a_nzval.push(1.0);
        a_rowval.push(b.len());
        b.push(params.tou);
    }
    a_colptr.push(a_nzval.len());

    let n = p.len();
    let a_matrix = CscMatrix {
        m: b.len(),
        n,
        colptr: a_colptr,
        rowval: a_rowval,
        nzval: a_nzval,
    };
    let p_matrix = CscMatrix {
        m: n,
        n,
        colptr: (0..=n).collect(),
        rowval: (0..n).collect(),
        nzval: p,
    };
    let cones = [ZeroConeT(1), NonnegativeConeT(2 * n)];

    let mut settings = DefaultSettings::<f64>::default();
    settings.verbose = false;

    let mut solver = DefaultSolver::new(&p_matrix, &q, &a_matrix, &b, &cones, settings);
    solver.solve();

    let status = accept(&solver.solution.status)
        .inspect_err(|error| {
            event!(Level::WARN, %error, "optimizer failed");
        })?;

    let prices = active
        .iter()
        .zip(solver.solution.x.iter())
        .map(|((bid, _), price)| (bid.id().clone(), params.clip_tariff(*price)))
        .collect::<Map<BidId, f64>>();
    let multiplier = solver.solution.z[0];

    let mut imbalance = 0.0;
    let mut deviation = 0.0;
    for ((bid, quantity), target) in active.iter().zip(targets.iter()) {
        let price = prices.get(bid.id()).copied().unwrap_or(*target);
        deviation += quantity * (price - target).powi(2);
        imbalance += if bid.is_buy() {
            quantity * price
        } else {
            -quantity * price
        };
    }

    for transaction in transactions.iter_mut() {
        let buyer = prices.get(&transaction.buyer_id).copied().unwrap_or(params.fit);
        let seller = prices.get(&transaction.seller_id).copied().unwrap_or(params.fit);
        transaction.price = params.clip_tariff((buyer + seller) / 2.0);
    }

    event!(
        Level::DEBUG,
        status,
        multiplier,
        deviation,
        imbalance,
        "constrained settlement solved"
    );

    let mut metrics = Metrics::default()
        .with("solver_status", status)
        .with("lagrange_multiplier", multiplier)
        .with("deviation", deviation)
        .with("budget_imbalance", imbalance)
        .with("shapley_values", shares)
        .with("participant_prices", prices);
    if let Some(last) = transactions.last() {
        metrics.insert("last_price", last.price);
    }

    Ok(Settlement {
        transactions,
        metrics,
    })
}

/// Map the solver status to a report label, rejecting anything short of an optimum
#[cfg(feature = "clarabel")]
fn accept(status: &clarabel::solver::SolverStatus) -> Result<&'static str, SettlementError> {
    use clarabel::solver::SolverStatus;
    match status {
        SolverStatus::Solved => Ok("Solved"),
        SolverStatus::AlmostSolved => Ok("AlmostSolved"),
        other => Err(SettlementError::Optimization {
            status: format!("{other:?}"),
        }),
    }
}
