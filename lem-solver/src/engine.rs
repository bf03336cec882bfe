use crate::{UniformPriceClearer, mechanisms::*};
use lem_core::{
    models::{BidError, BidSet, ClearingResult, Mechanism, MechanismParams, ParamsError, Settlement},
    ports::{SettlementError, SettlementStrategy},
};
use tracing::{Level, event};

/// The settlement strategy implementing a mechanism's second step
pub fn strategy(mechanism: Mechanism) -> &'static (dyn SettlementStrategy + Sync) {
    match mechanism {
        Mechanism::Up => &Up,
        Mechanism::Aup => &Aup,
        Mechanism::Mup => &Mup,
        Mechanism::Upnr => &Upnr,
        Mechanism::Apm => &Apm,
        Mechanism::Mpas => &Mpas,
        Mechanism::Cfrm => &Cfrm,
        Mechanism::Wam => &Wam,
        Mechanism::Mmp => &Mmp,
        Mechanism::Ipa => &Ipa,
        Mechanism::Vcg => &Vcg,
        Mechanism::Nbs => &Nbs,
        Mechanism::Cgt => &Cgt,
        Mechanism::Cgts => &Cgts,
        Mechanism::Colm => &Colm,
    }
}

/// The two-step clearing pipeline.
///
/// An engine holds a validated parameter set and clears any number of bid sets
/// with it. Each call is independent: step 1 runs the uniform-price auction, and
/// if both sides of its residual are non-empty, the mechanism's strategy settles
/// the residual. The ledger lists the step-1 trades first.
#[derive(Clone, Debug)]
pub struct Engine {
    params: MechanismParams,
}

impl Engine {
    /// Construct an engine, rejecting inconsistent parameters
    pub fn new(params: MechanismParams) -> Result<Self, ClearingError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// The validated parameters applied to every period
    pub fn params(&self) -> &MechanismParams {
        &self.params
    }

    /// Clear one period's bids with the given mechanism
    pub fn clear(
        &self,
        bids: &BidSet,
        mechanism: Mechanism,
    ) -> Result<ClearingResult, ClearingError> {
        let outcome = UniformPriceClearer.clear(bids, &self.params)?;

        let settlement =
            if outcome.uncovered_buys.is_empty() || outcome.uncovered_sells.is_empty() {
                Settlement::default()
            } else {
                strategy(mechanism)
                    .settle(&outcome.uncovered_buys, &outcome.uncovered_sells, &self.params)
                    .inspect_err(|error| {
                        event!(Level::WARN, %mechanism, %error, "settlement failed");
                    })?
            };

        let settled_quantity = settlement.quantity();
        let uncovered_buy_quantity = outcome
            .uncovered_buys
            .iter()
            .map(|bid| bid.quantity())
            .sum::<f64>();
        let uncovered_sell_quantity = outcome
            .uncovered_sells
            .iter()
            .map(|bid| bid.quantity())
            .sum::<f64>();

        event!(
            Level::INFO,
            %mechanism,
            price = outcome.clearing_price,
            uniform_quantity = outcome.clearing_quantity,
            settled_quantity,
            "period cleared"
        );

        let mut metrics = settlement.metrics;
        metrics.insert("uniform_quantity", outcome.clearing_quantity);
        if let Some(price) = outcome.clearing_price {
            metrics.insert("uniform_price", price);
        }
        metrics.insert("settled_quantity", settled_quantity);
        metrics.insert(
            "total_quantity",
            outcome.clearing_quantity + settled_quantity,
        );
        metrics.insert("uncovered_buy_quantity", uncovered_buy_quantity);
        metrics.insert("uncovered_sell_quantity", uncovered_sell_quantity);

        let uniform_count = outcome.transactions.len();
        let mut transactions = outcome.transactions;
        transactions.extend(settlement.transactions);

        Ok(ClearingResult {
            mechanism,
            clearing_price: outcome.clearing_price,
            uniform_quantity: outcome.clearing_quantity,
            settled_quantity,
            transactions,
            uniform_count,
            metrics,
        })
    }
}

/// The ways in which a clearing call can fail
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ClearingError {
    /// A bid was inadmissible
    #[error(transparent)]
    InvalidBid(#[from] BidError),
    /// The parameters were inconsistent
    #[error(transparent)]
    Params(#[from] ParamsError),
    /// The residual settlement failed
    #[error(transparent)]
    Settlement(#[from] SettlementError),
}
