use super::{Bid, Mechanism, Metrics, Transaction};

/// The result of the uniform-price step.
///
/// Every transaction is priced at `clearing_price`; the matched buy quantity
/// equals the matched sell quantity (`clearing_quantity`). Bids, or the parts of
/// bids, that did not clear are returned as the uncovered residual, buys in
/// descending and sells in ascending price order.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClearingOutcome {
    /// The uniform price, or None if the curves do not cross
    pub clearing_price: Option<f64>,
    /// The matched quantity (one-sided)
    pub clearing_quantity: f64,
    /// The matched trades
    pub transactions: Vec<Transaction>,
    /// Buy bids left (partly) unmatched
    pub uncovered_buys: Vec<Bid>,
    /// Sell bids left (partly) unmatched
    pub uncovered_sells: Vec<Bid>,
}

/// The output of a residual settlement mechanism
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Settlement {
    /// The additional trades
    pub transactions: Vec<Transaction>,
    /// Mechanism-specific diagnostics
    pub metrics: Metrics,
}

impl Settlement {
    /// The one-sided quantity settled
    pub fn quantity(&self) -> f64 {
        self.transactions.iter().map(|t| t.quantity).sum()
    }
}

/// The aggregated result of a two-step clearing call.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClearingResult {
    /// The mechanism used for the residual
    pub mechanism: Mechanism,
    /// The uniform clearing price of the first step
    pub clearing_price: Option<f64>,
    /// The quantity matched by the first step
    pub uniform_quantity: f64,
    /// The quantity matched by the residual settlement
    pub settled_quantity: f64,
    /// The full ledger: first-step trades followed by settlement trades
    pub transactions: Vec<Transaction>,
    /// How many leading entries of the ledger came from the first step
    pub uniform_count: usize,
    /// Mechanism-specific diagnostics
    pub metrics: Metrics,
}

impl ClearingResult {
    /// The total quantity traded inside the market
    pub fn total_quantity(&self) -> f64 {
        self.uniform_quantity + self.settled_quantity
    }

    /// The trades produced by the first step
    pub fn uniform_transactions(&self) -> &[Transaction] {
        &self.transactions[..self.uniform_count]
    }

    /// The trades produced by the second step
    pub fn settlement_transactions(&self) -> &[Transaction] {
        &self.transactions[self.uniform_count..]
    }
}
