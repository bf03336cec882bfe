use crate::models::{Bid, MechanismParams, Settlement};

/// Interface for the second clearing step.
///
/// A strategy receives only the bids left uncovered by the uniform-price step and
/// must not reference any other bid. Implementations must:
/// - return an empty settlement when either side of the residual is empty,
/// - never settle more than the smaller of the total uncovered buy and sell quantity,
/// - keep every price within the bounds the mechanism declares.
///
/// Each invocation is a pure function of its inputs.
pub trait SettlementStrategy {
    /// Settle the uncovered residual.
    ///
    /// # Arguments
    ///
    /// - `buys`: uncovered buy bids, in descending price order
    /// - `sells`: uncovered sell bids, in ascending price order
    /// - `params`: the (validated) clearing parameters
    fn settle(
        &self,
        buys: &[Bid],
        sells: &[Bid],
        params: &MechanismParams,
    ) -> Result<Settlement, SettlementError>;
}

/// The ways in which a residual settlement can fail.
///
/// None of these yield a partial result; the caller decides whether to retry
/// with relaxed parameters.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum SettlementError {
    /// An iterative method exhausted its iteration bound without meeting the tolerance
    #[error(
        "{mechanism} did not converge after {iterations} iterations (last price {last_iterate}, residual {residual})"
    )]
    NonConvergence {
        /// The mechanism code
        mechanism: &'static str,
        /// The iterations performed
        iterations: usize,
        /// The last price iterate
        last_iterate: f64,
        /// The residual at the last iterate
        residual: f64,
    },
    /// The constrained optimizer did not reach a feasible optimum
    #[error("optimizer failed: {status}")]
    Optimization {
        /// The solver status
        status: String,
    },
    /// Exact Shapley enumeration was requested for too large a residual
    #[error("exact Shapley values requested for {participants} participants (limit {limit})")]
    TooManyParticipants {
        /// The residual size
        participants: usize,
        /// The configured ceiling
        limit: usize,
    },
    /// The mechanism needs an optimizer that was not compiled in
    #[error("{0} requires an optimizer backend that is not enabled")]
    BackendUnavailable(&'static str),
}
