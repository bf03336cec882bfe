use lem_core::{
    models::{Bid, MechanismParams, Settlement},
    ports::{SettlementError, SettlementStrategy},
};

/// Uniform price only: the residual is left to the grid at the tariffs.
#[derive(Clone, Copy, Debug, Default)]
pub struct Up;

impl SettlementStrategy for Up {
    fn settle(
        &self,
        _buys: &[Bid],
        _sells: &[Bid],
        _params: &MechanismParams,
    ) -> Result<Settlement, SettlementError> {
        Ok(Settlement::default())
    }
}
