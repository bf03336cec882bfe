mod settlement;
mod welfare;

pub use settlement::{SettlementError, SettlementStrategy};
pub use welfare::Welfare;
