mod bid;
pub use bid::*;

mod bid_set;
pub use bid_set::BidSet;

mod map;
pub use map::Map;

mod mechanism;
pub use mechanism::{Mechanism, MechanismParseError};

mod metrics;
pub use metrics::{Metric, Metrics};

mod outcome;
pub use outcome::{ClearingOutcome, ClearingResult, Settlement};

mod params;
pub use params::{MechanismParams, ParamsError};

mod transaction;
pub use transaction::Transaction;
