use crate::IOArgs;
use lem_core::models::{Mechanism, MechanismParams};
use lem_solver::io::Period;

/// Read one period, clear it, and write the clearing result
pub fn run(io: &IOArgs, mechanism: Mechanism, params: &MechanismParams) -> anyhow::Result<()> {
    let period = io.read_json::<Period>()?;
    let result = period.clear(mechanism, params)?;
    io.write_json(&result)
}
