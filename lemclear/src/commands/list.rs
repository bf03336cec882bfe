use lem_core::models::Mechanism;
use std::io::Write;

/// Write one line per mechanism: its code and the band its prices are clipped to
pub fn run(output: &mut impl Write) -> anyhow::Result<()> {
    for mechanism in Mechanism::ALL {
        let bounds = if mechanism.uses_floor_and_cap() {
            "[floor, cap]"
        } else {
            "[fit, tou]"
        };
        writeln!(output, "{:<5} {}", mechanism.code(), bounds)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_every_mechanism() {
        let mut buffer = Vec::new();
        run(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().count(), Mechanism::ALL.len());
        assert!(text.lines().any(|line| line.starts_with("CGTS  [floor, cap]")));
    }
}
