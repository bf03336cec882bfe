use crate::{ClearingError, Engine};
use lem_core::models::{BidSet, ClearingResult, Mechanism, MechanismParams};
use serde::{Deserialize, Serialize};

/// a single trading period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Period {
    /// the period label, e.g. a timestamp
    pub id: String,
    /// the submitted bids
    pub bids: BidSet,
    /// a feed-in tariff overriding the configured one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit: Option<f64>,
    /// a time-of-use tariff overriding the configured one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tou: Option<f64>,
}

impl Period {
    /// the parameters in effect for this period
    pub fn params(&self, base: &MechanismParams) -> MechanismParams {
        let fit = self.fit.unwrap_or(base.fit);
        let tou = self.tou.unwrap_or(base.tou);
        base.clone().with_tariffs(fit, tou)
    }

    /// clear the period
    pub fn clear(
        &self,
        mechanism: Mechanism,
        base: &MechanismParams,
    ) -> Result<ClearingResult, ClearingError> {
        Engine::new(self.params(base))?.clear(&self.bids, mechanism)
    }

    /// clear the period, capturing any failure in the report
    pub fn report(&self, mechanism: Mechanism, base: &MechanismParams) -> PeriodReport {
        let outcome = match self.clear(mechanism, base) {
            Ok(result) => PeriodOutcome::Result(result),
            Err(error) => PeriodOutcome::Error(error.to_string()),
        };
        PeriodReport {
            id: self.id.clone(),
            outcome,
        }
    }
}

/// a representation of a market: independent periods cleared one at a time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    /// the periods
    pub periods: Vec<Period>,
}

impl Market {
    /// clear every period in order
    pub fn clear(&self, mechanism: Mechanism, base: &MechanismParams) -> Vec<PeriodReport> {
        self.periods
            .iter()
            .map(|period| period.report(mechanism, base))
            .collect()
    }
}

/// the outcome of clearing one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodReport {
    /// the period label
    pub id: String,
    /// the result or the reason there is none
    #[serde(flatten)]
    pub outcome: PeriodOutcome,
}

/// either a clearing result or an error message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodOutcome {
    /// the period cleared
    Result(ClearingResult),
    /// the period could not be cleared
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKET: &str = r#"{
        "periods": [
            {
                "id": "09:00",
                "bids": [
                    { "id": "h1", "side": "buy", "price": 0.20, "quantity": 15 },
                    { "id": "h2", "side": "buy", "price": 0.18, "quantity": 12 },
                    { "id": "pv1", "side": "sell", "price": 0.12, "quantity": 8 },
                    { "id": "pv2", "side": "sell", "price": 0.15, "quantity": 10 }
                ]
            },
            {
                "id": "10:00",
                "fit": 0.3,
                "bids": [
                    { "id": "h1", "side": "buy", "price": 0.20, "quantity": 1 }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_market_file() {
        let market = serde_json::from_str::<Market>(MARKET).unwrap();
        let reports = market.clear(Mechanism::Mup, &MechanismParams::default());
        assert_eq!(reports.len(), 2);

        let PeriodOutcome::Result(result) = &reports[0].outcome else {
            panic!("first period should clear");
        };
        assert_eq!(result.clearing_price, Some(0.15));
        assert_eq!(result.uniform_quantity, 18.0);

        // FIT 0.3 above TOU 0.25 is rejected for that period only
        assert!(matches!(reports[1].outcome, PeriodOutcome::Error(_)));

        let json = serde_json::to_value(&reports[0]).unwrap();
        assert_eq!(json["id"], "09:00");
        assert!(json.get("result").is_some());
    }

    #[test]
    fn test_rejects_invalid_bids() {
        let bad = r#"{ "periods": [ { "id": "x", "bids": [
            { "id": "h1", "side": "buy", "price": 0.2, "quantity": -1 }
        ] } ] }"#;
        assert!(serde_json::from_str::<Market>(bad).is_err());
    }
}
