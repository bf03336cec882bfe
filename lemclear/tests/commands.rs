use clap::Parser as _;
use lemclear::BaseArgs;
use serde_json::Value;
use std::fs;

const MARKET: &str = r#"{
    "periods": [
        {
            "id": "morning",
            "bids": [
                { "id": "h1", "side": "buy", "price": 0.24, "quantity": 6 },
                { "id": "h2", "side": "buy", "price": 0.19, "quantity": 5 },
                { "id": "h3", "side": "buy", "price": 0.13, "quantity": 4 },
                { "id": "p1", "side": "sell", "price": 0.11, "quantity": 5 },
                { "id": "p2", "side": "sell", "price": 0.16, "quantity": 4 },
                { "id": "p3", "side": "sell", "price": 0.22, "quantity": 6 }
            ]
        },
        {
            "id": "evening",
            "tou": 0.05,
            "bids": [
                { "id": "h1", "side": "buy", "price": 0.2, "quantity": 3 }
            ]
        }
    ]
}"#;

#[tokio::test]
async fn batch_reports_every_period_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("market.json");
    let output = dir.path().join("report.json");
    fs::write(&input, MARKET).unwrap();

    let args = BaseArgs::try_parse_from([
        "lemclear",
        "batch",
        input.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--mechanism",
        "apm",
    ])
    .unwrap();
    args.evaluate().await.unwrap();

    let report = serde_json::from_str::<Value>(&fs::read_to_string(&output).unwrap()).unwrap();
    let periods = report.as_array().unwrap();
    assert_eq!(periods.len(), 2);

    assert_eq!(periods[0]["id"], "morning");
    let result = &periods[0]["result"];
    assert_eq!(result["mechanism"], "APM");
    assert_eq!(result["clearing_price"], 0.16);
    assert_eq!(result["settled_quantity"], 6.0);

    // TOU below FIT invalidates only the second period
    assert_eq!(periods[1]["id"], "evening");
    assert!(periods[1]["error"].is_string());
}

#[tokio::test]
async fn clear_writes_a_single_result() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("period.json");
    let output = dir.path().join("result.json");
    let market = serde_json::from_str::<Value>(MARKET).unwrap();
    fs::write(&input, market["periods"][0].to_string()).unwrap();

    let args = BaseArgs::try_parse_from([
        "lemclear",
        "clear",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
    ])
    .unwrap();
    args.evaluate().await.unwrap();

    let result = serde_json::from_str::<Value>(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(result["mechanism"], "MUP");
    assert_eq!(result["uniform_quantity"], 9.0);
    assert_eq!(result["transactions"].as_array().unwrap().len(), 3);
}

#[test]
fn unknown_mechanism_is_rejected() {
    let parsed = BaseArgs::try_parse_from(["lemclear", "clear", "-", "-m", "XYZ"]);
    assert!(parsed.is_err());
}
