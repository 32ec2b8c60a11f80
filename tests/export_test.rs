mod common;

use anyhow::Result;
use common::*;
use travelog::io::{Exporter, LedgerSnapshot};

#[tokio::test]
async fn test_export_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service
        .as_account(alice())
        .submit(FLIGHT, "New York", "London", 1_700_000_000)
        .await?;
    service
        .as_account(bob())
        .submit(HOTEL, "", "Paris, 8e", 1_700_100_000)
        .await?;

    let mut buf = Vec::new();
    let count = Exporter::new(&service)
        .export_items_csv(&mut buf, None)
        .await?;
    assert_eq!(count, 2);

    let csv = String::from_utf8(buf)?;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "id,owner,category,origin,destination,event_timestamp,created_at_timestamp"
    );
    assert!(lines[1].starts_with(&format!("0,{},flight,New York,London,1700000000,", alice())));
    // Commas inside fields are quoted
    assert!(lines[2].starts_with(&format!("1,{},hotel,,\"Paris, 8e\",1700100000,", bob())));

    Ok(())
}

#[tokio::test]
async fn test_export_csv_for_owner() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service
        .as_account(alice())
        .submit(FLIGHT, "A", "B", 0)
        .await?;
    service
        .as_account(bob())
        .submit(BUS, "C", "D", 0)
        .await?;
    service
        .as_account(alice())
        .submit(OTHER, "E", "F", 0)
        .await?;

    let mut buf = Vec::new();
    let count = Exporter::new(&service)
        .export_items_csv(&mut buf, Some(&alice()))
        .await?;
    assert_eq!(count, 2);

    let csv = String::from_utf8(buf)?;
    assert!(!csv.contains(&bob().to_string()));

    Ok(())
}

#[tokio::test]
async fn test_export_json_snapshot() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service
        .as_account(alice())
        .submit(FLIGHT, "A", "B", 10)
        .await?;
    service
        .as_account(bob())
        .submit(BUS, "C", "D", 20)
        .await?;

    let mut buf = Vec::new();
    let snapshot = Exporter::new(&service)
        .export_json(&mut buf, Some(&bob()))
        .await?;
    assert_eq!(snapshot.total_count, 2);
    assert_eq!(snapshot.items.len(), 1);

    let parsed: LedgerSnapshot = serde_json::from_slice(&buf)?;
    assert_eq!(parsed.owner, Some(bob()));
    assert_eq!(parsed.items, service.items_for_owner(&bob()).await?);

    let raw: serde_json::Value = serde_json::from_slice(&buf)?;
    assert_eq!(raw["items"][0]["category"], "bus");
    assert_eq!(raw["items"][0]["owner"], bob().to_string());

    Ok(())
}
