mod common;

use anyhow::Result;
use common::*;
use tokio::sync::broadcast::error::TryRecvError;
use travelog::domain::Category;

#[tokio::test]
async fn test_event_fires_once_per_submit_with_owner() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let mut events = service.subscribe();
    let t = parse_date("2025-07-04");

    service
        .as_account(alice())
        .submit(FLIGHT, "Boston", "Denver", t)
        .await?;
    service
        .as_account(bob())
        .submit(HOTEL, "", "Denver", t)
        .await?;

    let first = events.try_recv()?;
    assert_eq!(first.owner, alice());
    assert_eq!(first.id, 0);
    assert_eq!(first.category, Category::Flight);
    assert_eq!(first.origin, "Boston");
    assert_eq!(first.destination, "Denver");
    assert_eq!(first.event_timestamp, t);

    let second = events.try_recv()?;
    assert_eq!(second.owner, bob());
    assert_eq!(second.id, 1);
    assert_eq!(second.category, Category::Hotel);

    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    Ok(())
}

#[tokio::test]
async fn test_event_matches_stored_item() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let mut events = service.subscribe();

    let id = service
        .as_account(carol())
        .submit(BUS, "Porto", "Braga", parse_date("2025-08-15"))
        .await?;

    let event = events.recv().await?;
    let item = service.get_item(id as i64).await?;
    assert_eq!(event, item.created_event());

    Ok(())
}

#[tokio::test]
async fn test_rejected_submit_emits_nothing() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let mut events = service.subscribe();

    let result = service
        .as_account(alice())
        .submit(9, "A", "B", 0)
        .await;
    assert!(result.is_err());
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    Ok(())
}

#[tokio::test]
async fn test_submit_without_subscribers_succeeds() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let id = service
        .as_account(alice())
        .submit(OTHER, "", "", 0)
        .await?;
    assert_eq!(id, 0);

    // Late subscribers only see what comes after them
    let mut events = service.subscribe();
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    service
        .as_account(alice())
        .submit(OTHER, "", "", 0)
        .await?;
    assert_eq!(events.try_recv()?.id, 1);

    Ok(())
}
