// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tempfile::TempDir;
use travelog::application::LedgerService;
use travelog::domain::Address;

pub const FLIGHT: i64 = 0;
pub const HOTEL: i64 = 1;
pub const BUS: i64 = 2;
pub const OTHER: i64 = 3;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Open a second, raw connection pool on the database behind `test_service`,
/// for tampering with the stored data underneath the service.
pub async fn raw_pool(temp_dir: &TempDir) -> Result<SqlitePool> {
    let db_path = temp_dir.path().join("test.db");
    let pool = SqlitePool::connect(&format!("sqlite:{}", db_path.display())).await?;
    Ok(pool)
}

/// Helper to parse a date string into seconds since epoch
pub fn parse_date(date_str: &str) -> i64 {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp()
}

pub fn alice() -> Address {
    Address::parse("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266").unwrap()
}

pub fn bob() -> Address {
    Address::parse("0x70997970c51812dc3a010c7d01b50e0d17dc79c8").unwrap()
}

pub fn carol() -> Address {
    Address::parse("0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc").unwrap()
}
