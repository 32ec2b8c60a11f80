use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{Address, TravelItem};

/// Ledger snapshot for JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    /// Items in the whole ledger, even when `items` is scoped to one owner
    pub total_count: u64,
    pub owner: Option<Address>,
    pub items: Vec<TravelItem>,
}

/// Exporter for converting ledger data to various formats
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    async fn load(&self, owner: Option<&Address>) -> Result<Vec<TravelItem>> {
        let items = match owner {
            Some(owner) => self.service.items_for_owner(owner).await?,
            None => self.service.list_items().await?,
        };
        Ok(items)
    }

    /// Export items to CSV format, optionally only those of one owner
    pub async fn export_items_csv<W: Write>(
        &self,
        writer: W,
        owner: Option<&Address>,
    ) -> Result<usize> {
        let items = self.load(owner).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "owner",
            "category",
            "origin",
            "destination",
            "event_timestamp",
            "created_at_timestamp",
        ])?;

        for item in &items {
            csv_writer.write_record([
                item.id.to_string(),
                item.owner.to_string(),
                item.category.as_str().to_string(),
                item.origin.clone(),
                item.destination.clone(),
                item.event_timestamp.to_string(),
                item.created_at_timestamp.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(items.len())
    }

    /// Export items as a pretty-printed JSON snapshot
    pub async fn export_json<W: Write>(
        &self,
        mut writer: W,
        owner: Option<&Address>,
    ) -> Result<LedgerSnapshot> {
        let items = self.load(owner).await?;
        let total_count = self.service.total_count().await?;

        let snapshot = LedgerSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            total_count,
            owner: owner.copied(),
            items,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
