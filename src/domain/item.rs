use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Address, Category};

pub type ItemId = u64;

/// A single travel record. Items are immutable once stored: the ledger
/// never updates or removes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelItem {
    /// Dense, zero-based position in the ledger
    pub id: ItemId,
    /// Account that submitted the item
    pub owner: Address,
    pub category: Category,
    pub origin: String,
    pub destination: String,
    /// When the travel happens, as supplied by the submitter (seconds since epoch)
    pub event_timestamp: i64,
    /// When the ledger stored the item (seconds since epoch)
    pub created_at_timestamp: i64,
}

impl TravelItem {
    pub fn event_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.event_timestamp, 0)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created_at_timestamp, 0)
    }

    /// The notification payload describing this item.
    pub fn created_event(&self) -> ItemCreated {
        ItemCreated {
            owner: self.owner,
            id: self.id,
            category: self.category,
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            event_timestamp: self.event_timestamp,
        }
    }
}

/// Notification emitted once for every committed submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCreated {
    pub owner: Address,
    pub id: ItemId,
    pub category: Category,
    pub origin: String,
    pub destination: String,
    pub event_timestamp: i64,
}

/// Creation timestamp for the next item: the current time, but never
/// earlier than the previous item's and never below 1.
pub fn next_created_at(previous: Option<i64>, now: i64) -> i64 {
    now.max(previous.unwrap_or(1)).max(1)
}
