use std::collections::HashMap;

use chrono::Utc;
use thiserror::Error;

use super::{Address, Category, ItemCreated, ItemId, TravelItem, next_created_at};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Invalid item id: {0}")]
    InvalidId(i64),

    #[error("Invalid category code: {0} (expected 0=flight, 1=hotel, 2=bus, 3=other)")]
    InvalidCategory(i64),

    #[error("Item {found} is out of sequence (expected id {expected})")]
    OutOfSequence { expected: ItemId, found: ItemId },
}

/// In-memory travel ledger: an append-only item log plus a per-owner index.
///
/// Writes take `&mut self`, so a shared ledger must sit behind a single
/// lock; that keeps id allocation and index updates atomic with respect to
/// each other and to readers.
#[derive(Debug, Default, Clone)]
pub struct TravelLedger {
    items: Vec<TravelItem>,
    by_owner: HashMap<Address, Vec<ItemId>>,
}

impl TravelLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new item owned by `owner`.
    ///
    /// Returns the assigned id together with the notification for the
    /// stored item. The category code is validated before anything is
    /// touched, so a rejected submit produces neither.
    pub fn submit(
        &mut self,
        owner: Address,
        category: i64,
        origin: impl Into<String>,
        destination: impl Into<String>,
        event_timestamp: i64,
    ) -> Result<(ItemId, ItemCreated), LedgerError> {
        self.submit_at(
            owner,
            category,
            origin,
            destination,
            event_timestamp,
            Utc::now().timestamp(),
        )
    }

    /// Same as [`submit`](Self::submit) with an explicit clock reading.
    pub fn submit_at(
        &mut self,
        owner: Address,
        category: i64,
        origin: impl Into<String>,
        destination: impl Into<String>,
        event_timestamp: i64,
        now: i64,
    ) -> Result<(ItemId, ItemCreated), LedgerError> {
        let category =
            Category::from_code(category).ok_or(LedgerError::InvalidCategory(category))?;
        let previous = self.items.last().map(|item| item.created_at_timestamp);

        let item = TravelItem {
            id: self.items.len() as ItemId,
            owner,
            category,
            origin: origin.into(),
            destination: destination.into(),
            event_timestamp,
            created_at_timestamp: next_created_at(previous, now),
        };

        let stored = self.push(item);
        Ok((stored.id, stored.created_event()))
    }

    /// Re-append an item that was already stored elsewhere, keeping its
    /// owner and timestamps. Ids must arrive densely, in order.
    pub fn restore(&mut self, item: TravelItem) -> Result<&TravelItem, LedgerError> {
        let expected = self.items.len() as ItemId;
        if item.id != expected {
            return Err(LedgerError::OutOfSequence {
                expected,
                found: item.id,
            });
        }
        Ok(self.push(item))
    }

    fn push(&mut self, item: TravelItem) -> &TravelItem {
        self.by_owner.entry(item.owner).or_default().push(item.id);
        self.items.push(item);
        &self.items[self.items.len() - 1]
    }

    pub fn get_by_id(&self, id: i64) -> Result<&TravelItem, LedgerError> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.items.get(index))
            .ok_or(LedgerError::InvalidId(id))
    }

    /// Items owned by `owner` in submission order. Unknown owners get an empty list.
    pub fn get_by_owner(&self, owner: &Address) -> Vec<&TravelItem> {
        self.owner_ids(owner)
            .iter()
            .map(|id| &self.items[*id as usize])
            .collect()
    }

    /// Ids owned by `owner` in submission order.
    pub fn owner_ids(&self, owner: &Address) -> &[ItemId] {
        self.by_owner.get(owner).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_count(&self) -> u64 {
        self.items.len() as u64
    }

    pub fn owner_count(&self, owner: &Address) -> u64 {
        self.owner_ids(owner).len() as u64
    }

    /// Owners with at least one item.
    pub fn owners(&self) -> impl Iterator<Item = &Address> {
        self.by_owner.keys()
    }

    pub fn items(&self) -> &[TravelItem] {
        &self.items
    }
}

/// Result of checking a persisted item log for consistency.
#[derive(Debug, Clone, Default)]
pub struct IntegrityReport {
    pub item_count: u64,
    pub owner_count: u64,
    pub count_by_category: HashMap<Category, u64>,
    pub issues: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Replay `items` (as loaded in id order) through a fresh ledger and compare
/// the owner index it rebuilds with the stored one.
///
/// `owner_index` maps each owner to its item ids in index order, as kept by
/// the store independently of the item rows.
pub fn build_integrity_report(
    items: Vec<TravelItem>,
    owner_index: &HashMap<Address, Vec<ItemId>>,
) -> IntegrityReport {
    let mut report = IntegrityReport::default();
    let mut ledger = TravelLedger::new();
    let mut previous_created_at: Option<i64> = None;

    for item in items {
        if item.created_at_timestamp <= 0 {
            report.issues.push(format!(
                "Item {} has non-positive creation timestamp {}",
                item.id, item.created_at_timestamp
            ));
        }
        if let Some(previous) = previous_created_at {
            if item.created_at_timestamp < previous {
                report.issues.push(format!(
                    "Item {} was created before the item preceding it ({} < {})",
                    item.id, item.created_at_timestamp, previous
                ));
            }
        }
        previous_created_at = Some(item.created_at_timestamp);
        *report.count_by_category.entry(item.category).or_insert(0) += 1;

        if let Err(err) = ledger.restore(item) {
            report.issues.push(err.to_string());
            // Nothing past a gap can be replayed.
            break;
        }
    }

    report.item_count = ledger.total_count();
    report.owner_count = ledger.owners().count() as u64;

    for owner in ledger.owners() {
        let replayed = ledger.owner_ids(owner);
        let indexed = owner_index.get(owner).map(Vec::as_slice).unwrap_or(&[]);
        if replayed != indexed {
            report.issues.push(format!(
                "Owner {} is indexed with items {:?} but owns {:?} in the log",
                owner, indexed, replayed
            ));
        }
    }
    for (owner, indexed) in owner_index {
        if ledger.owner_count(owner) == 0 && !indexed.is_empty() {
            report.issues.push(format!(
                "Owner {} is indexed with items {:?} but owns none in the log",
                owner, indexed
            ));
        }
    }

    report
}
