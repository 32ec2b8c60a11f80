use chrono::Utc;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

use crate::domain::{
    Address, Category, IntegrityReport, ItemCreated, ItemId, LedgerError, TravelItem,
    build_integrity_report,
};
use crate::storage::{NewItem, Repository};

use super::AppError;

/// How many undelivered notifications a slow subscriber may fall behind by
/// before it starts missing them.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Application service owning the travel ledger.
/// This is the primary interface for any client (CLI, API, etc.).
///
/// Submissions are serialized through a single write lock and a database
/// transaction; reads go straight to the store and only ever see committed
/// items.
pub struct LedgerService {
    repo: Repository,
    write_lock: Mutex<()>,
    events: broadcast::Sender<ItemCreated>,
}

/// Execution context of a caller. Writes made through an `Account` are
/// always attributed to its address.
pub struct Account<'a> {
    service: &'a LedgerService,
    address: Address,
}

impl Account<'_> {
    pub fn address(&self) -> Address {
        self.address
    }

    /// Record a new travel item owned by this account and return its id.
    pub async fn submit(
        &self,
        category: i64,
        origin: impl Into<String>,
        destination: impl Into<String>,
        event_timestamp: i64,
    ) -> Result<ItemId, AppError> {
        let category =
            Category::from_code(category).ok_or(LedgerError::InvalidCategory(category))?;

        let item = self
            .service
            .append(NewItem {
                owner: self.address,
                category,
                origin: origin.into(),
                destination: destination.into(),
                event_timestamp,
            })
            .await?;

        Ok(item.id)
    }
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            repo,
            write_lock: Mutex::new(()),
            events,
        }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        debug!(path = database_path, "Ledger database initialized");
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        debug!(path = database_path, "Connected to ledger database");
        Ok(Self::new(repo))
    }

    /// Act as `address`.
    pub fn as_account(&self, address: Address) -> Account<'_> {
        Account {
            service: self,
            address,
        }
    }

    /// Parse a textual address into an owner identity.
    pub fn parse_address(input: &str) -> Result<Address, AppError> {
        Address::parse(input)
            .map_err(|e| AppError::InvalidAddress(format!("{}: {}", input, e)))
    }

    /// Receive an [`ItemCreated`] for every submission committed after this call.
    ///
    /// Delivery is best effort:
    /// - A subscriber more than [`EVENT_CHANNEL_CAPACITY`] events behind gets
    ///   `RecvError::Lagged` and the skipped events are gone.
    /// - If the caller of `submit` drops its future after the commit but before
    ///   the send, the item is stored and no event is sent for it.
    ///
    /// Consumers that cannot miss items should resync from `list_items`.
    pub fn subscribe(&self) -> broadcast::Receiver<ItemCreated> {
        self.events.subscribe()
    }

    async fn append(&self, new_item: NewItem) -> Result<TravelItem, AppError> {
        let _guard = self.write_lock.lock().await;

        let item = self
            .repo
            .insert_item(new_item, Utc::now().timestamp())
            .await?;

        info!(
            id = item.id,
            owner = %item.owner,
            category = %item.category,
            "Travel item recorded"
        );

        // Sent under the lock so subscribers observe commit order.
        // An error only means nobody is listening.
        let _ = self.events.send(item.created_event());

        Ok(item)
    }

    // ========================
    // Read operations
    // ========================

    /// Get an item by id. Ids outside `[0, total_count)` are `InvalidId`.
    pub async fn get_item(&self, id: i64) -> Result<TravelItem, AppError> {
        if id < 0 {
            return Err(AppError::InvalidId(id));
        }
        debug!(id, "Fetching travel item");
        self.repo.get_item(id).await?.ok_or(AppError::InvalidId(id))
    }

    /// Items owned by `owner`, in submission order.
    pub async fn items_for_owner(&self, owner: &Address) -> Result<Vec<TravelItem>, AppError> {
        debug!(owner = %owner, "Listing travel items for owner");
        Ok(self.repo.list_items_for_owner(owner).await?)
    }

    /// All items, in id order.
    pub async fn list_items(&self) -> Result<Vec<TravelItem>, AppError> {
        Ok(self.repo.list_items().await?)
    }

    pub async fn total_count(&self) -> Result<u64, AppError> {
        Ok(self.repo.count_items().await?)
    }

    pub async fn owner_count(&self, owner: &Address) -> Result<u64, AppError> {
        Ok(self.repo.count_items_for_owner(owner).await?)
    }

    // ========================
    // Integrity operations
    // ========================

    /// Check ledger integrity and return a report.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, AppError> {
        // Hold off writers so the log and the owner index come from the same state.
        let _guard = self.write_lock.lock().await;

        let items = self.repo.list_items().await?;
        let owner_index = self.repo.owner_index().await?;
        let report = build_integrity_report(items, &owner_index);

        for issue in &report.issues {
            warn!(issue = %issue, "Ledger integrity issue");
        }

        Ok(report)
    }
}
