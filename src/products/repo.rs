use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::{ProductError, Result};
use crate::products::repo_types::Product;
use crate::products::validation::ProductFields;

/// Source of `created_at` / `updated_at` values.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Uuid;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Produces the new mutable fields from the current record, or refuses.
/// Stores run it while no other writer can touch the same record.
pub type MergeFn = Box<dyn FnOnce(&Product) -> Result<ProductFields> + Send>;

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// All records, oldest first.
    async fn list(&self) -> Result<Vec<Product>>;
    async fn get(&self, id: Uuid) -> Result<Product>;
    /// `fields` must already be validated.
    async fn create(&self, fields: ProductFields) -> Result<Product>;
    /// Loads the record exclusively, applies `merge` and writes the result.
    /// Nothing is written if `merge` fails.
    async fn update(&self, id: Uuid, merge: MergeFn) -> Result<Product>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// `updated_at` never goes behind `created_at`, even if the clock does.
pub(crate) fn touch(created_at: OffsetDateTime, now: OffsetDateTime) -> OffsetDateTime {
    now.max(created_at)
}

/// One record behind its own lock; `None` once deleted.
type Slot = Arc<Mutex<Option<Product>>>;

#[derive(Default)]
struct MemoryInner {
    records: HashMap<Uuid, Slot>,
    issued: HashSet<Uuid>,
}

/// In-process store, used when no database is configured.
///
/// The map lock is only held to find or insert a slot, so writers to
/// different records don't wait on each other.
pub struct MemoryProductStore {
    inner: RwLock<MemoryInner>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::with_sources(Arc::new(SystemClock), Arc::new(RandomIds))
    }

    pub fn with_sources(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            inner: RwLock::new(MemoryInner::default()),
            clock,
            ids,
        }
    }

    async fn slot(&self, id: Uuid) -> Result<Slot> {
        self.inner
            .read()
            .await
            .records
            .get(&id)
            .cloned()
            .ok_or(ProductError::NotFound)
    }
}

impl Default for MemoryProductStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn list(&self) -> Result<Vec<Product>> {
        let slots: Vec<Slot> = self.inner.read().await.records.values().cloned().collect();
        let mut rows = Vec::with_capacity(slots.len());
        for slot in slots {
            if let Some(product) = slot.lock().await.as_ref() {
                rows.push(product.clone());
            }
        }
        rows.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Product> {
        self.slot(id)
            .await?
            .lock()
            .await
            .clone()
            .ok_or(ProductError::NotFound)
    }

    async fn create(&self, fields: ProductFields) -> Result<Product> {
        let mut inner = self.inner.write().await;

        // ids are never handed out twice, even after a delete
        let id = loop {
            let candidate = self.ids.next_id();
            if inner.issued.insert(candidate) {
                break candidate;
            }
        };

        let now = self.clock.now();
        let product = Product {
            id,
            name: fields.name,
            description: fields.description,
            price: fields.price,
            available: fields.available,
            created_at: now,
            updated_at: now,
        };
        inner
            .records
            .insert(id, Arc::new(Mutex::new(Some(product.clone()))));
        Ok(product)
    }

    async fn update(&self, id: Uuid, merge: MergeFn) -> Result<Product> {
        let slot = self.slot(id).await?;
        let mut guard = slot.lock().await;
        let record = guard.as_mut().ok_or(ProductError::NotFound)?;

        let fields = merge(record)?;
        record.name = fields.name;
        record.description = fields.description;
        record.price = fields.price;
        record.available = fields.available;
        record.updated_at = touch(record.created_at, self.clock.now());
        Ok(record.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let slot = self.slot(id).await?;
        // a writer already queued on the slot sees `None` and reports not found
        slot.lock().await.take().ok_or(ProductError::NotFound)?;
        self.inner.write().await.records.remove(&id);
        Ok(())
    }
}
