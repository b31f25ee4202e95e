//! The store side of an import: product lookup and comment storage.

use crate::record::ReviewRecord;
use async_trait::async_trait;
use csv_async::AsyncReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tokio::io::AsyncRead;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("comment {0} already exists")]
    DuplicateComment(u64),
    #[error("store rejected the comment: {0}")]
    Rejected(String),
    #[error("product catalogue: {0}")]
    Catalogue(String),
    #[error(transparent)]
    Csv(#[from] csv_async::Error),
}

/// Value of a comment meta entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Int(i64),
    Text(String),
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self {
        MetaValue::Int(v)
    }
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        MetaValue::Int(i64::from(v))
    }
}

impl From<String> for MetaValue {
    fn from(v: String) -> Self {
        MetaValue::Text(v)
    }
}

/// What the importer needs from the host store. Calls are awaited one at a
/// time; nothing spans more than one row.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn lookup_product_id_by_sku(&self, sku: &str) -> Result<Option<u64>, StoreError>;

    /// Inserts the comment row and returns its id.
    async fn insert_comment(&mut self, record: &ReviewRecord) -> Result<u64, StoreError>;

    async fn set_comment_meta(
        &mut self,
        comment_id: u64,
        key: &str,
        value: MetaValue,
    ) -> Result<(), StoreError>;
}

/// Everything a [`MemoryStore`] holds, in a shape that serializes cleanly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub comments: BTreeMap<u64, ReviewRecord>,
    pub meta: BTreeMap<u64, BTreeMap<String, MetaValue>>,
}

/// In-process store used by the CLI and by tests.
#[derive(Debug)]
pub struct MemoryStore {
    products: HashMap<String, u64>,
    data: StoreSnapshot,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            products: HashMap::new(),
            data: StoreSnapshot::default(),
            next_id: 1,
        }
    }

    pub fn with_products<I, S>(products: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut store = Self::new();
        for (sku, id) in products {
            store.add_product(sku, id);
        }
        store
    }

    pub fn add_product(&mut self, sku: impl Into<String>, id: u64) {
        self.products.insert(sku.into(), id);
    }

    /// Reads a `sku,id` catalogue (header required, extra columns ignored).
    /// Returns how many products were loaded.
    pub async fn load_products<R>(&mut self, reader: R) -> Result<usize, StoreError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut rdr = AsyncReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .create_reader(reader);

        let headers = rdr.headers().await?.clone();
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| StoreError::Catalogue(format!("missing '{name}' column")))
        };
        let (sku_idx, id_idx) = (position("sku")?, position("id")?);

        let mut loaded = 0usize;
        let mut record = csv_async::StringRecord::new();
        while rdr.read_record(&mut record).await? {
            let (Some(sku), Some(id)) = (record.get(sku_idx), record.get(id_idx)) else {
                continue;
            };
            let sku = sku.trim();
            if sku.is_empty() {
                continue;
            }
            let id: u64 = id.trim().parse().map_err(|_| {
                StoreError::Catalogue(format!("product '{sku}' has a non-numeric id '{id}'"))
            })?;
            self.add_product(sku, id);
            loaded += 1;
        }
        Ok(loaded)
    }

    pub fn comment(&self, id: u64) -> Option<&ReviewRecord> {
        self.data.comments.get(&id)
    }

    pub fn meta(&self, id: u64, key: &str) -> Option<&MetaValue> {
        self.data.meta.get(&id).and_then(|m| m.get(key))
    }

    pub fn comments(&self) -> impl Iterator<Item = (u64, &ReviewRecord)> {
        self.data.comments.iter().map(|(id, c)| (*id, c))
    }

    pub fn len(&self) -> usize {
        self.data.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.comments.is_empty()
    }

    pub fn snapshot(&self) -> &StoreSnapshot {
        &self.data
    }

    pub fn into_snapshot(self) -> StoreSnapshot {
        self.data
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn lookup_product_id_by_sku(&self, sku: &str) -> Result<Option<u64>, StoreError> {
        Ok(self.products.get(sku).copied())
    }

    async fn insert_comment(&mut self, record: &ReviewRecord) -> Result<u64, StoreError> {
        let id = match u64::try_from(record.comment_id) {
            Ok(requested) if requested > 0 => {
                if self.data.comments.contains_key(&requested) {
                    return Err(StoreError::DuplicateComment(requested));
                }
                requested
            }
            _ => {
                while self.data.comments.contains_key(&self.next_id) {
                    self.next_id += 1;
                }
                self.next_id
            }
        };
        self.next_id = self.next_id.max(id.saturating_add(1));

        let mut stored = record.clone();
        stored.comment_id = i64::try_from(id).unwrap_or(i64::MAX);
        self.data.comments.insert(id, stored);
        Ok(id)
    }

    async fn set_comment_meta(
        &mut self,
        comment_id: u64,
        key: &str,
        value: MetaValue,
    ) -> Result<(), StoreError> {
        if !self.data.comments.contains_key(&comment_id) {
            return Err(StoreError::Rejected(format!("no comment {comment_id}")));
        }
        self.data
            .meta
            .entry(comment_id)
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }
}
