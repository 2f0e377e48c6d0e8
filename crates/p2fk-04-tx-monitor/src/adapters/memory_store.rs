use crate::domain::StoreError;
use crate::ports::IndexStore;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use shared_types::{BlockedAddress, IndexedItem, ItemKind, TxId};
use std::collections::{BTreeMap, HashMap};

/// Fields that identify the same record across replays.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NaturalKey {
    tx_id: TxId,
    kind: ItemKind,
    content: Option<String>,
    file_name: Option<String>,
    content_hash: Option<String>,
}

impl NaturalKey {
    fn of(item: &IndexedItem) -> Self {
        Self {
            tx_id: item.tx_id,
            kind: item.kind,
            content: item.content.clone(),
            file_name: item.file_name.clone(),
            content_hash: item.content_hash.clone(),
        }
    }
}

#[derive(Default)]
struct StoreState {
    items: Vec<(u64, IndexedItem)>,
    by_key: HashMap<NaturalKey, u64>,
    blocked: BTreeMap<String, BlockedAddress>,
    next_id: u64,
}

/// In-memory index store for tests and single-run nodes.
///
/// Saving a record that already exists (same transaction, kind, text, file
/// name and hash) returns the existing id.
#[derive(Default)]
pub struct InMemoryIndexStore {
    state: RwLock<StoreState>,
}

impl InMemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All items in insertion order.
    pub fn items(&self) -> Vec<IndexedItem> {
        self.state
            .read()
            .items
            .iter()
            .map(|(_, item)| item.clone())
            .collect()
    }

    /// Items signed by `address`.
    pub fn items_by_signer(&self, address: &str) -> Vec<IndexedItem> {
        self.state
            .read()
            .items
            .iter()
            .filter(|(_, item)| item.signed_by.as_deref() == Some(address))
            .map(|(_, item)| item.clone())
            .collect()
    }

    /// Case-insensitive substring search over message text and file names.
    pub fn search(&self, query: &str) -> Vec<IndexedItem> {
        let needle = query.to_lowercase();
        let hit = |field: &Option<String>| {
            field
                .as_deref()
                .is_some_and(|text| text.to_lowercase().contains(&needle))
        };
        self.state
            .read()
            .items
            .iter()
            .filter(|(_, item)| hit(&item.content) || hit(&item.file_name))
            .map(|(_, item)| item.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for InMemoryIndexStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("InMemoryIndexStore")
            .field("items", &state.items.len())
            .field("blocked", &state.blocked.len())
            .finish()
    }
}

#[async_trait]
impl IndexStore for InMemoryIndexStore {
    async fn save_indexed_item(&self, item: IndexedItem) -> Result<u64, StoreError> {
        let key = NaturalKey::of(&item);
        let mut state = self.state.write();
        if let Some(id) = state.by_key.get(&key) {
            return Ok(*id);
        }
        state.next_id += 1;
        let id = state.next_id;
        state.by_key.insert(key, id);
        state.items.push((id, item));
        Ok(id)
    }

    async fn is_address_blocked(&self, address: &str) -> Result<bool, StoreError> {
        Ok(self.state.read().blocked.contains_key(address))
    }

    async fn block_address(&self, address: &str, reason: &str) -> Result<bool, StoreError> {
        let mut state = self.state.write();
        if state.blocked.contains_key(address) {
            return Ok(false);
        }
        state.blocked.insert(
            address.to_string(),
            BlockedAddress {
                address: address.to_string(),
                reason: reason.to_string(),
                blocked_at: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn unblock_address(&self, address: &str) -> Result<bool, StoreError> {
        Ok(self.state.write().blocked.remove(address).is_some())
    }

    async fn blocked_addresses(&self) -> Result<Vec<BlockedAddress>, StoreError> {
        Ok(self.state.read().blocked.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> TxId {
        TxId::from_bytes([n; 32])
    }

    #[tokio::test]
    async fn test_save_assigns_increasing_ids() {
        let store = InMemoryIndexStore::new();
        let a = store
            .save_indexed_item(IndexedItem::message(id(1), "first"))
            .await
            .unwrap();
        let b = store
            .save_indexed_item(IndexedItem::file(id(1), "a.txt", 3))
            .await
            .unwrap();
        assert_eq!((a, b), (1, 2));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_replay_returns_existing_id() {
        let store = InMemoryIndexStore::new();
        let first = store
            .save_indexed_item(IndexedItem::message(id(1), "same"))
            .await
            .unwrap();
        // Different timestamp, same record
        let again = store
            .save_indexed_item(IndexedItem::message(id(1), "same"))
            .await
            .unwrap();
        assert_eq!(first, again);
        assert_eq!(store.len(), 1);

        // Same text from another transaction is a new record
        store
            .save_indexed_item(IndexedItem::message(id(2), "same"))
            .await
            .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_blocklist() {
        let store = InMemoryIndexStore::new();
        assert!(!store.is_address_blocked("mSpam").await.unwrap());
        assert!(store.block_address("mSpam", "spam").await.unwrap());
        assert!(!store.block_address("mSpam", "again").await.unwrap());
        assert!(store.is_address_blocked("mSpam").await.unwrap());

        let blocked = store.blocked_addresses().await.unwrap();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].reason, "spam");

        assert!(store.unblock_address("mSpam").await.unwrap());
        assert!(!store.unblock_address("mSpam").await.unwrap());
        assert!(!store.is_address_blocked("mSpam").await.unwrap());
    }

    #[tokio::test]
    async fn test_queries() {
        let store = InMemoryIndexStore::new();
        store
            .save_indexed_item(IndexedItem::message(id(1), "Hello World").signed_by(Some("mA".into())))
            .await
            .unwrap();
        store
            .save_indexed_item(IndexedItem::file(id(2), "hello.txt", 4).signed_by(Some("mB".into())))
            .await
            .unwrap();
        store
            .save_indexed_item(IndexedItem::message(id(3), "other"))
            .await
            .unwrap();

        assert_eq!(store.search("HELLO").len(), 2);
        assert_eq!(store.items_by_signer("mA").len(), 1);
        assert!(store.items_by_signer("mC").is_empty());
        assert_eq!(store.items()[2].content.as_deref(), Some("other"));
    }
}
