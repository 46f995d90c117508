//! In-process badge storage.
//!
//! [`MemoryBadgeStore`] keeps every record in a `HashMap` behind a single
//! [`tokio::sync::RwLock`]. Name uniqueness is checked while holding the
//! write lock, so two concurrent inserts with the same name cannot both
//! succeed.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::BadgeStore;
use crate::domain::{BadgeFields, BadgeId, BadgeRecord};
use crate::error::BadgeError;

/// Badge store held entirely in memory. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryBadgeStore {
    badges: RwLock<HashMap<BadgeId, BadgeRecord>>,
}

impl MemoryBadgeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored badges.
    pub async fn len(&self) -> usize {
        self.badges.read().await.len()
    }

    /// Returns `true` if the store holds no badges.
    pub async fn is_empty(&self) -> bool {
        self.badges.read().await.is_empty()
    }
}

fn name_taken(map: &HashMap<BadgeId, BadgeRecord>, name: &str, except: Option<BadgeId>) -> bool {
    map.values()
        .any(|r| r.fields.timer_name == name && Some(r.id) != except)
}

#[async_trait]
impl BadgeStore for MemoryBadgeStore {
    async fn insert(&self, record: BadgeRecord) -> Result<BadgeRecord, BadgeError> {
        let mut map = self.badges.write().await;
        if name_taken(&map, &record.fields.timer_name, None) {
            return Err(BadgeError::DuplicateName(record.fields.timer_name));
        }
        if map.contains_key(&record.id) {
            return Err(BadgeError::Internal(format!(
                "badge {} already exists",
                record.id
            )));
        }
        map.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<BadgeRecord>, BadgeError> {
        let map = self.badges.read().await;
        let mut records: Vec<BadgeRecord> = map.values().cloned().collect();
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        Ok(records)
    }

    async fn get(&self, id: BadgeId) -> Result<BadgeRecord, BadgeError> {
        let map = self.badges.read().await;
        map.get(&id)
            .cloned()
            .ok_or_else(|| BadgeError::NotFound(id.to_string()))
    }

    async fn replace(&self, id: BadgeId, fields: BadgeFields) -> Result<BadgeRecord, BadgeError> {
        let mut map = self.badges.write().await;
        if !map.contains_key(&id) {
            return Err(BadgeError::NotFound(id.to_string()));
        }
        if name_taken(&map, &fields.timer_name, Some(id)) {
            return Err(BadgeError::DuplicateName(fields.timer_name));
        }
        let slot = map
            .get_mut(&id)
            .ok_or_else(|| BadgeError::NotFound(id.to_string()))?;
        *slot = slot.replaced(fields);
        Ok(slot.clone())
    }

    async fn remove(&self, id: BadgeId) -> Result<BadgeRecord, BadgeError> {
        let mut map = self.badges.write().await;
        map.remove(&id)
            .ok_or_else(|| BadgeError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn record(name: &str) -> BadgeRecord {
        BadgeRecord::new(BadgeFields::with_name(name))
    }

    #[tokio::test]
    async fn insert_and_get() {
        let store = MemoryBadgeStore::new();
        let badge = record("Summer Sale");
        let id = badge.id;

        let Ok(inserted) = store.insert(badge).await else {
            panic!("insert failed");
        };
        assert_eq!(inserted.id, id);

        let Ok(fetched) = store.get(id).await else {
            panic!("badge not found");
        };
        assert_eq!(fetched.fields.timer_name, "Summer Sale");
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected_and_first_kept() {
        let store = MemoryBadgeStore::new();
        let first = record("Sale");
        let first_id = first.id;
        assert!(store.insert(first).await.is_ok());

        let result = store.insert(record("Sale")).await;
        assert!(matches!(result, Err(BadgeError::DuplicateName(_))));
        assert_eq!(store.len().await, 1);
        assert!(store.get(first_id).await.is_ok());
    }

    #[tokio::test]
    async fn get_nonexistent_returns_not_found() {
        let store = MemoryBadgeStore::new();
        let result = store.get(BadgeId::new()).await;
        assert!(matches!(result, Err(BadgeError::NotFound(_))));
    }

    #[tokio::test]
    async fn replace_swaps_fields_and_keeps_created_at() {
        let store = MemoryBadgeStore::new();
        let Ok(original) = store.insert(record("Sale")).await else {
            panic!("insert failed");
        };

        let mut fields = BadgeFields::with_name("Sale");
        fields.color = "#000000".to_string();
        let Ok(updated) = store.replace(original.id, fields).await else {
            panic!("replace failed");
        };
        assert_eq!(updated.fields.color, "#000000");
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at >= original.updated_at);
    }

    #[tokio::test]
    async fn replace_nonexistent_leaves_store_unchanged() {
        let store = MemoryBadgeStore::new();
        let Ok(existing) = store.insert(record("Sale")).await else {
            panic!("insert failed");
        };

        let result = store
            .replace(BadgeId::new(), BadgeFields::with_name("Other"))
            .await;
        assert!(matches!(result, Err(BadgeError::NotFound(_))));

        let Ok(list) = store.list().await else {
            panic!("list failed");
        };
        assert_eq!(list, vec![existing]);
    }

    #[tokio::test]
    async fn replace_into_taken_name_is_rejected() {
        let store = MemoryBadgeStore::new();
        let _ = store.insert(record("Sale")).await;
        let Ok(other) = store.insert(record("Clearance")).await else {
            panic!("insert failed");
        };

        let result = store
            .replace(other.id, BadgeFields::with_name("Sale"))
            .await;
        assert!(matches!(result, Err(BadgeError::DuplicateName(_))));
    }

    #[tokio::test]
    async fn remove_then_get_is_not_found() {
        let store = MemoryBadgeStore::new();
        let Ok(badge) = store.insert(record("Sale")).await else {
            panic!("insert failed");
        };

        assert!(store.remove(badge.id).await.is_ok());
        assert!(matches!(
            store.get(badge.id).await,
            Err(BadgeError::NotFound(_))
        ));
        assert!(matches!(
            store.remove(badge.id).await,
            Err(BadgeError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_is_ordered_by_creation() {
        let store = MemoryBadgeStore::new();
        let base = chrono::Utc::now();
        for (offset, name) in [(2, "Third"), (0, "First"), (1, "Second")] {
            let mut badge = record(name);
            badge.created_at = base + chrono::Duration::seconds(offset);
            assert!(store.insert(badge).await.is_ok());
        }

        let Ok(list) = store.list().await else {
            panic!("list failed");
        };
        let listed: Vec<String> = list.into_iter().map(|b| b.fields.timer_name).collect();
        assert_eq!(listed, vec!["First", "Second", "Third"]);
    }
}
