//! Collection store contract and in-memory backend

use crate::error::StoreError;
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use pathway_record::{Membership, ProgramId, ProgramRecord};
use std::time::Duration;

/// Authoritative owner of Saved/Target membership
///
/// Snapshots carry no ordering guarantee; ordering is the board's job.
/// Every operation may fail with [`StoreError::Unavailable`].
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Current Saved members
    async fn list_saved(&self) -> Result<Vec<ProgramRecord>, StoreError>;

    /// Current Target members
    async fn list_targets(&self) -> Result<Vec<ProgramRecord>, StoreError>;

    /// Move a record from Saved to Target
    ///
    /// # Errors
    /// - `StoreError::NotFound` if the id is not in Saved
    /// - `StoreError::AlreadyTarget` if the id is already in Target
    async fn convert_to_target(&self, id: &ProgramId) -> Result<(), StoreError>;

    /// Move a record from Target back to Saved
    ///
    /// # Errors
    /// - `StoreError::NotFound` if the id is not in Target
    /// - `StoreError::AlreadySaved` if the id is already in Saved
    async fn revert_to_saved(&self, id: &ProgramId) -> Result<(), StoreError>;

    /// Delete a record from the named collection
    ///
    /// # Errors
    /// - `StoreError::NotFound` if the id is not in that collection
    async fn remove_program(&self, id: &ProgramId, was_target: bool) -> Result<(), StoreError>;
}

/// In-memory collection store
///
/// Keeps insertion order, can simulate latency and outages.
#[derive(Debug, Default)]
pub struct InMemoryCollectionStore {
    records: RwLock<IndexMap<ProgramId, ProgramRecord>>,
    outage: RwLock<Option<String>>,
    latency: Option<Duration>,
}

impl InMemoryCollectionStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create store seeded with records
    ///
    /// A later record with a duplicate id replaces the earlier one.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = ProgramRecord>) -> Self {
        let store = Self::new();
        {
            let mut guard = store.records.write();
            for record in records {
                guard.insert(record.id.clone(), record);
            }
        }
        store
    }

    /// Create store from a JSON array of records
    ///
    /// # Errors
    /// - `StoreError::Persistence` if the JSON is malformed
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let records: Vec<ProgramRecord> = serde_json::from_str(json)?;
        Ok(Self::with_records(records))
    }

    /// With artificial latency on every call
    #[inline]
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every subsequent call with `Unavailable(reason)`
    pub fn set_unavailable(&self, reason: impl Into<String>) {
        *self.outage.write() = Some(reason.into());
    }

    /// Clear a simulated outage
    pub fn restore(&self) {
        *self.outage.write() = None;
    }

    /// Insert or replace a record
    pub fn insert(&self, record: ProgramRecord) {
        self.records.write().insert(record.id.clone(), record);
    }

    /// Look up a record regardless of membership
    #[must_use]
    pub fn get(&self, id: &ProgramId) -> Option<ProgramRecord> {
        self.records.read().get(id).cloned()
    }

    /// Number of records across both collections
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check if both collections are empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// All records in insertion order
    #[must_use]
    pub fn records(&self) -> Vec<ProgramRecord> {
        self.records.read().values().cloned().collect()
    }

    async fn enter(&self) -> Result<(), StoreError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match self.outage.read().as_ref() {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }

    fn list(&self, membership: Membership) -> Vec<ProgramRecord> {
        self.records
            .read()
            .values()
            .filter(|r| r.membership == membership)
            .cloned()
            .collect()
    }

    fn transfer(&self, id: &ProgramId, from: Membership) -> Result<(), StoreError> {
        let mut guard = self.records.write();
        let record = guard
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if record.membership != from {
            return Err(match from {
                Membership::Saved => StoreError::AlreadyTarget(id.clone()),
                Membership::Target => StoreError::AlreadySaved(id.clone()),
            });
        }

        record.membership = from.opposite();
        tracing::debug!(program = %id, to = %record.membership, "membership changed");
        Ok(())
    }
}

#[async_trait]
impl CollectionStore for InMemoryCollectionStore {
    async fn list_saved(&self) -> Result<Vec<ProgramRecord>, StoreError> {
        self.enter().await?;
        Ok(self.list(Membership::Saved))
    }

    async fn list_targets(&self) -> Result<Vec<ProgramRecord>, StoreError> {
        self.enter().await?;
        Ok(self.list(Membership::Target))
    }

    async fn convert_to_target(&self, id: &ProgramId) -> Result<(), StoreError> {
        self.enter().await?;
        self.transfer(id, Membership::Saved)
    }

    async fn revert_to_saved(&self, id: &ProgramId) -> Result<(), StoreError> {
        self.enter().await?;
        self.transfer(id, Membership::Target)
    }

    async fn remove_program(&self, id: &ProgramId, was_target: bool) -> Result<(), StoreError> {
        self.enter().await?;

        let expected = if was_target {
            Membership::Target
        } else {
            Membership::Saved
        };

        let mut guard = self.records.write();
        if !guard.get(id).is_some_and(|r| r.membership == expected) {
            return Err(StoreError::NotFound(id.clone()));
        }

        guard.shift_remove(id);
        tracing::debug!(program = %id, "program removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathway_record::ReferenceData;

    fn record(id: &str, membership: Membership) -> ProgramRecord {
        ProgramRecord::new(id, membership, ReferenceData::new(id, "School"))
    }

    fn seeded() -> InMemoryCollectionStore {
        InMemoryCollectionStore::with_records([
            record("p1", Membership::Saved),
            record("p2", Membership::Saved),
            record("p3", Membership::Target),
        ])
    }

    #[tokio::test]
    async fn lists_split_by_membership() {
        let store = seeded();

        let saved = store.list_saved().await.unwrap();
        let targets = store.list_targets().await.unwrap();

        assert_eq!(saved.len(), 2);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].id.as_str(), "p3");
    }

    #[tokio::test]
    async fn convert_moves_saved_to_target() {
        let store = seeded();
        let id = ProgramId::from("p1");

        store.convert_to_target(&id).await.unwrap();

        assert!(store.get(&id).unwrap().is_target());
        assert_eq!(store.list_saved().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn convert_rejects_existing_target() {
        let store = seeded();
        let result = store.convert_to_target(&"p3".into()).await;
        assert_eq!(result, Err(StoreError::AlreadyTarget("p3".into())));
    }

    #[tokio::test]
    async fn revert_rejects_existing_saved() {
        let store = seeded();
        let result = store.revert_to_saved(&"p1".into()).await;
        assert_eq!(result, Err(StoreError::AlreadySaved("p1".into())));
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = seeded();
        let result = store.convert_to_target(&"nope".into()).await;
        assert_eq!(result, Err(StoreError::NotFound("nope".into())));
    }

    #[tokio::test]
    async fn remove_checks_named_collection() {
        let store = seeded();

        let wrong = store.remove_program(&"p3".into(), false).await;
        assert_eq!(wrong, Err(StoreError::NotFound("p3".into())));

        store.remove_program(&"p3".into(), true).await.unwrap();
        assert!(store.get(&"p3".into()).is_none());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn outage_fails_every_call_until_restored() {
        let store = seeded();
        store.set_unavailable("offline");

        assert!(matches!(
            store.list_saved().await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.convert_to_target(&"p1".into()).await.is_err());
        assert!(store.get(&"p1".into()).unwrap().is_saved());

        store.restore();
        assert!(store.convert_to_target(&"p1".into()).await.is_ok());
    }

    #[tokio::test]
    async fn seeds_from_json() {
        let json = r#"[
            {"id": "a", "membership": "saved", "name": "A", "school": "S"},
            {"id": "b", "membership": "target", "name": "B", "school": "S"}
        ]"#;
        let store = InMemoryCollectionStore::from_json(json).unwrap();
        assert_eq!(store.len(), 2);
        assert!(InMemoryCollectionStore::from_json("{").is_err());
    }
}
