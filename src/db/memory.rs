use std::collections::BTreeMap;

use tokio::sync::RwLock;

use super::store::{RecommendationStore, StoreError, StoreResult};
use crate::models::{Recommendation, RecommendationFilter};

/// Same limit as the VARCHAR(63) columns of the PostgreSQL schema
pub const MAX_TEXT_LEN: usize = 63;

/// In-process store used by tests and `STORAGE_BACKEND=memory` deployments
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    next_id: i32,
    rows: BTreeMap<i32, Recommendation>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_constraints(record: &Recommendation) -> StoreResult<()> {
    for (column, value) in [
        ("name", &record.name),
        ("recommendation_name", &record.recommendation_name),
    ] {
        if value.chars().count() > MAX_TEXT_LEN {
            return Err(StoreError::Constraint(format!(
                "{} exceeds {} characters",
                column, MAX_TEXT_LEN
            )));
        }
    }
    Ok(())
}

#[async_trait::async_trait]
impl RecommendationStore for MemoryStore {
    async fn insert(&self, record: &Recommendation) -> StoreResult<i32> {
        check_constraints(record)?;

        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let id = inner.next_id;

        let mut row = record.clone();
        row.id = Some(id);
        inner.rows.insert(id, row);

        tracing::debug!(id, "Inserted row");
        Ok(id)
    }

    async fn update(&self, record: &Recommendation) -> StoreResult<()> {
        let id = record.id.ok_or(StoreError::Unpersisted)?;
        check_constraints(record)?;

        let mut inner = self.inner.write().await;
        let row = inner.rows.get_mut(&id).ok_or(StoreError::Missing(id))?;
        *row = record.clone();
        Ok(())
    }

    async fn delete(&self, id: i32) -> StoreResult<()> {
        let removed = self.inner.write().await.rows.remove(&id);
        tracing::debug!(id, removed = removed.is_some(), "Deleted row");
        Ok(())
    }

    async fn find(&self, id: i32) -> StoreResult<Option<Recommendation>> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn all(&self) -> StoreResult<Vec<Recommendation>> {
        Ok(self.inner.read().await.rows.values().cloned().collect())
    }

    async fn filter(&self, filter: &RecommendationFilter) -> StoreResult<Vec<Recommendation>> {
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .values()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
