use crate::models::{Recommendation, RecommendationFilter};

/// Errors raised by a storage backend
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Recommendation {0} does not exist")]
    Missing(i32),

    #[error("Constraint violated: {0}")]
    Constraint(String),

    #[error("Record has not been persisted")]
    Unpersisted,

    #[error("Corrupt row {id}: {reason}")]
    CorruptRow { id: i32, reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for recommendation rows
///
/// Each write is a single commit-or-rollback unit: a failed insert, update
/// or delete leaves storage as it was. Reads have no side effects and
/// return rows ordered by id.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Inserts a row and returns the id storage assigned to it. `record.id` is ignored.
    async fn insert(&self, record: &Recommendation) -> StoreResult<i32>;

    /// Overwrites every column of the row identified by `record.id`
    async fn update(&self, record: &Recommendation) -> StoreResult<()>;

    /// Removes the row if present. Deleting an absent row is not an error.
    async fn delete(&self, id: i32) -> StoreResult<()>;

    async fn find(&self, id: i32) -> StoreResult<Option<Recommendation>>;

    async fn all(&self) -> StoreResult<Vec<Recommendation>>;

    async fn filter(&self, filter: &RecommendationFilter) -> StoreResult<Vec<Recommendation>>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}
