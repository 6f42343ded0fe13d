use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};

use super::store::{RecommendationStore, StoreError, StoreResult};
use crate::models::{Recommendation, RecommendationFilter, RecommendationType};

const SELECT_COLUMNS: &str = r#"
    SELECT id, name, recommendation_type, recommendation_name,
           recommendation_id, recommendation_in_stock
    FROM recommendations
"#;

/// Creates a PostgreSQL connection pool
pub async fn create_pool(database_uri: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_uri)
        .await?;

    Ok(pool)
}

/// Applies the embedded migrations under `migrations/`
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(Debug, FromRow)]
struct RecommendationRow {
    id: i32,
    name: String,
    recommendation_type: String,
    recommendation_name: String,
    recommendation_id: i32,
    recommendation_in_stock: Option<bool>,
}

impl TryFrom<RecommendationRow> for Recommendation {
    type Error = StoreError;

    fn try_from(row: RecommendationRow) -> Result<Self, Self::Error> {
        let recommendation_type = row
            .recommendation_type
            .parse::<RecommendationType>()
            .map_err(|e| StoreError::CorruptRow {
                id: row.id,
                reason: e.to_string(),
            })?;

        Ok(Recommendation {
            id: Some(row.id),
            name: row.name,
            recommendation_type,
            recommendation_name: row.recommendation_name,
            recommendation_id: row.recommendation_id,
            recommendation_in_stock: row.recommendation_in_stock,
        })
    }
}

fn into_records(rows: Vec<RecommendationRow>) -> StoreResult<Vec<Recommendation>> {
    rows.into_iter().map(Recommendation::try_from).collect()
}

/// Recommendation storage backed by the `recommendations` table
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Deletes every row. Used to reset state between test runs.
    pub async fn truncate(&self) -> StoreResult<()> {
        sqlx::query("TRUNCATE recommendations RESTART IDENTITY")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RecommendationStore for PgStore {
    async fn insert(&self, record: &Recommendation) -> StoreResult<i32> {
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO recommendations
                (name, recommendation_type, recommendation_name,
                 recommendation_id, recommendation_in_stock)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&record.name)
        .bind(record.recommendation_type.as_str())
        .bind(&record.recommendation_name)
        .bind(record.recommendation_id)
        .bind(record.recommendation_in_stock)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(id)
    }

    async fn update(&self, record: &Recommendation) -> StoreResult<()> {
        let id = record.id.ok_or(StoreError::Unpersisted)?;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE recommendations
            SET name = $1,
                recommendation_type = $2,
                recommendation_name = $3,
                recommendation_id = $4,
                recommendation_in_stock = $5
            WHERE id = $6
            "#,
        )
        .bind(&record.name)
        .bind(record.recommendation_type.as_str())
        .bind(&record.recommendation_name)
        .bind(record.recommendation_id)
        .bind(record.recommendation_in_stock)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        // Dropping the transaction rolls it back
        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(id));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: i32) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM recommendations WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(id, removed = result.rows_affected(), "Deleted row");
        Ok(())
    }

    async fn find(&self, id: i32) -> StoreResult<Option<Recommendation>> {
        let sql = format!("{} WHERE id = $1", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, RecommendationRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Recommendation::try_from).transpose()
    }

    async fn all(&self) -> StoreResult<Vec<Recommendation>> {
        let sql = format!("{} ORDER BY id", SELECT_COLUMNS);
        let rows = sqlx::query_as::<_, RecommendationRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        into_records(rows)
    }

    async fn filter(&self, filter: &RecommendationFilter) -> StoreResult<Vec<Recommendation>> {
        let sql = format!("{} WHERE {} = $1 ORDER BY id", SELECT_COLUMNS, filter.column());
        let query = sqlx::query_as::<_, RecommendationRow>(&sql);

        let query = match filter {
            RecommendationFilter::Name(name) => query.bind(name.clone()),
            RecommendationFilter::InStock(flag) => query.bind(*flag),
            RecommendationFilter::Type(kind) => query.bind(kind.as_str()),
            RecommendationFilter::RecommendationName(name) => query.bind(name.clone()),
            RecommendationFilter::RecommendationId(id) => query.bind(*id),
        };

        let rows = query.fetch_all(&self.pool).await?;
        into_records(rows)
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
