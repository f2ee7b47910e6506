use crate::store::{StoreError, StoreResult, VisitRecord, VisitStore};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

pub struct PostgresVisitStore {
    pool: Arc<PgPool>,
}

impl PostgresVisitStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl VisitStore for PostgresVisitStore {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS visits (
                id BIGSERIAL PRIMARY KEY,
                date BIGINT NOT NULL,
                ip TEXT NOT NULL,
                host TEXT NOT NULL,
                uri_from TEXT NOT NULL,
                uri_to TEXT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_visits_ip ON visits(ip)")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn record_visit(&self, visit: &VisitRecord) -> StoreResult<()> {
        let date = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO visits (date, ip, host, uri_from, uri_to)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(date)
        .bind(&visit.ip)
        .bind(&visit.host)
        .bind(&visit.uri_from)
        .bind(&visit.uri_to)
        .execute(self.pool.as_ref())
        .await
        .map_err(StoreError::Insert)?;

        Ok(())
    }

    async fn visit_count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM visits")
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(count.0)
    }
}
