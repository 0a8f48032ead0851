use anyhow::Result;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct Db {
    pub pool: PgPool,
}

impl Db {
    // SECURITY: never include raw DSNs in tracing spans (they may contain credentials).
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let mut connect_options = PgConnectOptions::from_str(database_url)?;
        if database_url.contains("sslmode=require") && !database_url.contains("sslmode=disable") {
            connect_options = connect_options.ssl_mode(PgSslMode::Require);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(600))
            .connect_with(connect_options)
            .await?;
        info!("connected to db");

        Self::ensure_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// Idempotent bootstrap of the three harvest tables.
    async fn ensure_schema(pool: &PgPool) -> Result<()> {
        sqlx::raw_sql(
            r#"
            CREATE TABLE IF NOT EXISTS steam_app_details (
                app_id BIGINT PRIMARY KEY,
                name TEXT NOT NULL DEFAULT '',
                coming_soon BOOLEAN NOT NULL DEFAULT FALSE,
                release_date_date DATE,
                is_free BOOLEAN NOT NULL DEFAULT FALSE,
                recommendations BIGINT NOT NULL DEFAULT 0,
                raw_json JSONB,
                fetched_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );
            CREATE TABLE IF NOT EXISTS steam_app_categories (
                app_id BIGINT NOT NULL,
                category_name TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS steam_app_genres (
                app_id BIGINT NOT NULL,
                genre_name TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_steam_app_categories_app
                ON steam_app_categories (app_id);
            CREATE INDEX IF NOT EXISTS idx_steam_app_genres_app
                ON steam_app_genres (app_id);
            "#,
        )
        .execute(pool)
        .await?;
        info!("schema ensured");
        Ok(())
    }
}
