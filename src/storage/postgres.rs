use super::{DetailRow, DetailStore};
use crate::db::Db;
use anyhow::Result;
use async_trait::async_trait;

/// Production store writing to the three harvest tables. Each call runs in
/// its own transaction so a crash never leaves a row upserted with its
/// associations half-replaced.
pub struct PostgresStore {
    db: Db,
}

impl PostgresStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DetailStore for PostgresStore {
    async fn store_detail(
        &self,
        row: &DetailRow,
        categories: &[String],
        genres: &[String],
    ) -> Result<()> {
        let mut tx = self.db.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO steam_app_details
                   (app_id, name, coming_soon, release_date_date, is_free, recommendations, raw_json)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               ON CONFLICT (app_id) DO UPDATE SET
                   name = EXCLUDED.name,
                   coming_soon = EXCLUDED.coming_soon,
                   release_date_date = EXCLUDED.release_date_date,
                   is_free = EXCLUDED.is_free,
                   recommendations = EXCLUDED.recommendations,
                   raw_json = EXCLUDED.raw_json,
                   fetched_at = now()"#,
        )
        .persistent(false)
        .bind(row.app_id)
        .bind(&row.name)
        .bind(row.coming_soon)
        .bind(row.release_date)
        .bind(row.is_free)
        .bind(row.recommendations)
        .bind(&row.raw_json)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM steam_app_categories WHERE app_id = $1")
            .persistent(false)
            .bind(row.app_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM steam_app_genres WHERE app_id = $1")
            .persistent(false)
            .bind(row.app_id)
            .execute(&mut *tx)
            .await?;

        for label in categories {
            sqlx::query("INSERT INTO steam_app_categories (app_id, category_name) VALUES ($1, $2)")
                .persistent(false)
                .bind(row.app_id)
                .bind(label)
                .execute(&mut *tx)
                .await?;
        }
        for label in genres {
            sqlx::query("INSERT INTO steam_app_genres (app_id, genre_name) VALUES ($1, $2)")
                .persistent(false)
                .bind(row.app_id)
                .bind(label)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
