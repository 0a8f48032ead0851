use super::{DetailRow, DetailStore};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory store mirroring the three-table layout, used by tests.
#[derive(Default)]
pub struct InMemoryStore {
    details: Mutex<HashMap<i64, DetailRow>>,
    categories: Mutex<HashMap<i64, Vec<String>>>,
    genres: Mutex<HashMap<i64, Vec<String>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detail(&self, app_id: i64) -> Option<DetailRow> {
        self.details.lock().unwrap().get(&app_id).cloned()
    }

    pub fn categories_for(&self, app_id: i64) -> Vec<String> {
        self.categories
            .lock()
            .unwrap()
            .get(&app_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn genres_for(&self, app_id: i64) -> Vec<String> {
        self.genres
            .lock()
            .unwrap()
            .get(&app_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.details.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DetailStore for InMemoryStore {
    async fn store_detail(
        &self,
        row: &DetailRow,
        categories: &[String],
        genres: &[String],
    ) -> Result<()> {
        self.details.lock().unwrap().insert(row.app_id, row.clone());
        self.categories
            .lock()
            .unwrap()
            .insert(row.app_id, categories.to_vec());
        self.genres
            .lock()
            .unwrap()
            .insert(row.app_id, genres.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(app_id: i64, name: &str) -> DetailRow {
        DetailRow {
            app_id,
            name: name.to_string(),
            is_free: false,
            coming_soon: false,
            release_date: None,
            recommendations: 0,
            raw_json: json!({"name": name}),
        }
    }

    #[tokio::test]
    async fn upsert_is_last_write_wins() {
        let store = InMemoryStore::new();
        store
            .store_detail(&row(570, "Dota 2"), &["Multi-player".into()], &[])
            .await
            .unwrap();
        store
            .store_detail(&row(570, "Dota 2 Reborn"), &["Co-op".into()], &["MOBA".into()])
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.detail(570).unwrap().name, "Dota 2 Reborn");
        assert_eq!(store.categories_for(570), vec!["Co-op".to_string()]);
        assert_eq!(store.genres_for(570), vec!["MOBA".to_string()]);
    }
}
