use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

pub mod in_memory;
pub mod postgres;

/// One detail row as persisted, keyed by app id.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailRow {
    pub app_id: i64,
    pub name: String,
    pub is_free: bool,
    pub coming_soon: bool,
    pub release_date: Option<NaiveDate>,
    pub recommendations: i64,
    /// Full detail payload, archived verbatim.
    pub raw_json: Value,
}

/// Persistence seam for the harvester. Implementations must treat the row
/// upsert and its association replacement as one atomic unit: a failed
/// write leaves the previous row and associations intact.
#[async_trait]
pub trait DetailStore: Send + Sync {
    async fn store_detail(
        &self,
        row: &DetailRow,
        categories: &[String],
        genres: &[String],
    ) -> Result<()>;
}
