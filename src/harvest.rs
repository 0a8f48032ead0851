use crate::config;
use crate::pace::Pacer;
use crate::storage::{DetailRow, DetailStore};
use anyhow::Result;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

const APP_DETAILS_URL: &str = "https://store.steampowered.com/api/appdetails";

/// Terminal state for one record-file row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// Detail row and associations written.
    Stored,
    /// The endpoint reported no data for the id; not an error.
    SkippedNoData,
    /// The id column was not numeric; no request issued.
    SkippedInvalidId,
    /// Transport/status/body/store failure; logged and skipped.
    FailedTransient,
}

/// Outcome distribution for a harvest run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HarvestSummary {
    pub stored: u64,
    pub skipped_no_data: u64,
    pub skipped_invalid_id: u64,
    pub failed_transient: u64,
}

impl HarvestSummary {
    fn record(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Stored => self.stored += 1,
            RowOutcome::SkippedNoData => self.skipped_no_data += 1,
            RowOutcome::SkippedInvalidId => self.skipped_invalid_id += 1,
            RowOutcome::FailedTransient => self.failed_transient += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.stored + self.skipped_no_data + self.skipped_invalid_id + self.failed_transient
    }
}

#[derive(Debug, Deserialize)]
struct AppDetailsWrapper {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize, Default)]
struct AppData {
    #[serde(default)]
    name: String,
    #[serde(default)]
    is_free: bool,
    #[serde(default)]
    release_date: ReleaseDate,
    #[serde(default)]
    recommendations: Recommendations,
    #[serde(default)]
    categories: Vec<LabelEntry>,
    #[serde(default)]
    genres: Vec<LabelEntry>,
}

#[derive(Debug, Deserialize, Default)]
struct ReleaseDate {
    #[serde(default)]
    coming_soon: bool,
    #[serde(default)]
    date: String,
}

#[derive(Debug, Deserialize, Default)]
struct Recommendations {
    #[serde(default)]
    total: i64,
}

#[derive(Debug, Deserialize, Default)]
struct LabelEntry {
    #[serde(default)]
    description: String,
}

/// A decoded detail document ready to persist.
#[derive(Debug, Clone)]
pub struct ParsedDetail {
    pub row: DetailRow,
    pub categories: Vec<String>,
    pub genres: Vec<String>,
}

/// Accepts only fully numeric id strings; anything else is excluded from
/// harvesting before a request is made.
pub fn parse_app_id(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<i64>().ok()
}

/// Parses the storefront's human-readable date ("Jul 9, 2013"). Empty or
/// non-conforming strings yield `None` rather than failing the record.
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%b %d, %Y").ok()
}

/// Decodes one appdetails body for `app_id`. Returns `None` when the
/// endpoint reported no data for the id (missing entry or success=false);
/// the caller treats that as a silent skip.
pub fn decode_detail(app_id: i64, body: &Value) -> Option<ParsedDetail> {
    let entry = body.get(app_id.to_string())?;
    let wrapper: AppDetailsWrapper = serde_json::from_value(entry.clone()).ok()?;
    if !wrapper.success {
        return None;
    }
    let raw = wrapper
        .data
        .unwrap_or_else(|| Value::Object(Default::default()));
    let data: AppData = serde_json::from_value(raw.clone()).unwrap_or_default();

    let categories = data
        .categories
        .into_iter()
        .map(|c| c.description)
        .filter(|d| !d.is_empty())
        .collect();
    let genres = data
        .genres
        .into_iter()
        .map(|g| g.description)
        .filter(|d| !d.is_empty())
        .collect();

    Some(ParsedDetail {
        row: DetailRow {
            app_id,
            name: data.name,
            is_free: data.is_free,
            coming_soon: data.release_date.coming_soon,
            release_date: parse_release_date(&data.release_date.date),
            recommendations: data.recommendations.total,
            raw_json: raw,
        },
        categories,
        genres,
    })
}

async fn process_row(client: &Client, store: &dyn DetailStore, app_id: i64) -> RowOutcome {
    let url = format!("{APP_DETAILS_URL}?appids={app_id}");
    let resp = match client.get(&url).send().await {
        Ok(r) => r,
        Err(err) => {
            warn!(app_id, error = %err, "detail request failed");
            return RowOutcome::FailedTransient;
        }
    };
    if !resp.status().is_success() {
        warn!(app_id, status = %resp.status(), "detail request returned non-success");
        return RowOutcome::FailedTransient;
    }
    let body: Value = match resp.json().await {
        Ok(v) => v,
        Err(err) => {
            warn!(app_id, error = %err, "detail body was not valid JSON");
            return RowOutcome::FailedTransient;
        }
    };

    let Some(parsed) = decode_detail(app_id, &body) else {
        return RowOutcome::SkippedNoData;
    };
    if let Err(err) = store
        .store_detail(&parsed.row, &parsed.categories, &parsed.genres)
        .await
    {
        warn!(app_id, error = %err, "store write failed");
        return RowOutcome::FailedTransient;
    }
    RowOutcome::Stored
}

/// Reads the record file at `record_file` and harvests a detail document
/// per numeric id. Every failure category is a skip-and-continue decision;
/// the loop never aborts once rows are being processed. A missing record
/// file logs and returns an empty summary.
pub async fn store_app_details(
    record_file: &str,
    store: &dyn DetailStore,
    pacer: &dyn Pacer,
) -> Result<HarvestSummary> {
    let mut reader = match csv::Reader::from_path(record_file) {
        Ok(r) => r,
        Err(err) => {
            info!(path = %record_file, error = %err, "record file not found; run gather-all-ids first");
            return Ok(HarvestSummary::default());
        }
    };

    let client = Client::builder()
        .timeout(Duration::from_secs(config::env_u64(
            "HARVEST_HTTP_TIMEOUT_SECS",
            10,
        )))
        .build()?;
    let batch_size = config::env_u64("HARVEST_BATCH_SIZE", 1000);

    let mut summary = HarvestSummary::default();
    let mut batch_counter: u64 = 0;

    for (i, record) in reader.records().enumerate() {
        let row_no = (i + 1) as u64;
        let record = match record {
            Ok(r) => r,
            Err(err) => {
                warn!(row = row_no, error = %err, "unreadable record row");
                summary.record(RowOutcome::FailedTransient);
                continue;
            }
        };

        let outcome = match parse_app_id(record.get(0).unwrap_or("")) {
            Some(app_id) => process_row(&client, store, app_id).await,
            None => RowOutcome::SkippedInvalidId,
        };
        summary.record(outcome);

        if outcome == RowOutcome::Stored {
            batch_counter += 1;
            if batch_counter >= batch_size {
                batch_counter = 0;
                pacer.pause().await;
            }
        }
        // Positional progress counter, including skipped rows.
        if row_no % 100 == 0 {
            info!(rows = row_no, stored = summary.stored, "harvest progress");
        }
    }

    info!(
        stored = summary.stored,
        skipped_no_data = summary.skipped_no_data,
        skipped_invalid_id = summary.skipped_invalid_id,
        failed_transient = summary.failed_transient,
        "finished storing app details"
    );
    Ok(summary)
}
