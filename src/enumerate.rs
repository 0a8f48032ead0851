use crate::config;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

const APP_LIST_URL: &str = "https://api.steampowered.com/IStoreService/GetAppList/v1/";

#[derive(Debug, Deserialize, Default)]
struct AppListBody {
    #[serde(default)]
    response: AppListPage,
}

#[derive(Debug, Deserialize, Default)]
struct AppListPage {
    #[serde(default)]
    apps: Vec<AppEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppEntry {
    pub appid: u64,
    #[serde(default)]
    pub name: String,
}

/// Pages through the storefront app list with a `last_appid` cursor and
/// writes the deduplicated result to the record file.
///
/// Any non-success status or transport failure stops pagination; whatever
/// was accumulated up to that point is still written out.
pub async fn gather_all_ids(api_key: &str) -> Result<()> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config::env_u64(
            "HARVEST_HTTP_TIMEOUT_SECS",
            10,
        )))
        .build()?;
    let page_size = config::env_u64("ENUM_PAGE_SIZE", 50_000);
    let record_file = config::record_file();

    let mut all_apps: Vec<AppEntry> = Vec::new();
    let mut last_appid: u64 = 0;
    let mut page: u64 = 0;

    loop {
        let resp = match client
            .get(APP_LIST_URL)
            .query(&[
                ("key", api_key.to_string()),
                ("include_games", "true".to_string()),
                ("include_dlc", "false".to_string()),
                ("include_software", "false".to_string()),
                ("include_videos", "false".to_string()),
                ("include_hardware", "false".to_string()),
                ("max_results", page_size.to_string()),
                ("last_appid", last_appid.to_string()),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(err) => {
                warn!(error = %err, last_appid, "app list request failed; stopping enumeration");
                break;
            }
        };
        if !resp.status().is_success() {
            warn!(status = %resp.status(), last_appid, "app list request returned non-success; stopping enumeration");
            break;
        }
        let body: AppListBody = match resp.json().await {
            Ok(b) => b,
            Err(err) => {
                warn!(error = %err, last_appid, "app list body was not valid JSON; stopping enumeration");
                break;
            }
        };

        let apps = body.response.apps;
        if apps.is_empty() {
            break;
        }
        page += 1;
        // Cursor for the next page is the last id of this one.
        last_appid = apps.last().map(|a| a.appid).unwrap_or(last_appid);
        let fetched = apps.len();
        all_apps.extend(apps);
        info!(page, fetched, total = all_apps.len(), "fetched app list page");
    }

    let unique = collapse_entries(all_apps);
    write_record_file(&record_file, &unique)?;
    info!(unique = unique.len(), path = %record_file, "app id enumeration complete");
    Ok(())
}

/// Collapses accumulated entries into a set unique by app id; a later
/// occurrence of an id replaces the earlier name.
pub fn collapse_entries<I>(entries: I) -> IndexMap<u64, String>
where
    I: IntoIterator<Item = AppEntry>,
{
    let mut unique = IndexMap::new();
    for entry in entries {
        unique.insert(entry.appid, entry.name);
    }
    unique
}

/// Overwrites the record file with a header row and one (app_id, name)
/// row per unique entry.
pub fn write_record_file(path: &str, unique: &IndexMap<u64, String>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create record file {path}"))?;
    writer.write_record(["app_id", "name"])?;
    for (appid, name) in unique {
        writer.write_record([appid.to_string().as_str(), name.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(appid: u64, name: &str) -> AppEntry {
        AppEntry {
            appid,
            name: name.to_string(),
        }
    }

    #[test]
    fn collapse_is_independent_of_page_splits() {
        let one_page = collapse_entries(vec![entry(10, "a"), entry(20, "b"), entry(30, "c")]);
        let two_pages = collapse_entries(
            vec![entry(10, "a"), entry(20, "b")]
                .into_iter()
                .chain(vec![entry(30, "c")]),
        );
        assert_eq!(one_page, two_pages);
    }

    #[test]
    fn overlapping_pages_keep_the_last_occurrence() {
        let unique = collapse_entries(vec![
            entry(10, "first"),
            entry(30, "old name"),
            entry(30, "new name"),
        ]);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique.get(&30).map(String::as_str), Some("new name"));
    }

    #[test]
    fn record_file_round_trip_with_renamed_id() {
        // Two pages totaling 3 unique ids; the second page re-returns id 30
        // under a different name.
        let page_one = vec![entry(10, "Alpha"), entry(20, "Beta"), entry(30, "Gamma")];
        let page_two = vec![entry(30, "Gamma: Redux")];
        let unique = collapse_entries(page_one.into_iter().chain(page_two));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.csv");
        write_record_file(path.to_str().unwrap(), &unique).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(
            reader.headers().unwrap(),
            &csv::StringRecord::from(vec!["app_id", "name"])
        );
        let rows: Vec<(String, String)> = reader
            .records()
            .map(|r| {
                let r = r.unwrap();
                (r[0].to_string(), r[1].to_string())
            })
            .collect();
        assert_eq!(rows.len(), 3);
        assert!(rows.contains(&("30".to_string(), "Gamma: Redux".to_string())));
        assert!(!rows.iter().any(|(_, name)| name == "Gamma"));
    }

    #[test]
    fn record_file_is_fully_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.csv");
        let path_str = path.to_str().unwrap();

        write_record_file(path_str, &collapse_entries(vec![entry(1, "one"), entry(2, "two")]))
            .unwrap();
        write_record_file(path_str, &collapse_entries(vec![entry(3, "three")])).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "3");
    }
}
