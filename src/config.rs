use tracing::warn;

/// Fixed relative path holding the Steam Web API key.
pub const CREDENTIAL_FILE: &str = "./environment.txt";

const RECORD_FILE_DEFAULT: &str = "all_steam_game_ids.csv";

pub fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

pub fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

/// Path of the intermediate record file shared by both phases.
pub fn record_file() -> String {
    std::env::var("RECORD_FILE")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| RECORD_FILE_DEFAULT.to_string())
}

/// Reads the API key from [`CREDENTIAL_FILE`]. A missing file is not fatal:
/// enumeration proceeds with an empty key and fails remotely instead.
pub fn load_api_key() -> String {
    match std::fs::read_to_string(CREDENTIAL_FILE) {
        Ok(contents) => contents.trim().to_string(),
        Err(err) => {
            warn!(path = CREDENTIAL_FILE, error = %err, "credential file not found; continuing with empty key");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_helpers_fall_back_on_garbage() {
        std::env::remove_var("STEAM_HARVEST_TEST_UNSET");
        assert_eq!(env_u64("STEAM_HARVEST_TEST_UNSET", 42), 42);

        std::env::set_var("STEAM_HARVEST_TEST_BAD", "not-a-number");
        assert_eq!(env_u32("STEAM_HARVEST_TEST_BAD", 7), 7);

        std::env::set_var("STEAM_HARVEST_TEST_OK", " 123 ");
        assert_eq!(env_u64("STEAM_HARVEST_TEST_OK", 0), 123);
    }
}
