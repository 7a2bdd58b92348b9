//! Environment-driven tuning knobs.
//!
//! Every knob has a default; unset or unparsable variables fall back to it.

use std::time::Duration;

pub const ENV_POLL_INTERVAL_MS: &str = "LOOMO_POLL_INTERVAL_MS";
pub const ENV_POLL_CAPACITY: &str = "LOOMO_POLL_CAPACITY";
pub const ENV_BIND_ATTEMPTS: &str = "LOOMO_BIND_ATTEMPTS";
pub const ENV_BIND_DELAY_MS: &str = "LOOMO_BIND_DELAY_MS";
pub const ENV_BIND_MAX_DELAY_MS: &str = "LOOMO_BIND_MAX_DELAY_MS";
pub const ENV_CSV_DELIMITER: &str = "LOOMO_CSV_DELIMITER";
pub const ENV_CSV_HEADER: &str = "LOOMO_CSV_HEADER";

/// Settings for [`SensorPoller`](crate::SensorPoller).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Time between the start of two captures.
    pub interval: Duration,
    /// Snapshots buffered before new ones are dropped.
    pub capacity: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(10),
            capacity: 256,
        }
    }
}

impl PollConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            interval: Duration::from_millis(read_env_u64(
                ENV_POLL_INTERVAL_MS,
                default.interval.as_millis() as u64,
            )),
            capacity: read_env_u64(ENV_POLL_CAPACITY, default.capacity as u64).max(1) as usize,
        }
    }
}

/// Delimiter for exported rows, `,` unless overridden.
pub fn csv_delimiter_from_env() -> char {
    std::env::var(ENV_CSV_DELIMITER)
        .ok()
        .and_then(|v| match v.as_str() {
            "\\t" | "tab" => Some('\t'),
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => None,
                }
            }
        })
        .unwrap_or(',')
}

/// Whether exported logs start with a header row, on unless overridden.
pub fn csv_header_from_env() -> bool {
    read_env_bool(ENV_CSV_HEADER, true)
}

pub(crate) fn read_env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| {
            let v = v.trim().to_ascii_lowercase();
            match v.as_str() {
                "1" | "true" | "yes" | "on" => Some(true),
                "0" | "false" | "no" | "off" => Some(false),
                _ => None,
            }
        })
        .unwrap_or(default)
}

pub(crate) fn read_env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own variable names so they can run in parallel.

    #[test]
    fn test_read_env_u64_falls_back() {
        std::env::set_var("LOOMO_TEST_U64", " 42 ");
        assert_eq!(read_env_u64("LOOMO_TEST_U64", 7), 42);
        std::env::set_var("LOOMO_TEST_U64", "forty");
        assert_eq!(read_env_u64("LOOMO_TEST_U64", 7), 7);
        assert_eq!(read_env_u64("LOOMO_TEST_UNSET_U64", 9), 9);
    }

    #[test]
    fn test_read_env_bool() {
        std::env::set_var("LOOMO_TEST_BOOL", "Yes");
        assert!(read_env_bool("LOOMO_TEST_BOOL", false));
        std::env::set_var("LOOMO_TEST_BOOL", "off");
        assert!(!read_env_bool("LOOMO_TEST_BOOL", true));
        std::env::set_var("LOOMO_TEST_BOOL", "maybe");
        assert!(read_env_bool("LOOMO_TEST_BOOL", true));
    }

    #[test]
    fn test_poll_config_default() {
        let config = PollConfig::default();
        assert_eq!(config.interval, Duration::from_millis(10));
        assert_eq!(config.capacity, 256);
    }
}
