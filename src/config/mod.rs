//! Configuration for both the scheduler and worker processes.
//!
//! Loaded once at process start via `figment`'s environment provider. Supports
//! flexible duration parsing that accepts both numeric values (interpreted as
//! seconds) and duration strings with units.

use fundu::{DurationParser, TimeUnit};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Shared configuration, read by both binaries. Fields that only one process
/// uses are still present on both so a single `.env` serves both.
#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    pub database_url: String,

    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Comma-separated proxy URLs. Empty means fetch direct.
    #[serde(default)]
    pub proxy_list: String,

    #[serde(
        default = "default_shutdown_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub shutdown_timeout: Duration,

    #[serde(default = "default_scheduler_interval")]
    pub scheduler_interval_seconds: u64,

    #[serde(default = "default_scheduler_metrics_port")]
    pub scheduler_metrics_port: u16,

    #[serde(default = "default_scraper_metrics_port")]
    pub scraper_metrics_port: u16,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// How many times a worker re-queues a FAILED job before leaving it for
    /// the next scheduler cycle. Distinct from `RetryPolicy::max_attempts`,
    /// which governs attempts within a single `PageFetcher::fetch` call.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    pub discord_webhook_url: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379/0".to_string()
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(8)
}

fn default_scheduler_interval() -> u64 {
    300
}

fn default_scheduler_metrics_port() -> u16 {
    8002
}

fn default_scraper_metrics_port() -> u16 {
    8001
}

fn default_worker_count() -> usize {
    4
}

fn default_max_retries() -> u32 {
    3
}

impl Config {
    /// Proxy URLs parsed out of `PROXY_LIST`, empty list if unset.
    pub fn proxies(&self) -> Vec<String> {
        self.proxy_list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Duration parser configured to handle various time units with seconds as
/// the default unit. Does not support fractions, exponents, or infinity.
const DURATION_PARSER: DurationParser<'static> = DurationParser::builder()
    .time_units(&[TimeUnit::Second, TimeUnit::MilliSecond, TimeUnit::Minute])
    .parse_multiple(None)
    .allow_time_unit_delimiter()
    .disable_infinity()
    .disable_fraction()
    .disable_exponent()
    .default_unit(TimeUnit::Second)
    .build();

/// Accepts `1` (seconds), `"30s"`, `"2 m"`, `"1500ms"`.
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Visitor;

    struct DurationVisitor;

    impl<'de> Visitor<'de> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a duration string or number")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            DURATION_PARSER
                .parse(value)
                .map_err(|e| {
                    serde::de::Error::custom(format!("invalid duration '{}': {}", value, e))
                })?
                .try_into()
                .map_err(|e| serde::de::Error::custom(format!("duration conversion error: {}", e)))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Duration::from_secs(value))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if value < 0 {
                return Err(serde::de::Error::custom("duration cannot be negative"));
            }
            Ok(Duration::from_secs(value as u64))
        }
    }

    deserializer.deserialize_any(DurationVisitor)
}
