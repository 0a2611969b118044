//! Persistent entity shapes read and written by `DbContext`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, sqlx::Type, PartialEq, Eq, Serialize, Deserialize)]
#[sqlx(type_name = "scrape_job_status", rename_all = "lowercase")]
pub enum ScrapeJobStatus {
    Pending,
    Success,
    Failed,
    Captcha,
}

#[derive(Debug, Clone, FromRow)]
pub struct Target {
    pub id: i64,
    pub product_id: i64,
    pub domain: String,
    pub url: String,
    pub active: bool,
}

/// A target joined with the product it belongs to — what the scheduler and
/// worker actually operate on.
#[derive(Debug, Clone, FromRow)]
pub struct TargetWithProduct {
    pub id: i64,
    pub product_id: i64,
    pub domain: String,
    pub url: String,
    pub active: bool,
    pub sku: String,
    pub title: String,
    pub brand: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Product {
    pub id: i64,
    pub sku: String,
    pub title: String,
    pub brand: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ScrapeJob {
    pub id: i64,
    pub target_id: i64,
    pub status: ScrapeJobStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A new price sample, ready to persist. `raw_html` must already be
/// truncated to the first 5000 characters by the caller.
#[derive(Debug, Clone)]
pub struct NewPriceObservation {
    pub target_id: i64,
    pub price: Decimal,
    pub currency: String,
    pub raw_html: String,
    pub screenshot_url: Option<String>,
    pub proxy_used: Option<String>,
    pub user_agent: String,
    pub response_time_ms: i32,
    pub content_hash: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct LatestPrice {
    pub price: Decimal,
    pub scraped_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertType {
    CaptchaEncounter,
    PriceDrop,
    RepeatedErrors,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::CaptchaEncounter => "captcha_encounter",
            AlertType::PriceDrop => "price_drop",
            AlertType::RepeatedErrors => "repeated_errors",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Alert {
    pub id: i64,
    pub product_id: i64,
    pub alert_type: String,
    pub payload: serde_json::Value,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}

/// The first 5000 characters of `html`, matching the persistence bound
/// called out in the source notes.
pub fn truncate_raw_html(html: &str) -> String {
    html.chars().take(5000).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_to_5000_chars() {
        let html = "x".repeat(6000);
        assert_eq!(truncate_raw_html(&html).chars().count(), 5000);
    }

    #[test]
    fn leaves_short_html_untouched() {
        let html = "<html></html>";
        assert_eq!(truncate_raw_html(html), html);
    }
}
