//! Fire-and-forget outbound notifications for CAPTCHA encounters, price
//! drops, and repeated errors. The `Alert` row written via `DbContext` is the
//! durable record; webhook dispatch is best-effort on top of it and never
//! blocks the scraping pipeline.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::json;
use tracing::{error, info, warn};

use crate::db::DbContext;
use crate::error::Result;
use crate::models::AlertType;

#[derive(Debug, Clone)]
pub struct TargetInfo {
    pub product_id: i64,
    pub title: String,
    pub domain: String,
    pub url: String,
}

#[derive(Clone)]
pub struct AlertSink {
    http: reqwest::Client,
    discord_webhook_url: Option<String>,
    telegram_bot_token: Option<String>,
    telegram_chat_id: Option<String>,
}

impl AlertSink {
    pub fn new(
        discord_webhook_url: Option<String>,
        telegram_bot_token: Option<String>,
        telegram_chat_id: Option<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            discord_webhook_url,
            telegram_bot_token,
            telegram_chat_id,
        }
    }

    pub async fn captcha_encounter(
        &self,
        db: &DbContext,
        target: &TargetInfo,
        screenshot_url: Option<&str>,
    ) -> Result<()> {
        let payload = json!({
            "title": target.title,
            "domain": target.domain,
            "url": target.url,
            "screenshot_url": screenshot_url,
        });
        db.alerts()
            .create(target.product_id, AlertType::CaptchaEncounter, payload)
            .await?;

        let mut message = format!(
            "**Product:** {}\n**Domain:** {}\n**URL:** {}\n**Action Required:** Manual review needed",
            target.title, target.domain, target.url
        );
        if let Some(url) = screenshot_url {
            message.push_str(&format!("\n**Screenshot:** {url}"));
        }
        self.dispatch("⚠️ CAPTCHA Encountered", &message, 0xFFA500);
        Ok(())
    }

    pub async fn price_drop(
        &self,
        db: &DbContext,
        target: &TargetInfo,
        old_price: Decimal,
        new_price: Decimal,
    ) -> Result<()> {
        let drop_pct = ((old_price - new_price) / old_price * Decimal::from(100))
            .to_f64()
            .unwrap_or(0.0);

        let payload = json!({
            "title": target.title,
            "domain": target.domain,
            "old_price": old_price,
            "new_price": new_price,
            "drop_pct": drop_pct,
        });
        db.alerts()
            .create(target.product_id, AlertType::PriceDrop, payload)
            .await?;

        let message = format!(
            "**Product:** {}\n**Domain:** {}\n**Old Price:** ₹{old_price:.2}\n**New Price:** ₹{new_price:.2}\n**Drop:** {drop_pct:.1}%",
            target.title, target.domain
        );
        self.dispatch("📉 Price Drop Alert", &message, 0x00FF00);
        Ok(())
    }

    pub async fn repeated_errors(
        &self,
        db: &DbContext,
        target: &TargetInfo,
        error_count: u32,
    ) -> Result<()> {
        let payload = json!({
            "title": target.title,
            "domain": target.domain,
            "error_count": error_count,
        });
        db.alerts()
            .create(target.product_id, AlertType::RepeatedErrors, payload)
            .await?;

        let message = format!(
            "**Product:** {}\n**Domain:** {}\n**Error Count:** {error_count}\n**Action Required:** Check target configuration",
            target.title, target.domain
        );
        self.dispatch("❌ Repeated Scraping Errors", &message, 0xFF0000);
        Ok(())
    }

    /// Spawns the Discord + Telegram sends as independent tasks. Neither
    /// transport's failure affects the other, or the caller.
    fn dispatch(&self, title: &str, message: &str, color: u32) {
        if let Some(webhook) = self.discord_webhook_url.clone() {
            let http = self.http.clone();
            let title = title.to_string();
            let message = message.to_string();
            tokio::spawn(async move {
                let payload = json!({
                    "embeds": [{
                        "title": title,
                        "description": message,
                        "color": color,
                        "timestamp": chrono::Utc::now().to_rfc3339(),
                    }]
                });
                match http.post(&webhook).json(&payload).send().await {
                    Ok(resp) if resp.status().is_success() => {
                        info!(title, "discord alert sent");
                    }
                    Ok(resp) => warn!(status = %resp.status(), "discord alert rejected"),
                    Err(e) => error!(error = %e, "failed to send discord alert"),
                }
            });
        }

        if let (Some(token), Some(chat_id)) =
            (self.telegram_bot_token.clone(), self.telegram_chat_id.clone())
        {
            let http = self.http.clone();
            let body = format!("{title}\n\n{message}");
            tokio::spawn(async move {
                let url = format!("https://api.telegram.org/bot{token}/sendMessage");
                let payload = json!({
                    "chat_id": chat_id,
                    "text": body,
                    "parse_mode": "Markdown",
                });
                match http.post(&url).json(&payload).send().await {
                    Ok(resp) if resp.status().is_success() => {
                        info!("telegram alert sent");
                    }
                    Ok(resp) => warn!(status = %resp.status(), "telegram alert rejected"),
                    Err(e) => error!(error = %e, "failed to send telegram alert"),
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_percent_boundary_matches_spec_threshold() {
        let old = Decimal::new(100000, 2); // 1000.00
        let at_threshold = old * Decimal::new(95, 2); // 950.00, exactly 5%
        let below_threshold = old * Decimal::new(9499, 4); // 949.9

        let drop_at = (old - at_threshold) / old * Decimal::from(100);
        let drop_below = (old - below_threshold) / old * Decimal::from(100);

        assert_eq!(drop_at, Decimal::new(500, 2));
        assert!(drop_below > Decimal::new(500, 2));
    }
}
