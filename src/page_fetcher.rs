//! Headless-browser fetch contract. The worker treats the browser engine as
//! a black box behind this trait; `RetryPolicy` wraps the whole `fetch` call
//! at the call site, re-selecting proxy and user-agent on every attempt.

use async_trait::async_trait;
use chromiumoxide::Browser;
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::cdp::browser_protocol::emulation::SetTimezoneOverrideParams;
use chromiumoxide::page::ScreenshotParams;
use futures::StreamExt;
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::proxy_pool::ProxyPool;
use crate::ua_pool::UaPool;

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
const SELECTOR_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: Option<u16>,
    pub html: String,
    pub screenshot_path: Option<String>,
    pub proxy: Option<String>,
    pub user_agent: String,
    pub response_time_ms: i64,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        wait_for_selector: Option<&str>,
    ) -> anyhow::Result<FetchResult>;
}

/// `chromiumoxide`-backed implementation. Launches and tears down a fresh
/// browser instance per fetch — instances are never pooled, to avoid
/// cross-site fingerprint leakage between targets.
pub struct ChromiumPageFetcher {
    proxies: ProxyPool,
    uas: UaPool,
}

impl ChromiumPageFetcher {
    pub fn new(proxies: ProxyPool, uas: UaPool) -> Self {
        Self { proxies, uas }
    }
}

#[async_trait]
impl PageFetcher for ChromiumPageFetcher {
    async fn fetch(
        &self,
        url: &str,
        wait_for_selector: Option<&str>,
    ) -> anyhow::Result<FetchResult> {
        let proxy = self.proxies.select();
        let user_agent = self.uas.pick().to_string();
        let start = Instant::now();

        let result = self
            .fetch_once(url, wait_for_selector, proxy.as_deref(), &user_agent, start)
            .await;

        match &result {
            Ok(_) => {
                if let Some(p) = &proxy {
                    self.proxies.mark_success(p);
                }
            }
            Err(e) => {
                warn!(url, error = %e, "page fetch failed");
                if let Some(p) = &proxy {
                    self.proxies.mark_failure(p);
                }
            }
        }

        result
    }
}

/// HTTP status of the primary navigation, read back via the Navigation
/// Timing API rather than CDP network events (avoids subscribing to every
/// response on the page just to find the document's own status).
async fn read_response_status(page: &chromiumoxide::Page) -> Option<u16> {
    let status: serde_json::Value = page
        .evaluate("performance.getEntriesByType('navigation')[0]?.responseStatus ?? null")
        .await
        .ok()?
        .into_value()
        .ok()?;
    status.as_u64().map(|s| s as u16)
}

impl ChromiumPageFetcher {
    async fn fetch_once(
        &self,
        url: &str,
        wait_for_selector: Option<&str>,
        proxy: Option<&str>,
        user_agent: &str,
        start: Instant,
    ) -> anyhow::Result<FetchResult> {
        // Drawn up front and dropped before the first `.await`: `ThreadRng`
        // is `!Send`, and holding it across an await point would make this
        // future (and the `PageFetcher` trait's `Send` future) fail to compile.
        let (width, height, pacing) = {
            let mut rng = rand::rng();
            let width: u32 = rng.random_range(1200..=1920);
            let height: u32 = rng.random_range(800..=1080);
            let pacing = Duration::from_secs_f64(rng.random_range(0.5..=2.0));
            (width, height, pacing)
        };

        let mut builder = BrowserConfig::builder()
            .window_size(width, height)
            .args(["--disable-blink-features=AutomationControlled"]);
        if let Some(proxy) = proxy {
            builder = builder.arg(format!("--proxy-server={proxy}"));
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("invalid browser config: {e}"))?;

        let (mut browser, mut handler) = Browser::launch(config).await?;
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = browser.new_page(url).await?;
        page.set_user_agent(user_agent).await?;
        let _ = page
            .execute(SetTimezoneOverrideParams::new("Asia/Kolkata"))
            .await;

        // Hide the automation flag from the page's own JS context.
        page.evaluate_on_new_document(
            "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });",
        )
        .await?;

        tokio::time::timeout(NAVIGATION_TIMEOUT, page.wait_for_navigation())
            .await
            .map_err(|_| anyhow::anyhow!("navigation timed out after {NAVIGATION_TIMEOUT:?}"))??;

        if let Some(selector) = wait_for_selector {
            tokio::time::timeout(SELECTOR_TIMEOUT, page.find_element(selector))
                .await
                .map_err(|_| anyhow::anyhow!("selector '{selector}' wait timed out"))??;
        }

        // Human-pacing delay before reading the DOM.
        tokio::time::sleep(pacing).await;

        let html = page.content().await?;
        let status = read_response_status(&page).await;

        let response_time_ms = start.elapsed().as_millis() as i64;

        let mut screenshot_path = None;
        if status.is_some_and(|code| code >= 400) {
            let path = format!("screenshots/error_{}.png", start.elapsed().as_secs());
            if page
                .save_screenshot(ScreenshotParams::builder().build(), &path)
                .await
                .is_ok()
            {
                screenshot_path = Some(path);
            }
        }

        let _ = browser.close().await;
        handler_task.abort();

        Ok(FetchResult {
            status,
            html,
            screenshot_path,
            proxy: proxy.map(str::to_string),
            user_agent: user_agent.to_string(),
            response_time_ms,
        })
    }
}
