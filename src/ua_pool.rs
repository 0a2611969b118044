//! Static list of realistic browser user-agent strings plus header synthesis.
//! Stateless across calls; safe to share behind an `Arc` or simply cloned.

use rand::seq::IndexedRandom;
use reqwest::header::{HeaderMap, HeaderValue};

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36 Edg/123.0.0.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
];

const ACCEPT_LANGUAGES: &[&str] = &["en-IN,en;q=0.9", "en-IN,en-GB;q=0.9,en;q=0.8"];

#[derive(Debug, Default, Clone, Copy)]
pub struct UaPool;

impl UaPool {
    pub fn new() -> Self {
        Self
    }

    /// Returns a uniformly random user-agent string from the static list.
    pub fn pick(&self) -> &'static str {
        USER_AGENTS
            .choose(&mut rand::rng())
            .expect("USER_AGENTS is non-empty")
    }

    /// A fresh header map for one request: `Accept`, `Accept-Encoding`, and
    /// a randomly chosen `Accept-Language`.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_ENCODING,
            HeaderValue::from_static("gzip, deflate, br"),
        );
        let lang = ACCEPT_LANGUAGES
            .choose(&mut rand::rng())
            .expect("ACCEPT_LANGUAGES is non-empty");
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            HeaderValue::from_str(lang).expect("static language string is valid header value"),
        );
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_returns_a_known_user_agent() {
        let pool = UaPool::new();
        for _ in 0..50 {
            assert!(USER_AGENTS.contains(&pool.pick()));
        }
    }

    #[test]
    fn headers_always_include_accept_language() {
        let pool = UaPool::new();
        let headers = pool.headers();
        assert!(headers.get(reqwest::header::ACCEPT_LANGUAGE).is_some());
    }
}
