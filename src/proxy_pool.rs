//! Per-proxy health tracking with cooldown-based recovery.
//!
//! Process-local state: created once from a static proxy list at worker
//! start, mutated by `PageFetcher` outcomes, discarded on process exit. Never
//! shared across processes — pass it explicitly rather than hiding it behind
//! a module-level singleton.

use dashmap::DashMap;
use rand::seq::IndexedRandom;
use std::time::{Duration, Instant};

const BAD_THRESHOLD: u32 = 3;
const RECOVERY_TIME: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy)]
struct ProxyHealth {
    failures: u32,
    last_failure: Option<Instant>,
    last_success: Option<Instant>,
}

impl Default for ProxyHealth {
    fn default() -> Self {
        Self {
            failures: 0,
            last_failure: None,
            last_success: None,
        }
    }
}

impl ProxyHealth {
    /// healthy, or degraded-but-past-its-recovery-window (probationary).
    fn eligible(&self, now: Instant) -> bool {
        self.failures < BAD_THRESHOLD
            || match self.last_failure {
                Some(t) => now.duration_since(t) > RECOVERY_TIME,
                None => true,
            }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyStats {
    pub total: usize,
    pub healthy: usize,
    pub degraded: usize,
}

/// Tracks health for a fixed set of proxies. Cloning shares the underlying
/// map (cheap `Arc`-backed `DashMap`).
#[derive(Debug, Clone)]
pub struct ProxyPool {
    proxies: Vec<String>,
    health: std::sync::Arc<DashMap<String, ProxyHealth>>,
}

impl ProxyPool {
    pub fn new(proxies: Vec<String>) -> Self {
        let health = DashMap::new();
        for p in &proxies {
            health.insert(p.clone(), ProxyHealth::default());
        }
        Self {
            proxies,
            health: std::sync::Arc::new(health),
        }
    }

    /// Returns a random eligible proxy, falling back to the full list
    /// (fail-open) if none are currently eligible. Returns `None` only when
    /// the proxy list itself is empty, in which case the fetcher should
    /// proceed direct.
    pub fn select(&self) -> Option<String> {
        if self.proxies.is_empty() {
            return None;
        }

        let now = Instant::now();
        let candidates: Vec<&String> = self
            .proxies
            .iter()
            .filter(|p| {
                self.health
                    .get(p.as_str())
                    .map(|h| h.eligible(now))
                    .unwrap_or(true)
            })
            .collect();

        let pool = if candidates.is_empty() {
            self.proxies.iter().collect()
        } else {
            candidates
        };

        pool.choose(&mut rand::rng()).map(|s| (*s).clone())
    }

    /// Idempotent w.r.t. proxies not in the tracked set (ignored).
    pub fn mark_failure(&self, proxy: &str) {
        if let Some(mut entry) = self.health.get_mut(proxy) {
            entry.failures += 1;
            entry.last_failure = Some(Instant::now());
        }
    }

    pub fn mark_success(&self, proxy: &str) {
        if let Some(mut entry) = self.health.get_mut(proxy) {
            entry.failures = entry.failures.saturating_sub(1);
            entry.last_success = Some(Instant::now());
        }
    }

    pub fn stats(&self) -> ProxyStats {
        let healthy = self.health.iter().filter(|e| e.failures < BAD_THRESHOLD).count();
        ProxyStats {
            total: self.proxies.len(),
            healthy,
            degraded: self.proxies.len() - healthy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_never_returns_none_for_nonempty_list() {
        let pool = ProxyPool::new(vec!["http://a".into(), "http://b".into()]);
        for _ in 0..20 {
            assert!(pool.select().is_some());
        }
    }

    #[test]
    fn select_returns_none_for_empty_list() {
        let pool = ProxyPool::new(vec![]);
        assert_eq!(pool.select(), None);
    }

    #[test]
    fn degraded_proxy_excluded_unless_none_healthy() {
        let pool = ProxyPool::new(vec!["http://a".into(), "http://b".into()]);
        for _ in 0..3 {
            pool.mark_failure("http://a");
        }

        for _ in 0..20 {
            assert_eq!(pool.select().as_deref(), Some("http://b"));
        }
    }

    #[test]
    fn fails_open_when_all_degraded() {
        let pool = ProxyPool::new(vec!["http://a".into()]);
        for _ in 0..3 {
            pool.mark_failure("http://a");
        }
        assert_eq!(pool.select().as_deref(), Some("http://a"));
    }

    #[test]
    fn mark_success_decrements_failures_clamped_at_zero() {
        let pool = ProxyPool::new(vec!["http://a".into()]);
        pool.mark_success("http://a");
        let stats = pool.stats();
        assert_eq!(stats.healthy, 1);
    }

    #[test]
    fn unknown_proxy_marks_are_ignored() {
        let pool = ProxyPool::new(vec!["http://a".into()]);
        pool.mark_failure("http://unknown");
        pool.mark_success("http://unknown");
        assert_eq!(pool.stats().total, 1);
    }

    #[test]
    fn stats_counts_degraded_proxy_as_degraded_not_healthy() {
        let pool = ProxyPool::new(vec!["http://a".into(), "http://b".into()]);
        for _ in 0..3 {
            pool.mark_failure("http://a");
        }
        let stats = pool.stats();
        assert_eq!(stats.healthy, 1);
        assert_eq!(stats.degraded, 1);
    }
}
