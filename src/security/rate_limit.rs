//! Sliding-window rate limiting per client identity.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;
use crate::observability::metrics;

/// Recent request timestamps for one client.
#[derive(Debug)]
struct ClientWindow {
    hits: VecDeque<Instant>,
    last_seen: Instant,
}

impl ClientWindow {
    fn new(now: Instant) -> Self {
        Self {
            hits: VecDeque::new(),
            last_seen: now,
        }
    }

    /// Drop timestamps that are `window` or more older than `now`.
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(oldest) = self.hits.front() {
            if now.saturating_duration_since(*oldest) >= window {
                self.hits.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Sliding-window limiter keyed by client identity.
///
/// The window map is sharded; an admission holds the client's entry guard
/// across prune, count and record, so two concurrent calls for one client
/// can never both take the last slot.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    windows: DashMap<String, ClientWindow>,
    ceiling: usize,
    window: Duration,
    max_tracked_clients: usize,
}

impl SlidingWindowLimiter {
    pub fn new(ceiling: usize, window: Duration, max_tracked_clients: usize) -> Self {
        Self {
            windows: DashMap::new(),
            ceiling,
            window,
            max_tracked_clients,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.requests_per_window,
            Duration::from_secs(config.window_secs),
            config.max_tracked_clients,
        )
    }

    /// Admit a request from `client` at `now`, recording it if admitted.
    pub fn admit(&self, client: &str, now: Instant) -> bool {
        let mut window = match self.windows.get_mut(client) {
            Some(window) => window,
            None => self
                .windows
                .entry(client.to_string())
                .or_insert_with(|| ClientWindow::new(now)),
        };

        window.prune(now, self.window);
        window.last_seen = window.last_seen.max(now);
        if window.hits.len() >= self.ceiling {
            return false;
        }
        window.hits.push_back(now);
        true
    }

    /// Slots left for `client` at `now`. Does not record anything.
    pub fn remaining(&self, client: &str, now: Instant) -> usize {
        match self.windows.get(client) {
            Some(window) => {
                let live = window
                    .hits
                    .iter()
                    .filter(|hit| now.saturating_duration_since(**hit) < self.window)
                    .count();
                self.ceiling.saturating_sub(live)
            }
            None => self.ceiling,
        }
    }

    /// Number of clients currently holding a window.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Evict idle clients and cap the map size.
    ///
    /// Clients whose windows are empty after pruning are removed. If more
    /// than `max_tracked_clients` remain, the least recently seen go first.
    /// Returns the number of evicted clients.
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| {
            window.prune(now, self.window);
            !window.hits.is_empty()
        });

        let current = self.windows.len();
        if current > self.max_tracked_clients {
            let mut seen: Vec<(String, Instant)> = self
                .windows
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().last_seen))
                .collect();
            seen.sort_by_key(|(_, last_seen)| *last_seen);

            let excess = current - self.max_tracked_clients;
            for (client, _) in seen.into_iter().take(excess) {
                self.windows.remove(&client);
            }
            tracing::warn!(
                evicted = excess,
                max = self.max_tracked_clients,
                "Rate limiter reached max tracked clients"
            );
        }

        metrics::record_tracked_clients(self.windows.len());
        before.saturating_sub(self.windows.len())
    }
}
