//! Client-side throttle for outgoing messages.
//!
//! Each key (usually a room or sender address) gets a fixed window; once the
//! window's budget is spent further sends are refused until it resets.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::types::MESSAGE_RATE_LIMIT;

/// Configuration for the rate limiter.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Sends allowed per window.
    pub max_per_window: u32,
    /// Window length.
    pub window: Duration,
    /// Tracked keys above which `check` sweeps out expired windows.
    pub prune_threshold: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_per_window: MESSAGE_RATE_LIMIT,
            window: Duration::from_secs(60),
            prune_threshold: 1024,
        }
    }
}

/// Result of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Sends left in the current window.
    pub remaining: u32,
    /// Time until the window resets.
    pub reset_in: Duration,
}

struct WindowState {
    count: u32,
    resets_at: Instant,
}

/// Fixed-window rate limiter keyed by string.
pub struct RateLimiter {
    windows: Arc<RwLock<HashMap<String, WindowState>>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    /// Creates a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Creates a rate limiter allowing 20 sends per minute.
    pub fn with_defaults() -> Self {
        Self::new(RateLimitConfig::default())
    }

    /// Records an attempt for `key` and reports whether it may proceed.
    pub async fn check(&self, key: &str) -> RateLimitDecision {
        let mut windows = self.windows.write().await;
        let now = Instant::now();

        if let Some(state) = windows.get_mut(key) {
            if now < state.resets_at {
                let reset_in = state.resets_at - now;
                if state.count >= self.config.max_per_window {
                    return RateLimitDecision {
                        allowed: false,
                        remaining: 0,
                        reset_in,
                    };
                }
                state.count += 1;
                return RateLimitDecision {
                    allowed: true,
                    remaining: self.config.max_per_window - state.count,
                    reset_in,
                };
            }
        }

        if windows.len() >= self.config.prune_threshold {
            windows.retain(|_, state| state.resets_at > now);
        }

        windows.insert(
            key.to_string(),
            WindowState {
                count: 1,
                resets_at: now + self.config.window,
            },
        );
        RateLimitDecision {
            allowed: self.config.max_per_window > 0,
            remaining: self.config.max_per_window.saturating_sub(1),
            reset_in: self.config.window,
        }
    }

    /// Forgets the window for a key.
    pub async fn reset(&self, key: &str) {
        let mut windows = self.windows.write().await;
        windows.remove(key);
    }

    /// Removes all expired windows.
    pub async fn prune_expired(&self) {
        let mut windows = self.windows.write().await;
        let now = Instant::now();
        windows.retain(|_, state| state.resets_at > now);
    }

    /// Returns the number of tracked keys.
    pub async fn len(&self) -> usize {
        let windows = self.windows.read().await;
        windows.len()
    }

    /// Returns true if no keys are tracked.
    pub async fn is_empty(&self) -> bool {
        let windows = self.windows.read().await;
        windows.is_empty()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::with_defaults()
    }
}
