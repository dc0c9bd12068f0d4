//! Per-identity request cooldown
//!
//! State is in memory only and starts empty on every process start.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::clock::Clock;

/// Default spacing between schedule requests from one identity
pub const DEFAULT_COOLDOWN_SECS: i64 = 5;

/// Gate that lets an identity through at most once per cooldown
///
/// Check and update happen under one lock, so of several concurrent requests
/// from the same identity inside the window exactly one is allowed.
#[derive(Debug)]
pub struct RateLimiter {
    last_request: Mutex<HashMap<i64, i64>>,
    cooldown_secs: i64,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Creates a limiter with the default 5 second cooldown
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_cooldown(clock, DEFAULT_COOLDOWN_SECS)
    }

    pub fn with_cooldown(clock: Arc<dyn Clock>, cooldown_secs: i64) -> Self {
        Self {
            last_request: Mutex::new(HashMap::new()),
            cooldown_secs,
            clock,
        }
    }

    pub fn cooldown_secs(&self) -> i64 {
        self.cooldown_secs
    }

    /// Applies the configured cooldown
    pub fn allow(&self, identity: i64) -> bool {
        self.allow_with(identity, self.cooldown_secs)
    }

    /// Allows and records the request if `identity` has been quiet for at
    /// least `cooldown_secs`; a denied request leaves the record untouched
    pub fn allow_with(&self, identity: i64, cooldown_secs: i64) -> bool {
        let now = self.clock.epoch_secs();
        let mut last_request = self.last_request.lock().unwrap_or_else(|e| e.into_inner());

        match last_request.get(&identity) {
            Some(&last) if now - last < cooldown_secs => {
                debug!(identity, wait_secs = cooldown_secs - (now - last), "request rate limited");
                false
            }
            _ => {
                last_request.insert(identity, now);
                true
            }
        }
    }
}
