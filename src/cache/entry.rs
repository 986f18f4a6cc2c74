//! Cache Entry Module
//!
//! Defines the persisted shape of a single cache entry with TTL support.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Entry ==
/// Represents a single cache entry with value and timestamps.
///
/// Serialized as `{"value": .., "expires": .., "updated": ..}` inside the
/// cache document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The stored value
    #[serde(default)]
    pub value: Value,
    /// Expiration timestamp (Unix seconds), None = no expiration
    #[serde(default)]
    pub expires: Option<f64>,
    /// Last write timestamp (Unix seconds)
    #[serde(default)]
    pub updated: f64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL, stamped with the current time.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - Optional time to live
    pub fn new(value: Value, ttl: Option<Duration>) -> Self {
        let now = current_timestamp();
        let expires = ttl.map(|ttl| now + ttl.as_secs_f64());

        Self {
            value,
            expires,
            updated: now,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at the current time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp())
    }

    /// Checks expiry against a fixed instant.
    ///
    /// An entry is expired once `now >= expires`, so a TTL that has fully
    /// elapsed never yields the value again.
    pub fn is_expired_at(&self, now: f64) -> bool {
        match self.expires {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining lifetime, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has expired
    /// - `Some(remaining)` if the entry has TTL and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires.map(|expires| {
            let remaining = expires - current_timestamp();
            if remaining > 0.0 {
                Duration::try_from_secs_f64(remaining).unwrap_or(Duration::MAX)
            } else {
                Duration::ZERO
            }
        })
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in seconds with microsecond precision.
pub fn current_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
