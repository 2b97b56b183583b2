/*!
 * Request Options
 * Per-call caching behaviour for GET requests
 */

use std::time::Duration;

/// Convert a TTL in minutes to a duration
///
/// Zero, negative and NaN mean "always stale"; values too large for a
/// `Duration` saturate.
pub fn ttl_from_minutes(minutes: f64) -> Duration {
    if minutes.is_nan() || minutes <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(minutes * 60.0).unwrap_or(Duration::MAX)
}

/// Options recognised by [`CachedClient::get`](super::CachedClient::get)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Skip the cache and always hit the network
    pub force_refresh: bool,
    /// Freshness window for the entry this call writes; client default when `None`
    pub ttl: Option<Duration>,
    /// Serve a stale entry immediately and refresh it in the background
    pub stale_while_revalidate: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn force_refresh(mut self) -> Self {
        self.force_refresh = true;
        self
    }

    pub fn stale_while_revalidate(mut self) -> Self {
        self.stale_while_revalidate = true;
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn ttl_minutes(mut self, minutes: f64) -> Self {
        self.ttl = Some(ttl_from_minutes(minutes));
        self
    }
}
