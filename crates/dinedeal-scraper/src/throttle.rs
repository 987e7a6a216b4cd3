//! Per-host politeness: one in-flight request per host, randomized spacing,
//! and backoff after rate-limit responses.
//!
//! State is created lazily the first time a host is referenced and is never
//! evicted; the host set is bounded by the number of supported platforms.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dinedeal_core::{AppConfig, HostBlock};
use rand::Rng;
use tokio::sync::OwnedMutexGuard;

#[derive(Debug, Default)]
struct HostState {
    gate: Arc<tokio::sync::Mutex<()>>,
    blocked_until: Option<DateTime<Utc>>,
}

/// Exclusive right to send one request to `host`. Dropping it frees the slot.
#[derive(Debug)]
pub struct HostPermit {
    host: String,
    _guard: OwnedMutexGuard<()>,
}

impl HostPermit {
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }
}

#[derive(Debug)]
pub struct DomainThrottle {
    hosts: Mutex<HashMap<String, HostState>>,
    jitter_min: Duration,
    jitter_max: Duration,
    default_block: TimeDelta,
}

impl DomainThrottle {
    /// `jitter_min..=jitter_max` is the delay range before each request;
    /// `default_block` is the backoff applied by [`DomainThrottle::block_host`].
    /// A reversed jitter range is treated as `jitter_min..=jitter_min`.
    #[must_use]
    pub fn new(jitter_min: Duration, jitter_max: Duration, default_block: TimeDelta) -> Self {
        Self {
            hosts: Mutex::new(HashMap::new()),
            jitter_min,
            jitter_max: jitter_max.max(jitter_min),
            default_block,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let block_hours = i64::try_from(config.block_backoff_hours).unwrap_or(i64::MAX / 3600);
        Self::new(
            Duration::from_secs(config.jitter_min_secs),
            Duration::from_secs(config.jitter_max_secs),
            TimeDelta::try_hours(block_hours).unwrap_or(TimeDelta::MAX),
        )
    }

    /// Waits until no other task holds the permit for `host`, then returns it.
    pub async fn acquire(&self, host: &str) -> HostPermit {
        let gate = {
            let mut hosts = self.lock();
            Arc::clone(&hosts.entry(host.to_owned()).or_default().gate)
        };
        let guard = gate.lock_owned().await;
        HostPermit {
            host: host.to_owned(),
            _guard: guard,
        }
    }

    /// Frees the slot held by `permit`. Equivalent to dropping it.
    pub fn release(&self, permit: HostPermit) {
        tracing::trace!(host = permit.host(), "releasing host permit");
        drop(permit);
    }

    #[must_use]
    pub fn is_blocked(&self, host: &str) -> bool {
        self.is_blocked_at(host, Utc::now())
    }

    /// Whether `host` is in backoff at the instant `now`.
    #[must_use]
    pub fn is_blocked_at(&self, host: &str, now: DateTime<Utc>) -> bool {
        self.lock()
            .get(host)
            .and_then(|state| state.blocked_until)
            .is_some_and(|until| now < until)
    }

    /// Puts `host` into backoff for the configured default duration.
    pub fn block_host(&self, host: &str) -> DateTime<Utc> {
        self.block_host_for(host, self.default_block)
    }

    /// Puts `host` into backoff for `duration` from now and returns the end
    /// of the backoff.
    pub fn block_host_for(&self, host: &str, duration: TimeDelta) -> DateTime<Utc> {
        let until = Utc::now()
            .checked_add_signed(duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.lock().entry(host.to_owned()).or_default().blocked_until = Some(until);
        tracing::warn!(host, %until, "host placed into backoff");
        until
    }

    /// Restores a backoff that ends at `until`. An existing later backoff is
    /// kept.
    pub fn block_host_until(&self, host: &str, until: DateTime<Utc>) {
        let mut hosts = self.lock();
        let state = hosts.entry(host.to_owned()).or_default();
        state.blocked_until = Some(state.blocked_until.map_or(until, |cur| cur.max(until)));
    }

    /// Every host that has a recorded backoff, expired or not.
    #[must_use]
    pub fn blocked_hosts(&self) -> Vec<HostBlock> {
        let mut blocks: Vec<HostBlock> = self
            .lock()
            .iter()
            .filter_map(|(host, state)| {
                state.blocked_until.map(|blocked_until| HostBlock {
                    host: host.clone(),
                    blocked_until,
                })
            })
            .collect();
        blocks.sort_by(|a, b| a.host.cmp(&b.host));
        blocks
    }

    /// A uniformly random delay from the configured jitter range.
    #[must_use]
    pub fn jitter_duration(&self) -> Duration {
        if self.jitter_max.is_zero() {
            return Duration::ZERO;
        }
        let min_ms = u64::try_from(self.jitter_min.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.jitter_max.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rand::rng().random_range(min_ms..=max_ms))
    }

    /// Sleeps for a random interval from the jitter range.
    pub async fn jitter_delay(&self) {
        let delay = self.jitter_duration();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, HostState>> {
        self.hosts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
