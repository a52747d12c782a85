//! Exponential backoff with jitter, tracked per provider.
//!
//! A provider that times out or errors is skipped until its backoff
//! expires, so an outage costs one timeout per window instead of one per
//! stop.

use dashmap::DashMap;
use rand::Rng;
use std::time::{Duration, Instant};

const JITTER_RATIO: f64 = 0.2;

/// Retry gate for one provider.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    next_delay: Duration,
    blocked_until: Option<Instant>,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        let base = base.max(Duration::from_millis(1));
        Self {
            base,
            max: max.max(base),
            next_delay: base,
            blocked_until: None,
        }
    }

    pub fn ready(&self) -> bool {
        self.blocked_until
            .map_or(true, |until| Instant::now() >= until)
    }

    pub fn reset(&mut self) {
        self.next_delay = self.base;
        self.blocked_until = None;
    }

    /// Record a failure. The first failure waits `base`, later ones double.
    pub fn fail(&mut self) -> Duration {
        let delay = with_jitter(self.next_delay);
        self.blocked_until = Some(Instant::now() + delay);
        self.next_delay = (self.next_delay * 2).min(self.max);
        delay
    }
}

fn with_jitter(delay: Duration) -> Duration {
    let spread = delay.mul_f64(JITTER_RATIO).as_millis() as u64;
    if spread == 0 {
        return delay;
    }
    delay + Duration::from_millis(rand::rng().random_range(0..=spread))
}

/// Backoff state for every named provider.
#[derive(Debug)]
pub struct ProviderGates {
    base: Duration,
    max: Duration,
    gates: DashMap<&'static str, Backoff>,
}

impl ProviderGates {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            gates: DashMap::new(),
        }
    }

    pub fn ready(&self, provider: &'static str) -> bool {
        self.gates.get(provider).map(|b| b.ready()).unwrap_or(true)
    }

    pub fn succeeded(&self, provider: &'static str) {
        if let Some(mut gate) = self.gates.get_mut(provider) {
            gate.reset();
        }
    }

    pub fn failed(&self, provider: &'static str) -> Duration {
        self.gates
            .entry(provider)
            .or_insert_with(|| Backoff::new(self.base, self.max))
            .fail()
    }
}
