use crate::clock::{self, Clock};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerSnapshot {
    pub provider: String,
    pub failure_threshold: u32,
    pub cooldown_ms: u64,
    pub consecutive_failures: u32,
    pub is_open: bool,
    /// Remaining open time in ms, if currently open.
    pub open_remaining_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::from_secs(30),
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the failure threshold
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    /// Set the cooldown duration
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }
}

#[derive(Debug, Default)]
struct CircuitState {
    consecutive_failures: u32,
    last_failure: Option<Instant>,
    is_open: bool,
}

impl CircuitState {
    /// Full reset once the cooldown has elapsed. There is no half-open probe.
    fn refresh(&mut self, now: Instant, cooldown: Duration) -> bool {
        if !self.is_open {
            return false;
        }
        let elapsed = self
            .last_failure
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or(Duration::MAX);
        if elapsed > cooldown {
            self.is_open = false;
            self.consecutive_failures = 0;
            return true;
        }
        false
    }

    fn remaining(&self, now: Instant, cooldown: Duration) -> Option<Duration> {
        if !self.is_open {
            return None;
        }
        let elapsed = self
            .last_failure
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or(Duration::ZERO);
        Some(cooldown.saturating_sub(elapsed))
    }
}

/// Per-provider circuit breaker registry.
///
/// - One CLOSED/OPEN state machine per provider id, created lazily
/// - Opens the instant consecutive failures reach the threshold
/// - Resets fully after the cooldown, on the next `allow`/`check`
/// - Each provider's state sits behind its own lock, so providers never contend
pub struct CircuitBreaker {
    cfg: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
    circuits: Mutex<HashMap<String, Arc<Mutex<CircuitState>>>>,
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

impl CircuitBreaker {
    pub fn new(cfg: CircuitBreakerConfig) -> Self {
        Self::with_clock(cfg, clock::system())
    }

    pub fn with_clock(cfg: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            cfg,
            clock,
            circuits: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.cfg
    }

    fn circuit(&self, provider: &str) -> Arc<Mutex<CircuitState>> {
        let mut circuits = self.circuits.lock().unwrap_or_else(|p| p.into_inner());
        circuits
            .entry(provider.to_string())
            .or_default()
            .clone()
    }

    /// Gate a call to `provider`, reporting the remaining cooldown when rejected.
    pub fn check(&self, provider: &str) -> Result<()> {
        let circuit = self.circuit(provider);
        let mut st = circuit.lock().unwrap_or_else(|p| p.into_inner());
        let now = self.clock.now();
        if st.refresh(now, self.cfg.cooldown) {
            info!(provider, "circuit breaker cooldown elapsed, closing circuit");
        }
        match st.remaining(now, self.cfg.cooldown) {
            None => Ok(()),
            Some(remaining) => {
                let millis = remaining.as_millis() as u64;
                let retry_in_secs = ((millis + 999) / 1000).max(1);
                Err(Error::CircuitOpen {
                    provider: provider.to_string(),
                    retry_in_secs,
                })
            }
        }
    }

    pub fn allow(&self, provider: &str) -> bool {
        self.check(provider).is_ok()
    }

    pub fn record_success(&self, provider: &str) {
        let circuit = self.circuit(provider);
        let mut st = circuit.lock().unwrap_or_else(|p| p.into_inner());
        st.consecutive_failures = 0;
        st.is_open = false;
    }

    pub fn record_failure(&self, provider: &str) {
        let circuit = self.circuit(provider);
        let mut st = circuit.lock().unwrap_or_else(|p| p.into_inner());
        st.consecutive_failures = st.consecutive_failures.saturating_add(1);
        st.last_failure = Some(self.clock.now());
        if !st.is_open && st.consecutive_failures >= self.cfg.failure_threshold {
            st.is_open = true;
            warn!(
                provider,
                consecutive_failures = st.consecutive_failures,
                cooldown_secs = self.cfg.cooldown.as_secs(),
                "circuit breaker opened"
            );
        }
    }

    /// Read-only view of a provider's circuit. Does not apply the cooldown reset.
    pub fn snapshot(&self, provider: &str) -> CircuitBreakerSnapshot {
        let circuit = self.circuit(provider);
        let st = circuit.lock().unwrap_or_else(|p| p.into_inner());
        let open_remaining_ms = st
            .remaining(self.clock.now(), self.cfg.cooldown)
            .map(|d| d.as_millis() as u64);
        CircuitBreakerSnapshot {
            provider: provider.to_string(),
            failure_threshold: self.cfg.failure_threshold,
            cooldown_ms: self.cfg.cooldown.as_millis() as u64,
            consecutive_failures: st.consecutive_failures,
            is_open: st.is_open,
            open_remaining_ms,
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
