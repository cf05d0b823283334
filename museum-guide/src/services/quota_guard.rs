//! Quota Guard
//!
//! Per-caller and global request ceilings over a fixed time window, checked
//! before any external API call is made.
//!
//! The check-and-increment runs under a `std::sync::Mutex` held only for the
//! counter update, never across I/O. Windows are aligned to the UNIX epoch in
//! multiples of the configured length, so a one-day window starts at UTC
//! midnight. The first admission seen in a new window resets both counters.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Admission limits
#[derive(Debug, Clone)]
pub struct QuotaConfig {
    /// Requests allowed per caller per window
    pub per_caller_limit: u32,
    /// Requests allowed across all callers per window
    pub global_limit: u32,
    /// Window length
    pub window: Duration,
    /// Callers allowed to make requests (empty = everyone)
    pub allowed_callers: Vec<String>,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            per_caller_limit: 10,
            global_limit: 100,
            window: Duration::days(1),
            allowed_callers: Vec::new(),
        }
    }
}

/// Why a request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    PerCallerLimitExceeded,
    GlobalLimitExceeded,
    CallerNotAllowed,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerCallerLimitExceeded => "per-caller limit exceeded",
            Self::GlobalLimitExceeded => "global limit exceeded",
            Self::CallerNotAllowed => "caller not allowed",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Rejected(RejectReason),
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }
}

/// Counters for the current window
#[derive(Debug)]
struct QuotaState {
    window_start: DateTime<Utc>,
    global: u32,
    per_caller: HashMap<String, u32>,
}

/// Point-in-time view of quota usage
#[derive(Debug, Clone, Serialize)]
pub struct QuotaSnapshot {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub global_used: u32,
    pub global_limit: u32,
    pub per_caller_limit: u32,
    pub active_callers: usize,
}

/// Request-rate enforcement shared by all request tasks
pub struct QuotaGuard {
    config: QuotaConfig,
    allowed: HashSet<String>,
    state: Mutex<QuotaState>,
}

impl QuotaGuard {
    pub fn new(config: QuotaConfig) -> Self {
        Self::starting_at(config, Utc::now())
    }

    /// Create a guard whose first window contains `now`
    pub fn starting_at(mut config: QuotaConfig, now: DateTime<Utc>) -> Self {
        if config.window <= Duration::zero() {
            warn!("Quota window must be positive, using one day");
            config.window = Duration::days(1);
        }
        let allowed = config.allowed_callers.iter().cloned().collect();
        let window_start = window_start_for(now, config.window);

        Self {
            config,
            allowed,
            state: Mutex::new(QuotaState {
                window_start,
                global: 0,
                per_caller: HashMap::new(),
            }),
        }
    }

    pub fn config(&self) -> &QuotaConfig {
        &self.config
    }

    /// Admit or reject a request from `caller_id` at the current time
    pub fn admit(&self, caller_id: &str) -> Admission {
        self.admit_at(caller_id, Utc::now())
    }

    /// Admit or reject a request from `caller_id` observed at `now`
    ///
    /// Rejected requests do not consume quota: the counters are only committed
    /// when both post-increment values are within their limits.
    pub fn admit_at(&self, caller_id: &str, now: DateTime<Utc>) -> Admission {
        if !self.allowed.is_empty() && !self.allowed.contains(caller_id) {
            debug!(caller = %caller_id, "Caller not on allow-list");
            return Admission::Rejected(RejectReason::CallerNotAllowed);
        }

        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            // Counters are plain integers; a panic elsewhere cannot leave them torn.
            Err(poisoned) => poisoned.into_inner(),
        };

        let current_window = window_start_for(now, self.config.window);
        if current_window > state.window_start {
            info!(
                previous_window = %state.window_start,
                window = %current_window,
                global_used = state.global,
                "Quota window rolled over, resetting counters"
            );
            state.window_start = current_window;
            state.global = 0;
            state.per_caller.clear();
        }

        let caller_count = state.per_caller.get(caller_id).copied().unwrap_or(0) + 1;
        if caller_count > self.config.per_caller_limit {
            return Admission::Rejected(RejectReason::PerCallerLimitExceeded);
        }

        let global_count = state.global + 1;
        if global_count > self.config.global_limit {
            return Admission::Rejected(RejectReason::GlobalLimitExceeded);
        }

        state.global = global_count;
        state.per_caller.insert(caller_id.to_string(), caller_count);

        debug!(
            caller = %caller_id,
            caller_count,
            global_count,
            "Request admitted"
        );
        Admission::Allowed
    }

    /// Requests counted for `caller_id` in the current window
    pub fn caller_usage(&self, caller_id: &str) -> u32 {
        self.lock_state()
            .per_caller
            .get(caller_id)
            .copied()
            .unwrap_or(0)
    }

    /// Requests counted across all callers in the current window
    pub fn global_usage(&self) -> u32 {
        self.lock_state().global
    }

    pub fn snapshot(&self) -> QuotaSnapshot {
        let state = self.lock_state();
        QuotaSnapshot {
            window_start: state.window_start,
            window_end: state.window_start + self.config.window,
            global_used: state.global,
            global_limit: self.config.global_limit,
            per_caller_limit: self.config.per_caller_limit,
            active_callers: state.per_caller.len(),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, QuotaState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Start of the epoch-aligned window containing `now`
fn window_start_for(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    let window_secs = window.num_seconds().max(1);
    let start = now.timestamp().div_euclid(window_secs) * window_secs;
    Utc.timestamp_opt(start, 0).single().unwrap_or(now)
}
