//! Identity & time utilities (C1)
//!
//! UUID minting, a monotone clock abstraction, and the half-open
//! `[valid_from, valid_until)` interval predicate used by episodes, facts,
//! and relates-to edges throughout the data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mint a new random (v4) identifier.
pub fn new_uuid() -> Uuid {
    Uuid::new_v4()
}

/// Abstraction over "now" so retrieval idempotence and session-ordering
/// tests can run against a fixed instant instead of the wall clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Default clock backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed clock for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A half-open validity interval `[from, until)`.
///
/// `until = None` means "still valid" (unbounded future).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub from: DateTime<Utc>,
    pub until: Option<DateTime<Utc>>,
}

impl Interval {
    pub fn from(from: DateTime<Utc>) -> Self {
        Self { from, until: None }
    }

    pub fn with_until(from: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            from,
            until: Some(until),
        }
    }

    /// `valid_from <= t < (valid_until ∨ +∞)`
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.from <= t && self.until.map(|u| t < u).unwrap_or(true)
    }

    /// Whether `from <= until` (or `until` is unbounded) — the invariant
    /// every fact and episode must satisfy.
    pub fn is_well_formed(&self) -> bool {
        self.until.map(|u| self.from <= u).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn interval_half_open_contains() {
        let now = Utc::now();
        let iv = Interval::with_until(now, now + Duration::days(1));
        assert!(iv.contains(now));
        assert!(iv.contains(now + Duration::hours(12)));
        assert!(!iv.contains(now + Duration::days(1))); // exclusive upper bound
        assert!(!iv.contains(now - Duration::seconds(1)));
    }

    #[test]
    fn unbounded_interval_is_always_live_after_start() {
        let now = Utc::now();
        let iv = Interval::from(now);
        assert!(iv.contains(now + Duration::days(3650)));
        assert!(!iv.contains(now - Duration::seconds(1)));
    }

    #[test]
    fn well_formed_requires_from_before_until() {
        let now = Utc::now();
        assert!(Interval::with_until(now, now + Duration::seconds(1)).is_well_formed());
        assert!(!Interval::with_until(now, now - Duration::seconds(1)).is_well_formed());
    }

    #[test]
    fn fixed_clock_is_deterministic() {
        let t = Utc::now();
        let clock = FixedClock(t);
        assert_eq!(clock.now(), t);
        assert_eq!(clock.now(), clock.now());
    }
}
