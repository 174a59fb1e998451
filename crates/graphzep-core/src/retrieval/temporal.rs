//! Temporal filtering (C10)
//!
//! Two distinct notions of "in range" coexist in this crate: a plain
//! timestamp falling inside an inclusive `[start, end]` window (used here,
//! for filtering candidates by `created_at` before ranking), and the
//! half-open `[valid_from, valid_until)` liveness interval on [`crate::model::Fact`]
//! and [`crate::model::RelatesTo`], which each carry their own `is_live_at`.

use chrono::{DateTime, Utc};

/// `true` when `at` falls within `[start, end]`. A missing bound is
/// unconstrained on that side.
pub fn in_range(at: DateTime<Utc>, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> bool {
    if let Some(start) = start {
        if at < start {
            return false;
        }
    }
    if let Some(end) = end {
        if at > end {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn unbounded_range_accepts_everything() {
        assert!(in_range(Utc::now(), None, None));
    }

    #[test]
    fn bounds_are_inclusive() {
        let t = Utc::now();
        assert!(in_range(t, Some(t), Some(t)));
        assert!(!in_range(t - Duration::seconds(1), Some(t), None));
        assert!(!in_range(t + Duration::seconds(1), None, Some(t)));
    }
}
