//! Site availability state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A site's current classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Unknown,
    Available,
    Unavailable,
}

impl Availability {
    /// Gauge value used for metrics (1 = up, 0 = down, -1 = unknown).
    pub fn as_gauge(self) -> f64 {
        match self {
            Availability::Available => 1.0,
            Availability::Unavailable => 0.0,
            Availability::Unknown => -1.0,
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Availability::Unknown => "unknown",
            Availability::Available => "available",
            Availability::Unavailable => "unavailable",
        };
        f.write_str(s)
    }
}

/// Point-in-time state of one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteState {
    pub url: String,
    pub availability: Availability,
    /// Set while the site is unavailable.
    pub unavailable_since: Option<DateTime<Utc>>,
    /// Set on the last Unavailable → Available transition.
    pub recovered_at: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
}

/// An availability transition of one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityEvent {
    pub timestamp: DateTime<Utc>,
    pub site: String,
    pub url: String,
    pub from: Availability,
    pub to: Availability,
}

impl SiteState {
    /// Initial state of a site that has never been probed.
    pub fn new(url: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            availability: Availability::Unknown,
            unavailable_since: None,
            recovered_at: None,
            last_updated: now,
        }
    }

    /// Compute the state following one probe outcome observed at `at`.
    ///
    /// Returns the next state and, if the availability changed, the previous
    /// classification.
    pub fn apply(&self, success: bool, at: DateTime<Utc>) -> (SiteState, Option<Availability>) {
        let mut next = self.clone();
        next.last_updated = at;

        match (success, self.availability) {
            (true, Availability::Available) | (false, Availability::Unavailable) => (next, None),
            (true, previous) => {
                next.availability = Availability::Available;
                if previous == Availability::Unavailable {
                    next.recovered_at = Some(at);
                    next.unavailable_since = None;
                }
                (next, Some(previous))
            }
            (false, previous) => {
                next.availability = Availability::Unavailable;
                next.unavailable_since = Some(at);
                (next, Some(previous))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_fail_fail_success_trace() {
        let s0 = SiteState::new("http://a", at(0));

        let (s1, t1) = s0.apply(false, at(1));
        assert_eq!(t1, Some(Availability::Unknown));
        assert_eq!(s1.availability, Availability::Unavailable);
        assert_eq!(s1.unavailable_since, Some(at(1)));
        assert_eq!(s1.recovered_at, None);

        let (s2, t2) = s1.apply(false, at(2));
        assert_eq!(t2, None);
        assert_eq!(s2.availability, Availability::Unavailable);
        assert_eq!(s2.unavailable_since, Some(at(1)));
        assert_eq!(s2.last_updated, at(2));

        let (s3, t3) = s2.apply(true, at(3));
        assert_eq!(t3, Some(Availability::Unavailable));
        assert_eq!(s3.availability, Availability::Available);
        assert_eq!(s3.unavailable_since, None);
        assert_eq!(s3.recovered_at, Some(at(3)));
    }

    #[test]
    fn test_first_success_is_not_a_recovery() {
        let s0 = SiteState::new("http://a", at(0));
        let (s1, t1) = s0.apply(true, at(1));
        assert_eq!(t1, Some(Availability::Unknown));
        assert_eq!(s1.availability, Availability::Available);
        assert_eq!(s1.recovered_at, None);
    }

    #[test]
    fn test_recovered_at_survives_later_outage() {
        let s = SiteState::new("http://a", at(0));
        let (s, _) = s.apply(false, at(1));
        let (s, _) = s.apply(true, at(2));
        let (s, _) = s.apply(false, at(3));
        assert_eq!(s.recovered_at, Some(at(2)));
        assert_eq!(s.unavailable_since, Some(at(3)));
        let (s, _) = s.apply(true, at(4));
        assert_eq!(s.recovered_at, Some(at(4)));
    }

    #[test]
    fn test_invariants_over_long_sequence() {
        // Deterministic pseudo-random outcome sequence.
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        let mut state = SiteState::new("http://a", at(0));
        let mut now = at(0);

        for _ in 0..1_000 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let success = seed % 3 != 0;
            now += Duration::seconds(1);

            let before = state.clone();
            let (next, transition) = state.apply(success, now);

            match next.availability {
                Availability::Available => assert!(success),
                Availability::Unavailable => assert!(!success),
                Availability::Unknown => unreachable!("never returns to unknown"),
            }
            assert_eq!(
                next.unavailable_since.is_some(),
                next.availability == Availability::Unavailable
            );
            let recovered = before.availability == Availability::Unavailable && success;
            if recovered {
                assert_eq!(next.recovered_at, Some(now));
            } else {
                assert_eq!(next.recovered_at, before.recovered_at);
            }
            assert_eq!(transition.is_some(), before.availability != next.availability);

            state = next;
        }
    }
}
