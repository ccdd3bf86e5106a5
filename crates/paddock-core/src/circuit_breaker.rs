//! Per-load guard for the live API.
//!
//! A load calls up to six live endpoints, each allowed three throttled
//! attempts. When the API is down that is over a minute of waiting for
//! nothing, so the live client counts requests that exhausted their retries
//! and refuses further calls once [`DEFAULT_TRIP_AFTER`] of them happen in a
//! row. The facade resets the guard at the start of every load; there is no
//! timed recovery inside a load.

use std::sync::atomic::{AtomicU32, Ordering};

/// Consecutive exhausted requests that open the circuit.
pub const DEFAULT_TRIP_AFTER: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Requests go out.
    Closed,
    /// Requests are refused until the next reset.
    Open,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    trip_after: u32,
    exhausted_in_a_row: AtomicU32,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(DEFAULT_TRIP_AFTER)
    }
}

impl CircuitBreaker {
    /// `trip_after` is clamped to at least one.
    pub fn new(trip_after: u32) -> Self {
        Self {
            trip_after: trip_after.max(1),
            exhausted_in_a_row: AtomicU32::new(0),
        }
    }

    pub const fn trip_after(&self) -> u32 {
        self.trip_after
    }

    pub fn state(&self) -> CircuitState {
        if self.exhausted_in_a_row() >= self.trip_after {
            CircuitState::Open
        } else {
            CircuitState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == CircuitState::Open
    }

    pub fn exhausted_in_a_row(&self) -> u32 {
        self.exhausted_in_a_row.load(Ordering::Acquire)
    }

    /// Records a request that ran out of attempts. Returns `true` when this
    /// request is the one that opened the circuit.
    pub fn record_exhausted(&self) -> bool {
        let previous = self
            .exhausted_in_a_row
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                Some(count.saturating_add(1))
            })
            .unwrap_or_else(|count| count);
        previous.saturating_add(1) == self.trip_after
    }

    /// Any answer from the API, whatever its status, breaks the streak.
    pub fn record_answered(&self) {
        self.exhausted_in_a_row.store(0, Ordering::Release);
    }

    pub fn reset(&self) {
        self.exhausted_in_a_row.store(0, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_on_the_third_exhausted_request() {
        let breaker = CircuitBreaker::default();

        assert!(!breaker.record_exhausted());
        assert!(!breaker.record_exhausted());
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.record_exhausted());
        assert!(breaker.is_open());

        // Later failures keep it open without reporting the trip again.
        assert!(!breaker.record_exhausted());
        assert_eq!(breaker.exhausted_in_a_row(), 4);
    }

    #[test]
    fn an_answer_breaks_the_streak() {
        let breaker = CircuitBreaker::default();
        breaker.record_exhausted();
        breaker.record_exhausted();
        breaker.record_answered();
        breaker.record_exhausted();

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.exhausted_in_a_row(), 1);
    }

    #[test]
    fn reset_closes_an_open_circuit() {
        let breaker = CircuitBreaker::new(1);
        assert!(breaker.record_exhausted());
        assert!(breaker.is_open());

        breaker.reset();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn zero_threshold_is_clamped() {
        assert_eq!(CircuitBreaker::new(0).trip_after(), 1);
    }
}
