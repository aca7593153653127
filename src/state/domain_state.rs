use std::time::Duration;
use tokio::time::Instant;

/// Per-domain spacing state kept by the rate limiter
///
/// Created lazily on a domain's first request and never evicted.
#[derive(Debug, Clone, Default)]
pub struct DomainState {
    /// Number of requests released to this domain
    pub request_count: u64,

    /// Instant the last request to this domain was released
    pub last_request_at: Option<Instant>,
}

impl DomainState {
    /// Creates a new DomainState with no history
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a request was released at `now`
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_at = Some(now);
    }

    /// Time elapsed since the last request, `None` if there was none
    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        self.last_request_at.map(|last| now.saturating_duration_since(last))
    }

    /// How long a caller must still wait to honor `min_spacing`
    ///
    /// # Returns
    ///
    /// * `Duration::ZERO` - If a request can be made now
    /// * The remaining wait otherwise
    pub fn time_until_next_request(&self, min_spacing: Duration, now: Instant) -> Duration {
        match self.elapsed(now) {
            Some(elapsed) => min_spacing.saturating_sub(elapsed),
            None => Duration::ZERO,
        }
    }
}

/// The single process-wide "last request" timestamp
#[derive(Debug, Clone, Default)]
pub struct GlobalRateState {
    pub last_request_at: Option<Instant>,
}

impl GlobalRateState {
    pub fn time_until_next_request(&self, floor: Duration, now: Instant) -> Duration {
        match self.last_request_at {
            Some(last) => floor.saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_domain_state() {
        let state = DomainState::new();
        assert_eq!(state.request_count, 0);
        assert!(state.last_request_at.is_none());
    }

    #[test]
    fn test_record_request() {
        let mut state = DomainState::new();
        let now = Instant::now();

        state.record_request(now);
        assert_eq!(state.request_count, 1);
        assert_eq!(state.last_request_at, Some(now));

        state.record_request(now);
        assert_eq!(state.request_count, 2);
    }

    #[test]
    fn test_time_until_next_request() {
        let mut state = DomainState::new();
        let spacing = Duration::from_millis(1000);
        let now = Instant::now();

        assert_eq!(state.time_until_next_request(spacing, now), Duration::ZERO);

        state.record_request(now);
        assert_eq!(state.time_until_next_request(spacing, now), spacing);

        let soon = now + Duration::from_millis(500);
        assert_eq!(
            state.time_until_next_request(spacing, soon),
            Duration::from_millis(500)
        );

        let later = now + Duration::from_millis(1100);
        assert_eq!(state.time_until_next_request(spacing, later), Duration::ZERO);
    }

    #[test]
    fn test_global_floor() {
        let mut global = GlobalRateState::default();
        let now = Instant::now();
        let floor = Duration::from_millis(200);

        assert_eq!(global.time_until_next_request(floor, now), Duration::ZERO);

        global.last_request_at = Some(now);
        assert_eq!(
            global.time_until_next_request(floor, now + Duration::from_millis(50)),
            Duration::from_millis(150)
        );
    }
}
