//! Per-question countdown

use std::time::Duration;

use tokio::time::Instant;

/// Answer time every question gets regardless of its length
pub const BASE_DURATION: Duration = Duration::from_secs(10);

/// Upper bound for a single question
pub const MAX_DURATION: Duration = Duration::from_secs(120);

/// Reading speed used to extend the base duration
const CHARS_PER_SECOND: u64 = 15;

/// Countdown length for a prompt: one extra second per 15 characters
///
/// Positive, bounded and non-decreasing in the prompt length.
pub fn reading_time(prompt: &str) -> Duration {
    let chars = prompt.trim().chars().count() as u64;
    let extra = Duration::from_secs(chars.div_ceil(CHARS_PER_SECOND));
    (BASE_DURATION + extra).min(MAX_DURATION)
}

/// Countdown for one question instance
///
/// A fresh timer is created whenever the question index changes; an expired
/// timer never restarts.
#[derive(Debug)]
pub struct SessionTimer {
    question_index: usize,
    duration: Duration,
    deadline: Instant,
    selected: Option<bool>,
    expired: bool,
}

impl SessionTimer {
    /// Start counting down for `question_index`
    pub fn start(question_index: usize, prompt: &str) -> Self {
        let duration = reading_time(prompt);
        Self {
            question_index,
            duration,
            deadline: Instant::now() + duration,
            selected: None,
            expired: false,
        }
    }

    pub fn question_index(&self) -> usize {
        self.question_index
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Current selection; `None` when nothing is selected
    pub fn selected(&self) -> Option<bool> {
        self.selected
    }

    /// Set or overwrite the selection; ignored once time is over
    pub fn select(&mut self, answer: Option<bool>) -> bool {
        if self.expired {
            return false;
        }
        self.selected = answer;
        true
    }

    /// Whether the countdown has expired
    pub fn time_is_over(&self) -> bool {
        self.expired
    }

    /// Expire the countdown and lock in the selection
    ///
    /// Returns the final selection the first time only.
    pub fn expire(&mut self) -> Option<Option<bool>> {
        if self.expired {
            return None;
        }
        self.expired = true;
        Some(self.selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_time_bounds() {
        assert_eq!(reading_time(""), BASE_DURATION);
        assert_eq!(reading_time(&"x".repeat(100_000)), MAX_DURATION);
    }

    #[test]
    fn test_reading_time_grows_with_length() {
        assert_eq!(reading_time("a"), Duration::from_secs(11));
        assert_eq!(reading_time(&"a".repeat(15)), Duration::from_secs(11));
        assert_eq!(reading_time(&"a".repeat(16)), Duration::from_secs(12));

        let mut previous = Duration::ZERO;
        for len in (0..2_000).step_by(7) {
            let current = reading_time(&"é".repeat(len));
            assert!(current >= previous);
            assert!(current > Duration::ZERO && current <= MAX_DURATION);
            previous = current;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_fires_once_with_last_selection() {
        let mut timer = SessionTimer::start(3, "Is Rust memory safe?");
        assert!(timer.select(Some(false)));
        assert!(timer.select(Some(true)));

        tokio::time::sleep_until(timer.deadline()).await;
        assert_eq!(timer.expire(), Some(Some(true)));
        assert!(timer.time_is_over());
        assert_eq!(timer.expire(), None);
    }

    #[test]
    fn test_selection_locked_after_expiry() {
        let mut timer = SessionTimer::start(0, "");
        assert_eq!(timer.expire(), Some(None));
        assert!(!timer.select(Some(true)));
        assert_eq!(timer.selected(), None);
    }
}
