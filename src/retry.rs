//! Retry-with-backoff combinator for whole-response LLM calls

use std::fmt::Display;
use std::time::Duration;

use tracing::{error, warn};

/// Fixed attempt cap with exponential backoff: the delay after failed
/// attempt `n` (0-based) is `base_delay * 2^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `op` until it succeeds or the attempts run out, sleeping the
    /// calling thread between attempts. The last error is returned as-is.
    pub fn run<T, E: Display>(&self, name: &str, op: impl FnMut() -> Result<T, E>) -> Result<T, E> {
        self.run_with_sleep(name, std::thread::sleep, op)
    }

    /// Like [`run`](Self::run) with a caller-supplied sleep.
    pub fn run_with_sleep<T, E: Display>(
        &self,
        name: &str,
        mut sleep: impl FnMut(Duration),
        mut op: impl FnMut() -> Result<T, E>,
    ) -> Result<T, E> {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if attempt + 1 >= attempts => {
                    error!("{name} failed after {attempts} attempts: {e}");
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "Attempt {} failed for {name}: {e}. Retrying in {:.1}s...",
                        attempt + 1,
                        delay.as_secs_f64()
                    );
                    sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn succeeds_after_two_failures_with_doubling_delays() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        let mut calls = 0;
        let mut slept = Vec::new();

        let result: Result<i32, String> = policy.run_with_sleep(
            "flaky",
            |d| slept.push(d),
            || {
                calls += 1;
                if calls <= 2 { Err(format!("failure {calls}")) } else { Ok(42) }
            },
        );

        assert_eq!(result, Ok(42));
        assert_eq!(calls, 3);
        assert_eq!(slept, vec![Duration::from_secs_f64(1.0), Duration::from_secs_f64(2.0)]);
    }

    #[test]
    fn surfaces_last_error_when_attempts_run_out() {
        let policy = RetryPolicy::default();
        let mut calls = 0;
        let mut sleeps = 0;

        let result: Result<(), String> = policy.run_with_sleep(
            "down",
            |_| sleeps += 1,
            || {
                calls += 1;
                Err(format!("attempt {calls}"))
            },
        );

        assert_eq!(result, Err("attempt 3".to_string()));
        assert_eq!(calls, 3);
        assert_eq!(sleeps, 2);
    }

    #[test]
    fn first_success_never_sleeps() {
        let policy = RetryPolicy::default();
        let mut sleeps = 0;
        let result: Result<&str, String> = policy.run_with_sleep("ok", |_| sleeps += 1, || Ok("done"));
        assert_eq!(result, Ok("done"));
        assert_eq!(sleeps, 0);
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let policy = RetryPolicy::new(0, Duration::from_millis(1));
        let mut calls = 0;
        let _: Result<(), String> = policy.run_with_sleep(
            "once",
            |_| {},
            || {
                calls += 1;
                Err("no".to_string())
            },
        );
        assert_eq!(calls, 1);
    }

    #[test]
    fn delays_double_from_base() {
        let policy = RetryPolicy::new(5, Duration::from_millis(500));
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(4000));
    }
}
