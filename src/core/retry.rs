//! Retry strategies for unreliable operations
//!
//! Every strategy runs a fresh, independent loop per [`Retry::run`] call and
//! never sleeps after its final failed attempt.

use super::error::{LoggerError, Result};
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Sentinel for "no try limit"
pub const UNLIMITED_TRIES: u32 = u32::MAX;

/// Sentinel for "no deadline"
pub const UNLIMITED_DEADLINE: Duration = Duration::MAX;

/// Sentinel for "no delay cap"
pub const UNLIMITED_DELAY: Duration = Duration::MAX;

pub type SleepFn = Arc<dyn Fn(Duration) + Send + Sync>;

/// Predicate selecting the errors worth another attempt
pub type RetryablePredicate = Arc<dyn Fn(&LoggerError) -> bool + Send + Sync>;

fn thread_sleep() -> SleepFn {
    Arc::new(std::thread::sleep)
}

pub trait Retry: Send + Sync {
    /// Run `operation` until it succeeds or the strategy gives up
    fn run(&self, operation: &mut dyn FnMut() -> Result<()>) -> Result<()>;
}

/// Up to `max_times` attempts with a fixed pause between them
#[derive(Clone)]
pub struct NTimesRetry {
    sleep: SleepFn,
    max_times: u32,
    delay: Duration,
}

impl NTimesRetry {
    pub fn new(max_times: u32, delay: Duration) -> Self {
        Self {
            sleep: thread_sleep(),
            max_times,
            delay,
        }
    }

    #[must_use]
    pub fn with_sleep(mut self, sleep: SleepFn) -> Self {
        self.sleep = sleep;
        self
    }
}

impl Retry for NTimesRetry {
    fn run(&self, operation: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        let mut last = LoggerError::RetryFailed;
        for attempt in 1..=self.max_times {
            match operation() {
                Ok(()) => return Ok(()),
                Err(e) => last = e,
            }
            if attempt < self.max_times {
                (self.sleep)(self.delay);
            }
        }
        Err(last)
    }
}

/// A single attempt
#[derive(Clone)]
pub struct OnceRetry(NTimesRetry);

impl OnceRetry {
    pub fn new() -> Self {
        OnceRetry(NTimesRetry::new(1, Duration::ZERO))
    }
}

impl Default for OnceRetry {
    fn default() -> Self {
        Self::new()
    }
}

impl Retry for OnceRetry {
    fn run(&self, operation: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        self.0.run(operation)
    }
}

/// Retries with a fixed pause until `max_elapsed` has passed
#[derive(Clone)]
pub struct UntilElapsedRetry {
    sleep: SleepFn,
    delay: Duration,
    max_elapsed: Duration,
}

impl UntilElapsedRetry {
    pub fn new(delay: Duration, max_elapsed: Duration) -> Self {
        Self {
            sleep: thread_sleep(),
            delay,
            max_elapsed,
        }
    }

    #[must_use]
    pub fn with_sleep(mut self, sleep: SleepFn) -> Self {
        self.sleep = sleep;
        self
    }
}

impl Retry for UntilElapsedRetry {
    fn run(&self, operation: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        let start = Instant::now();
        loop {
            let err = match operation() {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };
            if start.elapsed().saturating_add(self.delay) >= self.max_elapsed {
                return Err(err);
            }
            (self.sleep)(self.delay);
        }
    }
}

fn doubled(delay: Duration, cap: Duration) -> Duration {
    delay.checked_mul(2).unwrap_or(cap).min(cap)
}

/// Unbounded retries, doubling the pause up to `max_delay`
#[derive(Clone)]
pub struct ExponentialBackoffRetry {
    sleep: SleepFn,
    base_delay: Duration,
    max_delay: Duration,
}

impl ExponentialBackoffRetry {
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            sleep: thread_sleep(),
            base_delay,
            max_delay,
        }
    }

    #[must_use]
    pub fn with_sleep(mut self, sleep: SleepFn) -> Self {
        self.sleep = sleep;
        self
    }
}

impl Retry for ExponentialBackoffRetry {
    fn run(&self, operation: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        let mut delay = self.base_delay.min(self.max_delay);
        while operation().is_err() {
            (self.sleep)(delay);
            delay = doubled(delay, self.max_delay);
        }
        Ok(())
    }
}

/// Exponential backoff limited to `max_tries` attempts
#[derive(Clone)]
pub struct BoundedExponentialBackoffRetry {
    sleep: SleepFn,
    max_tries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl BoundedExponentialBackoffRetry {
    pub fn new(max_tries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            sleep: thread_sleep(),
            max_tries,
            base_delay,
            max_delay,
        }
    }

    #[must_use]
    pub fn with_sleep(mut self, sleep: SleepFn) -> Self {
        self.sleep = sleep;
        self
    }
}

impl Retry for BoundedExponentialBackoffRetry {
    fn run(&self, operation: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        let mut delay = self.base_delay;
        let mut last = LoggerError::RetryFailed;
        for attempt in 1..=self.max_tries {
            match operation() {
                Ok(()) => return Ok(()),
                Err(e) => last = e,
            }
            if attempt < self.max_tries {
                delay = doubled(delay, self.max_delay);
                (self.sleep)(delay);
            }
        }
        Err(last)
    }
}

/// What [`ErrorRetry`] returns once it gives up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExhaustionMode {
    /// `LoggerError::RetryFailed`, dropping the last failure
    Generic,
    /// `LoggerError::RetryExhausted` carrying the last failure as source
    #[default]
    PreserveLast,
}

/// Retries selected errors with jittered exponential backoff.
///
/// An attempt failing with an error that no retryable predicate accepts is
/// returned unchanged. Otherwise the loop sleeps
/// `delay * (1 + U(0, max_jitter))`, multiplies `delay` by `backoff`
/// (capped at `max_delay`) and tries again, until `max_tries` attempts
/// were made or the next sleep would cross `deadline`.
///
/// ```
/// use rust_channel_logger::core::{ErrorRetry, LoggerError, Retry};
/// use std::time::Duration;
///
/// let retry = ErrorRetry::new()
///     .with_max_tries(3)
///     .with_delay(Duration::from_millis(1));
/// let mut calls = 0;
/// let result = retry.run(&mut || {
///     calls += 1;
///     Err(LoggerError::ForceRetry)
/// });
/// assert!(result.unwrap_err().is_retry_exhaustion());
/// assert_eq!(calls, 3);
/// ```
#[derive(Clone)]
pub struct ErrorRetry {
    sleep: SleepFn,
    max_tries: u32,
    delay: Duration,
    backoff: u32,
    max_jitter: f64,
    max_delay: Duration,
    deadline: Duration,
    retryable: Vec<RetryablePredicate>,
    exhaustion: ExhaustionMode,
}

impl ErrorRetry {
    /// Unlimited tries, 10 ms initial delay, backoff 2, 10% jitter, no
    /// delay cap, no deadline; only `ForceRetry` is retryable
    pub fn new() -> Self {
        Self {
            sleep: thread_sleep(),
            max_tries: UNLIMITED_TRIES,
            delay: Duration::from_millis(10),
            backoff: 2,
            max_jitter: 0.1,
            max_delay: UNLIMITED_DELAY,
            deadline: UNLIMITED_DEADLINE,
            retryable: vec![Arc::new(|e: &LoggerError| matches!(e, LoggerError::ForceRetry))],
            exhaustion: ExhaustionMode::default(),
        }
    }

    #[must_use]
    pub fn with_sleep(mut self, sleep: SleepFn) -> Self {
        self.sleep = sleep;
        self
    }

    #[must_use]
    pub fn with_max_tries(mut self, max_tries: u32) -> Self {
        self.max_tries = max_tries;
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: u32) -> Self {
        self.backoff = backoff;
        self
    }

    /// Fraction in `[0, 1]`; values outside are clamped
    #[must_use]
    pub fn with_max_jitter(mut self, max_jitter: f64) -> Self {
        self.max_jitter = max_jitter.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    #[must_use]
    pub fn with_exhaustion_mode(mut self, mode: ExhaustionMode) -> Self {
        self.exhaustion = mode;
        self
    }

    /// Also retry errors matching `predicate`
    #[must_use]
    pub fn on_error<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&LoggerError) -> bool + Send + Sync + 'static,
    {
        self.retryable.push(Arc::new(predicate));
        self
    }

    pub fn max_tries(&self) -> u32 {
        self.max_tries
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn is_retryable(&self, error: &LoggerError) -> bool {
        self.retryable.iter().any(|p| p(error))
    }

    fn jitter_delay(&self, delay: Duration) -> Duration {
        if self.max_jitter <= 0.0 {
            return delay;
        }
        let jitter = rand::thread_rng().gen_range(0.0..=self.max_jitter);
        Duration::try_from_secs_f64(delay.as_secs_f64() * (1.0 + jitter)).unwrap_or(delay)
    }

    fn backoff_delay(&self, delay: Duration) -> Duration {
        delay
            .checked_mul(self.backoff)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    fn exhausted(&self, attempts: u32, last: LoggerError) -> LoggerError {
        match self.exhaustion {
            ExhaustionMode::Generic => LoggerError::RetryFailed,
            ExhaustionMode::PreserveLast => LoggerError::retry_exhausted(attempts, last),
        }
    }
}

impl Default for ErrorRetry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ErrorRetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorRetry")
            .field("max_tries", &self.max_tries)
            .field("delay", &self.delay)
            .field("backoff", &self.backoff)
            .field("max_jitter", &self.max_jitter)
            .field("max_delay", &self.max_delay)
            .field("deadline", &self.deadline)
            .field("retryable", &self.retryable.len())
            .field("exhaustion", &self.exhaustion)
            .finish()
    }
}

impl Retry for ErrorRetry {
    fn run(&self, operation: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        let start = Instant::now();
        let mut delay = self.delay;
        let mut attempts: u32 = 0;
        loop {
            attempts = attempts.saturating_add(1);
            let err = match operation() {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };
            if !self.is_retryable(&err) {
                return Err(err);
            }
            if self.max_tries != UNLIMITED_TRIES && attempts >= self.max_tries {
                return Err(self.exhausted(attempts, err));
            }
            let sleep_time = self.jitter_delay(delay);
            if self.deadline != UNLIMITED_DEADLINE
                && start.elapsed().saturating_add(sleep_time) >= self.deadline
            {
                return Err(self.exhausted(attempts, err));
            }
            (self.sleep)(sleep_time);
            delay = self.backoff_delay(delay);
        }
    }
}
