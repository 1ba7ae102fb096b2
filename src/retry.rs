/*
 *  retry.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Bounded retry with exponential backoff for network calls
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::fmt;
use std::time::Duration;

use log::warn;
use thiserror::Error;

/// Errors that may clear up if the call is simply made again
pub trait Transient {
    fn is_transient(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RetryPolicyError {
    #[error("Retry backoff must be greater than 1, got {0}")]
    Backoff(f64),

    #[error("Retry wait must be greater than 0, got {0}")]
    Wait(f64),
}

/// How many times to try, how long to wait first, how fast the wait grows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    attempts: u32,
    wait: Duration,
    backoff: f64,
}

impl RetryPolicy {
    pub fn new(attempts: u32, wait_secs: f64, backoff: f64) -> Result<Self, RetryPolicyError> {
        if backoff.is_nan() || backoff <= 1.0 {
            return Err(RetryPolicyError::Backoff(backoff));
        }
        if !wait_secs.is_finite() || wait_secs <= 0.0 {
            return Err(RetryPolicyError::Wait(wait_secs));
        }
        Ok(Self {
            attempts,
            wait: Duration::from_secs_f64(wait_secs),
            backoff,
        })
    }

    /// Total number of tries, never less than one
    pub fn tries(&self) -> u32 {
        self.attempts.max(1)
    }
}

impl fmt::Display for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tries, {:.1}s wait, x{} backoff",
            self.tries(),
            self.wait.as_secs_f64(),
            self.backoff
        )
    }
}

/// Retry bookkeeping for one logical call
#[derive(Debug)]
struct Retry<'a> {
    what: &'a str,
    tries: u32,
    attempt: u32,
    wait: Duration,
    backoff: f64,
}

impl<'a> Retry<'a> {
    fn new(policy: &RetryPolicy, what: &'a str) -> Self {
        Retry {
            what,
            tries: policy.tries(),
            attempt: 1,
            wait: policy.wait,
            backoff: policy.backoff,
        }
    }

    /// Sleeps and returns `Ok` when another try is due, hands the error
    /// back when it is not transient or the tries are used up. The sleep
    /// runs to completion; shutdown is noticed by the caller afterwards.
    async fn failed<E>(&mut self, err: E) -> Result<(), E>
    where
        E: Transient + fmt::Display,
    {
        if !err.is_transient() || self.attempt >= self.tries {
            return Err(err);
        }
        warn!(
            "{} failed (attempt {}/{}): {}; retrying in {:.1}s",
            self.what,
            self.attempt,
            self.tries,
            err,
            self.wait.as_secs_f64()
        );
        tokio::time::sleep(self.wait).await;
        self.wait = self.wait.mul_f64(self.backoff);
        self.attempt += 1;
        Ok(())
    }
}

/// Run `operation` until it succeeds, fails for good or runs out of tries.
///
/// Only transient errors are retried. The operation may borrow mutably
/// from its surroundings, e.g. `async || client.poll().await`.
pub async fn call_with_retry<T, E, F>(what: &str, policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    E: Transient + fmt::Display,
    F: AsyncFnMut() -> Result<T, E>,
{
    let mut retry = Retry::new(policy, what);
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => retry.failed(err).await?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Flaky(u32),
        Fatal,
    }

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl Transient for TestError {
        fn is_transient(&self) -> bool {
            matches!(self, TestError::Flaky(_))
        }
    }

    #[test]
    fn test_policy_validation() {
        assert_eq!(RetryPolicy::new(3, 3.0, 1.0), Err(RetryPolicyError::Backoff(1.0)));
        assert_eq!(RetryPolicy::new(3, 0.0, 2.0), Err(RetryPolicyError::Wait(0.0)));
        assert!(RetryPolicy::new(0, 1.0, 2.0).is_ok());
    }

    #[test]
    fn test_tries_never_zero() {
        let once = RetryPolicy::new(0, 1.0, 2.0).unwrap();
        assert_eq!(once.tries(), 1);
        assert_eq!(once.to_string(), "1 tries, 1.0s wait, x2 backoff");
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let policy = RetryPolicy::new(3, 0.001, 2.0).unwrap();
        let calls = Cell::new(0);
        let result = call_with_retry("poll", &policy, || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move { if n < 3 { Err(TestError::Flaky(n)) } else { Ok(n) } }
        })
        .await;
        assert_eq!(result, Ok(3));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_gives_last_error_when_exhausted() {
        let policy = RetryPolicy::new(2, 0.001, 2.0).unwrap();
        let calls = Cell::new(0);
        let result: Result<(), _> = call_with_retry("poll", &policy, || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move { Err(TestError::Flaky(n)) }
        })
        .await;
        assert_eq!(result, Err(TestError::Flaky(2)));
    }

    #[tokio::test]
    async fn test_fatal_errors_not_retried() {
        let policy = RetryPolicy::new(5, 0.001, 2.0).unwrap();
        let calls = Cell::new(0);
        let result: Result<(), _> = call_with_retry("flush", &policy, || {
            calls.set(calls.get() + 1);
            async { Err(TestError::Fatal) }
        })
        .await;
        assert_eq!(result, Err(TestError::Fatal));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_operation_may_borrow_mutably() {
        let policy = RetryPolicy::new(3, 0.001, 2.0).unwrap();
        let mut log: Vec<u32> = Vec::new();
        let result = call_with_retry("flush", &policy, async || {
            log.push(log.len() as u32);
            if log.len() < 2 { Err(TestError::Flaky(1)) } else { Ok(log.len()) }
        })
        .await;
        assert_eq!(result, Ok(2));
        assert_eq!(log, vec![0, 1]);
    }
}
