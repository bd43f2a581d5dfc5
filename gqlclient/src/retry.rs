//! Unauthorized-retry bookkeeping.
//!
//! A `401` clears the cached token and resubmits the same request, up to
//! `max_retries` times. Past the ceiling the call fails with
//! [`GraphQLError::RetryExhausted`](crate::GraphQLError::RetryExhausted) and
//! no further request is sent.

use parking_lot::Mutex;
use std::str::FromStr;

use crate::GraphQLError;

/// Default number of resubmissions after a `401`.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Who shares a retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryScope {
    /// Every call gets its own budget of `max_retries`.
    #[default]
    PerCall,
    /// All calls on one client draw from a single counter, which only resets
    /// when some call exhausts it.
    Shared,
}

impl FromStr for RetryScope {
    type Err = GraphQLError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "per-call" | "per_call" | "percall" | "call" => Ok(Self::PerCall),
            "shared" | "client" => Ok(Self::Shared),
            other => Err(GraphQLError::Config(format!("unknown retry scope: {other}"))),
        }
    }
}

/// Outcome of recording a `401`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RetryDecision {
    /// Resubmit; `retry` is the 1-based count against the ceiling.
    Retry { retry: u32 },
    /// Ceiling exceeded. `retries` is how many resubmissions this call made.
    Exhausted { retries: u32 },
}

/// Retry state for one client.
#[derive(Debug)]
pub(crate) struct RetryController {
    max_retries: u32,
    scope: RetryScope,
    shared: Mutex<u32>,
}

impl RetryController {
    pub(crate) fn new(max_retries: u32, scope: RetryScope) -> Self {
        Self {
            max_retries,
            scope,
            shared: Mutex::new(0),
        }
    }

    /// Record an unauthorized response for a call that has made `*call_retries` resubmissions so far.
    pub(crate) fn on_unauthorized(&self, call_retries: &mut u32) -> RetryDecision {
        let made = *call_retries;
        let count = match self.scope {
            RetryScope::PerCall => made + 1,
            RetryScope::Shared => {
                // Increment, check and reset under one lock.
                let mut shared = self.shared.lock();
                *shared += 1;
                if *shared > self.max_retries {
                    *shared = 0;
                    return RetryDecision::Exhausted { retries: made };
                }
                *shared
            }
        };

        if count > self.max_retries {
            return RetryDecision::Exhausted { retries: made };
        }
        *call_retries = made + 1;
        RetryDecision::Retry { retry: count }
    }

    /// Current value of the shared counter (always 0 in per-call scope).
    pub(crate) fn shared_count(&self) -> u32 {
        *self.shared.lock()
    }

    pub(crate) fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub(crate) fn scope(&self) -> RetryScope {
        self.scope
    }
}
