//! Convergence wait.
//!
//! After the initial policy fires, the scaling group starts building
//! servers. We poll its state until nothing is pending. A group that settles
//! with zero active servers means every build failed (typically an oversized
//! personality or a bad image), which is an error.

use std::cell::Cell;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::core::domain::{GroupState, ScalingGroup};
use crate::core::provider::CloudProvider;
use crate::error::{ConvergenceError, Result};

/// How often and how long to poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    /// Delay before the second poll
    pub interval: Duration,
    /// Give up after this long; `None` waits forever
    pub timeout: Option<Duration>,
    /// Interval multiplier applied after every poll (1.0 keeps it fixed)
    pub backoff: f64,
    /// Upper bound on the interval
    pub max_interval: Duration,
}

impl PollPolicy {
    /// Fixed-interval polling.
    pub fn fixed(interval: Duration, timeout: Option<Duration>) -> Self {
        Self {
            interval,
            timeout,
            backoff: 1.0,
            max_interval: interval,
        }
    }

    fn next_interval(&self, current: Duration) -> Duration {
        Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff)
            .map_or(self.max_interval, |next| next.min(self.max_interval))
    }
}

/// Source of time for the poll loop.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock that only advances when slept on.
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    offset: Cell<Duration>,
    sleeps: Cell<u32>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Cell::new(Duration::ZERO),
            sleeps: Cell::new(0),
        }
    }

    /// Total time slept so far.
    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }

    /// Number of sleeps so far.
    pub fn sleeps(&self) -> u32 {
        self.sleeps.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + self.offset.get()
    }

    fn sleep(&self, duration: Duration) {
        self.offset.set(self.offset.get() + duration);
        self.sleeps.set(self.sleeps.get() + 1);
    }
}

/// Outcome of a successful wait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Converged {
    pub state: GroupState,
    pub polls: u32,
    #[serde(rename = "elapsed_secs", serialize_with = "as_secs")]
    pub elapsed: Duration,
}

fn as_secs<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}

/// Poll `group` until its pending capacity reaches zero.
///
/// # Errors
///
/// - `ConvergenceError::NoActiveCapacity` if it settles with no active servers
/// - `ConvergenceError::TimedOut` if the policy's timeout elapses first
/// - any provider error from the state query
pub fn wait_for_convergence(
    provider: &dyn CloudProvider,
    group: &ScalingGroup,
    policy: &PollPolicy,
    clock: &dyn Clock,
) -> Result<Converged> {
    let start = clock.now();
    let mut interval = policy.interval;
    let mut polls = 0;

    loop {
        let state = provider.group_state(&group.id)?;
        polls += 1;
        let elapsed = clock.now().duration_since(start);
        info!(
            group = %group.name,
            active = state.active_capacity,
            pending = state.pending_capacity,
            desired = state.desired_capacity,
            poll = polls,
            "scaling group state"
        );

        if state.pending_capacity == 0 {
            if state.active_capacity == 0 {
                return Err(ConvergenceError::NoActiveCapacity {
                    group: group.name.clone(),
                }
                .into());
            }
            return Ok(Converged {
                state,
                polls,
                elapsed,
            });
        }

        if let Some(timeout) = policy.timeout {
            if elapsed >= timeout {
                return Err(ConvergenceError::TimedOut {
                    group: group.name.clone(),
                    elapsed,
                    pending: state.pending_capacity,
                }
                .into());
            }
        }

        debug!(sleep_secs = interval.as_secs_f64(), "waiting for convergence");
        clock.sleep(interval);
        interval = policy.next_interval(interval);
    }
}
