//! Readiness polling state machine.
//!
//! Three phases, strictly ordered: the droplet reports `active`, then SSH
//! answers, then the bootstrap sentinel appears. Each phase is a bounded
//! fixed-interval retry loop around one check function; there is no backoff
//! and no jitter. Time is injected through [`Sleeper`] so tests run
//! instantly.

use std::time::Duration;

use anyhow::Result;

use crate::assets;
use crate::error::DeployError;
use crate::provider::DropletApi;
use crate::shell::RemoteShell;

/// Injected time source.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Production sleeper, blocking the current (only) thread.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Outcome of one poll attempt.
enum Step<T> {
    /// Phase complete, yield the value.
    Advance(T),
    /// Not ready yet, sleep and try again.
    Retry,
}

/// Attempt count and spacing for one phase.
struct Budget {
    attempts: u32,
    interval: Duration,
}

const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Droplets usually activate within a minute or two; five minutes is ample.
const ACTIVE_BUDGET: Budget = Budget {
    attempts: 60,
    interval: POLL_INTERVAL,
};

const SSH_BUDGET: Budget = Budget {
    attempts: 30,
    interval: POLL_INTERVAL,
};

const BOOTSTRAP_BUDGET: Budget = Budget {
    attempts: 20,
    interval: POLL_INTERVAL,
};

/// Wait between the droplet reporting `active` and trusting its network
/// listing; addresses can lag the status flip.
const ADDRESS_GRACE: Duration = Duration::from_secs(10);

/// Head start for cloud-init before the first sentinel check.
const BOOTSTRAP_SETTLE: Duration = Duration::from_secs(30);

/// Drive one phase to completion or exhaustion. The first attempt runs
/// immediately; sleeps only separate attempts.
fn run_phase<T>(
    budget: &Budget,
    sleeper: &impl Sleeper,
    timeout_error: impl FnOnce() -> DeployError,
    mut check: impl FnMut() -> Step<T>,
) -> Result<T> {
    for attempt in 0..budget.attempts {
        if attempt > 0 {
            sleeper.sleep(budget.interval);
        }
        if let Step::Advance(value) = check() {
            return Ok(value);
        }
    }
    Err(timeout_error().into())
}

/// Phase 1: poll until the droplet is `active` and has a public IPv4
/// address, returning that address.
///
/// A transient GET failure counts as a retry, not a phase failure: the
/// droplet may be mid-provision and the API flaky for it. Once `active` is
/// seen, a short grace delay and one re-fetch precede address extraction; a
/// still-missing public entry is also a retry.
///
/// # Errors
///
/// Returns [`DeployError::ProvisioningTimeout`] when the budget is exhausted.
pub fn wait_for_active(
    api: &impl DropletApi,
    sleeper: &impl Sleeper,
    droplet_id: u64,
) -> Result<String> {
    run_phase(
        &ACTIVE_BUDGET,
        sleeper,
        || DeployError::ProvisioningTimeout,
        || {
            let Ok(droplet) = api.get_droplet(droplet_id) else {
                return Step::Retry;
            };
            if !droplet.is_active() {
                return Step::Retry;
            }
            sleeper.sleep(ADDRESS_GRACE);
            let Ok(refreshed) = api.get_droplet(droplet_id) else {
                return Step::Retry;
            };
            match refreshed.public_v4() {
                Some(address) => Step::Advance(address.to_string()),
                None => Step::Retry,
            }
        },
    )
}

/// Phase 2: poll until the host answers a trivial command over SSH.
///
/// # Errors
///
/// Returns [`DeployError::SshUnreachable`] when the budget is exhausted.
pub fn wait_for_ssh(shell: &impl RemoteShell, sleeper: &impl Sleeper, address: &str) -> Result<()> {
    run_phase(
        &SSH_BUDGET,
        sleeper,
        || DeployError::SshUnreachable,
        || match shell.run(address, "echo ok") {
            Ok(output) if output.status.success() => Step::Advance(()),
            _ => Step::Retry,
        },
    )
}

/// Phase 3: settle, then poll for the bootstrap sentinel file.
///
/// # Errors
///
/// Returns [`DeployError::BootstrapTimeout`] (naming the still-running,
/// still-billable droplet) when the budget is exhausted.
pub fn wait_for_bootstrap(
    shell: &impl RemoteShell,
    sleeper: &impl Sleeper,
    address: &str,
    droplet_id: u64,
) -> Result<()> {
    sleeper.sleep(BOOTSTRAP_SETTLE);
    let probe = format!("test -f {}", assets::SENTINEL_PATH);
    run_phase(
        &BOOTSTRAP_BUDGET,
        sleeper,
        || DeployError::BootstrapTimeout { droplet_id },
        || match shell.run(address, &probe) {
            Ok(output) if output.status.success() => Step::Advance(()),
            _ => Step::Retry,
        },
    )
}

#[cfg(test)]
pub mod test_helpers {
    use super::Sleeper;
    use std::cell::RefCell;
    use std::time::Duration;

    /// Records requested sleeps without actually sleeping.
    #[derive(Default)]
    pub struct InstantSleeper {
        pub slept: RefCell<Vec<Duration>>,
    }

    impl Sleeper for InstantSleeper {
        fn sleep(&self, duration: Duration) {
            self.slept.borrow_mut().push(duration);
        }
    }
}
