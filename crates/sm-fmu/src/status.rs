//! Interpretation of native call statuses.
//!
//! Every native call reports a [`Status`]. The [`StatusGovernor`] turns it into
//! proceed / warn / fail, and polls the instance while a call is pending.

use crate::error::{FmuError, FmuResult};
use crate::slave::Slave;
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// No call has been made yet.
    None,
    Ok,
    Warning,
    Discard,
    Error,
    Fatal,
    Pending,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::None => "None",
            Status::Ok => "OK",
            Status::Warning => "Warning",
            Status::Discard => "Discard",
            Status::Error => "Error",
            Status::Fatal => "Fatal",
            Status::Pending => "Pending",
        }
    }

    pub fn is_ok(self) -> bool {
        matches!(self, Status::Ok | Status::None | Status::Warning)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of native call, used when querying a pending status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Setup,
    Read,
    Write,
    DoStep,
}

/// Poll cadence and deadline for pending calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PendingPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            timeout: Duration::from_secs(10),
        }
    }
}

impl PendingPolicy {
    pub fn from_millis(interval_ms: u64, timeout_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

/// Call `probe` until it yields a value or the policy deadline passes.
///
/// The first probe happens immediately. Sleeps never overshoot the deadline.
pub fn poll_until<T>(policy: &PendingPolicy, mut probe: impl FnMut() -> Option<T>) -> Option<T> {
    let deadline = Instant::now() + policy.timeout;
    loop {
        if let Some(value) = probe() {
            return Some(value);
        }
        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        std::thread::sleep(policy.interval.min(deadline - now));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatusGovernor {
    policy: PendingPolicy,
}

impl StatusGovernor {
    pub fn new(policy: PendingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PendingPolicy {
        &self.policy
    }

    /// Decide whether execution may continue after a native call.
    ///
    /// `slave` is the instance the call was made on; without one a pending
    /// status cannot be polled and is let through with a warning.
    pub fn check(
        &self,
        status: Status,
        slave: Option<&mut (dyn Slave + '_)>,
        kind: CallKind,
        context: &str,
    ) -> FmuResult<()> {
        match status {
            Status::Ok | Status::None => Ok(()),
            Status::Warning => {
                tracing::warn!("Received status 'Warning' - {context}");
                Ok(())
            }
            Status::Discard | Status::Error | Status::Fatal => Err(FmuError::NativeCallFailed {
                status,
                context: context.to_string(),
            }),
            Status::Pending => {
                let Some(slave) = slave else {
                    tracing::warn!("Received status 'Pending' without a running instance - {context}");
                    return Ok(());
                };
                tracing::debug!(?kind, "call pending, polling - {context}");
                let resolved = poll_until(&self.policy, || {
                    let current = slave.status(kind);
                    (current != Status::Pending).then_some(current)
                });
                match resolved {
                    Some(final_status) => self.check(final_status, None, kind, context),
                    None => Err(FmuError::PendingTimeout {
                        context: context.to_string(),
                        waited: self.policy.timeout,
                    }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        let governor = StatusGovernor::default();
        assert!(governor.check(Status::Ok, None, CallKind::Read, "r").is_ok());
        assert!(governor.check(Status::None, None, CallKind::Read, "r").is_ok());
        assert!(governor.check(Status::Warning, None, CallKind::Read, "r").is_ok());
        for status in [Status::Discard, Status::Error, Status::Fatal] {
            let err = governor.check(status, None, CallKind::DoStep, "step").unwrap_err();
            assert_eq!(
                err,
                FmuError::NativeCallFailed {
                    status,
                    context: "step".to_string()
                }
            );
        }
    }

    #[test]
    fn pending_without_instance_proceeds() {
        let governor = StatusGovernor::default();
        assert!(governor.check(Status::Pending, None, CallKind::DoStep, "s").is_ok());
    }

    #[test]
    fn poll_until_gives_up_at_deadline() {
        let policy = PendingPolicy::from_millis(1, 20);
        let started = Instant::now();
        let mut calls = 0;
        let result: Option<()> = poll_until(&policy, || {
            calls += 1;
            None
        });
        assert!(result.is_none());
        assert!(calls >= 2);
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn poll_until_returns_first_success() {
        let policy = PendingPolicy::from_millis(1, 1000);
        let mut calls = 0;
        let result = poll_until(&policy, || {
            calls += 1;
            (calls == 3).then_some(calls)
        });
        assert_eq!(result, Some(3));
    }
}
