//! Service binding state and retry policy.
//!
//! The vendor services report binding through `onBind` / `onUnbind(reason)`
//! callbacks. [`BindListener`] is handed to those callbacks; [`Binding`] is the
//! side callers block on until the service is ready. Hooks registered with
//! [`Binding::watch_unbind`] run on the callback thread when the service goes away.

use crate::config::{
    read_env_u64, ENV_BIND_ATTEMPTS, ENV_BIND_DELAY_MS, ENV_BIND_MAX_DELAY_MS,
};
use crate::{LoomoError, Result};
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Runs with the unbind reason; returning `false` unregisters the hook.
pub type UnbindHook = Box<dyn FnMut(&str) -> bool + Send + 'static>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum BindEvent {
    Bound,
    Unbound(String),
}

/// Callback side of a service binding.
#[derive(Clone)]
pub struct BindListener {
    name: Arc<str>,
    sender: Sender<BindEvent>,
    bound: Arc<AtomicBool>,
    hooks: Arc<Mutex<Vec<UnbindHook>>>,
}

impl BindListener {
    pub fn on_bind(&self) {
        log::info!("{} service bound", self.name);
        self.bound.store(true, Ordering::Release);
        let _ = self.sender.send(BindEvent::Bound);
    }

    pub fn on_unbind(&self, reason: &str) {
        log::info!("{} service unbound: {}", self.name, reason);
        self.bound.store(false, Ordering::Release);
        if let Ok(mut hooks) = self.hooks.lock() {
            hooks.retain_mut(|hook| hook(reason));
        }
        let _ = self.sender.send(BindEvent::Unbound(reason.to_string()));
    }
}

/// Awaitable side of a service binding.
pub struct Binding {
    name: Arc<str>,
    receiver: Receiver<BindEvent>,
    bound: Arc<AtomicBool>,
    hooks: Arc<Mutex<Vec<UnbindHook>>>,
}

impl Binding {
    /// Create a binding for the named service and the listener that resolves it.
    pub fn new(name: &str) -> (Binding, BindListener) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let name: Arc<str> = Arc::from(name);
        let bound = Arc::new(AtomicBool::new(false));
        let hooks = Arc::new(Mutex::new(Vec::new()));
        (
            Binding {
                name: name.clone(),
                receiver,
                bound: bound.clone(),
                hooks: hooks.clone(),
            },
            BindListener {
                name,
                sender,
                bound,
                hooks,
            },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_bound(&self) -> bool {
        self.bound.load(Ordering::Acquire)
    }

    /// Register `hook` to run on the next unbind.
    pub fn watch_unbind(&self, hook: UnbindHook) {
        if let Ok(mut hooks) = self.hooks.lock() {
            hooks.push(hook);
        }
    }

    /// Block until the service is bound.
    ///
    /// Returns `ServiceUnbound` if the service reports an unbind while waiting,
    /// `Timeout` if nothing happens within `timeout`. A timeout too large to
    /// represent as a deadline waits without limit.
    pub fn wait_bound(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now().checked_add(timeout);
        loop {
            if self.is_bound() {
                // Drain stale events so a later wait starts fresh.
                while self.receiver.try_recv().is_ok() {}
                return Ok(());
            }

            let event = match deadline {
                Some(deadline) => self
                    .receiver
                    .recv_timeout(deadline.saturating_duration_since(Instant::now())),
                None => self
                    .receiver
                    .recv()
                    .map_err(|_| crossbeam_channel::RecvTimeoutError::Disconnected),
            };
            match event {
                Ok(BindEvent::Bound) => continue,
                Ok(BindEvent::Unbound(reason)) => {
                    // A rebind may already be queued behind this event.
                    if self.is_bound() {
                        continue;
                    }
                    return Err(LoomoError::ServiceUnbound(format!("{}: {}", self.name, reason)));
                }
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                    return if self.is_bound() {
                        Ok(())
                    } else {
                        log::warn!("Timed out waiting for {} service to bind", self.name);
                        Err(LoomoError::Timeout)
                    };
                }
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                    return if self.is_bound() {
                        Ok(())
                    } else {
                        Err(LoomoError::ChannelDisconnected)
                    };
                }
            }
        }
    }
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 40,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            attempts: read_env_u64(ENV_BIND_ATTEMPTS, default.attempts as u64).max(1) as usize,
            initial_delay: Duration::from_millis(read_env_u64(
                ENV_BIND_DELAY_MS,
                default.initial_delay.as_millis() as u64,
            )),
            max_delay: Duration::from_millis(read_env_u64(
                ENV_BIND_MAX_DELAY_MS,
                default.max_delay.as_millis() as u64,
            )),
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: usize) -> Duration {
        let shift = retry.saturating_sub(1).min(16) as u32;
        self.initial_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts are used up. `op` receives the 1-based attempt number.
    pub fn run<T, F>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut(usize) -> Result<T>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    let delay = self.delay_for(attempt);
                    log::warn!(
                        "{} failed ({}), retry {}/{} in {:?}",
                        label,
                        e,
                        attempt,
                        attempts - 1,
                        delay
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
