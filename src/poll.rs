use crate::config::PollConfig;
use crate::source::SensorSource;
use crate::types::AllSensors;
use crate::{LoomoError, Result};
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Handle to a background sensor polling thread.
///
/// The thread captures an [`AllSensors`] snapshot every `interval`. Failed
/// captures are logged and counted; polling continues on the next tick.
pub struct SensorPoller {
    receiver: Receiver<AllSensors>,
    stop_flag: Arc<AtomicBool>,
    failures: Arc<AtomicU64>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl SensorPoller {
    /// Start polling `source` on a dedicated thread.
    pub fn start<S>(source: S, config: PollConfig) -> Result<SensorPoller>
    where
        S: SensorSource + Send + 'static,
    {
        let (sender, receiver) = crossbeam_channel::bounded(config.capacity.max(1));
        let stop_flag = Arc::new(AtomicBool::new(false));
        let failures = Arc::new(AtomicU64::new(0));
        let stop_clone = stop_flag.clone();
        let failures_clone = failures.clone();

        let thread = std::thread::Builder::new()
            .name("loomo-sensors".into())
            .spawn(move || {
                poll_loop(source, config.interval, sender, stop_clone, failures_clone);
            })
            .map_err(LoomoError::Spawn)?;

        Ok(SensorPoller {
            receiver,
            stop_flag,
            failures,
            thread: Some(thread),
        })
    }

    /// Receive the next snapshot (blocks until available).
    pub fn recv(&self) -> Result<AllSensors> {
        self.receiver.recv().map_err(|_| LoomoError::StreamStopped)
    }

    /// Try to receive a snapshot without blocking.
    pub fn try_recv(&self) -> Option<AllSensors> {
        self.receiver.try_recv().ok()
    }

    /// Receive a snapshot with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<AllSensors> {
        self.receiver.recv_timeout(timeout).map_err(|e| match e {
            crossbeam_channel::RecvTimeoutError::Timeout => LoomoError::Timeout,
            crossbeam_channel::RecvTimeoutError::Disconnected => LoomoError::StreamStopped,
        })
    }

    /// Number of captures that failed so far.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn is_active(&self) -> bool {
        !self.stop_flag.load(Ordering::Relaxed)
    }

    /// Stop polling and wait for the thread to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for SensorPoller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn poll_loop<S: SensorSource>(
    source: S,
    interval: Duration,
    sender: Sender<AllSensors>,
    stop_flag: Arc<AtomicBool>,
    failures: Arc<AtomicU64>,
) {
    log::info!("Sensor poller started (interval {:?})", interval);

    loop {
        if stop_flag.load(Ordering::Relaxed) {
            log::info!("Sensor poller stopping (stop flag set)");
            break;
        }

        let started = Instant::now();
        match AllSensors::capture(&source) {
            Ok(sensors) => {
                if let Err(e) = sender.try_send(sensors) {
                    match e {
                        crossbeam_channel::TrySendError::Full(_) => {
                            log::trace!("Sensor channel full, dropping snapshot");
                        }
                        crossbeam_channel::TrySendError::Disconnected(_) => {
                            log::info!("Sensor channel disconnected, stopping poller");
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                failures.fetch_add(1, Ordering::Relaxed);
                log::warn!("Sensor capture failed: {}", e);
            }
        }

        if let Some(rest) = interval.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }
}
