//! # loomo-telemetry - sensor and camera plumbing for the Segway Loomo
//!
//! Provides:
//! - Typed snapshots of the Loomo's base and head sensors with a fixed row layout
//! - Background polling, delimited row export, and collision-free snapshot files
//! - Camera frame streams and an awaitable service binding behind injectable traits
//! - C FFI for formatting rows from JNI or C glue
//!
//! The vendor SDK sits behind [`SensorSource`] and [`CameraSource`]; this crate
//! never talks to the robot services directly.
//!
//! ## Quick Start
//! ```no_run
//! use loomo_telemetry::{AllSensors, PollConfig, RowWriter, SensorPoller, SensorSource};
//! use std::time::Duration;
//!
//! fn log_sensors<S: SensorSource + Send + 'static>(source: S) -> loomo_telemetry::Result<()> {
//!     let poller = SensorPoller::start(source, PollConfig::from_env())?;
//!     let mut out = RowWriter::new(std::io::stdout());
//!     for _ in 0..100 {
//!         let sensors: AllSensors = poller.recv_timeout(Duration::from_secs(1))?;
//!         out.write(&sensors)?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod types;
pub mod source;
pub mod aggregate;
pub mod config;
pub mod binding;
pub mod poll;
pub mod camera;
pub mod export;
pub mod snapshot;
pub mod ffi;

pub use error::LoomoError;
pub use types::*;
pub use source::SensorSource;
pub use aggregate::COLUMN_COUNT;
pub use config::PollConfig;
pub use binding::{BindListener, Binding, RetryPolicy, UnbindHook};
pub use poll::SensorPoller;
pub use camera::{start_cameras, CameraSource, CameraStreams, Frame, FrameStream, StreamType};
pub use export::RowWriter;
pub use snapshot::SnapshotDir;

/// Result type alias for loomo-telemetry operations.
pub type Result<T> = std::result::Result<T, LoomoError>;
