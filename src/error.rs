use crate::camera::StreamType;
use crate::types::SensorKind;
use std::fmt;

/// Errors that can occur when talking to the Loomo services or exporting data.
#[derive(Debug, thiserror::Error)]
pub enum LoomoError {
    #[error("Sensor unavailable: {0}")]
    SensorUnavailable(SensorKind),

    #[error("Service not bound: {0}")]
    ServiceUnbound(String),

    #[error("Already listening to {0} stream")]
    AlreadyStreaming(StreamType),

    #[error("Frame size mismatch for {stream}: expected {expected} bytes, got {actual}")]
    FrameSize {
        stream: StreamType,
        expected: usize,
        actual: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Timeout waiting for data")]
    Timeout,

    #[error("Stream stopped")]
    StreamStopped,

    #[error("Channel disconnected")]
    ChannelDisconnected,
}

impl LoomoError {
    /// Whether re-invoking the failed operation later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LoomoError::SensorUnavailable(_) | LoomoError::ServiceUnbound(_) | LoomoError::Timeout
        )
    }
}

/// Thread-safe last-error storage for the C FFI layer.
pub(crate) struct LastError {
    message: std::sync::Mutex<String>,
}

impl LastError {
    pub const fn new() -> Self {
        Self {
            message: std::sync::Mutex::new(String::new()),
        }
    }

    pub fn set(&self, err: &LoomoError) {
        if let Ok(mut msg) = self.message.lock() {
            *msg = fmt::format(format_args!("{}\0", err));
        }
    }

    pub fn as_ptr(&self) -> *const std::ffi::c_char {
        match self.message.lock() {
            Ok(msg) if !msg.is_empty() => msg.as_ptr() as *const std::ffi::c_char,
            _ => std::ptr::null(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_unavailable_message() {
        let err = LoomoError::SensorUnavailable(SensorKind::BaseTick);
        assert_eq!(err.to_string(), "Sensor unavailable: baseTick");
        assert!(err.is_retryable());
        assert!(!LoomoError::StreamStopped.is_retryable());
    }

    #[test]
    fn test_last_error_is_nul_terminated() {
        let last = LastError::new();
        assert!(last.as_ptr().is_null());

        last.set(&LoomoError::Timeout);
        let msg = unsafe { std::ffi::CStr::from_ptr(last.as_ptr()) };
        assert_eq!(msg.to_str().unwrap(), "Timeout waiting for data");
    }
}
