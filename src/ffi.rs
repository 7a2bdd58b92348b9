//! C FFI layer for loomo-telemetry.
//!
//! Lets JNI or C glue that already holds the sensor readings format them
//! with the same column layout as the Rust exporter.
//! The generated C header is written to `include/loomo_telemetry.h` by cbindgen.

use crate::aggregate::COLUMN_COUNT;
use crate::error::LastError;
use crate::export::format_line;
use crate::types::AllSensors;
use crate::LoomoError;
use std::ffi::{c_char, c_int};

/// Last error message for C consumers.
static LAST_ERROR: LastError = LastError::new();

/// Copy `line` plus a NUL terminator into `out`.
///
/// Returns the number of bytes written excluding the terminator, or -1 if
/// `cap` is too small.
unsafe fn write_c_string(line: &str, out: *mut c_char, cap: usize) -> c_int {
    let bytes = line.as_bytes();
    if out.is_null() || bytes.len() + 1 > cap {
        LAST_ERROR.set(&LoomoError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("buffer of {} bytes too small for {} bytes", cap, bytes.len() + 1),
        )));
        return -1;
    }
    std::ptr::copy_nonoverlapping(bytes.as_ptr() as *const c_char, out, bytes.len());
    out.add(bytes.len()).write(0);
    bytes.len() as c_int
}

fn delimiter_char(delimiter: c_char) -> char {
    match delimiter as u8 {
        0 => ',',
        b => b as char,
    }
}

/// Number of columns in a header or row.
#[no_mangle]
pub extern "C" fn lt_column_count() -> c_int {
    COLUMN_COUNT as c_int
}

/// Write the header row into `out` as a NUL-terminated string.
/// A `delimiter` of 0 means `,`. Returns the line length, or -1 on error.
///
/// # Safety
/// `out` must point to at least `cap` writable bytes, or be null.
#[no_mangle]
pub unsafe extern "C" fn lt_format_header(delimiter: c_char, out: *mut c_char, cap: usize) -> c_int {
    let line = format_line(&AllSensors::header()[..], delimiter_char(delimiter));
    write_c_string(&line, out, cap)
}

/// Write the row for `sensors` into `out` as a NUL-terminated string.
/// A `delimiter` of 0 means `,`. Returns the line length, or -1 on error.
///
/// # Safety
/// `sensors` must point to a valid `AllSensors`, or be null.
/// `out` must point to at least `cap` writable bytes, or be null.
#[no_mangle]
pub unsafe extern "C" fn lt_format_row(
    sensors: *const AllSensors,
    delimiter: c_char,
    out: *mut c_char,
    cap: usize,
) -> c_int {
    let Some(sensors) = sensors.as_ref() else {
        LAST_ERROR.set(&LoomoError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "sensors pointer is null",
        )));
        return -1;
    };
    let line = format_line(&sensors.to_row()[..], delimiter_char(delimiter));
    write_c_string(&line, out, cap)
}

/// Get the last error message (null-terminated). Returns NULL if no error.
/// The pointer is valid until the next failing lt_* call.
#[no_mangle]
pub extern "C" fn lt_last_error() -> *const c_char {
    LAST_ERROR.as_ptr()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn test_format_row_into_buffer() {
        let sensors = AllSensors {
            timestamp_ms: 1000,
            ..Default::default()
        };
        let mut buf = [0 as c_char; 256];
        let len = unsafe { lt_format_row(&sensors, 0, buf.as_mut_ptr(), buf.len()) };
        assert!(len > 0);

        let line = unsafe { CStr::from_ptr(buf.as_ptr()) }.to_str().unwrap();
        assert_eq!(line.len(), len as usize);
        assert!(line.starts_with("1000,0,0,0,"));
        assert_eq!(line.split(',').count(), lt_column_count() as usize);
    }

    #[test]
    fn test_format_header_too_small() {
        let mut buf = [0 as c_char; 8];
        let len = unsafe { lt_format_header(b';' as c_char, buf.as_mut_ptr(), buf.len()) };
        assert_eq!(len, -1);
        assert!(!lt_last_error().is_null());

        let mut buf = [0 as c_char; 1024];
        let len = unsafe { lt_format_header(b';' as c_char, buf.as_mut_ptr(), buf.len()) };
        assert!(len > 0);
        let line = unsafe { CStr::from_ptr(buf.as_ptr()) }.to_str().unwrap();
        assert!(line.starts_with("timeStamp;surroundings_IR_Left;"));
    }

    #[test]
    fn test_null_sensors() {
        let mut buf = [0 as c_char; 16];
        let len = unsafe { lt_format_row(std::ptr::null(), 0, buf.as_mut_ptr(), buf.len()) };
        assert_eq!(len, -1);
        assert!(!lt_last_error().is_null());
    }
}
