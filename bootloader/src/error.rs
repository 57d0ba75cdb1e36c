//! Loader error taxonomy.
//!
//! Every fatal condition has a distinct code and message so an operator
//! can tell the failure stages apart on screen. Components report
//! failure to their immediate caller through `Result`; the top-level
//! boot flow decides when a failure is terminal.

use core::fmt;

/// Boot-fatal error conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootError {
    /// Both disk strategies failed; carries the last firmware status.
    DiskExhausted(u8),

    /// No kernel signature inside the scan bound.
    SignatureNotFound,

    /// CPU does not report long-mode capability.
    LongModeUnsupported,

    /// First bytes at the final kernel address read back all-zero.
    KernelNotPresent,

    /// A20 line could not be opened by any method.
    A20Failed,

    /// Every memory probe tier refused to produce a map.
    MemoryMapError,
}

impl BootError {
    /// Error code rendered next to the message on fatal reports.
    pub fn code(&self) -> u32 {
        match self {
            BootError::DiskExhausted(status) => 0x1000 + *status as u32,
            BootError::SignatureNotFound => 0x2000,
            BootError::LongModeUnsupported => 0x3000,
            BootError::KernelNotPresent => 0x3001,
            BootError::A20Failed => 0x4000,
            BootError::MemoryMapError => 0x5000,
        }
    }

    /// Human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            BootError::DiskExhausted(_) => "Disk read failed on both LBA and CHS paths",
            BootError::SignatureNotFound => "Kernel signature not found in loaded image",
            BootError::LongModeUnsupported => "CPU does not support long mode",
            BootError::KernelNotPresent => "Kernel not loaded or invalid",
            BootError::A20Failed => "Unable to enable the A20 line",
            BootError::MemoryMapError => "Unable to build a memory map",
        }
    }
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {:#x})", self.description(), self.code())
    }
}

/// Result type used throughout the loader.
pub type Result<T = ()> = core::result::Result<T, BootError>;

/// Last firmware status and retry count, overwritten on every attempt.
/// Read only for diagnostics and the final failure report.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoaderErrorState {
    pub last_status: u8,
    pub retries: u32,
}

/// Single-writer scratch state for the failure report.
pub static LOADER_ERROR: spin::Mutex<LoaderErrorState> = spin::Mutex::new(LoaderErrorState {
    last_status: 0,
    retries: 0,
});

/// Record a firmware failure for later diagnostic display.
pub fn record_firmware_error(status: u8, retries: u32) {
    let mut state = LOADER_ERROR.lock();
    state.last_status = status;
    state.retries = retries;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_distinct() {
        let errors = [
            BootError::DiskExhausted(0),
            BootError::SignatureNotFound,
            BootError::LongModeUnsupported,
            BootError::KernelNotPresent,
            BootError::A20Failed,
            BootError::MemoryMapError,
        ];

        for (i, a) in errors.iter().enumerate() {
            for b in &errors[i + 1..] {
                assert_ne!(a.code(), b.code());
                assert_ne!(a.description(), b.description());
            }
        }
    }

    #[test]
    fn test_disk_error_carries_status() {
        assert_eq!(BootError::DiskExhausted(0x20).code(), 0x1020);
    }

    #[test]
    fn test_load_and_verify_failures_distinguishable() {
        // An operator must be able to tell a failed disk read from a
        // loaded-but-unrecognized image.
        assert_ne!(
            BootError::DiskExhausted(0).description(),
            BootError::SignatureNotFound.description()
        );
    }

    #[test]
    fn test_kernel_not_present_message() {
        assert_eq!(
            BootError::KernelNotPresent.description(),
            "Kernel not loaded or invalid"
        );
    }
}
