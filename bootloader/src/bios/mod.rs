//! Firmware interrupt services.
//!
//! [`FirmwareServices`] is the single seam between loader logic and the
//! BIOS. The hardware implementation issues real `int` instructions
//! through a register context; the test suites script responses behind
//! the same trait instead.

pub mod realmode;

pub use realmode::{RealModeFirmware, RealModeRegs};

use crate::disk::{CylinderHeadSector, DiskAddressPacket};

/// INT 13h status byte values the loader makes decisions on.
pub mod disk_status {
    pub const OK: u8 = 0x00;
    /// Invalid command for this drive; retrying cannot help.
    pub const INVALID_COMMAND: u8 = 0x01;
    /// Unsupported track or invalid media; retrying cannot help.
    pub const UNSUPPORTED_TRACK: u8 = 0x0C;
}

/// Outcome of an INT 13h service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskStatus {
    /// Carry flag as returned by the service.
    pub carry: bool,
    /// AH status byte as returned by the service.
    pub status: u8,
}

impl DiskStatus {
    pub const fn ok() -> Self {
        Self { carry: false, status: disk_status::OK }
    }

    pub const fn error(status: u8) -> Self {
        Self { carry: true, status }
    }

    /// A clear carry flag alone is not trusted: some firmware clears it
    /// while still reporting a non-zero sub-status.
    pub fn is_ok(&self) -> bool {
        !self.carry && self.status == disk_status::OK
    }
}

/// 24-byte entry exactly as INT 15h AX=E820h writes it.
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct RawMapEntry {
    pub base: u64,
    pub length: u64,
    pub kind: u32,
    pub attributes: u32,
}

/// One step of the E820 continuation protocol.
#[derive(Debug, Clone, Copy)]
pub enum E820Response {
    /// Firmware produced an entry and a continuation handle; a zero
    /// handle means the enumeration is complete.
    Entry { raw: RawMapEntry, next: u32 },
    /// Carry set or the "SMAP" signature missing.
    Failed,
}

/// Sizes reported by the coarse INT 15h AX=E801h interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct E801Sizes {
    /// KiB between 1 MiB and 16 MiB (at most 0x3C00).
    pub low_kib: u16,
    /// 64 KiB blocks above 16 MiB.
    pub high_blocks: u16,
}

/// The firmware services the loader consumes. One hardware
/// implementation exists; everything else is a test double.
pub trait FirmwareServices {
    /// INT 13h AH=42h extended read described by `dap`.
    fn disk_read_ext(&mut self, drive: u8, dap: &DiskAddressPacket) -> DiskStatus;

    /// INT 13h AH=02h legacy read into a low-memory buffer.
    fn disk_read_chs(
        &mut self,
        drive: u8,
        chs: CylinderHeadSector,
        sectors: u8,
        buffer: u32,
    ) -> DiskStatus;

    /// INT 13h AH=00h drive reset.
    fn disk_reset(&mut self, drive: u8) -> DiskStatus;

    /// One INT 15h AX=E820h enumeration step.
    fn e820_next(&mut self, continuation: u32) -> E820Response;

    /// INT 15h AX=E801h coarse memory sizes.
    fn e801_sizes(&mut self) -> Option<E801Sizes>;

    /// INT 15h AH=88h extended memory KiB above 1 MiB.
    fn legacy_extended_kib(&mut self) -> Option<u16>;

    /// INT 15h AX=2401h A20 gate enable.
    fn enable_a20_gate(&mut self) -> bool;

    /// INT 10h AH=0Eh teletype character output.
    fn teletype(&mut self, ch: u8);
}
