//! Kernel disk loading.
//!
//! Extended (LBA) addressing is the primary strategy; legacy CHS is the
//! last-ditch path. There is no third strategy: if both fail the boot is
//! over and the caller reports the last firmware status.

use crate::bios::{DiskStatus, FirmwareServices, disk_status};
use crate::consts::{
    KERNEL_LBA, KERNEL_SECTORS, KERNEL_TEMP_ADDR, MAX_READ_RETRIES, SECTOR_SIZE,
};
use crate::error::{BootError, record_firmware_error};
use crate::layout;

/// Sectors per track assumed for the CHS fallback geometry.
pub const CHS_SECTORS_PER_TRACK: u32 = 63;

/// Heads per cylinder assumed for the CHS fallback geometry.
pub const CHS_HEADS: u32 = 16;

/// Hardware limit on sectors per legacy read call.
pub const CHS_MAX_SECTORS_PER_READ: u16 = 63;

/// INT 13h AH=42h disk address packet. Built fresh before every
/// extended read; the firmware reads it from DS:SI.
#[derive(Clone, Copy)]
#[repr(C, packed)]
pub struct DiskAddressPacket {
    size: u8,
    reserved: u8,
    sectors: u16,
    buffer_offset: u16,
    buffer_segment: u16,
    start_lba: u64,
}

impl DiskAddressPacket {
    pub fn new(start_lba: u64, sectors: u16, buffer: u32) -> Self {
        Self {
            size: core::mem::size_of::<Self>() as u8,
            reserved: 0,
            sectors,
            buffer_offset: (buffer & 0xF) as u16,
            buffer_segment: (buffer >> 4) as u16,
            start_lba,
        }
    }

    pub fn sectors(&self) -> u16 {
        self.sectors
    }

    pub fn start_lba(&self) -> u64 {
        self.start_lba
    }

    pub fn buffer_segment(&self) -> u16 {
        self.buffer_segment
    }

    pub fn buffer_offset(&self) -> u16 {
        self.buffer_offset
    }

    pub fn size(&self) -> u8 {
        self.size
    }
}

/// Disk sector address in legacy cylinder/head/sector form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CylinderHeadSector {
    pub cylinder: u16,
    pub head: u8,
    pub sector: u8,
}

impl CylinderHeadSector {
    /// Convert an LBA using the standard 63x16 geometry assumption.
    pub fn from_lba(lba: u32) -> Self {
        let per_cylinder = CHS_SECTORS_PER_TRACK * CHS_HEADS;
        Self {
            cylinder: (lba / per_cylinder) as u16,
            head: ((lba % per_cylinder) / CHS_SECTORS_PER_TRACK) as u8,
            sector: ((lba % CHS_SECTORS_PER_TRACK) + 1) as u8,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.cylinder <= 1023 && self.sector >= 1 && self.sector <= 63
    }
}

/// Where a successful load ended up and how much actually arrived.
/// The CHS path can deliver fewer sectors than requested; relocation
/// and verification are sized by this count, never the request.
#[derive(Debug, Clone, Copy)]
pub struct LoadedImage {
    pub addr: u32,
    pub sectors: u16,
}

impl LoadedImage {
    pub fn len(&self) -> usize {
        self.sectors as usize * SECTOR_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.sectors == 0
    }

    /// View of the loaded bytes.
    ///
    /// # Safety
    ///
    /// Valid only in flat address space with the image actually loaded
    /// at `addr`.
    pub unsafe fn as_slice(&self) -> &'static [u8] {
        core::slice::from_raw_parts(self.addr as usize as *const u8, self.len())
    }
}

/// Status codes that make another attempt on the same path pointless.
fn non_retryable(status: u8) -> bool {
    matches!(
        status,
        disk_status::INVALID_COMMAND | disk_status::UNSUPPORTED_TRACK
    )
}

/// Loads the kernel image from the boot drive.
pub struct DiskLoader<'a, F: FirmwareServices> {
    firmware: &'a mut F,
    drive: u8,
}

impl<'a, F: FirmwareServices> DiskLoader<'a, F> {
    pub fn new(firmware: &'a mut F, drive: u8) -> Self {
        Self { firmware, drive }
    }

    /// Load the kernel image into its staging area.
    pub fn load_kernel(&mut self) -> Result<LoadedImage, BootError> {
        layout::assert_owned_write(
            &layout::KERNEL_TEMP,
            KERNEL_TEMP_ADDR as u64,
            KERNEL_SECTORS as u64 * SECTOR_SIZE as u64,
        );
        self.load(KERNEL_LBA, KERNEL_SECTORS, KERNEL_TEMP_ADDR)
    }

    /// Load `sectors` sectors starting at `lba` into `dest`, applying
    /// the full retry and fallback policy.
    pub fn load(&mut self, lba: u64, sectors: u16, dest: u32) -> Result<LoadedImage, BootError> {
        match self.load_extended(lba, sectors, dest) {
            Ok(image) => return Ok(image),
            Err(status) => {
                log::warn!("extended read failed (status {:#04x}), falling back to CHS", status);
            }
        }

        self.load_legacy(lba, sectors, dest)
            .map_err(BootError::DiskExhausted)
    }

    /// Extended-read path: up to `MAX_READ_RETRIES` attempts with a
    /// drive reset before each retry. Non-retryable statuses escalate
    /// immediately.
    fn load_extended(&mut self, lba: u64, sectors: u16, dest: u32) -> Result<LoadedImage, u8> {
        let mut last_status = 0u8;

        for attempt in 0..MAX_READ_RETRIES {
            if attempt > 0 {
                let _ = self.firmware.disk_reset(self.drive);
            }

            let dap = DiskAddressPacket::new(lba, sectors, dest);
            let status = self.firmware.disk_read_ext(self.drive, &dap);
            if status.is_ok() {
                return Ok(LoadedImage { addr: dest, sectors });
            }

            last_status = status.status;
            record_firmware_error(status.status, attempt + 1);

            if non_retryable(status.status) {
                return Err(status.status);
            }
        }

        Err(last_status)
    }

    /// Legacy path: one clamped CHS read, no further fallback.
    fn load_legacy(&mut self, lba: u64, sectors: u16, dest: u32) -> Result<LoadedImage, u8> {
        let chs = CylinderHeadSector::from_lba(lba as u32);
        let count = sectors.min(CHS_MAX_SECTORS_PER_READ);

        let status = self.firmware.disk_read_chs(self.drive, chs, count as u8, dest);
        if status.is_ok() {
            if count < sectors {
                log::warn!("CHS fallback delivered {} of {} sectors", count, sectors);
            }
            return Ok(LoadedImage { addr: dest, sectors: count });
        }

        record_firmware_error(status.status, 0);
        Err(status.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bios::{E801Sizes, E820Response};

    struct ScriptedDisk {
        ext_results: std::vec::Vec<DiskStatus>,
        chs_result: DiskStatus,
        ext_calls: usize,
        chs_calls: usize,
        resets: usize,
    }

    impl ScriptedDisk {
        fn new(ext_results: std::vec::Vec<DiskStatus>, chs_result: DiskStatus) -> Self {
            Self { ext_results, chs_result, ext_calls: 0, chs_calls: 0, resets: 0 }
        }
    }

    impl FirmwareServices for ScriptedDisk {
        fn disk_read_ext(&mut self, _drive: u8, _dap: &DiskAddressPacket) -> DiskStatus {
            let result = self.ext_results[self.ext_calls.min(self.ext_results.len() - 1)];
            self.ext_calls += 1;
            result
        }

        fn disk_read_chs(
            &mut self,
            _drive: u8,
            _chs: CylinderHeadSector,
            _sectors: u8,
            _buffer: u32,
        ) -> DiskStatus {
            self.chs_calls += 1;
            self.chs_result
        }

        fn disk_reset(&mut self, _drive: u8) -> DiskStatus {
            self.resets += 1;
            DiskStatus::ok()
        }

        fn e820_next(&mut self, _continuation: u32) -> E820Response {
            E820Response::Failed
        }

        fn e801_sizes(&mut self) -> Option<E801Sizes> {
            None
        }

        fn legacy_extended_kib(&mut self) -> Option<u16> {
            None
        }

        fn enable_a20_gate(&mut self) -> bool {
            false
        }

        fn teletype(&mut self, _ch: u8) {}
    }

    #[test]
    fn test_dap_layout() {
        let dap = DiskAddressPacket::new(66, 120, 0x2_0000);
        assert_eq!(core::mem::size_of::<DiskAddressPacket>(), 16);
        assert_eq!(dap.size(), 16);
        assert_eq!(dap.sectors(), 120);
        assert_eq!(dap.start_lba(), 66);
        assert_eq!(dap.buffer_segment(), 0x2000);
        assert_eq!(dap.buffer_offset(), 0);
    }

    #[test]
    fn test_lba_to_chs_conversion() {
        // LBA 0 = first sector of the first track.
        let chs = CylinderHeadSector::from_lba(0);
        assert_eq!(chs, CylinderHeadSector { cylinder: 0, head: 0, sector: 1 });

        // LBA 63 rolls over to the next head.
        let chs = CylinderHeadSector::from_lba(63);
        assert_eq!(chs, CylinderHeadSector { cylinder: 0, head: 1, sector: 1 });

        // One full cylinder is 63 * 16 sectors.
        let chs = CylinderHeadSector::from_lba(63 * 16);
        assert_eq!(chs, CylinderHeadSector { cylinder: 1, head: 0, sector: 1 });

        // Kernel start sector.
        let chs = CylinderHeadSector::from_lba(66);
        assert_eq!(chs, CylinderHeadSector { cylinder: 0, head: 1, sector: 4 });
        assert!(chs.is_valid());
    }

    #[test]
    fn test_first_read_success_uses_no_fallback() {
        let mut firmware = ScriptedDisk::new(vec![DiskStatus::ok()], DiskStatus::ok());
        let image = DiskLoader::new(&mut firmware, 0x80)
            .load(66, 120, 0x2_0000)
            .unwrap();

        assert_eq!(image.sectors, 120);
        assert_eq!(image.addr, 0x2_0000);
        assert_eq!(firmware.ext_calls, 1);
        assert_eq!(firmware.resets, 0);
        assert_eq!(firmware.chs_calls, 0);
    }

    #[test]
    fn test_transient_errors_retry_then_fall_back() {
        let mut firmware = ScriptedDisk::new(
            vec![DiskStatus::error(0x04); 3],
            DiskStatus::ok(),
        );
        let image = DiskLoader::new(&mut firmware, 0x80)
            .load(66, 120, 0x2_0000)
            .unwrap();

        // Three attempts, a reset before each retry, then one CHS read.
        assert_eq!(firmware.ext_calls, 3);
        assert_eq!(firmware.resets, 2);
        assert_eq!(firmware.chs_calls, 1);
        // The CHS read is clamped to the 63-sector hardware limit.
        assert_eq!(image.sectors, 63);
    }

    #[test]
    fn test_non_retryable_status_escalates_immediately() {
        for status in [disk_status::INVALID_COMMAND, disk_status::UNSUPPORTED_TRACK] {
            let mut firmware =
                ScriptedDisk::new(vec![DiskStatus::error(status)], DiskStatus::ok());
            DiskLoader::new(&mut firmware, 0x80)
                .load(66, 120, 0x2_0000)
                .unwrap();

            assert_eq!(firmware.ext_calls, 1, "status {:#04x}", status);
            assert_eq!(firmware.resets, 0, "status {:#04x}", status);
            assert_eq!(firmware.chs_calls, 1, "status {:#04x}", status);
        }
    }

    #[test]
    fn test_both_paths_failing_is_fatal_with_last_status() {
        let mut firmware = ScriptedDisk::new(
            vec![DiskStatus::error(0x04)],
            DiskStatus::error(0x20),
        );
        let result = DiskLoader::new(&mut firmware, 0x80).load(66, 120, 0x2_0000);

        assert_eq!(result.unwrap_err(), BootError::DiskExhausted(0x20));
    }

    #[test]
    fn test_small_reads_are_not_clamped() {
        let mut firmware = ScriptedDisk::new(
            vec![DiskStatus::error(disk_status::INVALID_COMMAND)],
            DiskStatus::ok(),
        );
        let image = DiskLoader::new(&mut firmware, 0x80)
            .load(1, 16, 0x2_0000)
            .unwrap();
        assert_eq!(image.sectors, 16);
    }
}
