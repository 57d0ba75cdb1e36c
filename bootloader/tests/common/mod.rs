//! Scripted firmware double shared by the integration tests.
//!
//! Responses are queued per service; call counts and request shapes are
//! recorded so tests can assert on the exact firmware traffic a boot
//! path generated.

use helios_bootloader::bios::{
    DiskStatus, E801Sizes, E820Response, FirmwareServices, RawMapEntry,
};
use helios_bootloader::disk::{CylinderHeadSector, DiskAddressPacket};

#[derive(Debug, Clone, Copy)]
pub struct ExtReadRequest {
    pub lba: u64,
    pub sectors: u16,
    pub segment: u16,
    pub offset: u16,
}

#[derive(Debug, Clone, Copy)]
pub struct ChsReadRequest {
    pub chs: CylinderHeadSector,
    pub sectors: u8,
    pub buffer: u32,
}

pub struct MockFirmware {
    pub ext_results: Vec<DiskStatus>,
    pub chs_result: DiskStatus,
    pub e820_script: Vec<E820Response>,
    pub e801: Option<E801Sizes>,
    pub legacy_kib: Option<u16>,
    pub a20_supported: bool,

    pub ext_reads: Vec<ExtReadRequest>,
    pub chs_reads: Vec<ChsReadRequest>,
    pub resets: usize,
    pub e820_calls: usize,
    pub teletype_out: Vec<u8>,
}

impl Default for MockFirmware {
    fn default() -> Self {
        Self {
            ext_results: vec![DiskStatus::ok()],
            chs_result: DiskStatus::ok(),
            e820_script: vec![E820Response::Failed],
            e801: None,
            legacy_kib: None,
            a20_supported: true,
            ext_reads: Vec::new(),
            chs_reads: Vec::new(),
            resets: 0,
            e820_calls: 0,
            teletype_out: Vec::new(),
        }
    }
}

impl MockFirmware {
    pub fn entry(base: u64, length: u64, kind: u32, next: u32) -> E820Response {
        E820Response::Entry {
            raw: RawMapEntry { base, length, kind, attributes: 0 },
            next,
        }
    }

    pub fn printed(&self) -> String {
        String::from_utf8_lossy(&self.teletype_out).into_owned()
    }
}

impl FirmwareServices for MockFirmware {
    fn disk_read_ext(&mut self, _drive: u8, dap: &DiskAddressPacket) -> DiskStatus {
        let index = self.ext_reads.len().min(self.ext_results.len() - 1);
        self.ext_reads.push(ExtReadRequest {
            lba: dap.start_lba(),
            sectors: dap.sectors(),
            segment: dap.buffer_segment(),
            offset: dap.buffer_offset(),
        });
        self.ext_results[index]
    }

    fn disk_read_chs(
        &mut self,
        _drive: u8,
        chs: CylinderHeadSector,
        sectors: u8,
        buffer: u32,
    ) -> DiskStatus {
        self.chs_reads.push(ChsReadRequest { chs, sectors, buffer });
        self.chs_result
    }

    fn disk_reset(&mut self, _drive: u8) -> DiskStatus {
        self.resets += 1;
        DiskStatus::ok()
    }

    fn e820_next(&mut self, _continuation: u32) -> E820Response {
        let index = self.e820_calls.min(self.e820_script.len() - 1);
        self.e820_calls += 1;
        self.e820_script[index]
    }

    fn e801_sizes(&mut self) -> Option<E801Sizes> {
        self.e801
    }

    fn legacy_extended_kib(&mut self) -> Option<u16> {
        self.legacy_kib
    }

    fn enable_a20_gate(&mut self) -> bool {
        self.a20_supported
    }

    fn teletype(&mut self, ch: u8) {
        self.teletype_out.push(ch);
    }
}
