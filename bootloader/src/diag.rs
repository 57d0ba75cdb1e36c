//! Operator-facing reporting.
//!
//! Two output paths exist because the execution environment changes
//! under the loader: before the first transition text goes through the
//! firmware teletype service, afterwards through direct VGA buffer
//! writes. Nothing in this module mutates loader state; a rendering bug
//! can garble the screen but never a control-flow decision.

use core::fmt::{self, Write};

use crate::bios::FirmwareServices;
use crate::disk::LoadedImage;
use crate::error::{BootError, LOADER_ERROR};
use crate::memory::MemoryMap;
use crate::vga::VGA;

/// Entries shown from the front of the memory map.
pub const MEMORY_MAP_RENDER_LIMIT: usize = 4;

/// Adapter driving the firmware teletype from `core::fmt`.
pub struct Teletype<'a>(pub &'a mut dyn FirmwareServices);

impl Write for Teletype<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.0.teletype(b'\r');
            }
            self.0.teletype(byte);
        }
        Ok(())
    }
}

/// Render a decimal value without the formatting machinery.
pub fn write_decimal(out: &mut dyn Write, value: u64) {
    let mut buffer = itoa::Buffer::new();
    let _ = out.write_str(buffer.format(value));
}

/// Render a `0x`-prefixed, zero-padded hexadecimal value.
pub fn write_hex(out: &mut dyn Write, value: u64, digits: u32) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let _ = out.write_str("0x");
    let mut shift = digits * 4;
    while shift > 0 {
        shift -= 4;
        let nibble = ((value >> shift) & 0xF) as usize;
        let _ = out.write_char(HEX[nibble] as char);
    }
}

/// Early (pre-transition) banner through the firmware teletype.
pub fn early_banner(firmware: &mut dyn FirmwareServices) {
    let mut out = Teletype(firmware);
    let _ = out.write_str("Helios stage two\n");
}

/// Report a fatal condition on the teletype path and halt. Used before
/// the first transition, while the firmware is still callable.
pub fn fatal_early(firmware: &mut dyn FirmwareServices, error: BootError) -> ! {
    let state = *LOADER_ERROR.lock();

    let mut out = Teletype(firmware);
    let _ = out.write_str("BOOT FAILURE: ");
    let _ = out.write_str(error.description());
    let _ = out.write_str("\n  code ");
    write_hex(&mut out, error.code() as u64, 4);
    let _ = out.write_str(", firmware status ");
    write_hex(&mut out, state.last_status as u64, 2);
    let _ = out.write_str("\n");

    crate::arch::halt();
}

/// Report a fatal condition on the VGA path and halt. Used once the
/// firmware is gone.
pub fn fatal(error: BootError) -> ! {
    let state = *LOADER_ERROR.lock();

    {
        let mut vga = VGA.lock();
        let _ = vga.write_str("BOOT FAILURE: ");
        let _ = vga.write_str(error.description());
        let _ = vga.write_str("\n  code ");
        write_hex(&mut *vga, error.code() as u64, 4);
        let _ = vga.write_str(", firmware status ");
        write_hex(&mut *vga, state.last_status as u64, 2);
        let _ = vga.write_str("\n");
    }

    crate::arch::halt();
}

/// Render up to the first [`MEMORY_MAP_RENDER_LIMIT`] map entries on
/// the teletype path. The stored map is never touched.
pub fn render_memory_map(firmware: &mut dyn FirmwareServices, map: &MemoryMap) {
    let mut out = Teletype(firmware);

    let _ = out.write_str("memory map: ");
    write_decimal(&mut out, map.len() as u64);
    let _ = out.write_str(" entries\n");

    for entry in map.entries().iter().take(MEMORY_MAP_RENDER_LIMIT) {
        let _ = out.write_str("  ");
        write_hex(&mut out, entry.base, 16);
        let _ = out.write_str(" + ");
        write_hex(&mut out, entry.length, 16);
        let _ = out.write_str(" type ");
        write_decimal(&mut out, entry.kind as u64);
        let _ = out.write_str(" (");
        let _ = out.write_str(entry.type_name());
        let _ = out.write_str(")\n");
    }
}

/// Post-transition success report: addresses, first kernel bytes,
/// memory summary. For operator visibility only.
pub fn handoff_report(map: &MemoryMap, image: &LoadedImage, pages: u64, entry: u32) {
    let mut vga = VGA.lock();
    vga.clear();

    let _ = vga.write_str("Helios loader: long mode up\n");

    let _ = vga.write_str("  kernel at ");
    write_hex(&mut *vga, entry as u64, 8);
    let _ = vga.write_str(", ");
    write_decimal(&mut *vga, image.sectors as u64);
    let _ = vga.write_str(" sectors\n");

    let _ = vga.write_str("  first bytes ");
    let first = unsafe { core::ptr::read_volatile(entry as usize as *const [u8; 8]) };
    for byte in first {
        write_hex(&mut *vga, byte as u64, 2);
        let _ = vga.write_str(" ");
    }
    let _ = vga.write_str("\n");

    let _ = vga.write_str("  mapped ");
    write_decimal(&mut *vga, pages * 2);
    let _ = vga.write_str(" MiB in ");
    write_decimal(&mut *vga, pages);
    let _ = vga.write_str(" pages, ");
    write_decimal(&mut *vga, map.total_usable() / (1024 * 1024));
    let _ = vga.write_str(" MiB usable RAM\n");
}

/// VGA-backed logger for the `log` facade.
struct VgaLogger;

impl log::Log for VgaLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Info
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            crate::vga_println!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: VgaLogger = VgaLogger;
static LOGGER_INIT: spin::Once = spin::Once::new();

/// Install the logger. Idempotent; chatter above `Info` is dropped.
pub fn init_logging() {
    LOGGER_INIT.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Info);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CapturedText(std::string::String);

    impl Write for CapturedText {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            self.0.push_str(s);
            Ok(())
        }
    }

    #[test]
    fn test_write_hex_pads_and_prefixes() {
        let mut out = CapturedText::default();
        write_hex(&mut out, 0x9000, 8);
        assert_eq!(out.0, "0x00009000");

        let mut out = CapturedText::default();
        write_hex(&mut out, 0x0C, 2);
        assert_eq!(out.0, "0x0C");
    }

    #[test]
    fn test_write_decimal() {
        let mut out = CapturedText::default();
        write_decimal(&mut out, 0);
        write_decimal(&mut out, 15360);
        assert_eq!(out.0, "015360");
    }
}
