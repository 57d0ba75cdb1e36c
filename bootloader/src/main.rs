//! Stage-two entry point.
//!
//! The first stage leaves the machine in real mode with interrupts
//! disabled and this image at its fixed base. From here the boot is one
//! straight line: load kernel, verify, probe memory, transition, jump.
//! There is no return path; every failure ends in a report and a halt.

#![no_std]
#![no_main]

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
mod boot {
    use helios_bootloader::arch::x86_64::{self as arch_x86_64, cpuid, transition};
    use helios_bootloader::bios::RealModeFirmware;
    use helios_bootloader::consts::{BOOT_DRIVE, KERNEL_FINAL_ADDR, PAGE_TABLE_BASE};
    use helios_bootloader::disk::DiskLoader;
    use helios_bootloader::error::BootError;
    use helios_bootloader::{diag, memory, paging, verify};

    pub fn boot_main() -> ! {
        arch_x86_64::early_init();
        diag::init_logging();

        // SAFETY: single instance, machine state per first-stage contract.
        let mut firmware = unsafe { RealModeFirmware::new() };
        // SAFETY: claimed once, at entry, in real mode.
        let real_mode = unsafe { transition::RealMode::claim() };

        diag::early_banner(&mut firmware);

        // Kernel from disk into the staging area.
        let image = match DiskLoader::new(&mut firmware, BOOT_DRIVE).load_kernel() {
            Ok(image) => image,
            Err(error) => diag::fatal_early(&mut firmware, error),
        };

        // Identity check before anything irreversible happens.
        // SAFETY: the image was just loaded at its staging address.
        let bytes = unsafe { image.as_slice() };
        if let Err(error) = verify::verify_kernel(bytes) {
            diag::fatal_early(&mut firmware, error);
        }

        // Memory above 1 MiB must be reachable before probing it.
        if let Err(error) = memory::a20::enable(&mut firmware) {
            diag::fatal_early(&mut firmware, error);
        }

        // Canonical memory map, stored at its fixed address for the
        // kernel, then rendered for the operator.
        let map = memory::detect_memory(&mut firmware);
        // SAFETY: flat single-writer region per the layout contract.
        unsafe { map.store() };
        diag::render_memory_map(&mut firmware, &map);

        let pages = paging::page_count(&map);

        // First one-way gate. No firmware service is callable past here.
        // SAFETY: GDT is static, stack region is reserved in the layout.
        let protected = unsafe { transition::enter_protected_mode(real_mode) };

        // SAFETY: staging and final regions are disjoint per the layout.
        let entry = unsafe { transition::relocate_kernel(&protected, &image) };

        if !cpuid::supports_long_mode() {
            diag::fatal(BootError::LongModeUnsupported);
        }

        // Build the identity-mapped hierarchy in the fixed scratch.
        // SAFETY: region is reserved and unused until CR3 load below.
        let scratch = unsafe { paging::scratch_at(PAGE_TABLE_BASE) };
        scratch.populate(PAGE_TABLE_BASE as u64, pages);

        // Second one-way gate.
        // SAFETY: scratch was just populated; selectors exist in the GDT.
        let long_mode = unsafe { transition::enter_long_mode(protected, PAGE_TABLE_BASE) };

        diag::handoff_report(&map, &image, pages, entry);

        // Defensive re-check at the final address: a silently failed
        // relocation must never be jumped into.
        // SAFETY: the final region is mapped by the identity tables.
        let first = unsafe { core::ptr::read_volatile(KERNEL_FINAL_ADDR as usize as *const [u8; 8]) };
        if !verify::image_present(&first) {
            diag::fatal(BootError::KernelNotPresent);
        }

        // SAFETY: verified image, long mode active, contract satisfied.
        unsafe { transition::jump_to_kernel(long_mode, entry) }
    }
}

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
#[unsafe(no_mangle)]
#[unsafe(link_section = ".text._start")]
pub extern "C" fn _start() -> ! {
    boot::boot_main()
}

// Hosted builds only need the binary to link; the loader runs nowhere
// but bare metal.
#[cfg(not(target_os = "none"))]
#[unsafe(no_mangle)]
extern "C" fn main(_argc: isize, _argv: *const *const u8) -> isize {
    0
}

#[cfg(not(test))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    helios_bootloader::vga_println!("loader panic: {}", info);
    helios_bootloader::arch::halt()
}

// Hosted (`not(target_os = "none")`) links pull in the C startup object,
// whose unwinding glue references the personality routine; `panic = "abort"`
// never unwinds, so a no-op shim satisfies the linker. The bare-metal build
// links neither the C runtime nor this symbol.
#[cfg(all(not(test), not(target_os = "none")))]
#[unsafe(no_mangle)]
extern "C" fn rust_eh_personality() {}
