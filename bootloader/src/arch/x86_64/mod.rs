// x86_64 architecture support for the stage-two loader.

pub mod cpuid;
pub mod gdt;
pub mod msr;
pub mod transition;

/// Disable interrupts. The loader never re-enables them; the kernel
/// installs its own IDT before it does.
#[cfg(target_arch = "x86_64")]
pub fn early_init() {
    ::x86_64::instructions::interrupts::disable();
}

/// Terminal halt loop: the only exit from a fatal boot error.
#[cfg(target_arch = "x86_64")]
pub fn halt() -> ! {
    loop {
        ::x86_64::instructions::hlt();
    }
}

#[cfg(not(target_arch = "x86_64"))]
pub fn halt() -> ! {
    loop {
        core::hint::spin_loop();
    }
}
