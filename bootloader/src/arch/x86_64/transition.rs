//! Irreversible CPU mode transitions.
//!
//! Each transition consumes the token for the mode it leaves, so a
//! completed transition cannot be replayed at the type level; the
//! hardware offers no way back either. Past the first gate no firmware
//! service is callable and the only failure action is halting.

#[cfg(target_arch = "x86_64")]
use super::gdt;
#[cfg(target_arch = "x86_64")]
use super::msr;
#[cfg(target_arch = "x86_64")]
use crate::consts::{KERNEL_FINAL_ADDR, KERNEL_TEMP_ADDR, SECTOR_SIZE, STACK_TOP};
#[cfg(target_arch = "x86_64")]
use crate::disk::LoadedImage;
#[cfg(target_arch = "x86_64")]
use crate::layout;

/// Protection enable.
pub const CR0_PE: u32 = 0x0000_0001;
/// Paging enable.
pub const CR0_PG: u32 = 0x8000_0000;
/// Physical address extension.
pub const CR4_PAE: u32 = 0x0000_0020;

/// The 16-bit state the first stage hands over.
pub struct RealMode(());

/// 32-bit flat protected mode, paging off.
pub struct ProtectedMode(());

/// 64-bit long mode with identity paging active.
pub struct LongMode(());

impl RealMode {
    /// # Safety
    ///
    /// Must be claimed exactly once, at entry, while the machine is
    /// still in the state the first stage handed over: real mode,
    /// interrupts disabled, boot drive in DL semantics already consumed.
    pub unsafe fn claim() -> Self {
        RealMode(())
    }
}

/// Real -> protected. Loads the descriptor table, sets CR0.PE and far
/// jumps through the 32-bit code selector, then establishes flat data
/// selectors and the loader stack.
#[cfg(all(target_arch = "x86_64", target_os = "none"))]
pub unsafe fn enter_protected_mode(_from: RealMode) -> ProtectedMode {
    gdt::load();

    core::arch::asm!(
        "cli",
        // Set the protection-enable bit.
        "mov eax, cr0",
        "or eax, {pe}",
        "mov cr0, eax",
        // Serialize the pipeline through the new code selector.
        "push {code}",
        "lea rax, [rip + 2f]",
        "push rax",
        "retfq",
        "2:",
        // Flat data and stack selectors.
        "mov ax, {data}",
        "mov ds, ax",
        "mov es, ax",
        "mov fs, ax",
        "mov gs, ax",
        "mov ss, ax",
        "mov esp, {stack:e}",
        pe = const CR0_PE,
        code = const gdt::SELECTOR_CODE32 as u32,
        data = const gdt::SELECTOR_DATA32 as u32,
        stack = in(reg) STACK_TOP,
        out("rax") _,
    );

    ProtectedMode(())
}

/// Relocate the kernel image from its staging area to its final
/// address. The copy is a bulk word copy sized exactly to the sectors
/// that were loaded: no more, no less.
#[cfg(target_arch = "x86_64")]
pub unsafe fn relocate_kernel(_mode: &ProtectedMode, image: &LoadedImage) -> u32 {
    let words = image.sectors as usize * SECTOR_SIZE / 4;

    layout::assert_owned_write(
        &layout::KERNEL_FINAL,
        KERNEL_FINAL_ADDR as u64,
        (words * 4) as u64,
    );
    debug_assert_eq!(image.addr, KERNEL_TEMP_ADDR);

    let src = image.addr as usize as *const u32;
    let dst = KERNEL_FINAL_ADDR as usize as *mut u32;
    for i in 0..words {
        dst.add(i).write_volatile(src.add(i).read_volatile());
    }

    KERNEL_FINAL_ADDR
}

/// Protected -> long. Points CR3 at the prepared hierarchy, enables
/// PAE, sets EFER.LME, turns paging on and far jumps through the
/// 64-bit code selector.
#[cfg(all(target_arch = "x86_64", target_os = "none"))]
pub unsafe fn enter_long_mode(_from: ProtectedMode, pml4: u32) -> LongMode {
    core::arch::asm!(
        // Page-table base first; it must be live when paging turns on.
        "mov cr3, {pml4:r}",
        // Physical address extension.
        "mov eax, cr4",
        "or eax, {pae}",
        "mov cr4, eax",
        pml4 = in(reg) pml4 as u64,
        pae = const CR4_PAE,
        out("rax") _,
        options(nostack),
    );

    msr::set_efer_flag(msr::EFER_LME);

    core::arch::asm!(
        // Paging on (CR0 bit 31): completes the long-mode activation.
        "mov eax, cr0",
        "bts eax, {pg_bit}",
        "mov cr0, eax",
        // Far jump into 64-bit code.
        "push {code}",
        "lea rax, [rip + 2f]",
        "push rax",
        "retfq",
        "2:",
        "mov ax, {data}",
        "mov ds, ax",
        "mov es, ax",
        "mov fs, ax",
        "mov gs, ax",
        "mov ss, ax",
        "mov rsp, {stack:r}",
        pg_bit = const 31,
        code = const gdt::SELECTOR_CODE64 as u32,
        data = const gdt::SELECTOR_DATA64 as u32,
        stack = in(reg) STACK_TOP as u64,
        out("rax") _,
    );

    debug_assert!(msr::is_long_mode_active());
    LongMode(())
}

/// Hand the machine to the kernel: 64-bit mode, identity paging,
/// interrupts disabled, stack valid. Execution begins at the image's
/// first byte and never comes back.
#[cfg(all(target_arch = "x86_64", target_os = "none"))]
pub unsafe fn jump_to_kernel(_mode: LongMode, entry: u32) -> ! {
    core::arch::asm!(
        "jmp {entry:r}",
        entry = in(reg) entry as u64,
        options(noreturn),
    );
}
