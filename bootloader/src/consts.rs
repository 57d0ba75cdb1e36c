//! Compile-time parameters.
//!
//! There is no runtime configuration surface; every tunable the loader
//! has lives here as a named constant.

/// Boot drive number handed over by the first stage (first hard disk).
pub const BOOT_DRIVE: u8 = 0x80;

/// Bytes per disk sector.
pub const SECTOR_SIZE: usize = 512;

/// First LBA of the kernel image on the boot disk. Sector 0 is the
/// first stage, sectors 1-64 are this image.
pub const KERNEL_LBA: u64 = 66;

/// Kernel image size bound, in sectors (60 KiB).
pub const KERNEL_SECTORS: u16 = 120;

/// Temporary address the kernel is read into before paging exists.
pub const KERNEL_TEMP_ADDR: u32 = 0x2_0000;

/// Final physical address the kernel is relocated to and entered at.
pub const KERNEL_FINAL_ADDR: u32 = 0x20_0000;

/// 28-bit magic the kernel embeds in the low bits of an 8-byte-aligned
/// word within its first 64 KiB.
pub const KERNEL_MAGIC: u64 = 0x0B00_7C0D;

/// Mask selecting the magic bits out of a scanned word.
pub const KERNEL_MAGIC_MASK: u64 = 0x0FFF_FFFF;

/// Signature scan bound from the start of the image.
pub const SIGNATURE_SCAN_LIMIT: usize = 0x1_0000;

/// Extended-read attempts before escalating to the CHS fallback.
pub const MAX_READ_RETRIES: u32 = 3;

/// Memory map storage: a `u32` entry count followed by packed 24-byte
/// entries. Read by the kernel after handoff.
pub const MEMORY_MAP_BASE: u32 = 0x9000;

/// Entry cap for the stored memory map.
pub const MAX_MEMORY_MAP_ENTRIES: usize = 32;

/// Low-memory transfer buffer the firmware writes E820 entries into.
pub const E820_BUFFER_ADDR: u32 = 0x500;

/// Page-table scratch region (PML4, PDPT, page directories).
pub const PAGE_TABLE_BASE: u32 = 0x7_0000;

/// Size of the page-table scratch region in bytes.
pub const PAGE_TABLE_REGION_SIZE: usize = 0x8000;

/// Lower bound on identity-mapped 2 MiB pages (128 MiB).
pub const MIN_IDENTITY_PAGES: u64 = 64;

/// Upper bound on identity-mapped 2 MiB pages (4 GiB).
pub const MAX_IDENTITY_PAGES: u64 = 2048;

/// Stack top used by the 32-bit and 64-bit stages.
pub const STACK_TOP: u32 = 0x9_0000;

/// Iteration budget for keyboard-controller status polling. A wedged
/// controller fails the A20 method instead of hanging the boot.
pub const A20_POLL_BUDGET: u32 = 100_000;

/// Stage-two image location (first-stage contract: 32 KiB at this base).
pub const STAGE2_BASE: u32 = 0x1_0000;

/// Stage-two image size, padded by the image tool.
pub const STAGE2_SIZE: usize = 0x8000;
