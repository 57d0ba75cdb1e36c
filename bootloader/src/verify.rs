//! Kernel image identification.
//!
//! The kernel embeds a 28-bit magic in the low bits of an 8-byte-aligned
//! word within its first 64 KiB. This is an identity check, not an
//! authenticity check: any blob carrying the aligned magic passes, and
//! nothing beyond the matched word is covered by it.

use crate::consts::{KERNEL_MAGIC, KERNEL_MAGIC_MASK, SIGNATURE_SCAN_LIMIT};
use crate::error::{BootError, Result};

/// Scan for the kernel magic; returns the byte offset of the match.
///
/// The scan advances in 8-byte steps from offset 0, over the lesser of
/// 64 KiB and the image size. A magic placed at an unaligned offset
/// does not match.
pub fn find_signature(image: &[u8]) -> Option<usize> {
    let bound = image.len().min(SIGNATURE_SCAN_LIMIT);

    let mut offset = 0;
    while offset + 8 <= bound {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&image[offset..offset + 8]);
        let word = u64::from_le_bytes(bytes);

        if word & KERNEL_MAGIC_MASK == KERNEL_MAGIC {
            return Some(offset);
        }
        offset += 8;
    }
    None
}

/// Confirm the loaded blob is a kernel image before anything
/// irreversible happens.
pub fn verify_kernel(image: &[u8]) -> Result {
    match find_signature(image) {
        Some(offset) => {
            log::info!("kernel signature at offset {:#x}", offset);
            Ok(())
        }
        None => Err(BootError::SignatureNotFound),
    }
}

/// Post-relocation presence check: all-zero first bytes mean the copy
/// silently failed and the final jump must not happen.
pub fn image_present(first_bytes: &[u8; 8]) -> bool {
    first_bytes.iter().any(|&b| b != 0)
}
