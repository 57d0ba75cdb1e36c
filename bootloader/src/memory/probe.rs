//! Tiered physical-memory discovery.
//!
//! The firmware interfaces are tried from most to least capable; the
//! first tier that yields a map wins and later tiers never run, so the
//! final map is always the output of exactly one tier.

use crate::bios::{E820Response, FirmwareServices};
use crate::memory::map::{MemoryMap, MemoryMapEntry, REGION_USABLE};

/// Fixed low-memory region synthesized by the coarse tiers (0..~640 KiB).
const LOW_MEMORY_BASE: u64 = 0;
const LOW_MEMORY_LENGTH: u64 = 0x9FC00;

/// Start of extended memory.
const EXTENDED_BASE: u64 = 0x10_0000;

/// Conservative minimum assumed when every interface fails: 15 MiB
/// above the 1 MiB mark.
const DEFAULT_EXTENDED_LENGTH: u64 = 15 * 1024 * 1024;

/// One memory-discovery strategy.
pub trait MemoryProbe {
    fn name(&self) -> &'static str;

    /// Try to produce a map. `None` means this tier is unavailable or
    /// untrustworthy; the prober moves on to the next tier.
    fn attempt(&mut self, firmware: &mut dyn FirmwareServices) -> Option<MemoryMap>;
}

/// Tier 1: full E820 enumeration via the continuation protocol.
pub struct E820Probe;

impl MemoryProbe for E820Probe {
    fn name(&self) -> &'static str {
        "e820"
    }

    fn attempt(&mut self, firmware: &mut dyn FirmwareServices) -> Option<MemoryMap> {
        let mut map = MemoryMap::new();
        let mut continuation = 0u32;

        loop {
            match firmware.e820_next(continuation) {
                // No partial map is trusted: any failed step discards
                // everything collected so far.
                E820Response::Failed => return None,
                E820Response::Entry { raw, next } => {
                    let entry = MemoryMapEntry::from_raw(&raw);
                    if entry.is_valid() {
                        if !map.push(entry) {
                            log::warn!("memory map entry cap reached, truncating");
                            break;
                        }
                    } else {
                        log::debug!(
                            "dropping invalid e820 entry {:#x}+{:#x} type {}",
                            entry.base,
                            entry.length,
                            entry.kind
                        );
                    }

                    if next == 0 {
                        break;
                    }
                    continuation = next;
                }
            }
        }

        if map.is_empty() {
            return None;
        }

        // Second full pass: re-validate and rewrite the count to the
        // surviving entries only.
        let dropped = map.revalidate();
        if dropped > 0 {
            log::debug!("compaction dropped {} entries", dropped);
        }

        if map.is_empty() { None } else { Some(map) }
    }
}

/// Tier 2: coarse low/high sizes, synthesized into exactly two entries.
/// These are constructed locally and bypass the tier-1 validation pass.
pub struct E801Probe;

impl MemoryProbe for E801Probe {
    fn name(&self) -> &'static str {
        "e801"
    }

    fn attempt(&mut self, firmware: &mut dyn FirmwareServices) -> Option<MemoryMap> {
        let sizes = firmware.e801_sizes()?;
        if sizes.low_kib == 0 && sizes.high_blocks == 0 {
            return None;
        }

        let high_length =
            sizes.low_kib as u64 * 1024 + sizes.high_blocks as u64 * 65536;

        let mut map = MemoryMap::new();
        map.push(MemoryMapEntry::new(LOW_MEMORY_BASE, LOW_MEMORY_LENGTH, REGION_USABLE));
        map.push(MemoryMapEntry::new(EXTENDED_BASE, high_length, REGION_USABLE));
        Some(map)
    }
}

/// Tier 3: legacy extended-memory count, one synthesized entry.
pub struct LegacyProbe;

impl MemoryProbe for LegacyProbe {
    fn name(&self) -> &'static str {
        "int15/88"
    }

    fn attempt(&mut self, firmware: &mut dyn FirmwareServices) -> Option<MemoryMap> {
        let kib = firmware.legacy_extended_kib()?;
        if kib == 0 {
            return None;
        }

        let mut map = MemoryMap::new();
        map.push(MemoryMapEntry::new(EXTENDED_BASE, kib as u64 * 1024, REGION_USABLE));
        Some(map)
    }
}

/// Tier 4: last resort, a single conservative default entry.
pub struct FallbackProbe;

impl MemoryProbe for FallbackProbe {
    fn name(&self) -> &'static str {
        "default"
    }

    fn attempt(&mut self, _firmware: &mut dyn FirmwareServices) -> Option<MemoryMap> {
        let mut map = MemoryMap::new();
        map.push(MemoryMapEntry::new(EXTENDED_BASE, DEFAULT_EXTENDED_LENGTH, REGION_USABLE));
        Some(map)
    }
}

/// Run the probe tiers in priority order; first success wins.
pub fn detect_memory(firmware: &mut dyn FirmwareServices) -> MemoryMap {
    let mut e820 = E820Probe;
    let mut e801 = E801Probe;
    let mut legacy = LegacyProbe;
    let mut fallback = FallbackProbe;

    let tiers: [&mut dyn MemoryProbe; 4] =
        [&mut e820, &mut e801, &mut legacy, &mut fallback];

    for tier in tiers {
        if let Some(map) = tier.attempt(firmware) {
            log::info!("memory map from {} ({} entries)", tier.name(), map.len());
            return map;
        }
        log::debug!("memory probe {} unavailable", tier.name());
    }

    // The default tier never refuses; nothing reaches this point.
    MemoryMap::new()
}
