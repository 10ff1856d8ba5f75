//! Cache and TLB maintenance.
//!
//! Page-table updates that replace a live translation must be followed by a
//! TLB invalidation before the replaced table memory is reused; changing the
//! cacheability of normal memory requires a full data-cache clean and
//! invalidate on either side of the change.

/// Maintenance operation could not be carried out.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum MaintenanceError {
    #[error("TLB invalidation is unavailable")]
    TlbUnavailable,
    #[error("data cache maintenance is unavailable")]
    CacheUnavailable,
}

/// Global cache and TLB maintenance for the calling CPU's shareability
/// domain.
pub trait CacheMaintenance {
    /// Clean and invalidate all data caches to the point of coherency, then
    /// invalidate the instruction cache.
    fn flush_cache_all(&mut self) -> Result<(), MaintenanceError>;

    /// Invalidate all stage 1 EL1 translations, inner shareable.
    fn flush_tlb_all(&mut self) -> Result<(), MaintenanceError>;
}

impl<T> CacheMaintenance for &mut T
where
    T: CacheMaintenance + ?Sized,
{
    fn flush_cache_all(&mut self) -> Result<(), MaintenanceError> {
        (**self).flush_cache_all()
    }

    fn flush_tlb_all(&mut self) -> Result<(), MaintenanceError> {
        (**self).flush_tlb_all()
    }
}

/// Maintenance instructions of the executing CPU.
#[cfg(all(feature = "asm", target_arch = "aarch64"))]
#[derive(Debug)]
pub struct Aarch64Maintenance {
    _private: (),
}

#[cfg(all(feature = "asm", target_arch = "aarch64"))]
impl Aarch64Maintenance {
    /// # Safety
    /// Must only be created at EL1.
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }

    /// Set/way clean and invalidate of every data or unified cache level up
    /// to the level of coherency.
    #[allow(clippy::cast_possible_truncation)]
    unsafe fn clean_invalidate_dcache_all() {
        let clidr: u64;
        unsafe {
            core::arch::asm!("dsb sy", "mrs {}, clidr_el1", out(reg) clidr, options(nostack, preserves_flags));
        }

        let level_of_coherency = (clidr >> 24) & 0b111;
        for level in 0..level_of_coherency {
            // 0b000 none, 0b001 instruction only
            let cache_type = (clidr >> (level * 3)) & 0b111;
            if cache_type < 0b010 {
                continue;
            }

            let ccsidr: u64;
            unsafe {
                core::arch::asm!(
                    "msr csselr_el1, {sel}",
                    "isb",
                    "mrs {ccsidr}, ccsidr_el1",
                    sel = in(reg) level << 1,
                    ccsidr = out(reg) ccsidr,
                    options(nostack, preserves_flags)
                );
            }

            let line_shift = (ccsidr & 0b111) + 4;
            let ways = ((ccsidr >> 3) & 0x3FF) + 1;
            let sets = ((ccsidr >> 13) & 0x7FFF) + 1;
            let way_shift = ((ways - 1) as u32).leading_zeros();

            for way in 0..ways {
                for set in 0..sets {
                    let operand = (way.unbounded_shl(way_shift)) | (set << line_shift) | (level << 1);
                    unsafe {
                        core::arch::asm!("dc cisw, {}", in(reg) operand, options(nostack, preserves_flags));
                    }
                }
            }
        }

        unsafe {
            core::arch::asm!("msr csselr_el1, xzr", "dsb sy", "isb", options(nostack, preserves_flags));
        }
    }
}

#[cfg(all(feature = "asm", target_arch = "aarch64"))]
impl CacheMaintenance for Aarch64Maintenance {
    fn flush_cache_all(&mut self) -> Result<(), MaintenanceError> {
        unsafe {
            Self::clean_invalidate_dcache_all();
            core::arch::asm!("ic iallu", "dsb ish", "isb", options(nostack, preserves_flags));
        }
        Ok(())
    }

    fn flush_tlb_all(&mut self) -> Result<(), MaintenanceError> {
        unsafe {
            core::arch::asm!(
                "dsb ishst",
                "tlbi vmalle1is",
                "dsb ish",
                "isb",
                options(nostack, preserves_flags)
            );
        }
        Ok(())
    }
}

/// A maintenance operation observed by [`RecordingMaintenance`].
#[cfg(any(test, feature = "software-emulation"))]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MaintenanceEvent {
    CacheFlush,
    TlbFlush,
}

/// Records maintenance requests instead of executing them.
#[cfg(any(test, feature = "software-emulation"))]
#[derive(Debug, Default, Clone)]
pub struct RecordingMaintenance {
    events: alloc::vec::Vec<MaintenanceEvent>,
    tlb_unavailable: bool,
}

#[cfg(any(test, feature = "software-emulation"))]
impl RecordingMaintenance {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder whose TLB invalidation always fails.
    #[must_use]
    pub fn without_tlb_invalidation() -> Self {
        Self {
            events: alloc::vec::Vec::new(),
            tlb_unavailable: true,
        }
    }

    #[must_use]
    pub fn events(&self) -> &[MaintenanceEvent] {
        &self.events
    }

    #[must_use]
    pub fn tlb_flushes(&self) -> usize {
        self.count(MaintenanceEvent::TlbFlush)
    }

    #[must_use]
    pub fn cache_flushes(&self) -> usize {
        self.count(MaintenanceEvent::CacheFlush)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    fn count(&self, event: MaintenanceEvent) -> usize {
        self.events.iter().filter(|e| **e == event).count()
    }
}

#[cfg(any(test, feature = "software-emulation"))]
impl CacheMaintenance for RecordingMaintenance {
    fn flush_cache_all(&mut self) -> Result<(), MaintenanceError> {
        self.events.push(MaintenanceEvent::CacheFlush);
        Ok(())
    }

    fn flush_tlb_all(&mut self) -> Result<(), MaintenanceError> {
        if self.tlb_unavailable {
            return Err(MaintenanceError::TlbUnavailable);
        }
        self.events.push(MaintenanceEvent::TlbFlush);
        Ok(())
    }
}
