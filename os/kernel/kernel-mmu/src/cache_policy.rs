//! # Cache Policy Selection
//!
//! `cachepolicy=<name>` on the boot command line changes how Normal memory
//! and translation table walks are cached, which helps narrow down cache
//! coherency problems.
//!
//! | Name | `MAIR_EL1` Normal byte | Walk cacheability (`IRGN`/`ORGN`) |
//! |------|------------------------|-----------------------------------|
//! | `uncached` | `0x44` | non-cacheable |
//! | `writethrough` | `0xaa` | write-through |
//! | `writeback` | `0xee` | write-back, no write-allocate |

use kernel_registers::{
    CacheMaintenance, Mair, MaintenanceError, MemoryType, SystemRegisters, WalkCacheability,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CachePolicy {
    pub name: &'static str,
    /// Attribute byte for [`MemoryType::Normal`].
    pub mair: u8,
    pub walk: WalkCacheability,
}

pub static CACHE_POLICIES: [CachePolicy; 3] = [
    CachePolicy {
        name: "uncached",
        mair: Mair::NORMAL_NC,
        walk: WalkCacheability::NonCacheable,
    },
    CachePolicy {
        name: "writethrough",
        mair: Mair::NORMAL_WT,
        walk: WalkCacheability::WriteThrough,
    },
    CachePolicy {
        name: "writeback",
        mair: Mair::NORMAL_WB,
        walk: WalkCacheability::WriteBackNoWriteAllocate,
    },
];

impl CachePolicy {
    /// The first policy whose name starts `param`.
    #[must_use]
    pub fn lookup(param: &str) -> Option<&'static Self> {
        CACHE_POLICIES.iter().find(|p| param.starts_with(p.name))
    }

    /// Reprograms `MAIR_EL1` and `TCR_EL1` for this policy, with all caches
    /// cleaned and invalidated before and after.
    ///
    /// # Errors
    /// The cache could not be maintained. The registers may already have
    /// been changed.
    pub fn apply<R, C>(
        &self,
        registers: &mut R,
        maintenance: &mut C,
    ) -> Result<(), MaintenanceError>
    where
        R: SystemRegisters,
        C: CacheMaintenance,
    {
        maintenance.flush_cache_all()?;

        let mair = registers.mair().with_attr(MemoryType::Normal, self.mair);
        registers.set_mair(mair);
        registers.isb();

        let tcr = registers.tcr().with_walk_cacheability(self.walk);
        registers.set_tcr(tcr);
        registers.isb();

        maintenance.flush_cache_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_registers::{MaintenanceEvent, RecordingMaintenance, SoftwareRegisters, Tcr};

    #[test]
    fn lookup_matches_prefixes() {
        assert_eq!(CachePolicy::lookup("writeback").unwrap().mair, 0xee);
        assert_eq!(CachePolicy::lookup("writethrough").unwrap().mair, 0xaa);
        assert_eq!(CachePolicy::lookup("uncached,foo").unwrap().name, "uncached");
        assert!(CachePolicy::lookup("write").is_none());
        assert!(CachePolicy::lookup("").is_none());
    }

    #[test]
    fn apply_rewrites_only_the_normal_byte_and_walk_bits() {
        let mut regs = SoftwareRegisters::default();
        let mut maintenance = RecordingMaintenance::new();
        let before = regs.clone();

        CachePolicy::lookup("uncached")
            .unwrap()
            .apply(&mut regs, &mut maintenance)
            .unwrap();

        assert_eq!(regs.mair.attr(MemoryType::Normal), 0x44);
        assert_eq!(
            regs.mair.attr(MemoryType::DeviceNGnRE),
            before.mair.attr(MemoryType::DeviceNGnRE)
        );
        assert_eq!(regs.tcr.irgn0(), WalkCacheability::NonCacheable);
        assert_eq!(regs.tcr.orgn1(), WalkCacheability::NonCacheable);
        let walk_bits = Tcr::IRGN_MASK | Tcr::ORGN_MASK;
        assert_eq!(
            regs.tcr.into_bits() & !walk_bits,
            before.tcr.into_bits() & !walk_bits
        );
        assert_eq!(regs.barriers, 2);
        assert_eq!(
            maintenance.events(),
            &[MaintenanceEvent::CacheFlush, MaintenanceEvent::CacheFlush]
        );
    }
}
