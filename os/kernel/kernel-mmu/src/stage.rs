use core::fmt;

/// Progress of translation table setup during boot.
///
/// Stages only ever advance:
///
/// ```text
/// Uninitialized ─► MemoryMapped ─► ZeroPageReady ─► RegionsRegistered
///   map_memory       caches/TLB flushed,   iotable_init(_exec)
///                    reserved TTBR0 set
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum BootStage {
    Uninitialized,
    /// All RAM banks are in the linear map.
    MemoryMapped,
    /// The zero page exists and TTBR0 points at it.
    ZeroPageReady,
    /// At least one batch of static regions was registered.
    RegionsRegistered,
}

impl BootStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::MemoryMapped => "memory mapped",
            Self::ZeroPageReady => "zero page ready",
            Self::RegionsRegistered => "regions registered",
        }
    }
}

impl fmt::Display for BootStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
