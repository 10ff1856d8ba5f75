use crate::stage::BootStage;
use kernel_registers::MaintenanceError;
use kernel_vmem::FatalError;

/// Why a cache policy was not applied.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum CachePolicyError {
    #[error("unknown or unsupported cache policy")]
    Unknown,
    #[error("cache policy can only be chosen before memory is mapped")]
    TooLate,
    #[error("a cache policy was already applied")]
    AlreadySelected,
    #[error(transparent)]
    Maintenance(#[from] MaintenanceError),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum BootError {
    #[error("{operation} needs boot stage '{required}', currently '{current}'")]
    OutOfOrder {
        operation: &'static str,
        required: BootStage,
        current: BootStage,
    },
    #[error("cache policy: {0}")]
    CachePolicy(#[from] CachePolicyError),
    #[error(transparent)]
    Fatal(#[from] FatalError),
}

impl BootError {
    /// Stops the boot. There is nothing to unwind to: the kernel is built
    /// with `panic = "abort"`.
    #[cold]
    pub fn halt(self) -> ! {
        log::error!("fatal error while setting up translation tables: {self}");
        panic!("MMU setup failed: {self}");
    }
}

impl From<MaintenanceError> for BootError {
    fn from(value: MaintenanceError) -> Self {
        Self::Fatal(FatalError::from(value))
    }
}
