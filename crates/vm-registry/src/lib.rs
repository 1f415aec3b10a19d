//! VM Registry
//!
//! Keeps started virtual machines in memory, keyed by a randomly issued
//! UUID. Nothing is persisted; entries live for the lifetime of the process.

pub mod models;
pub mod storage;

pub use models::{
    OsImage, VirtualMachine, VmRecord, CPU_COUNT_MAX, CPU_COUNT_MIN, MEM_SIZE_GB_MAX,
    MEM_SIZE_GB_MIN,
};
pub use storage::Registry;

/// Registry of started VMs
pub type VmRegistry = Registry<VmRecord>;
