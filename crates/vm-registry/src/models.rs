//! Data models for the VM registry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use showcase_common::ClosedSet;
use std::fmt;

/// Allowed number of virtual CPUs
pub const CPU_COUNT_MIN: u32 = 1;
pub const CPU_COUNT_MAX: u32 = 64;

/// Allowed memory size in GiB
pub const MEM_SIZE_GB_MIN: u32 = 8;
pub const MEM_SIZE_GB_MAX: u32 = 1024;

/// Operating system image a VM boots from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OsImage {
    #[serde(rename = "ubuntu:24.04")]
    Ubuntu2404,
    #[serde(rename = "debian:bookworm")]
    DebianBookworm,
    #[serde(rename = "alpine:3.20")]
    Alpine320,
}

impl ClosedSet for OsImage {
    fn choices() -> &'static [Self] {
        &[OsImage::Ubuntu2404, OsImage::DebianBookworm, OsImage::Alpine320]
    }

    fn tag(&self) -> &'static str {
        match self {
            OsImage::Ubuntu2404 => "ubuntu:24.04",
            OsImage::DebianBookworm => "debian:bookworm",
            OsImage::Alpine320 => "alpine:3.20",
        }
    }
}

impl fmt::Display for OsImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A virtual machine specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualMachine {
    /// Number of virtual CPUs
    pub cpu_count: u32,

    /// Memory size in GiB
    pub mem_size_gb: u32,

    /// Boot image
    pub image: OsImage,
}

/// A started VM as held by the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmRecord {
    pub vm: VirtualMachine,

    /// When the VM was started
    pub started_at: DateTime<Utc>,
}

impl VmRecord {
    pub fn new(vm: VirtualMachine) -> Self {
        Self {
            vm,
            started_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_tags_round_trip_through_serde() {
        for image in OsImage::choices() {
            let json = serde_json::to_string(image).unwrap();
            assert_eq!(json, format!("\"{}\"", image.tag()));

            let parsed: OsImage = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, *image);
        }
    }

    #[test]
    fn test_unknown_image_tag_rejected() {
        assert!(serde_json::from_str::<OsImage>("\"fedora:40\"").is_err());
        assert_eq!(OsImage::from_tag("fedora:40"), None);
        assert_eq!(
            OsImage::tags(),
            vec!["ubuntu:24.04", "debian:bookworm", "alpine:3.20"]
        );
    }
}
