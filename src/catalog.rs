//! Fixed descriptions of every metric the evaluator watches.
//!
//! Two disjoint tables: ATA SMART attribute IDs and kernel (libata) error
//! codes. Anything outside these tables is rejected with
//! [`EngineError::UnknownMetricCode`].

use crate::error::EngineError;
use std::fmt;

/// Identity of a monitored metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricCode {
    Smart(u32),
    Kernel(&'static str),
}

impl fmt::Display for MetricCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricCode::Smart(id)    => write!(f, "SMART {}", id),
            MetricCode::Kernel(code) => write!(f, "kernel {}", code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub code:        MetricCode,
    pub name:        &'static str,
    pub description: &'static str,
}

const SMART_ATTRIBUTES: &[MetricDescriptor] = &[
    MetricDescriptor {
        code: MetricCode::Smart(5),
        name: "Reallocated Sectors Count",
        description: "Count of reallocated sectors. When the hard drive finds a read/write/verification error, \
            it marks this sector as reallocated and transfers data to a special reserved area (spare area). \
            This process is also known as remapping and reallocated sectors are called remaps. This is why, \
            on modern hard disks, bad blocks cannot be found while testing the surface — all bad blocks are \
            hidden in reallocated sectors. However, the more sectors that are reallocated, the more \
            read/write speed will decrease.",
    },
    MetricDescriptor {
        code: MetricCode::Smart(196),
        name: "Reallocation Event Count",
        description: "Count of remap operations. The raw value of this attribute shows the total number of \
            attempts to transfer data from reallocated sectors to a spare area. Both successful & \
            unsuccessful attempts are counted.",
    },
    MetricDescriptor {
        code: MetricCode::Smart(197),
        name: "Current Pending Sector Count",
        description: "Number of unstable sectors (waiting to be remapped). If the unstable sector is \
            subsequently written or read successfully, this value is decreased and the sector is not \
            remapped. Read errors on the sector will not remap the sector, it will only be remapped on a \
            failed write attempt. This can be problematic to test because cached writes will not remap \
            the sector, only direct I/O writes to the disk.",
    },
    MetricDescriptor {
        code: MetricCode::Smart(198),
        name: "Uncorrectable Sector Count",
        description: "The total number of uncorrectable errors when reading/writing a sector. A rise in the \
            value of this attribute indicates defects of the disk surface and/or problems in the \
            mechanical subsystem.",
    },
    MetricDescriptor {
        code: MetricCode::Smart(199),
        name: "UDMA CRC Error Count",
        description: "The number of errors in data transfer via the interface cable as determined by ICRC \
            (Interface Cyclic Redundancy Check).",
    },
    MetricDescriptor {
        code: MetricCode::Smart(200),
        name: "Multi-Zone Error Rate",
        description: "The total number of errors when writing a sector.",
    },
];

const KERNEL_ERRORS: &[MetricDescriptor] = &[
    MetricDescriptor {
        code: MetricCode::Kernel("icrc"),
        name: "Interface CRC error",
        description: "Interface CRC error during Ultra DMA transfer - often either a bad cable or power \
            problem, though possibly an incorrect Ultra DMA mode setting by the driver.",
    },
    MetricDescriptor {
        code: MetricCode::Kernel("idnf"),
        name: "Sector ID Not Found",
        description: " If the sector that holds this information is corrupt there is no way for the hard \
            drive to locate this sector and it will return the result IDNF.",
    },
    MetricDescriptor {
        code: MetricCode::Kernel("unc"),
        name: "Uncorrectable error",
        description: "Uncorrectable error - often due to bad sectors on the disk.",
    },
];

pub fn lookup_smart_attribute(id: u32) -> Result<&'static MetricDescriptor, EngineError> {
    SMART_ATTRIBUTES
        .iter()
        .find(|d| d.code == MetricCode::Smart(id))
        .ok_or_else(|| EngineError::UnknownMetricCode(id.to_string()))
}

pub fn lookup_kernel_error(code: &str) -> Result<&'static MetricDescriptor, EngineError> {
    KERNEL_ERRORS
        .iter()
        .find(|d| matches!(d.code, MetricCode::Kernel(c) if c == code))
        .ok_or_else(|| EngineError::UnknownMetricCode(code.to_string()))
}

/// Every monitored SMART attribute ID, in table order.
pub fn smart_codes() -> Vec<u32> {
    SMART_ATTRIBUTES.iter().filter_map(|d| match d.code {
        MetricCode::Smart(id) => Some(id),
        MetricCode::Kernel(_) => None,
    }).collect()
}

/// Every monitored kernel error code, in table order.
pub fn kernel_codes() -> Vec<String> {
    KERNEL_ERRORS.iter().filter_map(|d| match d.code {
        MetricCode::Kernel(code) => Some(code.to_string()),
        MetricCode::Smart(_)     => None,
    }).collect()
}
