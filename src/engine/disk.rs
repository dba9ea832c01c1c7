//! Single-disk classification.
//!
//! Checks run in a fixed order (SMART attributes, kernel errors, upstream
//! verdicts) and each appends flags and escalates the status; the final
//! status is the most severe one raised.

use crate::catalog;
use crate::error::EngineError;
use crate::models::evaluated::{DiskStatus, EvaluatedDisk, Flag, FlagSource};
use crate::models::snapshot::{DeviceKind, DiskSnapshot};
use serde_json::Value;

pub fn evaluate(
    disk:         &DiskSnapshot,
    smart_codes:  &[u32],
    kernel_codes: &[String],
) -> Result<EvaluatedDisk, EngineError> {
    let mut out = EvaluatedDisk::new(disk.clone());

    if disk.kind == DeviceKind::NVMe {
        tracing::info!(serial = %disk.serial, "disk is NVMe, skipping SMART attribute check");
    } else {
        for flag in smart_flags(disk, smart_codes)? {
            out.raise(flag, DiskStatus::Warning);
        }
    }

    for flag in kernel_flags(disk, kernel_codes)? {
        out.raise(flag, DiskStatus::Warning);
    }

    for flag in verdict_flags(disk) {
        out.raise(flag, DiskStatus::Error);
    }

    Ok(out)
}

fn smart_flags(disk: &DiskSnapshot, codes: &[u32]) -> Result<Vec<Flag>, EngineError> {
    let mut flags = Vec::new();
    for attr in disk.attributes.iter().filter(|a| codes.contains(&a.code)) {
        let value = parse_raw_value(&attr.raw_value).ok_or_else(|| EngineError::MalformedMetricValue {
            serial: disk.serial.clone(),
            metric: format!("SMART {}", attr.code),
            raw:    attr.raw_value.clone(),
        })?;
        if value > 0 {
            flags.push(Flag::from_metric(catalog::lookup_smart_attribute(attr.code)?, value));
        }
    }
    Ok(flags)
}

fn kernel_flags(disk: &DiskSnapshot, codes: &[String]) -> Result<Vec<Flag>, EngineError> {
    let mut flags = Vec::new();
    for code in codes {
        let Some(raw) = disk.kernel_errors.get(code) else { continue };
        let count = parse_count(raw).ok_or_else(|| EngineError::MalformedMetricValue {
            serial: disk.serial.clone(),
            metric: format!("kernel {}", code),
            raw:    raw.to_string(),
        })?;
        if count > 0 {
            flags.push(Flag::from_metric(catalog::lookup_kernel_error(code)?, count));
        }
    }
    Ok(flags)
}

fn verdict_flags(disk: &DiskSnapshot) -> Vec<Flag> {
    let mut flags = Vec::new();
    if disk.overview_status.is_abnormal() {
        flags.push(Flag {
            name:        "Disk status is not normal".into(),
            description: format!(
                "Please check the status of the disk. Current status: {}",
                disk.overview_status.as_str()
            ),
            value:       0,
            increment:   0,
            source:      FlagSource::OverviewStatus,
        });
    }
    if disk.smart_status.is_abnormal() {
        flags.push(Flag {
            name:        "SMART status is not normal".into(),
            description: format!(
                "Please check the status of the disk. Current SMART status: {}",
                disk.smart_status.as_str()
            ),
            value:       0,
            increment:   0,
            source:      FlagSource::SmartStatus,
        });
    }
    flags
}

/// Parse a SMART raw value, ignoring anything but digits and dots
/// (trailing units such as `"12 sectors"`). The fraction is dropped.
pub fn parse_raw_value(raw: &str) -> Option<i64> {
    let cleaned: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v.trunc() as i64)
}

fn parse_count(raw: &Value) -> Option<i64> {
    let v = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    v.is_finite().then(|| v.trunc() as i64)
}
