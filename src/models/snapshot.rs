use crate::error::EngineError;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

/// Column of a `smart_attr` row holding the attribute ID.
const ATTR_ID_COLUMN: usize = 0;
/// Column of a `smart_attr` row holding the raw value.
const ATTR_RAW_COLUMN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Rotational,
    NVMe,
}

impl DeviceKind {
    /// NVMe namespaces are recognised by their device path (`/dev/nvme0n1`).
    pub fn from_path(path: &str) -> Self {
        if path.contains("nvme") { DeviceKind::NVMe } else { DeviceKind::Rotational }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeviceKind::Rotational => " HDD",
            DeviceKind::NVMe       => "NVMe",
        }
    }
}

/// Health verdict as written by the prediction tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Normal,
    Critical,
    Failing,
    Other(String),
}

impl Verdict {
    pub fn parse(s: &str) -> Self {
        match s {
            "normal"   => Verdict::Normal,
            "critical" => Verdict::Critical,
            "failing"  => Verdict::Failing,
            other      => Verdict::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Verdict::Normal   => "normal",
            Verdict::Critical => "critical",
            Verdict::Failing  => "failing",
            Verdict::Other(s) => s,
        }
    }

    pub fn is_abnormal(&self) -> bool {
        matches!(self, Verdict::Critical | Verdict::Failing)
    }
}

/// One `smart_attr` row. Only the ID and raw value are interpreted; the
/// full row is kept for the outbound payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAttributeRecord {
    pub code:      u32,
    pub raw_value: String,
    pub columns:   Vec<Value>,
}

/// Kernel error code → observed count, as found in `kernel_err`.
pub type KernelErrorCounters = BTreeMap<String, Value>;

/// One disk in one prediction file.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskSnapshot {
    pub serial:          String,
    pub path:            String,
    pub kind:            DeviceKind,
    pub overview_status: Verdict,
    pub smart_status:    Verdict,
    pub attributes:      Vec<RawAttributeRecord>,
    pub kernel_errors:   KernelErrorCounters,
    /// The upstream object, untouched.
    pub raw:             Map<String, Value>,
}

impl DiskSnapshot {
    /// Build a disk from its upstream JSON object. `index` only names the
    /// disk in errors when its serial is missing.
    pub fn from_value(index: usize, value: &Value) -> Result<Self, EngineError> {
        let fallback_id = format!("#{}", index);
        let obj = value.as_object().ok_or_else(|| EngineError::MissingRequiredField {
            serial: fallback_id.clone(),
            field:  "serial".into(),
        })?;

        let serial = match obj.get("serial") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(missing(&fallback_id, "serial")),
        };

        let path = obj.get("path").and_then(Value::as_str).unwrap_or("").to_string();
        let overview_status = verdict_field(obj, &serial, "overview_status")?;
        let smart_status    = verdict_field(obj, &serial, "smart")?;

        let kernel_errors: KernelErrorCounters = obj.get("kernel_err")
            .and_then(Value::as_object)
            .ok_or_else(|| missing(&serial, "kernel_err"))?
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let rows = obj.get("smart_attr")
            .and_then(Value::as_array)
            .ok_or_else(|| missing(&serial, "smart_attr"))?;
        let attributes = rows.iter().enumerate()
            .map(|(i, row)| parse_attribute_row(&serial, i, row))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            kind: DeviceKind::from_path(&path),
            serial,
            path,
            overview_status,
            smart_status,
            attributes,
            kernel_errors,
            raw: obj.clone(),
        })
    }
}

fn missing(serial: &str, field: &str) -> EngineError {
    EngineError::MissingRequiredField { serial: serial.to_string(), field: field.to_string() }
}

fn verdict_field(obj: &Map<String, Value>, serial: &str, field: &str) -> Result<Verdict, EngineError> {
    obj.get(field)
        .and_then(Value::as_str)
        .map(Verdict::parse)
        .ok_or_else(|| missing(serial, field))
}

fn parse_attribute_row(serial: &str, index: usize, row: &Value) -> Result<RawAttributeRecord, EngineError> {
    let columns = row.as_array()
        .ok_or_else(|| missing(serial, &format!("smart_attr[{}]", index)))?;

    let id = columns.get(ATTR_ID_COLUMN)
        .ok_or_else(|| missing(serial, &format!("smart_attr[{}][{}]", index, ATTR_ID_COLUMN)))?;
    let code = match id {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
    .ok_or_else(|| EngineError::MalformedMetricValue {
        serial: serial.to_string(),
        metric: format!("smart_attr[{}] id", index),
        raw:    id.as_str().map(str::to_string).unwrap_or_else(|| id.to_string()),
    })?;

    let raw_value = match columns.get(ATTR_RAW_COLUMN) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => {
            return Err(missing(serial, &format!("smart_attr[{}][{}]", index, ATTR_RAW_COLUMN)));
        }
        Some(other) => other.to_string(),
    };

    Ok(RawAttributeRecord { code, raw_value, columns: columns.clone() })
}

/// All disks of one prediction file, in file order.
///
/// A disk whose object cannot be read does not fail the whole file. Its
/// error is kept in `rejected` and the evaluator applies the configured
/// malformed-data policy to it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub disks:    Vec<DiskSnapshot>,
    pub rejected: Vec<EngineError>,
}

impl Snapshot {
    pub fn from_value(value: &Value) -> Result<Self, EngineError> {
        let list = value.get("disks")
            .and_then(Value::as_array)
            .ok_or_else(|| missing("-", "disks"))?;

        let mut seen = HashSet::new();
        let mut snapshot = Self { disks: Vec::with_capacity(list.len()), rejected: Vec::new() };
        for (i, entry) in list.iter().enumerate() {
            let disk = match DiskSnapshot::from_value(i, entry) {
                Ok(d) => d,
                Err(err) => {
                    snapshot.rejected.push(err);
                    continue;
                }
            };
            if !seen.insert(disk.serial.clone()) {
                return Err(EngineError::DuplicateSerial(disk.serial));
            }
            snapshot.disks.push(disk);
        }
        Ok(snapshot)
    }
}

/// The latest snapshot and, when the look-back period is covered, an older one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SnapshotPair {
    pub latest: Snapshot,
    pub older:  Option<Snapshot>,
}
