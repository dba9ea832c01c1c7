use crate::catalog::{MetricCode, MetricDescriptor};
use crate::models::snapshot::DiskSnapshot;
use serde::Serialize;

/// Derived health of a disk. Ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskStatus {
    Normal,
    Warning,
    Error,
}

impl DiskStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DiskStatus::Normal  => "OK",
            DiskStatus::Warning => "WARN",
            DiskStatus::Error   => "ERR",
        }
    }

    /// Raise to `to` if it is more severe. Never lowers.
    pub fn escalate(&mut self, to: DiskStatus) {
        if to > *self {
            *self = to;
        }
    }
}

/// What produced a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagSource {
    Metric(MetricCode),
    OverviewStatus,
    SmartStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flag {
    pub name:        String,
    #[serde(rename = "desc")]
    pub description: String,
    pub value:       i64,
    pub increment:   i64,
    #[serde(skip)]
    pub source:      FlagSource,
}

impl Flag {
    pub fn from_metric(descriptor: &MetricDescriptor, value: i64) -> Self {
        Self {
            name:        descriptor.name.to_string(),
            description: descriptor.description.to_string(),
            value,
            increment:   value,
            source:      FlagSource::Metric(descriptor.code),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedDisk {
    pub disk:   DiskSnapshot,
    pub status: DiskStatus,
    pub flags:  Vec<Flag>,
}

impl EvaluatedDisk {
    pub fn new(disk: DiskSnapshot) -> Self {
        Self { disk, status: DiskStatus::Normal, flags: Vec::new() }
    }

    pub fn serial(&self) -> &str {
        &self.disk.serial
    }

    /// Append a finding and escalate the status to at least `severity`.
    pub fn raise(&mut self, flag: Flag, severity: DiskStatus) {
        self.flags.push(flag);
        self.status.escalate(severity);
    }
}
