use crate::config::{EvaluationConfig, MalformedPolicy};
use crate::engine::delta::apply_delta;
use crate::engine::disk;
use crate::error::EngineError;
use crate::models::evaluated::EvaluatedDisk;
use crate::models::snapshot::{DiskSnapshot, Snapshot, SnapshotPair};

/// Evaluate every disk of the latest snapshot and, when an older snapshot is
/// present, turn each flag's increment into the change over the period.
///
/// Results follow the order of `pair.latest`. Disks only found in the older
/// snapshot are ignored.
pub fn evaluate_snapshot_pair(
    pair: &SnapshotPair,
    cfg:  &EvaluationConfig,
) -> Result<Vec<EvaluatedDisk>, EngineError> {
    check_rejected(&pair.latest, cfg, "latest")?;
    let mut results = Vec::with_capacity(pair.latest.disks.len());
    for d in &pair.latest.disks {
        if let Some(e) = evaluate_or_skip(d, cfg)? {
            results.push(e);
        }
    }

    let Some(older) = &pair.older else {
        return Ok(results);
    };
    check_rejected(older, cfg, "older")?;

    for old_disk in &older.disks {
        let Some(latest) = results.iter_mut().find(|r| r.serial() == old_disk.serial) else {
            tracing::debug!(serial = %old_disk.serial, "disk no longer present, ignoring");
            continue;
        };
        if cfg.require_same_kind && latest.disk.kind != old_disk.kind {
            tracing::warn!(
                serial = %old_disk.serial,
                before = old_disk.kind.label().trim(),
                after  = latest.disk.kind.label().trim(),
                "device kind changed, not computing increments",
            );
            continue;
        }
        if let Some(old_eval) = evaluate_or_skip(old_disk, cfg)? {
            apply_delta(&old_eval, latest, cfg.match_strategy);
        }
    }

    Ok(results)
}

fn evaluate_or_skip(d: &DiskSnapshot, cfg: &EvaluationConfig) -> Result<Option<EvaluatedDisk>, EngineError> {
    match disk::evaluate(d, &cfg.smart_codes, &cfg.kernel_codes) {
        Ok(e) => Ok(Some(e)),
        Err(err) if skippable(&err, cfg) => {
            tracing::warn!(serial = %d.serial, error = %err, "skipping disk with malformed telemetry");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Disks that failed to load are dropped under `skip`. A dropped older disk
/// only loses its increments.
fn check_rejected(snapshot: &Snapshot, cfg: &EvaluationConfig, which: &str) -> Result<(), EngineError> {
    for err in &snapshot.rejected {
        if !skippable(err, cfg) {
            return Err(err.clone());
        }
        tracing::warn!(snapshot = which, error = %err, "skipping unreadable disk");
    }
    Ok(())
}

fn skippable(err: &EngineError, cfg: &EvaluationConfig) -> bool {
    cfg.on_malformed == MalformedPolicy::Skip
        && matches!(err, EngineError::MalformedMetricValue { .. } | EngineError::MissingRequiredField { .. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::delta::MatchStrategy;
    use crate::models::evaluated::DiskStatus;
    use crate::models::snapshot::Snapshot;
    use assert_matches::assert_matches;
    use serde_json::{json, Value};

    fn disk(serial: &str, path: &str, realloc: &str, overview: &str) -> Value {
        json!({
            "serial": serial,
            "path": path,
            "overview_status": overview,
            "smart": "normal",
            "smart_attr": [[5, "Reallocated_Sector_Ct", 100, 100, realloc]],
            "kernel_err": { "unc": 0 },
        })
    }

    fn snapshot(disks: Vec<Value>) -> Snapshot {
        Snapshot::from_value(&json!({ "disks": disks })).unwrap()
    }

    #[test]
    fn latest_only_has_no_deltas() {
        let pair = SnapshotPair {
            latest: snapshot(vec![disk("A", "/dev/sata1", "7", "normal"), disk("B", "/dev/sata2", "0", "normal")]),
            older:  None,
        };
        let out = evaluate_snapshot_pair(&pair, &EvaluationConfig::default()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].serial(), "A");
        assert_eq!(out[0].flags[0].increment, 7);
        assert_eq!(out[1].status, DiskStatus::Normal);
    }

    #[test]
    fn older_snapshot_produces_increments() {
        let pair = SnapshotPair {
            latest: snapshot(vec![disk("A", "/dev/sata1", "8", "normal"), disk("B", "/dev/sata2", "2", "normal")]),
            older:  Some(snapshot(vec![disk("B", "/dev/sata2", "0", "normal"), disk("A", "/dev/sata1", "5", "normal")])),
        };
        let out = evaluate_snapshot_pair(&pair, &EvaluationConfig::default()).unwrap();
        assert_eq!(out[0].serial(), "A");
        assert_eq!(out[0].flags[0].increment, 3);
        // B had no flag before, so the full value is the increment
        assert_eq!(out[1].flags[0].increment, 2);
    }

    #[test]
    fn removed_disks_contribute_nothing() {
        let pair = SnapshotPair {
            latest: snapshot(vec![disk("A", "/dev/sata1", "1", "normal")]),
            older:  Some(snapshot(vec![disk("GONE", "/dev/sata3", "50", "failing")])),
        };
        let out = evaluate_snapshot_pair(&pair, &EvaluationConfig::default()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].flags[0].increment, 1);
    }

    #[test]
    fn device_kind_change_skips_delta_by_default() {
        let pair = SnapshotPair {
            latest: snapshot(vec![disk("A", "/dev/sata1", "8", "normal")]),
            older:  Some(snapshot(vec![disk("A", "/dev/nvme0n1", "5", "normal")])),
        };
        let mut cfg = EvaluationConfig::default();
        let out = evaluate_snapshot_pair(&pair, &cfg).unwrap();
        assert_eq!(out[0].flags[0].increment, 8);

        // the older NVMe evaluation has no SMART flags, so nothing matches either way
        cfg.require_same_kind = false;
        let out = evaluate_snapshot_pair(&pair, &cfg).unwrap();
        assert_eq!(out[0].flags[0].increment, 8);
    }

    #[test]
    fn kind_check_can_be_disabled() {
        let pair = SnapshotPair {
            latest: snapshot(vec![disk("A", "/dev/nvme0n1", "0", "failing")]),
            older:  Some(snapshot(vec![disk("A", "/dev/sata1", "0", "failing")])),
        };
        let cfg = EvaluationConfig { require_same_kind: false, ..EvaluationConfig::default() };
        let out = evaluate_snapshot_pair(&pair, &cfg).unwrap();
        assert_eq!(out[0].status, DiskStatus::Error);
        assert_eq!(out[0].flags[0].increment, 0);
    }

    #[test]
    fn malformed_disk_aborts_by_default() {
        let pair = SnapshotPair {
            latest: snapshot(vec![disk("A", "/dev/sata1", "N/A", "normal")]),
            older:  None,
        };
        assert_matches!(
            evaluate_snapshot_pair(&pair, &EvaluationConfig::default()),
            Err(EngineError::MalformedMetricValue { .. })
        );
    }

    #[test]
    fn malformed_disk_can_be_skipped() {
        let pair = SnapshotPair {
            latest: snapshot(vec![disk("A", "/dev/sata1", "N/A", "normal"), disk("B", "/dev/sata2", "4", "normal")]),
            older:  Some(snapshot(vec![disk("B", "/dev/sata2", "bad", "normal")])),
        };
        let cfg = EvaluationConfig { on_malformed: MalformedPolicy::Skip, ..EvaluationConfig::default() };
        let out = evaluate_snapshot_pair(&pair, &cfg).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].serial(), "B");
        assert_eq!(out[0].flags[0].increment, 4);
    }

    fn unreadable(serial: &str) -> Value {
        json!({
            "serial": serial,
            "path": "/dev/sata9",
            "overview_status": "normal",
            "smart": "normal",
            "smart_attr": [["x9", "Power_On_Hours", 1, 1, "1"], [9, "Power_On_Hours", 1]],
            "kernel_err": {},
        })
    }

    #[test]
    fn unreadable_latest_disk_aborts_unless_skipping() {
        let pair = SnapshotPair {
            latest: snapshot(vec![unreadable("BAD"), disk("GOOD", "/dev/sata1", "2", "normal")]),
            older:  None,
        };
        assert_matches!(
            evaluate_snapshot_pair(&pair, &EvaluationConfig::default()),
            Err(EngineError::MalformedMetricValue { serial, raw, .. }) if serial == "BAD" && raw == "x9"
        );

        let cfg = EvaluationConfig { on_malformed: MalformedPolicy::Skip, ..EvaluationConfig::default() };
        let out = evaluate_snapshot_pair(&pair, &cfg).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].serial(), "GOOD");
        assert_eq!(out[0].flags[0].increment, 2);
    }

    #[test]
    fn disk_missing_fields_is_skipped() {
        let mut partial = disk("HALF", "/dev/sata2", "1", "normal");
        partial.as_object_mut().unwrap().remove("kernel_err");
        let pair = SnapshotPair {
            latest: snapshot(vec![partial, disk("GOOD", "/dev/sata1", "0", "normal")]),
            older:  None,
        };
        assert_matches!(
            evaluate_snapshot_pair(&pair, &EvaluationConfig::default()),
            Err(EngineError::MissingRequiredField { field, .. }) if field == "kernel_err"
        );

        let cfg = EvaluationConfig { on_malformed: MalformedPolicy::Skip, ..EvaluationConfig::default() };
        let out = evaluate_snapshot_pair(&pair, &cfg).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].serial(), "GOOD");
    }

    #[test]
    fn unreadable_older_disk_only_loses_its_delta() {
        let mut old_a = unreadable("A");
        old_a["path"] = json!("/dev/sata1");
        let pair = SnapshotPair {
            latest: snapshot(vec![disk("A", "/dev/sata1", "8", "normal"), disk("B", "/dev/sata2", "6", "normal")]),
            older:  Some(snapshot(vec![old_a, disk("B", "/dev/sata2", "1", "normal")])),
        };
        assert_matches!(
            evaluate_snapshot_pair(&pair, &EvaluationConfig::default()),
            Err(EngineError::MalformedMetricValue { .. })
        );

        let cfg = EvaluationConfig { on_malformed: MalformedPolicy::Skip, ..EvaluationConfig::default() };
        let out = evaluate_snapshot_pair(&pair, &cfg).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].flags[0].increment, 8);
        assert_eq!(out[1].flags[0].increment, 5);
    }

    #[test]
    fn code_strategy_is_honoured() {
        let pair = SnapshotPair {
            latest: snapshot(vec![disk("A", "/dev/sata1", "9", "normal")]),
            older:  Some(snapshot(vec![disk("A", "/dev/sata1", "4", "normal")])),
        };
        let cfg = EvaluationConfig { match_strategy: MatchStrategy::Code, ..EvaluationConfig::default() };
        let out = evaluate_snapshot_pair(&pair, &cfg).unwrap();
        assert_eq!(out[0].flags[0].increment, 5);
    }

    #[test]
    fn evaluation_is_repeatable() {
        let pair = SnapshotPair {
            latest: snapshot(vec![disk("A", "/dev/sata1", "3", "critical"), disk("B", "/dev/nvme0n1", "9", "normal")]),
            older:  None,
        };
        let cfg = EvaluationConfig::default();
        let first  = evaluate_snapshot_pair(&pair, &cfg).unwrap();
        let second = evaluate_snapshot_pair(&pair, &cfg).unwrap();
        assert_eq!(first, second);
    }
}
