use crate::models::evaluated::{DiskStatus, EvaluatedDisk};

/// Generate a human-readable evaluation report to a String.
pub fn generate(host_serial: &str, disks: &[EvaluatedDisk], had_older: bool) -> String {
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    let mut out = String::new();

    out.push_str("═══════════════════════════════════════════════\n");
    out.push_str(&format!("  Disk Health Report ({}) {}\n", host_serial, now));
    out.push_str("═══════════════════════════════════════════════\n\n");

    // ── Summary ────────────────────────────────────────────────────────
    let count = |s: DiskStatus| disks.iter().filter(|d| d.status == s).count();
    out.push_str(&format!("── Summary ({} disks) ─────────────────────────\n", disks.len()));
    out.push_str(&format!(
        "  normal: {}   warning: {}   error: {}\n",
        count(DiskStatus::Normal), count(DiskStatus::Warning), count(DiskStatus::Error),
    ));
    if !had_older {
        out.push_str("  (no older snapshot in period, increments equal current values)\n");
    }
    out.push('\n');

    // ── Disks ──────────────────────────────────────────────────────────
    out.push_str("── Disks ──────────────────────────────────────\n");
    for d in disks {
        out.push_str(&format!(
            "  [{:4}] {:<20} {:4}  {}\n",
            d.status.label(), d.serial(), d.disk.kind.label().trim(), d.disk.path,
        ));
        out.push_str(&format!(
            "         overview: {}  SMART: {}\n",
            d.disk.overview_status.as_str(), d.disk.smart_status.as_str(),
        ));
        for f in &d.flags {
            out.push_str(&format!(
                "         • {:<30} value {:>6}  change {:>+6}\n",
                f.name, f.value, f.increment,
            ));
        }
        out.push('\n');
    }

    out.push_str("═══════════════════════════════════════════════\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvaluationConfig;
    use crate::engine::evaluate_snapshot_pair;
    use crate::models::snapshot::{Snapshot, SnapshotPair};
    use serde_json::json;

    #[test]
    fn report_lists_disks_and_flags() {
        let snap = |v: &str| Snapshot::from_value(&json!({ "disks": [
            { "serial": "A1", "path": "/dev/sata1", "overview_status": "normal", "smart": "normal",
              "smart_attr": [[5, "Reallocated_Sector_Ct", 1, 1, v]], "kernel_err": {} },
            { "serial": "B2", "path": "/dev/nvme0n1", "overview_status": "normal", "smart": "normal",
              "smart_attr": [], "kernel_err": {} }
        ]})).unwrap();
        let pair = SnapshotPair { latest: snap("10"), older: Some(snap("4")) };
        let disks = evaluate_snapshot_pair(&pair, &EvaluationConfig::default()).unwrap();

        let text = generate("NAS-1", &disks, true);
        assert!(text.contains("Disk Health Report (NAS-1)"));
        assert!(text.contains("normal: 1   warning: 1   error: 0"));
        assert!(text.contains("A1"));
        assert!(text.contains("Reallocated Sectors Count"));
        assert!(text.contains("+6"));
        assert!(!text.contains("no older snapshot"));
    }
}
