use crate::models::evaluated::EvaluatedDisk;
use serde::Serialize;
use serde_json::{Map, Value};

/// Body POSTed to the reporting endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Payload {
    #[serde(rename = "NAS_SN")]
    pub host_serial: String,
    pub disks:       Vec<Map<String, Value>>,
}

/// Merge each evaluation back into its upstream disk object: every original
/// field, plus `status` and `flag`.
pub fn build_payload(host_serial: &str, disks: &[EvaluatedDisk]) -> Payload {
    let disks = disks.iter().map(|e| {
        let mut obj = e.disk.raw.clone();
        obj.insert("status".into(), serde_json::to_value(e.status).unwrap_or(Value::Null));
        obj.insert("flag".into(), serde_json::to_value(&e.flags).unwrap_or_else(|_| Value::Array(Vec::new())));
        obj
    }).collect();

    Payload { host_serial: host_serial.to_string(), disks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvaluationConfig;
    use crate::engine::evaluate_snapshot_pair;
    use crate::models::snapshot::{Snapshot, SnapshotPair};
    use serde_json::json;

    #[test]
    fn payload_keeps_upstream_fields() {
        let latest = Snapshot::from_value(&json!({ "disks": [{
            "serial": "Z1", "path": "/dev/sata1", "model": "ST4000VN008", "temp": 38,
            "overview_status": "normal", "smart": "normal",
            "smart_attr": [[197, "Current_Pending_Sector", 100, 100, "2"]],
            "kernel_err": { "icrc": 0 }
        }]})).unwrap();
        let pair = SnapshotPair { latest, older: None };
        let disks = evaluate_snapshot_pair(&pair, &EvaluationConfig::default()).unwrap();

        let v = serde_json::to_value(build_payload("NAS-42", &disks)).unwrap();
        assert_eq!(v["NAS_SN"], "NAS-42");
        let disk = &v["disks"][0];
        assert_eq!(disk["serial"], "Z1");
        assert_eq!(disk["model"], "ST4000VN008");
        assert_eq!(disk["temp"], 38);
        assert_eq!(disk["status"], "warning");
        assert_eq!(disk["flag"][0]["name"], "Current Pending Sector Count");
        assert_eq!(disk["flag"][0]["value"], 2);
        assert_eq!(disk["flag"][0]["increment"], 2);
    }
}
