use crate::error::CollectError;
use std::fs;
use std::path::Path;

/// Read the host serial number (one line, e.g. `/proc/sys/kernel/syno_serial`).
pub fn read_host_serial(path: &Path) -> Result<String, CollectError> {
    let text = fs::read_to_string(path).map_err(|source| CollectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let serial = text.replace(['\n', '\r'], "");
    if serial.trim().is_empty() {
        return Err(CollectError::EmptyHostSerial(path.to_path_buf()));
    }
    Ok(serial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn strips_line_breaks() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("serial");
        fs::write(&path, "1930PDN123456\n").unwrap();
        assert_eq!(read_host_serial(&path).unwrap(), "1930PDN123456");
    }

    #[test]
    fn empty_or_missing_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("serial");
        fs::write(&path, "\n").unwrap();
        assert_matches!(read_host_serial(&path), Err(CollectError::EmptyHostSerial(_)));
        assert_matches!(read_host_serial(&tmp.path().join("nope")), Err(CollectError::Io { .. }));
    }
}
