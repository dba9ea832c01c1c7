use crate::error::DeliveryError;
use crate::util::payload::Payload;
use std::io::Write;
use std::process::{Command, Output, Stdio};
use std::time::Duration;

/// POST `payload` as JSON to `url` through curl, retrying up to `retries`
/// extra times. Blocks until the last attempt finishes.
pub fn deliver(url: &str, payload: &Payload, timeout: Duration, retries: u32) -> Result<(), DeliveryError> {
    let body = serde_json::to_string(payload)?;
    let mut attempt = 0;
    loop {
        match post_json(url, &body, timeout) {
            Ok(()) => return Ok(()),
            Err(e) if attempt < retries => {
                attempt += 1;
                tracing::warn!(error = %e, attempt, retries, "POST failed, retrying");
            }
            Err(e) => return Err(e),
        }
    }
}

fn post_json(url: &str, body: &str, timeout: Duration) -> Result<(), DeliveryError> {
    let max_time = timeout.as_secs().max(1).to_string();
    let mut cmd = Command::new("curl");
    cmd.args([
        "-s", "--max-time", &max_time,
        "-o", "/dev/null",
        "-w", "%{http_code}",
        "-X", "POST",
        "-H", "Content-Type: application/json",
        "--data-binary", "@-",
        url,
    ]);
    let out = run_with_stdin(cmd, body)?;
    check_http_code(&String::from_utf8_lossy(&out.stdout))
}

/// Run `cmd` with `body` on stdin. The child is always waited for, even when
/// it stops reading early.
fn run_with_stdin(mut cmd: Command, body: &str) -> Result<Output, DeliveryError> {
    // Body goes through stdin so large reports do not hit argv limits.
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(body.as_bytes()),
        None            => Ok(()),
    };
    let out = child.wait_with_output()?;

    if !out.status.success() {
        return Err(DeliveryError::Transport {
            code:   out.status.code(),
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        });
    }
    written?;
    Ok(out)
}

/// Interpret curl's `%{http_code}` output.
fn check_http_code(written: &str) -> Result<(), DeliveryError> {
    let code: u16 = written.trim().parse().unwrap_or(0);
    if code == 0 || code >= 400 {
        return Err(DeliveryError::Status(code));
    }
    Ok(())
}
