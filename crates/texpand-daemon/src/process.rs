use std::process::Command;

/// Verify if a process with the given PID is running
#[cfg(unix)]
pub fn verify_process_running(pid: u32) -> bool {
    // kill -0 only checks that the process exists
    Command::new("kill")
        .args(["-0", &pid.to_string()])
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(windows)]
pub fn verify_process_running(pid: u32) -> bool {
    Command::new("tasklist")
        .args(["/FI", &format!("PID eq {}", pid), "/NH"])
        .output()
        .map(|output| String::from_utf8_lossy(&output.stdout).contains(&pid.to_string()))
        .unwrap_or(false)
}

/// Ask a process to exit; `force` skips the graceful request
#[cfg(unix)]
pub fn terminate_process(pid: u32, force: bool) -> bool {
    let pid = pid.to_string();
    let mut cmd = Command::new("kill");
    if force {
        cmd.arg("-9");
    }
    cmd.arg(&pid)
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(windows)]
pub fn terminate_process(pid: u32, force: bool) -> bool {
    let pid = pid.to_string();
    let mut cmd = Command::new("taskkill");
    if force {
        cmd.args(["/F", "/T"]);
    }
    cmd.args(["/PID", &pid])
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
