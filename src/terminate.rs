use crate::error::Error;
use crate::muted_error;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

/// Send `SIGKILL` to a process.
pub fn try_terminate(pid: u32) -> Result<(), Error> {
    // zero and negative values address process groups
    let raw = i32::try_from(pid)
        .ok()
        .filter(|&raw| raw > 0)
        .ok_or_else(|| Error::Termination(pid, "pid out of range".to_string()))?;

    kill(Pid::from_raw(raw), Signal::SIGKILL).map_err(|e| Error::Termination(pid, e.to_string()))
}

/// Kill a debugged process at session teardown. Never fails: the process may be gone already.
pub fn terminate(pid: u32) {
    if muted_error!(try_terminate(pid)).is_some() {
        log::info!(target: "bridge", "process {pid} killed");
    }
}
