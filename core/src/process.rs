//! OS-level probes for monitor processes recorded in the session registry.

use std::io;

/// Reports whether `pid` names a live process.
///
/// Uses signal 0, so nothing is delivered. A process owned by another user
/// (`EPERM`) still counts as alive; `ESRCH` means it is gone. Any other errno
/// is surfaced to the caller.
#[cfg(unix)]
pub fn process_state(pid: u32) -> io::Result<bool> {
    let pid = to_pid(pid)?;
    // SAFETY: kill with signal 0 performs only the existence and permission
    // checks; it has no effect on the target.
    let rc = unsafe { libc::kill(pid, 0) };
    if rc == 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::EPERM) => Ok(true),
        Some(libc::ESRCH) => Ok(false),
        _ => Err(err),
    }
}

/// Sends SIGTERM to `pid`.
#[cfg(unix)]
pub fn terminate_process(pid: u32) -> io::Result<()> {
    let pid = to_pid(pid)?;
    // SAFETY: plain signal delivery to a positive pid; no memory is shared.
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(unix)]
fn to_pid(pid: u32) -> io::Result<libc::pid_t> {
    // 0 and negative values address process groups, never a single process.
    match libc::pid_t::try_from(pid) {
        Ok(pid) if pid > 0 => Ok(pid),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid pid {pid}"),
        )),
    }
}

#[cfg(not(unix))]
pub fn process_state(_pid: u32) -> io::Result<bool> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "process probing is only supported on unix",
    ))
}

#[cfg(not(unix))]
pub fn terminate_process(_pid: u32) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "process termination is only supported on unix",
    ))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn current_process_is_alive() {
        assert!(process_state(std::process::id()).expect("probe"));
    }

    #[test]
    fn reaped_child_is_gone() {
        let mut child = Command::new("true").spawn().expect("spawn");
        let pid = child.id();
        child.wait().expect("wait");
        assert!(!process_state(pid).expect("probe"));
    }

    #[test]
    fn terminate_stops_a_sleeping_child() {
        let mut child = Command::new("sleep").arg("30").spawn().expect("spawn");
        terminate_process(child.id()).expect("terminate");
        let status = child.wait().expect("wait");
        assert!(!status.success());
    }

    #[test]
    fn zero_pid_is_rejected() {
        let err = process_state(0).expect_err("invalid");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
