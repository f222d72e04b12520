use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;

/// Signal 0 checks for existence without delivering anything. EPERM still
/// means the process exists.
pub fn is_alive(pid: i32) -> bool {
    if pid <= 0 {
        return false;
    }
    match kill(Pid::from_raw(pid), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_process_is_alive() {
        assert!(is_alive(std::process::id() as i32));
    }

    #[test]
    fn test_invalid_pid_is_not_alive() {
        assert!(!is_alive(0));
        assert!(!is_alive(-1));
    }
}
