// crates/daemon/src/os.rs
#![allow(unsafe_code)]

use std::io;

#[cfg(unix)]
use nix::unistd::{ForkResult, fork};

#[cfg(unix)]
pub(crate) use nix::unistd::Pid;

#[cfg(unix)]
/// Fork the current process.
///
/// # Safety
/// This wrapper is safe because it performs the raw `fork(2)` and returns
/// immediately without touching shared state in the child. The caller is
/// responsible for keeping the child single-threaded; the child never
/// returns into the code that called [`crate::Daemon::run`].
pub(crate) fn fork_daemon() -> io::Result<ForkResult> {
    // SAFETY: see the `Safety` section above.
    unsafe { fork() }.map_err(io::Error::from)
}

#[cfg(unix)]
pub(crate) fn detach_session() -> io::Result<()> {
    nix::unistd::setsid().map(drop).map_err(io::Error::from)
}

#[cfg(unix)]
pub(crate) fn clear_umask() {
    use nix::sys::stat::{Mode, umask};
    let _ = umask(Mode::empty());
}

#[cfg(unix)]
pub(crate) fn ignore_child_exit() -> io::Result<()> {
    use nix::sys::signal::{SigHandler, Signal, signal};
    // SAFETY: installing SIG_IGN does not run any handler code.
    unsafe { signal(Signal::SIGCHLD, SigHandler::SigIgn) }
        .map(drop)
        .map_err(io::Error::from)
}

#[cfg(unix)]
pub(crate) fn reap_in_background(child: Pid) -> io::Result<()> {
    std::thread::Builder::new()
        .name(format!("reap-{child}"))
        .spawn(move || {
            let _ = nix::sys::wait::waitpid(child, None);
        })
        .map(drop)
}

#[cfg(unix)]
/// Points stdin, stdout and stderr at `/dev/null`.
pub(crate) fn redirect_stdio() -> io::Result<()> {
    use std::fs::OpenOptions;
    use std::os::fd::AsRawFd;

    let null = OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/null")?;
    for target in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
        // SAFETY: both descriptors are valid for the duration of the call.
        if unsafe { libc::dup2(null.as_raw_fd(), target) } < 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

#[cfg(unix)]
pub(crate) fn terminate_self() -> io::Result<()> {
    use nix::sys::signal::{Signal, kill};
    kill(Pid::this(), Signal::SIGTERM).map_err(io::Error::from)
}

#[cfg(unix)]
/// Sends SIGTERM to `pid`. Returns `Ok(false)` if no such process exists.
pub fn terminate(pid: u32) -> io::Result<bool> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};

    let raw = i32::try_from(pid).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    match kill(Pid::from_raw(raw), Signal::SIGTERM) {
        Ok(()) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(unix)]
/// Whether a process with `pid` currently exists.
pub fn is_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    match kill(Pid::from_raw(raw), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
pub fn terminate(_pid: u32) -> io::Result<bool> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "signals are not supported on this platform",
    ))
}

#[cfg(not(unix))]
pub fn is_alive(_pid: u32) -> bool {
    false
}
