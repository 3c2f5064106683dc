// src/exec/kill.rs

//! Platform-specific termination helpers.

use std::io;
use std::process::ExitStatus;

use tokio::process::Child;

/// Ask the child to terminate.
///
/// On Unix this sends `SIGTERM`; elsewhere it falls back to Tokio's
/// `start_kill`. A child that has already been reaped is left alone.
pub(crate) fn terminate(child: &mut Child) -> io::Result<()> {
    #[cfg(unix)]
    {
        let Some(pid) = child.id() else {
            return Ok(());
        };
        let pid = libc::pid_t::try_from(pid)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        // SAFETY: `kill` has no memory-safety preconditions; `pid` belongs to
        // a child we have not reaped yet, so it cannot have been recycled.
        let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    #[cfg(not(unix))]
    {
        child.start_kill()
    }
}

/// Name of the signal that ended the process, if it was ended by one.
pub(crate) fn signal_name(status: &ExitStatus) -> Option<String> {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;

        status.signal().map(|sig| match sig {
            libc::SIGHUP => "SIGHUP".to_string(),
            libc::SIGINT => "SIGINT".to_string(),
            libc::SIGQUIT => "SIGQUIT".to_string(),
            libc::SIGABRT => "SIGABRT".to_string(),
            libc::SIGKILL => "SIGKILL".to_string(),
            libc::SIGSEGV => "SIGSEGV".to_string(),
            libc::SIGPIPE => "SIGPIPE".to_string(),
            libc::SIGALRM => "SIGALRM".to_string(),
            libc::SIGTERM => "SIGTERM".to_string(),
            other => format!("SIG{other}"),
        })
    }

    #[cfg(not(unix))]
    {
        let _ = status;
        None
    }
}

/// Symbolic code for a spawn failure, in the style of `errno` names.
pub(crate) fn error_code(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => "ENOENT".to_string(),
        io::ErrorKind::PermissionDenied => "EACCES".to_string(),
        io::ErrorKind::InvalidInput => "EINVAL".to_string(),
        _ => match err.raw_os_error() {
            Some(code) => format!("OS{code}"),
            None => format!("{:?}", err.kind()).to_uppercase(),
        },
    }
}
