//! Best-effort application of POSIX resource limits to the current process.
//!
//! Each limit kind is read, optionally reported, and then rewritten with
//! soft = hard = the resolved value. Failures are warned and skipped: the
//! remaining kinds and the eventual exec proceed regardless.

use std::fmt;
use std::io;

use crate::profile::ResourceProfile;

#[cfg(target_env = "gnu")]
type Resource = libc::__rlimit_resource_t;
#[cfg(not(target_env = "gnu"))]
type Resource = libc::c_int;

/// The three limit kinds this tool manages, in application order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitKind {
    AddressSpace,
    Data,
    OpenFiles,
}

impl LimitKind {
    pub const ALL: [LimitKind; 3] = [
        LimitKind::AddressSpace,
        LimitKind::Data,
        LimitKind::OpenFiles,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LimitKind::AddressSpace => "address space",
            LimitKind::Data => "data segment",
            LimitKind::OpenFiles => "open files",
        }
    }

    fn resource(self) -> Resource {
        match self {
            LimitKind::AddressSpace => libc::RLIMIT_AS,
            LimitKind::Data => libc::RLIMIT_DATA,
            LimitKind::OpenFiles => libc::RLIMIT_NOFILE,
        }
    }
}

/// Current (soft, hard) values for a limit kind.
pub fn read(kind: LimitKind) -> io::Result<(libc::rlim_t, libc::rlim_t)> {
    let mut rlim = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // Safety: `rlim` is a valid, writable rlimit struct for the duration of
    // the call.
    let ret = unsafe { libc::getrlimit(kind.resource(), &mut rlim) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok((rlim.rlim_cur, rlim.rlim_max))
}

/// Set both soft and hard values of a limit kind.
pub fn write(kind: LimitKind, value: u64) -> io::Result<()> {
    let rlim = libc::rlimit {
        rlim_cur: value as libc::rlim_t,
        rlim_max: value as libc::rlim_t,
    };
    // Safety: `rlim` is a valid rlimit struct for the duration of the call.
    let ret = unsafe { libc::setrlimit(kind.resource(), &rlim) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Apply a resolved profile to the current process, best-effort.
///
/// A read or write failure on one kind does not stop the others; the policy
/// is to constrain as much as possible and exec anyway.
pub fn apply(profile: &ResourceProfile, verbose: bool) {
    for kind in LimitKind::ALL {
        let value = match kind {
            LimitKind::AddressSpace => profile.memory,
            LimitKind::Data => profile.data,
            LimitKind::OpenFiles => profile.files,
        };
        let current = match read(kind) {
            Ok(current) => Some(current),
            Err(err) => {
                tracing::warn!(limit = kind.name(), %err, "unable to read current limit");
                None
            }
        };
        if let Err(err) = write(kind, value) {
            tracing::warn!(limit = kind.name(), %err, "unable to set limit");
            continue;
        }
        // Report only limits that actually took effect.
        if verbose {
            match current {
                Some((soft, hard)) => println!(
                    "{}: soft={} hard={} -> {}",
                    kind.name(),
                    Rlim(soft),
                    Rlim(hard),
                    value
                ),
                None => println!("{}: -> {}", kind.name(), value),
            }
        }
        tracing::debug!(limit = kind.name(), value, "limit set");
    }
}

/// Renders `RLIM_INFINITY` as `unlimited`, otherwise the numeric value.
struct Rlim(libc::rlim_t);

impl fmt::Display for Rlim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == libc::RLIM_INFINITY {
            f.write_str("unlimited")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
