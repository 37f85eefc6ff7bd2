#![allow(unsafe_code)]
//! Best-effort CPU pinning for subscribed threads.
//!
//! Keeping every subscriber on one CPU makes the spin-yield hand-off less
//! noisy, but nothing may depend on it: this is a hint. On platforms
//! without an affinity call both functions succeed without doing anything.

use std::io;
use std::thread;

/// Number of CPUs available to this process, at least one.
#[must_use]
pub fn cpu_count() -> usize {
    thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

/// Restricts the calling thread to the single CPU `cpu` (taken modulo the
/// CPU count).
///
/// # Errors
///
/// Returns the OS error when the affinity call is rejected.
#[cfg(target_os = "linux")]
pub fn pin_current_thread(cpu: usize) -> io::Result<()> {
    unsafe {
        let mut set = std::mem::zeroed::<libc::cpu_set_t>();
        libc::CPU_ZERO(&mut set);
        libc::CPU_SET(cpu % cpu_count().min(libc::CPU_SETSIZE as usize), &mut set);
        if libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Allows the calling thread to run on every available CPU again.
///
/// # Errors
///
/// Returns the OS error when the affinity call is rejected.
#[cfg(target_os = "linux")]
pub fn reset_affinity() -> io::Result<()> {
    unsafe {
        let mut set = std::mem::zeroed::<libc::cpu_set_t>();
        libc::CPU_ZERO(&mut set);
        for cpu in 0..cpu_count().min(libc::CPU_SETSIZE as usize) {
            libc::CPU_SET(cpu, &mut set);
        }
        if libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Restricts the calling thread to a single CPU. Unsupported here; always
/// succeeds without effect.
#[cfg(not(target_os = "linux"))]
pub fn pin_current_thread(_cpu: usize) -> io::Result<()> {
    Ok(())
}

/// Allows the calling thread to run on every CPU. Unsupported here; always
/// succeeds without effect.
#[cfg(not(target_os = "linux"))]
pub fn reset_affinity() -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_count_is_positive() {
        assert!(cpu_count() >= 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn pin_and_restore_round_trip() {
        pin_current_thread(0).expect("pinning to the first CPU");
        reset_affinity().expect("restoring the full mask");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn out_of_range_cpu_wraps() {
        pin_current_thread(cpu_count() * 3 + 1).expect("index wraps into range");
        reset_affinity().unwrap();
    }
}
