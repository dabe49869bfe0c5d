//! Capability Probes
//!
//! The engine never touches the clock, the heap or a collector directly; it
//! goes through an injected [`Probe`]. Absence of a capability degrades
//! measurement precision silently and is never an error.

use std::time::Instant;

/// Process-wide measurement capabilities.
///
/// Only one run should be active against a given probe at a time; the
/// methods are unsynchronized by design.
pub trait Probe: Send + Sync {
    /// Monotonic milliseconds since an arbitrary epoch.
    fn now_ms(&self) -> f64;

    /// Current heap/resident usage in bytes, 0 if unavailable.
    fn memory_used_bytes(&self) -> u64 {
        0
    }

    /// Best-effort hint to collect garbage before a series. No-op when the
    /// platform offers no collector control.
    fn hint_gc(&self) {}
}

/// Standard-library probe: `Instant`-based clock, resident-set size on
/// Linux, no collector.
#[derive(Debug)]
pub struct StdProbe {
    epoch: Instant,
}

impl StdProbe {
    /// Create a probe with its epoch at construction time.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for StdProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe for StdProbe {
    fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    fn memory_used_bytes(&self) -> u64 {
        resident_set_bytes()
    }
}

#[cfg(target_os = "linux")]
fn resident_set_bytes() -> u64 {
    // Second field of /proc/self/statm is the resident page count.
    let pages = std::fs::read_to_string("/proc/self/statm")
        .ok()
        .and_then(|content| {
            content
                .split_whitespace()
                .nth(1)
                .and_then(|field| field.parse::<u64>().ok())
        })
        .unwrap_or(0);
    pages * page_size_bytes()
}

#[cfg(target_os = "linux")]
fn page_size_bytes() -> u64 {
    // SAFETY: sysconf with a valid name has no preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 { size as u64 } else { 4096 }
}

#[cfg(not(target_os = "linux"))]
fn resident_set_bytes() -> u64 {
    0
}
