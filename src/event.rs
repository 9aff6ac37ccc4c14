// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Cross-platform named event.
// Delegates to platform::PlatformEvent (POSIX or Windows).

use std::io;

use crate::platform::PlatformEvent;

/// A named, binary, cross-process event.
///
/// Auto-reset semantics on both platforms: a signal releases at most one
/// waiter, a successful wait consumes the signal, and signaling an
/// already-signaled event is a successful no-op (the state never
/// accumulates). On POSIX this is a named semaphore clamped to a binary
/// range at signal time; on Windows a kernel auto-reset event object.
///
/// The handle is valid for the lifetime of the value; `Drop` releases the
/// process-local reference exactly once. The name stays attachable by
/// other processes until [`NamedEvent::unlink`] is called or the OS
/// collects the object.
pub struct NamedEvent {
    inner: PlatformEvent,
}

impl NamedEvent {
    /// Create a named event, or attach to it if the name already exists.
    ///
    /// `initially_signaled` only takes effect when this call creates the
    /// object; attaching leaves the existing state untouched.
    ///
    /// # Errors
    /// `InvalidInput` if `name` is empty (checked before any OS call);
    /// otherwise the OS error from the failed create/open.
    pub fn create_or_open(name: &str, initially_signaled: bool) -> io::Result<Self> {
        let inner = PlatformEvent::create_or_open(name, initially_signaled)?;
        Ok(Self { inner })
    }

    /// Set the event to signaled, releasing at most one waiter.
    pub fn signal(&self) -> io::Result<()> {
        self.inner.signal()
    }

    /// Block the calling thread until the event is signaled or `timeout_ms`
    /// milliseconds elapse. `None` blocks indefinitely.
    ///
    /// Returns `Ok(true)` if the event was signaled (the signal is now
    /// consumed), `Ok(false)` on timeout. `Err` is an OS-level failure
    /// distinct from a clean timeout. Interrupted waits are retried
    /// internally and never surfaced.
    pub fn wait(&self, timeout_ms: Option<u64>) -> io::Result<bool> {
        self.inner.wait(timeout_ms)
    }

    /// Remove the name from the OS namespace so no future `create_or_open`
    /// attaches to this object. Existing handles stay usable.
    ///
    /// No-op on Windows, where the kernel removes the name when the last
    /// handle closes.
    pub fn unlink(&self) {
        self.inner.unlink();
    }

    /// Remove a named event by name without needing an open handle.
    /// Safe to call when the name does not exist.
    pub fn unlink_by_name(name: &str) {
        PlatformEvent::unlink_by_name(name);
    }
}
