// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Windows implementation of named events and shared memory regions.
// Events are kernel auto-reset event objects; regions are pagefile-backed
// file mappings with MapViewOfFile views.

use std::io;
use std::ptr;

use windows_sys::Win32::Foundation::HANDLE;

use crate::region::OpenMode;

/// Encode a name as a null-terminated wide string for Win32 APIs.
fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

// ---------------------------------------------------------------------------
// PlatformEvent — kernel auto-reset event object
// ---------------------------------------------------------------------------

pub struct PlatformEvent {
    handle: HANDLE,
}

unsafe impl Send for PlatformEvent {}
unsafe impl Sync for PlatformEvent {}

impl PlatformEvent {
    /// Create the named event, or attach to it if the name already exists.
    /// `initially_signaled` only takes effect when this call creates the object.
    pub fn create_or_open(name: &str, initially_signaled: bool) -> io::Result<Self> {
        use windows_sys::Win32::Foundation::{FALSE, TRUE};
        use windows_sys::Win32::System::Threading::CreateEventW;

        if name.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "name is empty"));
        }

        let wide_name = to_wide(name);
        let initial = if initially_signaled { TRUE } else { FALSE };

        // bManualReset = FALSE: a successful wait consumes the signal.
        // CreateEventW attaches to an existing object of the same name,
        // ignoring the initial state — ERROR_ALREADY_EXISTS is not an error.
        let h = unsafe { CreateEventW(ptr::null(), FALSE, initial, wide_name.as_ptr()) };
        if h.is_null() {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { handle: h })
    }

    /// Set the event to signaled, releasing at most one waiter.
    /// Signaling an already-signaled event is a successful no-op.
    pub fn signal(&self) -> io::Result<()> {
        use windows_sys::Win32::System::Threading::SetEvent;

        if unsafe { SetEvent(self.handle) } == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Block until signaled or until `timeout_ms` elapses.
    /// `None` blocks indefinitely. A successful wait consumes the signal.
    /// Returns `Ok(true)` if signaled, `Ok(false)` on timeout.
    pub fn wait(&self, timeout_ms: Option<u64>) -> io::Result<bool> {
        use windows_sys::Win32::Foundation::{WAIT_OBJECT_0, WAIT_TIMEOUT};
        use windows_sys::Win32::System::Threading::{WaitForSingleObject, INFINITE};

        let timeout = match timeout_ms {
            None => INFINITE,
            Some(ms) => ms.min((INFINITE - 1) as u64) as u32,
        };

        let ret = unsafe { WaitForSingleObject(self.handle, timeout) };
        match ret {
            WAIT_OBJECT_0 => Ok(true),
            WAIT_TIMEOUT => Ok(false),
            _ => Err(io::Error::last_os_error()),
        }
    }

    /// The kernel removes the name when the last handle closes; there is
    /// no explicit unlink syscall for named events.
    pub fn unlink(&self) {}

    /// No-op on Windows (see `unlink`).
    pub fn unlink_by_name(_name: &str) {}
}

impl Drop for PlatformEvent {
    fn drop(&mut self) {
        use windows_sys::Win32::Foundation::CloseHandle;
        if !self.handle.is_null() {
            unsafe { CloseHandle(self.handle) };
        }
    }
}

// ---------------------------------------------------------------------------
// PlatformShm — named backing object via pagefile-backed file mapping
// ---------------------------------------------------------------------------

pub struct PlatformShm {
    handle: HANDLE,
    size: usize, // size requested by the caller
}

unsafe impl Send for PlatformShm {}
unsafe impl Sync for PlatformShm {}

impl PlatformShm {
    /// Acquire a named backing object of `size` bytes.
    ///
    /// The size is only authoritative when this call creates the object;
    /// attaching to an existing object never resizes it.
    pub fn acquire(name: &str, size: usize, mode: OpenMode) -> io::Result<Self> {
        use windows_sys::Win32::Foundation::*;
        use windows_sys::Win32::System::Memory::*;

        if name.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "name is empty"));
        }
        if size == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "size is 0"));
        }

        let wide_name = to_wide(name);

        let handle = if mode == OpenMode::Open {
            let h = unsafe { OpenFileMappingW(FILE_MAP_ALL_ACCESS, FALSE, wide_name.as_ptr()) };
            if h.is_null() {
                return Err(io::Error::last_os_error());
            }
            h
        } else {
            let h = unsafe {
                CreateFileMappingW(
                    INVALID_HANDLE_VALUE,
                    ptr::null(),
                    PAGE_READWRITE | SEC_COMMIT,
                    (size as u64 >> 32) as u32,
                    size as u32,
                    wide_name.as_ptr(),
                )
            };
            let err = unsafe { GetLastError() };
            if mode == OpenMode::Create && err == ERROR_ALREADY_EXISTS {
                if !h.is_null() {
                    unsafe { CloseHandle(h) };
                }
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "region already exists",
                ));
            }
            if h.is_null() {
                return Err(io::Error::last_os_error());
            }
            h
        };

        Ok(Self { handle, size })
    }

    /// Map `len` bytes of the backing object read/write.
    /// On failure the handle is left untouched and stays owned by `self`.
    pub fn map(&self, len: usize) -> io::Result<PlatformMapping> {
        use windows_sys::Win32::System::Memory::{MapViewOfFile, FILE_MAP_ALL_ACCESS};

        if len == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "length is 0"));
        }

        let view = unsafe { MapViewOfFile(self.handle, FILE_MAP_ALL_ACCESS, 0, 0, len) };
        if view.Value.is_null() {
            return Err(io::Error::last_os_error());
        }

        Ok(PlatformMapping {
            mem: view.Value as *mut u8,
            len,
        })
    }

    /// Size requested by the caller at acquire time.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The mapping object is pagefile-backed; the kernel removes the name
    /// when the last handle closes. No explicit unlink exists.
    pub fn unlink(&self) {}

    /// No-op on Windows (see `unlink`).
    pub fn unlink_by_name(_name: &str) {}
}

impl Drop for PlatformShm {
    fn drop(&mut self) {
        use windows_sys::Win32::Foundation::CloseHandle;
        if !self.handle.is_null() {
            unsafe { CloseHandle(self.handle) };
        }
    }
}

// ---------------------------------------------------------------------------
// PlatformMapping — one MapViewOfFile view, released independently
// ---------------------------------------------------------------------------

pub struct PlatformMapping {
    mem: *mut u8,
    len: usize,
}

unsafe impl Send for PlatformMapping {}
unsafe impl Sync for PlatformMapping {}

impl PlatformMapping {
    pub fn as_ptr(&self) -> *const u8 {
        self.mem
    }

    pub fn as_mut_ptr(&self) -> *mut u8 {
        self.mem
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

impl Drop for PlatformMapping {
    fn drop(&mut self) {
        use windows_sys::Win32::System::Memory::{UnmapViewOfFile, MEMORY_MAPPED_VIEW_ADDRESS};

        unsafe {
            UnmapViewOfFile(MEMORY_MAPPED_VIEW_ADDRESS {
                Value: self.mem as *mut _,
            })
        };
    }
}
