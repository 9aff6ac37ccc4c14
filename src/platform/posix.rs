// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// POSIX implementation of named events and shared memory regions.
// Events are named semaphores (sem_open) used in binary mode; regions
// are shm_open file descriptors with mmap views.

use std::ffi::CString;
use std::io;
use std::ptr;

use crate::obj_name;
use crate::region::OpenMode;

fn c_name(posix_name: &str) -> io::Result<CString> {
    CString::new(posix_name.as_bytes()).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}

// ---------------------------------------------------------------------------
// Adaptive backoff for the macOS timed-wait emulation: pause → yield → sleep.
// ---------------------------------------------------------------------------

#[cfg(target_os = "macos")]
#[inline]
fn adaptive_yield(k: &mut u32) {
    if *k < 4 {
        // busy spin
    } else if *k < 16 {
        std::hint::spin_loop();
    } else if *k < 32 {
        std::thread::yield_now();
    } else {
        std::thread::sleep(std::time::Duration::from_millis(1));
        return;
    }
    *k += 1;
}

// ---------------------------------------------------------------------------
// PlatformEvent — named semaphore used as a binary, auto-reset event
// ---------------------------------------------------------------------------

pub struct PlatformEvent {
    sem: *mut libc::sem_t,
    name: String, // POSIX name (with leading '/')
}

// Safety: sem_post/sem_wait on a named semaphore are thread-safe; the
// handle itself is only closed in Drop.
unsafe impl Send for PlatformEvent {}
unsafe impl Sync for PlatformEvent {}

impl PlatformEvent {
    /// Create the named event, or attach to it if the name already exists.
    /// `initially_signaled` only takes effect when this call creates the object.
    pub fn create_or_open(name: &str, initially_signaled: bool) -> io::Result<Self> {
        if name.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "name is empty"));
        }

        let posix_name = obj_name::make_object_name(name);
        let c_name = c_name(&posix_name)?;

        let perms: libc::c_uint = 0o666;
        let initial: libc::c_uint = if initially_signaled { 1 } else { 0 };

        let sem = unsafe { libc::sem_open(c_name.as_ptr(), libc::O_CREAT, perms, initial) };
        if sem == libc::SEM_FAILED {
            return Err(io::Error::last_os_error());
        }

        Ok(Self {
            sem,
            name: posix_name,
        })
    }

    /// Set the event to signaled, releasing at most one waiter.
    ///
    /// Binary semantics: posting onto an already-signaled event is a
    /// successful no-op — the count never rises above 1.
    pub fn signal(&self) -> io::Result<()> {
        #[cfg(not(target_os = "macos"))]
        {
            let mut value: libc::c_int = 0;
            if unsafe { libc::sem_getvalue(self.sem, &mut value) } == 0 && value > 0 {
                return Ok(());
            }
        }
        #[cfg(target_os = "macos")]
        {
            // sem_getvalue is unimplemented on macOS — probe with a
            // non-blocking wait and restore the token if one was present.
            let ret = unsafe { libc::sem_trywait(self.sem) };
            if ret == 0 {
                if unsafe { libc::sem_post(self.sem) } != 0 {
                    return Err(io::Error::last_os_error());
                }
                return Ok(());
            }
            let e = io::Error::last_os_error();
            match e.raw_os_error() {
                Some(libc::EAGAIN) | Some(libc::EINTR) => {}
                _ => return Err(e),
            }
        }

        if unsafe { libc::sem_post(self.sem) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Block until signaled or until `timeout_ms` elapses.
    /// `None` blocks indefinitely. A successful wait consumes the signal.
    /// Returns `Ok(true)` if signaled, `Ok(false)` on timeout.
    pub fn wait(&self, timeout_ms: Option<u64>) -> io::Result<bool> {
        let Some(ms) = timeout_ms else {
            loop {
                if unsafe { libc::sem_wait(self.sem) } == 0 {
                    return Ok(true);
                }
                let e = io::Error::last_os_error();
                if e.raw_os_error() != Some(libc::EINTR) {
                    return Err(e);
                }
            }
        };

        #[cfg(target_os = "macos")]
        {
            // macOS lacks sem_timedwait — emulate via sem_trywait polling.
            let deadline = std::time::Instant::now() + std::time::Duration::from_millis(ms);
            let mut k = 0u32;
            loop {
                if unsafe { libc::sem_trywait(self.sem) } == 0 {
                    return Ok(true);
                }
                let e = io::Error::last_os_error();
                match e.raw_os_error() {
                    Some(libc::EAGAIN) => {}
                    Some(libc::EINTR) => continue,
                    _ => return Err(e),
                }
                if std::time::Instant::now() >= deadline {
                    return Ok(false);
                }
                adaptive_yield(&mut k);
            }
        }
        #[cfg(not(target_os = "macos"))]
        {
            let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
            unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut ts) };
            let ns_total = ts.tv_nsec as u64 + (ms % 1000) * 1_000_000;
            ts.tv_sec +=
                (ms / 1000) as libc::time_t + (ns_total / 1_000_000_000) as libc::time_t;
            ts.tv_nsec = (ns_total % 1_000_000_000) as libc::c_long;
            loop {
                if unsafe { libc::sem_timedwait(self.sem, &ts) } == 0 {
                    return Ok(true);
                }
                let e = io::Error::last_os_error();
                match e.raw_os_error() {
                    Some(libc::ETIMEDOUT) => return Ok(false),
                    Some(libc::EINTR) => continue,
                    _ => return Err(e),
                }
            }
        }
    }

    /// Remove the name from the OS namespace. Existing handles stay usable;
    /// subsequent `create_or_open` calls create a fresh object.
    pub fn unlink(&self) {
        if let Ok(c_name) = c_name(&self.name) {
            unsafe { libc::sem_unlink(c_name.as_ptr()) };
        }
    }

    /// Unlink a named event by name (static helper).
    pub fn unlink_by_name(name: &str) {
        let posix_name = obj_name::make_object_name(name);
        if let Ok(c_name) = c_name(&posix_name) {
            unsafe { libc::sem_unlink(c_name.as_ptr()) };
        }
    }
}

impl Drop for PlatformEvent {
    fn drop(&mut self) {
        // Best-effort: a failed close has no recovery at teardown time.
        unsafe { libc::sem_close(self.sem) };
    }
}

// ---------------------------------------------------------------------------
// PlatformShm — named shared memory backing object (shm_open descriptor)
// ---------------------------------------------------------------------------

pub struct PlatformShm {
    fd: libc::c_int,
    name: String, // POSIX name (with leading '/')
    size: usize,  // size requested by the caller
}

unsafe impl Send for PlatformShm {}
unsafe impl Sync for PlatformShm {}

impl PlatformShm {
    /// Acquire a named backing object of `size` bytes.
    ///
    /// The size is only authoritative when this call creates the object;
    /// attaching to an existing object never resizes it.
    pub fn acquire(name: &str, size: usize, mode: OpenMode) -> io::Result<Self> {
        if name.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "name is empty"));
        }
        if size == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "size is 0"));
        }

        let posix_name = obj_name::make_object_name(name);
        let c_name = c_name(&posix_name)?;

        let perms: libc::mode_t = 0o666; // S_IRUSR|S_IWUSR|S_IRGRP|S_IWGRP|S_IROTH|S_IWOTH

        // For CreateOrOpen: try exclusive create first so we only call
        // ftruncate when we actually own the new object. On macOS, calling
        // ftruncate on an already-sized shm object can zero its contents
        // before returning EINVAL.
        let (fd, created) = match mode {
            OpenMode::Create => {
                let f = unsafe {
                    libc::shm_open(
                        c_name.as_ptr(),
                        libc::O_RDWR | libc::O_CREAT | libc::O_EXCL,
                        perms as libc::c_uint,
                    )
                };
                if f == -1 {
                    return Err(io::Error::last_os_error());
                }
                (f, true)
            }
            OpenMode::Open => {
                let f =
                    unsafe { libc::shm_open(c_name.as_ptr(), libc::O_RDWR, perms as libc::c_uint) };
                if f == -1 {
                    return Err(io::Error::last_os_error());
                }
                (f, false)
            }
            OpenMode::CreateOrOpen => {
                let f = unsafe {
                    libc::shm_open(
                        c_name.as_ptr(),
                        libc::O_RDWR | libc::O_CREAT | libc::O_EXCL,
                        perms as libc::c_uint,
                    )
                };
                if f != -1 {
                    (f, true)
                } else {
                    let e = io::Error::last_os_error();
                    if e.raw_os_error() != Some(libc::EEXIST) {
                        return Err(e);
                    }
                    // Already exists — open without truncation.
                    let f2 = unsafe {
                        libc::shm_open(c_name.as_ptr(), libc::O_RDWR, perms as libc::c_uint)
                    };
                    if f2 == -1 {
                        return Err(io::Error::last_os_error());
                    }
                    (f2, false)
                }
            }
        };

        unsafe { libc::fchmod(fd, perms) };

        if created {
            let ret = unsafe { libc::ftruncate(fd, size as libc::off_t) };
            if ret != 0 {
                // Unwind the partial creation: a named object whose size was
                // never set can be impossible to reuse, so the name must not
                // survive this failure.
                let err = io::Error::last_os_error();
                unsafe {
                    libc::close(fd);
                    libc::shm_unlink(c_name.as_ptr());
                }
                return Err(err);
            }
        }

        Ok(Self {
            fd,
            name: posix_name,
            size,
        })
    }

    /// Map `len` bytes of the backing object read/write.
    /// On failure the descriptor is left untouched and stays owned by `self`.
    pub fn map(&self, len: usize) -> io::Result<PlatformMapping> {
        if len == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "length is 0"));
        }

        let mem = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                self.fd,
                0,
            )
        };
        if mem == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }

        Ok(PlatformMapping {
            mem: mem as *mut u8,
            len,
        })
    }

    /// Size requested by the caller at acquire time.
    pub fn size(&self) -> usize {
        self.size
    }

    /// POSIX name (with leading '/').
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remove the name from the OS namespace (shm_unlink).
    /// Does NOT release the descriptor or any live mapping.
    pub fn unlink(&self) {
        if let Ok(c_name) = c_name(&self.name) {
            unsafe { libc::shm_unlink(c_name.as_ptr()) };
        }
    }

    /// Unlink a named backing object by name (static helper).
    pub fn unlink_by_name(name: &str) {
        let posix_name = obj_name::make_object_name(name);
        if let Ok(c_name) = c_name(&posix_name) {
            unsafe { libc::shm_unlink(c_name.as_ptr()) };
        }
    }
}

impl Drop for PlatformShm {
    fn drop(&mut self) {
        unsafe { libc::close(self.fd) };
    }
}

// ---------------------------------------------------------------------------
// PlatformMapping — one mmap view, released independently of the descriptor
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
        unsafe { libc::munmap(self.mem as *mut libc::c_void, self.len) };
    }
}
