// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Cross-platform named shared memory region: a backing object plus
// independently-released mappings.
// Delegates to platform::PlatformShm (POSIX or Windows).

use std::io;
use std::marker::PhantomData;

use crate::platform::{PlatformMapping, PlatformShm};

/// Open mode for shared memory backing objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Create exclusively — fail if already exists.
    Create,
    /// Open existing — fail if it does not exist.
    Open,
    /// Create if missing, open if it already exists.
    CreateOrOpen,
}

/// A named, fixed-size, cross-process shared memory backing object.
///
/// The backing object owns the OS-level handle (a descriptor on POSIX, a
/// file-mapping handle on Windows). Views of the bytes are produced with
/// [`SharedRegion::map`] and released independently; `Drop` closes the
/// handle exactly once. The name stays attachable by other processes until
/// [`SharedRegion::unlink`] is called or the OS collects the object.
pub struct SharedRegion {
    inner: PlatformShm,
}

impl SharedRegion {
    /// Acquire a named backing object of `size` bytes with the given mode.
    ///
    /// `size` is only authoritative when the call creates the object;
    /// attaching to an existing object never resizes it, and no size
    /// verification happens on attach — cooperating processes must agree
    /// on the size out of band.
    ///
    /// If creation succeeds but sizing the fresh object fails, the
    /// just-created descriptor is closed and the name unlinked before the
    /// error returns, so the failure leaves no stale named object behind.
    ///
    /// # Errors
    /// `InvalidInput` if `name` is empty or `size` is zero (checked before
    /// any OS call); otherwise the OS error from the failed acquisition.
    pub fn acquire(name: &str, size: usize, mode: OpenMode) -> io::Result<Self> {
        let inner = PlatformShm::acquire(name, size, mode)?;
        Ok(Self { inner })
    }

    /// Acquire with [`OpenMode::CreateOrOpen`] — the common rendezvous case.
    pub fn create_or_open(name: &str, size: usize) -> io::Result<Self> {
        Self::acquire(name, size, OpenMode::CreateOrOpen)
    }

    /// Map the full region (the size requested at acquire time) read/write.
    ///
    /// On failure the backing object is untouched and still owned by the
    /// caller; mapping and backing-object lifetimes are independent.
    pub fn map(&self) -> io::Result<RegionMapping<'_>> {
        self.map_len(self.inner.size())
    }

    /// Map `len` bytes of the region read/write.
    ///
    /// # Errors
    /// `InvalidInput` if `len` is zero (checked before any OS call);
    /// otherwise the OS error from the failed mapping.
    pub fn map_len(&self, len: usize) -> io::Result<RegionMapping<'_>> {
        let inner = self.inner.map(len)?;
        Ok(RegionMapping {
            inner,
            _backing: PhantomData,
        })
    }

    /// Size requested by the caller at acquire time. Not re-queried from
    /// the OS; an attached pre-existing object may differ.
    pub fn size(&self) -> usize {
        self.inner.size()
    }

    /// The platform name used to open the region.
    #[cfg(unix)]
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Remove the name from the OS namespace so no future acquire attaches
    /// to this object. Existing handles and mappings stay usable.
    ///
    /// No-op on Windows, where the kernel removes the name when the last
    /// handle closes.
    pub fn unlink(&self) {
        self.inner.unlink();
    }

    /// Remove a named backing object by name without needing an open handle.
    /// Safe to call when the name does not exist.
    pub fn unlink_by_name(name: &str) {
        PlatformShm::unlink_by_name(name);
    }
}

/// A process-local view of a [`SharedRegion`]'s bytes.
///
/// The borrow ties the view to its backing object, so a mapping can never
/// outlive the region it came from and is always unmapped before the
/// backing handle closes. `Drop` unmaps.
///
/// The bytes are concurrently mutable by other processes: no locking,
/// atomicity, or memory-ordering guarantees are provided. Coordinate
/// access with a [`NamedEvent`](crate::NamedEvent) or a caller-supplied
/// protocol inside the region.
pub struct RegionMapping<'a> {
    inner: PlatformMapping,
    _backing: PhantomData<&'a SharedRegion>,
}

impl RegionMapping<'_> {
    /// Pointer to the start of the mapped bytes.
    pub fn as_ptr(&self) -> *const u8 {
        self.inner.as_ptr()
    }

    /// Mutable pointer to the start of the mapped bytes.
    pub fn as_mut_ptr(&self) -> *mut u8 {
        self.inner.as_mut_ptr()
    }

    /// Mapped length in bytes.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Always false: zero-length mappings are rejected at map time.
    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }
}
