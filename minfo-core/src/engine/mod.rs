// ============================================================================
// minfo-core/src/engine/mod.rs
// ============================================================================
//
// NATIVE ENGINE: The primitive call surface of the analysis engine
//
// This module describes, as a trait, every call the native engine accepts.
// Arguments are already in wire form here: enumerations are ordinals,
// strings are NUL-terminated, buffers are byte slices. `Session` is the only
// caller and is responsible for turning typed requests into these values.
//
// KEY COMPONENTS:
// - Engine: The raw call surface (implemented by the real library and a mock)
// - RawHandle: Opaque per-analysis token minted by `Engine::new_handle`
// - BufferStatus: Bitmask returned by the streaming open protocol
// - Wire constants: the no-seek sentinel and the "all streams" selector
//
// DESIGN PHILOSOPHY:
// The trait mirrors the dependency injection used for external tools
// elsewhere: production code talks to libmediainfo through `library`,
// tests and the CLI's mock mode talk to `mock`, and `Session` cannot tell
// the difference.

// ---- Standard library imports ----
use std::ffi::{CStr, c_void};
use std::fmt;
use std::ptr::NonNull;

// ============================================================================
// SUBMODULES
// ============================================================================

/// libmediainfo loaded at runtime
pub mod library;

/// In-process engine emulating the native contract on synthetic fixtures.
/// Only compiled for tests or with the "mock" feature.
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use library::MediaInfoLib;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEngine;

// ============================================================================
// WIRE CONSTANTS
// ============================================================================

/// Value of `Open_Buffer_Continue_GoTo_Get` when no seek is requested.
/// The engine returns `(MediaInfo_int64u)-1`.
pub const NO_SEEK: u64 = u64::MAX;

/// Stream number meaning "all streams of the kind" for `Count_Get`.
/// The engine expects `(size_t)-1`.
pub const ALL_STREAMS: usize = usize::MAX;

// ============================================================================
// HANDLE
// ============================================================================

/// Opaque token identifying one analysis context inside the engine.
///
/// Only an [`Engine`] can mint one. It is `Copy` so it can be passed to the
/// raw calls, but the only long-lived owner is a `Session`, which releases
/// it exactly once.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(NonNull<c_void>);

impl RawHandle {
    /// Wraps a pointer returned by the engine initializer. Null means the
    /// engine failed to allocate.
    pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(RawHandle)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }

    /// Address of the handle, usable as a map key by engines that keep
    /// per-handle state.
    pub fn addr(self) -> usize {
        self.0.as_ptr().addr()
    }
}

impl fmt::Debug for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawHandle({:#x})", self.addr())
    }
}

// ============================================================================
// BUFFER STATUS
// ============================================================================

/// Status bitmask returned by `Open_Buffer_Continue` and
/// `Open_Buffer_Finalize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferStatus(pub usize);

impl BufferStatus {
    pub const ACCEPTED: usize = 0x01;
    pub const FILLED: usize = 0x02;
    pub const UPDATED: usize = 0x04;
    pub const FINALIZED: usize = 0x08;

    /// The engine recognized the format.
    pub fn is_accepted(self) -> bool {
        self.0 & Self::ACCEPTED != 0
    }

    /// Enough data was parsed to fill the stream information.
    pub fn is_filled(self) -> bool {
        self.0 & Self::FILLED != 0
    }

    pub fn is_updated(self) -> bool {
        self.0 & Self::UPDATED != 0
    }

    /// The engine wants no more data.
    pub fn is_finalized(self) -> bool {
        self.0 & Self::FINALIZED != 0
    }

    pub fn bits(self) -> usize {
        self.0
    }
}

// ============================================================================
// ENGINE TRAIT
// ============================================================================

/// The raw call surface of the native analysis engine.
///
/// Every method except [`Engine::new_handle`] takes a handle. Implementations
/// may assume it came from their own `new_handle` and has not been passed
/// to `delete` yet; passing anything else is undefined behavior for the
/// native library, hence the `unsafe`.
///
/// Soft failures are part of the contract: unknown parameters yield empty
/// strings, failed opens yield 0. Implementations must not turn them into
/// panics.
///
/// # Safety
///
/// For all `unsafe` methods the caller guarantees that `handle` was returned
/// by `new_handle` on the same engine, has not been deleted, and is not used
/// concurrently from another thread.
pub trait Engine: Send + Sync {
    /// `MediaInfo_New`. Returns `None` when the engine cannot allocate.
    fn new_handle(&self) -> Option<RawHandle>;

    /// `MediaInfo_Delete`. The handle must not be used afterwards.
    unsafe fn delete(&self, handle: RawHandle);

    /// `MediaInfo_Open`. Non-zero on success.
    unsafe fn open(&self, handle: RawHandle, path: &CStr) -> usize;

    /// `MediaInfo_Open_Buffer_Init`. Non-zero on success.
    unsafe fn open_buffer_init(&self, handle: RawHandle, file_size: u64, file_offset: u64) -> usize;

    /// `MediaInfo_Open_Buffer_Continue`. Returns a [`BufferStatus`] bitmask.
    unsafe fn open_buffer_continue(&self, handle: RawHandle, buffer: &[u8]) -> usize;

    /// `MediaInfo_Open_Buffer_Continue_GoTo_Get`. [`NO_SEEK`] when the engine
    /// wants the next sequential bytes.
    unsafe fn open_buffer_continue_goto_get(&self, handle: RawHandle) -> u64;

    /// `MediaInfo_Open_Buffer_Finalize`.
    unsafe fn open_buffer_finalize(&self, handle: RawHandle) -> usize;

    /// `MediaInfo_Close`.
    unsafe fn close(&self, handle: RawHandle);

    /// `MediaInfo_Inform`, rendered with the current `Inform` option.
    unsafe fn inform(&self, handle: RawHandle) -> String;

    /// `MediaInfo_GetI`.
    unsafe fn get_i(
        &self,
        handle: RawHandle,
        stream_kind: u32,
        stream_number: usize,
        parameter: usize,
        info_kind: u32,
    ) -> String;

    /// `MediaInfo_Get`.
    unsafe fn get(
        &self,
        handle: RawHandle,
        stream_kind: u32,
        stream_number: usize,
        parameter: &CStr,
        info_kind: u32,
        search_kind: u32,
    ) -> String;

    /// `MediaInfo_Option`. Effects are engine-wide even though a handle is
    /// passed.
    unsafe fn option(&self, handle: RawHandle, option: &CStr, value: &CStr) -> String;

    /// `MediaInfo_State_Get`.
    unsafe fn state_get(&self, handle: RawHandle) -> usize;

    /// `MediaInfo_Count_Get`. With [`ALL_STREAMS`] returns the number of
    /// streams of the kind, otherwise the number of parameters of stream
    /// `stream_number`.
    unsafe fn count_get(&self, handle: RawHandle, stream_kind: u32, stream_number: usize) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_status_bits() {
        let status = BufferStatus(BufferStatus::ACCEPTED | BufferStatus::FINALIZED);
        assert!(status.is_accepted());
        assert!(!status.is_filled());
        assert!(!status.is_updated());
        assert!(status.is_finalized());
        assert!(!BufferStatus::default().is_accepted());
    }

    #[test]
    fn test_null_pointer_is_not_a_handle() {
        assert!(RawHandle::from_ptr(std::ptr::null_mut()).is_none());
    }
}
