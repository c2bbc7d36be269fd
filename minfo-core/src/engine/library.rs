//! libmediainfo loaded at runtime.
//!
//! The library is opened with `libloading` rather than linked, so a missing
//! engine surfaces as [`CoreError::LibraryNotFound`] from
//! [`MediaInfoLib::shared`] instead of a link failure. Only the 8-bit
//! `MediaInfoA_*` entry points are used; the engine is switched to UTF-8 once
//! at load time through its process-wide `CharSet` option.

use std::env;
use std::ffi::{CStr, c_char, c_int, c_void};

use libloading::Library;
use once_cell::sync::OnceCell;

use super::{Engine, RawHandle};
use crate::error::{CoreError, CoreResult, library_load_error};

/// Environment variable naming the library file to load.
pub const LIBRARY_ENV: &str = "MINFO_LIBRARY";

/// File names tried when `MINFO_LIBRARY` is unset.
#[cfg(target_os = "macos")]
pub const DEFAULT_LIBRARY_NAMES: &[&str] = &["libmediainfo.0.dylib", "libmediainfo.dylib"];
#[cfg(windows)]
pub const DEFAULT_LIBRARY_NAMES: &[&str] = &["MediaInfo.dll"];
#[cfg(not(any(target_os = "macos", windows)))]
pub const DEFAULT_LIBRARY_NAMES: &[&str] = &["libmediainfo.so.0", "libmediainfo.so"];

type NewFn = unsafe extern "C" fn() -> *mut c_void;
type DeleteFn = unsafe extern "C" fn(*mut c_void);
type OpenFn = unsafe extern "C" fn(*mut c_void, *const c_char) -> usize;
type OpenBufferInitFn = unsafe extern "C" fn(*mut c_void, u64, u64) -> usize;
type OpenBufferContinueFn = unsafe extern "C" fn(*mut c_void, *const u8, usize) -> usize;
type OpenBufferGotoGetFn = unsafe extern "C" fn(*mut c_void) -> u64;
type OpenBufferFinalizeFn = unsafe extern "C" fn(*mut c_void) -> usize;
type CloseFn = unsafe extern "C" fn(*mut c_void);
type InformFn = unsafe extern "C" fn(*mut c_void, usize) -> *const c_char;
type GetIFn = unsafe extern "C" fn(*mut c_void, c_int, usize, usize, c_int) -> *const c_char;
type GetFn =
    unsafe extern "C" fn(*mut c_void, c_int, usize, *const c_char, c_int, c_int) -> *const c_char;
type OptionFn = unsafe extern "C" fn(*mut c_void, *const c_char, *const c_char) -> *const c_char;
type StateGetFn = unsafe extern "C" fn(*mut c_void) -> usize;
type CountGetFn = unsafe extern "C" fn(*mut c_void, c_int, usize) -> usize;

static SHARED: OnceCell<MediaInfoLib> = OnceCell::new();

/// The production [`Engine`]: function pointers resolved from libmediainfo.
pub struct MediaInfoLib {
    // Keeps the function pointers below valid.
    _library: Library,
    name: String,
    new: NewFn,
    delete: DeleteFn,
    open: OpenFn,
    open_buffer_init: OpenBufferInitFn,
    open_buffer_continue: OpenBufferContinueFn,
    open_buffer_goto_get: OpenBufferGotoGetFn,
    open_buffer_finalize: OpenBufferFinalizeFn,
    close: CloseFn,
    inform: InformFn,
    get_i: GetIFn,
    get: GetFn,
    option: OptionFn,
    state_get: StateGetFn,
    count_get: CountGetFn,
}

impl MediaInfoLib {
    /// Returns the process-wide engine, loading it on first use.
    ///
    /// The first successful load wins for the lifetime of the process. A
    /// failed load is not cached, so a later call may retry.
    pub fn shared() -> CoreResult<&'static MediaInfoLib> {
        SHARED.get_or_try_init(|| match env::var(LIBRARY_ENV) {
            Ok(path) if !path.is_empty() => MediaInfoLib::load_from(&path),
            _ => MediaInfoLib::load(),
        })
    }

    /// Like [`MediaInfoLib::shared`] but with an explicit library file. Has
    /// no effect on the path if the engine was already loaded.
    pub fn shared_from(path: &str) -> CoreResult<&'static MediaInfoLib> {
        let lib = SHARED.get_or_try_init(|| MediaInfoLib::load_from(path))?;
        if lib.name != path {
            log::warn!(
                "Engine already loaded from '{}', ignoring '{}'",
                lib.name,
                path
            );
        }
        Ok(lib)
    }

    /// Loads the first of [`DEFAULT_LIBRARY_NAMES`] that opens.
    pub fn load() -> CoreResult<Self> {
        for name in DEFAULT_LIBRARY_NAMES {
            match Self::load_from(name) {
                Ok(lib) => return Ok(lib),
                Err(e) => log::debug!("Could not load {}: {}", name, e),
            }
        }
        Err(CoreError::LibraryNotFound(DEFAULT_LIBRARY_NAMES.join(", ")))
    }

    /// Loads the engine from a specific file name or path.
    pub fn load_from(name: &str) -> CoreResult<Self> {
        log::debug!("Loading engine library: {}", name);

        // SAFETY: libmediainfo has no load-time initializers with
        // preconditions on the caller.
        let library =
            unsafe { Library::new(name) }.map_err(|e| library_load_error(name, e))?;

        // SAFETY: each type alias matches the prototype in MediaInfoDLL.h,
        // and the pointers are stored next to the `Library` that owns them.
        let lib = unsafe {
            MediaInfoLib {
                name: name.to_string(),
                new: symbol(&library, "MediaInfoA_New")?,
                delete: symbol(&library, "MediaInfoA_Delete")?,
                open: symbol(&library, "MediaInfoA_Open")?,
                open_buffer_init: symbol(&library, "MediaInfoA_Open_Buffer_Init")?,
                open_buffer_continue: symbol(&library, "MediaInfoA_Open_Buffer_Continue")?,
                open_buffer_goto_get: symbol(&library, "MediaInfoA_Open_Buffer_Continue_GoTo_Get")?,
                open_buffer_finalize: symbol(&library, "MediaInfoA_Open_Buffer_Finalize")?,
                close: symbol(&library, "MediaInfoA_Close")?,
                inform: symbol(&library, "MediaInfoA_Inform")?,
                get_i: symbol(&library, "MediaInfoA_GetI")?,
                get: symbol(&library, "MediaInfoA_Get")?,
                option: symbol(&library, "MediaInfoA_Option")?,
                state_get: symbol(&library, "MediaInfoA_State_Get")?,
                count_get: symbol(&library, "MediaInfoA_Count_Get")?,
                _library: library,
            }
        };

        // A null handle addresses the engine's global configuration.
        // SAFETY: both strings are NUL-terminated literals.
        unsafe {
            (lib.option)(std::ptr::null_mut(), c"CharSet".as_ptr(), c"UTF-8".as_ptr());
        }

        log::debug!("Engine library loaded: {}", name);
        Ok(lib)
    }

    /// File name or path the library was loaded from.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for MediaInfoLib {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaInfoLib").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Resolves one entry point and copies the function pointer out.
///
/// # Safety
///
/// `T` must be the exact function pointer type of the exported symbol.
unsafe fn symbol<T: Copy>(library: &Library, name: &str) -> CoreResult<T> {
    let mut bytes = name.as_bytes().to_vec();
    bytes.push(0);
    // SAFETY: forwarded to the caller.
    unsafe { library.get::<T>(&bytes) }
        .map(|sym| *sym)
        .map_err(|e| library_load_error(name, e))
}

/// Copies an engine-owned string before the next call can invalidate it.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn copy_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: non-null and NUL-terminated per the caller.
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

impl Engine for MediaInfoLib {
    fn new_handle(&self) -> Option<RawHandle> {
        // SAFETY: MediaInfoA_New takes no arguments.
        RawHandle::from_ptr(unsafe { (self.new)() })
    }

    unsafe fn delete(&self, handle: RawHandle) {
        unsafe { (self.delete)(handle.as_ptr()) }
    }

    unsafe fn open(&self, handle: RawHandle, path: &CStr) -> usize {
        unsafe { (self.open)(handle.as_ptr(), path.as_ptr()) }
    }

    unsafe fn open_buffer_init(&self, handle: RawHandle, file_size: u64, file_offset: u64) -> usize {
        unsafe { (self.open_buffer_init)(handle.as_ptr(), file_size, file_offset) }
    }

    unsafe fn open_buffer_continue(&self, handle: RawHandle, buffer: &[u8]) -> usize {
        unsafe { (self.open_buffer_continue)(handle.as_ptr(), buffer.as_ptr(), buffer.len()) }
    }

    unsafe fn open_buffer_continue_goto_get(&self, handle: RawHandle) -> u64 {
        unsafe { (self.open_buffer_goto_get)(handle.as_ptr()) }
    }

    unsafe fn open_buffer_finalize(&self, handle: RawHandle) -> usize {
        unsafe { (self.open_buffer_finalize)(handle.as_ptr()) }
    }

    unsafe fn close(&self, handle: RawHandle) {
        unsafe { (self.close)(handle.as_ptr()) }
    }

    unsafe fn inform(&self, handle: RawHandle) -> String {
        unsafe { copy_string((self.inform)(handle.as_ptr(), 0)) }
    }

    unsafe fn get_i(
        &self,
        handle: RawHandle,
        stream_kind: u32,
        stream_number: usize,
        parameter: usize,
        info_kind: u32,
    ) -> String {
        unsafe {
            copy_string((self.get_i)(
                handle.as_ptr(),
                stream_kind as c_int,
                stream_number,
                parameter,
                info_kind as c_int,
            ))
        }
    }

    unsafe fn get(
        &self,
        handle: RawHandle,
        stream_kind: u32,
        stream_number: usize,
        parameter: &CStr,
        info_kind: u32,
        search_kind: u32,
    ) -> String {
        unsafe {
            copy_string((self.get)(
                handle.as_ptr(),
                stream_kind as c_int,
                stream_number,
                parameter.as_ptr(),
                info_kind as c_int,
                search_kind as c_int,
            ))
        }
    }

    unsafe fn option(&self, handle: RawHandle, option: &CStr, value: &CStr) -> String {
        unsafe { copy_string((self.option)(handle.as_ptr(), option.as_ptr(), value.as_ptr())) }
    }

    unsafe fn state_get(&self, handle: RawHandle) -> usize {
        unsafe { (self.state_get)(handle.as_ptr()) }
    }

    unsafe fn count_get(&self, handle: RawHandle, stream_kind: u32, stream_number: usize) -> usize {
        unsafe { (self.count_get)(handle.as_ptr(), stream_kind as c_int, stream_number) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_library_reports_the_name() {
        let err = match MediaInfoLib::load_from("libdefinitely-not-mediainfo.so") {
            Ok(_) => panic!("unexpectedly loaded a nonexistent library"),
            Err(e) => e,
        };
        match err {
            CoreError::LibraryLoad { name, .. } => {
                assert_eq!(name, "libdefinitely-not-mediainfo.so")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_copy_string_handles_null() {
        assert_eq!(unsafe { copy_string(std::ptr::null()) }, "");
        assert_eq!(unsafe { copy_string(c"MIXML".as_ptr()) }, "MIXML");
    }
}
