// ============================================================================
// minfo-core/src/session.rs
// ============================================================================
//
// SESSION: Ownership of one native analysis handle
//
// A Session owns exactly one engine handle and exposes every primitive
// operation the engine accepts, translating typed arguments into wire values:
// enumerations become ordinals, strings become NUL-terminated C strings,
// in-memory content is passed as byte slices.
//
// LIFECYCLE:
//   Created --open--> Opened --close--> Closed --open--> Opened ...
//   Created/Closed --open_buffer_begin--> Streaming --finalize--> Opened
//
// There is no Destroyed state to check. `destroy(self)` consumes the session
// and `Drop` releases the handle on every other exit path, so a handle can
// neither be used after release nor released twice. All engine calls take
// `&mut self`, which rules out concurrent use of one handle.
//
// SOFT FAILURES:
// The engine reports "no data" as empty strings and failed opens as zero.
// Session passes both through unchanged; it never turns them into errors.

// ---- Standard library imports ----
use std::ffi::CString;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

#[cfg(unix)]
use std::os::fd::BorrowedFd;

// ---- Internal crate imports ----
use crate::config::{DEFAULT_READ_CHUNK_SIZE, FILE_NAME_OPTION};
use crate::engine::{ALL_STREAMS, BufferStatus, Engine, MediaInfoLib, NO_SEEK, RawHandle};
use crate::error::{CoreError, CoreResult};
use crate::kinds::{InfoKind, StreamKind};

// ============================================================================
// LIFECYCLE
// ============================================================================

/// Where a session is in its open/close cycle, as seen from the binding.
///
/// The engine is the real authority; this is tracked for logging and to keep
/// the streaming protocol's seek sentinel stable after finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Handle allocated, nothing opened yet.
    Created,
    /// A buffer-based open is in progress.
    Streaming,
    /// An open call succeeded; queries are meaningful.
    Opened,
    /// The source was closed, or an open failed. The handle is reusable.
    Closed,
}

// ============================================================================
// SESSION
// ============================================================================

/// One analysis context inside the engine.
///
/// # Examples
///
/// ```rust
/// use minfo_core::engine::MockEngine;
/// use minfo_core::{InfoKind, Session, StreamKind};
///
/// let engine = MockEngine::new();
/// let mut session = Session::create(&engine).unwrap();
/// assert!(!session.open_by_path("/no/such/file.mkv"));
/// assert_eq!(session.query_by_name(StreamKind::General, 0, "Format", InfoKind::Text, InfoKind::Name), "");
/// session.destroy();
/// assert_eq!(engine.live_handles(), 0);
/// ```
pub struct Session<'e, E: Engine + ?Sized> {
    engine: &'e E,
    handle: RawHandle,
    lifecycle: Lifecycle,
}

// SAFETY: the handle is only ever used through `&mut self`, so moving the
// session to another thread cannot create concurrent use. `E: Sync` makes
// the shared engine reference safe to send.
unsafe impl<E: Engine + ?Sized> Send for Session<'_, E> {}

impl Session<'static, MediaInfoLib> {
    /// Creates a session on the process-wide libmediainfo.
    pub fn native() -> CoreResult<Self> {
        Session::create(MediaInfoLib::shared()?)
    }
}

impl<'e, E: Engine + ?Sized> Session<'e, E> {
    /// Allocates a new engine handle.
    pub fn create(engine: &'e E) -> CoreResult<Self> {
        let handle = engine.new_handle().ok_or(CoreError::Allocation)?;
        log::debug!("Created session {:?}", handle);
        Ok(Self {
            engine,
            handle,
            lifecycle: Lifecycle::Created,
        })
    }

    /// Releases the handle. Equivalent to dropping the session.
    pub fn destroy(self) {
        drop(self);
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// True between a successful open and the next close.
    pub fn is_open(&self) -> bool {
        self.lifecycle == Lifecycle::Opened
    }

    // ---- Opening ----

    /// Opens a file by path. Returns whether the engine accepted it.
    ///
    /// The engine's 8-bit entry points take UTF-8, so a path that is not
    /// valid Unicode is refused (with a warning) rather than mangled into a
    /// different name.
    pub fn open_by_path(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let Some(utf8) = path.to_str() else {
            log::warn!("Path is not valid UTF-8, open skipped: {}", path.display());
            self.lifecycle = Lifecycle::Closed;
            return false;
        };
        let Some(c_path) = to_c_string("path", utf8) else {
            self.lifecycle = Lifecycle::Closed;
            return false;
        };
        // SAFETY: `self.handle` is live for as long as `self` exists.
        let opened = unsafe { self.engine.open(self.handle, &c_path) } != 0;
        self.finish_open(opened, &path.display().to_string());
        opened
    }

    /// Opens from a file descriptor the caller keeps ownership of.
    ///
    /// The descriptor is duplicated and read from offset 0 through the
    /// streaming protocol. `name` is handed to the engine as the file name
    /// (which it may use as a format hint) and appears in logs. The caller's
    /// file offset is the same after the call as before it.
    #[cfg(unix)]
    pub fn open_by_descriptor(&mut self, fd: BorrowedFd<'_>, name: &str) -> bool {
        self.open_by_descriptor_chunked(fd, name, DEFAULT_READ_CHUNK_SIZE)
    }

    /// [`Session::open_by_descriptor`] with an explicit feed size.
    #[cfg(unix)]
    pub fn open_by_descriptor_chunked(&mut self, fd: BorrowedFd<'_>, name: &str, chunk_size: usize) -> bool {
        match fd.try_clone_to_owned() {
            Ok(owned) => self.open_shared_file(File::from(owned), name, chunk_size),
            Err(e) => {
                log::warn!("Could not duplicate descriptor for {}: {}", name, e);
                self.lifecycle = Lifecycle::Closed;
                false
            }
        }
    }

    /// Streams an open file the caller keeps using. As with descriptors, the
    /// file's offset is restored before returning.
    pub fn open_file_chunked(&mut self, file: &File, name: &str, chunk_size: usize) -> bool {
        match file.try_clone() {
            Ok(duplicate) => self.open_shared_file(duplicate, name, chunk_size),
            Err(e) => {
                log::warn!("Could not duplicate file handle for {}: {}", name, e);
                self.lifecycle = Lifecycle::Closed;
                false
            }
        }
    }

    // `duplicate` shares its offset with the caller's handle.
    fn open_shared_file(&mut self, duplicate: File, name: &str, chunk_size: usize) -> bool {
        let mut restore = match OffsetRestore::new(duplicate) {
            Ok(restore) => restore,
            Err(e) => {
                log::warn!("Could not read the offset of {}: {}", name, e);
                self.lifecycle = Lifecycle::Closed;
                return false;
            }
        };
        self.open_reader_chunked(&mut restore.file, name, chunk_size)
    }

    /// Opens any seekable byte source through the streaming protocol.
    pub fn open_reader<R: Read + Seek>(&mut self, reader: R, name: &str) -> bool {
        self.open_reader_chunked(reader, name, DEFAULT_READ_CHUNK_SIZE)
    }

    /// [`Session::open_reader`] with an explicit feed size.
    ///
    /// Seek requests are polled after every feed and honored by
    /// repositioning `reader` and re-issuing `open_buffer_begin` at the
    /// requested offset. I/O errors end the parse early; whatever the engine
    /// accepted up to that point is kept.
    pub fn open_reader_chunked<R: Read + Seek>(
        &mut self,
        mut reader: R,
        name: &str,
        chunk_size: usize,
    ) -> bool {
        let total = match reader.seek(SeekFrom::End(0)).and_then(|len| {
            reader.seek(SeekFrom::Start(0))?;
            Ok(len)
        }) {
            Ok(len) => len,
            Err(e) => {
                log::warn!("Could not size source {}: {}", name, e);
                self.lifecycle = Lifecycle::Closed;
                return false;
            }
        };

        self.configure(FILE_NAME_OPTION, name);
        if !self.open_buffer_begin(total, 0) {
            log::warn!("Engine refused buffer open for {} ({} bytes)", name, total);
            self.lifecycle = Lifecycle::Closed;
            return false;
        }

        let mut buffer = vec![0u8; chunk_size.max(1)];
        let mut accepted = false;
        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::warn!("Read error on {}: {}", name, e);
                    break;
                }
            };

            let status = self.open_buffer_feed(&buffer[..read]);
            accepted |= status.is_accepted();
            if status.is_finalized() {
                break;
            }

            if let Some(position) = self.open_buffer_seek_request() {
                log::trace!("Engine requested seek to {} in {}", position, name);
                if let Err(e) = reader.seek(SeekFrom::Start(position)) {
                    log::warn!("Seek to {} failed on {}: {}", position, name, e);
                    break;
                }
                if !self.open_buffer_begin(total, position) {
                    log::warn!("Engine refused to resume {} at offset {}", name, position);
                    break;
                }
            }
        }

        let status = self.open_buffer_finalize();
        let opened = accepted || status.is_accepted();
        self.finish_open(opened, name);
        opened
    }

    /// Starts (or, after a seek request, repositions) a buffer-based open.
    pub fn open_buffer_begin(&mut self, total_size: u64, offset: u64) -> bool {
        // SAFETY: `self.handle` is live for as long as `self` exists.
        let ok = unsafe { self.engine.open_buffer_init(self.handle, total_size, offset) } != 0;
        if ok {
            self.lifecycle = Lifecycle::Streaming;
        }
        ok
    }

    /// Feeds the next chunk of the source.
    pub fn open_buffer_feed(&mut self, chunk: &[u8]) -> BufferStatus {
        // SAFETY: `self.handle` is live for as long as `self` exists.
        BufferStatus(unsafe { self.engine.open_buffer_continue(self.handle, chunk) })
    }

    /// Offset the engine wants the next chunk to start at, if it is not the
    /// next sequential byte.
    ///
    /// Always `None` outside a streaming open, in particular after
    /// [`Session::open_buffer_finalize`].
    pub fn open_buffer_seek_request(&mut self) -> Option<u64> {
        if self.lifecycle != Lifecycle::Streaming {
            return None;
        }
        // SAFETY: `self.handle` is live for as long as `self` exists.
        match unsafe { self.engine.open_buffer_continue_goto_get(self.handle) } {
            NO_SEEK => None,
            position => Some(position),
        }
    }

    /// Ends a buffer-based open.
    pub fn open_buffer_finalize(&mut self) -> BufferStatus {
        // SAFETY: `self.handle` is live for as long as `self` exists.
        let status = BufferStatus(unsafe { self.engine.open_buffer_finalize(self.handle) });
        if self.lifecycle == Lifecycle::Streaming {
            self.lifecycle = if status.is_accepted() {
                Lifecycle::Opened
            } else {
                Lifecycle::Closed
            };
        }
        status
    }

    fn finish_open(&mut self, opened: bool, name: &str) {
        if opened {
            log::debug!("Opened {} on {:?}", name, self.handle);
            self.lifecycle = Lifecycle::Opened;
        } else {
            log::debug!("Engine could not open {}", name);
            self.lifecycle = Lifecycle::Closed;
        }
    }

    /// Closes the current source. The session can open another one.
    pub fn close(&mut self) {
        // SAFETY: `self.handle` is live for as long as `self` exists.
        unsafe { self.engine.close(self.handle) };
        self.lifecycle = Lifecycle::Closed;
    }

    // ---- Querying ----

    /// Full report in the format selected by the `Inform` option.
    /// Empty when nothing is open.
    pub fn report(&mut self) -> String {
        // SAFETY: `self.handle` is live for as long as `self` exists.
        unsafe { self.engine.inform(self.handle) }
    }

    /// One field by positional parameter index. Empty when any index is out
    /// of range.
    pub fn query_by_index(
        &mut self,
        stream_kind: StreamKind,
        stream_number: usize,
        parameter_index: usize,
        info_kind: InfoKind,
    ) -> String {
        // SAFETY: `self.handle` is live for as long as `self` exists.
        unsafe {
            self.engine.get_i(
                self.handle,
                stream_kind.wire(),
                stream_number,
                parameter_index,
                info_kind.wire(),
            )
        }
    }

    /// One field by parameter name. `search_kind` selects how the name is
    /// matched (`InfoKind::Name` for the internal parameter name). Empty when
    /// nothing matches.
    pub fn query_by_name(
        &mut self,
        stream_kind: StreamKind,
        stream_number: usize,
        parameter_name: &str,
        info_kind: InfoKind,
        search_kind: InfoKind,
    ) -> String {
        let Some(c_name) = to_c_string("parameter name", parameter_name) else {
            return String::new();
        };
        // SAFETY: `self.handle` is live for as long as `self` exists.
        unsafe {
            self.engine.get(
                self.handle,
                stream_kind.wire(),
                stream_number,
                &c_name,
                info_kind.wire(),
                search_kind.wire(),
            )
        }
    }

    /// Text value of a named parameter, the most common query.
    pub fn get(&mut self, stream_kind: StreamKind, stream_number: usize, parameter_name: &str) -> String {
        self.query_by_name(
            stream_kind,
            stream_number,
            parameter_name,
            InfoKind::Text,
            InfoKind::Name,
        )
    }

    /// Sets an engine option and returns the engine's diagnostic answer.
    ///
    /// Options are process-wide engine state, not session state: a format
    /// selected here applies to every session's next report until changed.
    /// Read-only options (`Info_Version`, `Info_OutputFormats`) are queried by
    /// passing an empty value, see [`Session::configure_get`].
    pub fn configure(&mut self, option_name: &str, option_value: &str) -> String {
        let (Some(c_name), Some(c_value)) = (
            to_c_string("option name", option_name),
            to_c_string("option value", option_value),
        ) else {
            return String::new();
        };
        // SAFETY: `self.handle` is live for as long as `self` exists.
        unsafe { self.engine.option(self.handle, &c_name, &c_value) }
    }

    /// `configure(option_name, "")`.
    pub fn configure_get(&mut self, option_name: &str) -> String {
        self.configure(option_name, "")
    }

    /// Raw engine progress/status value, uninterpreted.
    pub fn state(&mut self) -> usize {
        // SAFETY: `self.handle` is live for as long as `self` exists.
        unsafe { self.engine.state_get(self.handle) }
    }

    /// Number of streams of `stream_kind` (`stream_number = None`, i.e. ALL),
    /// or the number of parameters of stream `n` (`Some(n)`).
    pub fn stream_count(&mut self, stream_kind: StreamKind, stream_number: Option<usize>) -> usize {
        let number = stream_number.unwrap_or(ALL_STREAMS);
        // SAFETY: `self.handle` is live for as long as `self` exists.
        unsafe { self.engine.count_get(self.handle, stream_kind.wire(), number) }
    }

    /// Name/text pairs of every parameter of one stream, in engine order.
    pub fn parameters(&mut self, stream_kind: StreamKind, stream_number: usize) -> Vec<(String, String)> {
        let count = self.stream_count(stream_kind, Some(stream_number));
        (0..count)
            .map(|index| {
                (
                    self.query_by_index(stream_kind, stream_number, index, InfoKind::Name),
                    self.query_by_index(stream_kind, stream_number, index, InfoKind::Text),
                )
            })
            .filter(|(name, _)| !name.is_empty())
            .collect()
    }
}

impl<E: Engine + ?Sized> Drop for Session<'_, E> {
    fn drop(&mut self) {
        log::debug!("Releasing session {:?}", self.handle);
        // SAFETY: the handle came from `new_handle`, and `drop` runs at most
        // once, so this is its only release.
        unsafe { self.engine.delete(self.handle) };
    }
}

/// Puts a shared file offset back where it was, on every exit path.
struct OffsetRestore {
    file: File,
    position: u64,
}

impl OffsetRestore {
    fn new(mut file: File) -> std::io::Result<Self> {
        let position = file.stream_position()?;
        Ok(Self { file, position })
    }
}

impl Drop for OffsetRestore {
    fn drop(&mut self) {
        if let Err(e) = self.file.seek(SeekFrom::Start(self.position)) {
            log::warn!("Could not restore file offset {}: {}", self.position, e);
        }
    }
}

/// Converts a string for the C boundary; `None` (with a warning) if it
/// contains NUL, which C cannot represent.
fn to_c_string(what: &str, value: &str) -> Option<CString> {
    match CString::new(value) {
        Ok(c) => Some(c),
        Err(_) => {
            log::warn!("{} contains a NUL byte, call skipped: {:?}", what, value);
            None
        }
    }
}
