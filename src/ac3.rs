//! AC3 streams through the BASS_AC3 add-on.
//!
//! Streams created here carry their callbacks in the handle registry of the
//! owning `Bass`, so `Bass::stream_free` (or `Bass::free`) releases them.

use std::ffi::{c_char, c_void};
use std::path::Path;
use std::sync::Arc;

use log::debug;

use crate::bass::Bass;
use crate::callback::{download_trampoline, CallbackBinding, DownloadProcedure, FileProcedures, UserContext, FILE_PROCEDURES};
use crate::config::BridgeConfig;
use crate::engine::RawAc3;
use crate::error::Result;
use crate::ffi::*;
use crate::library::Ac3Library;
use crate::pin::with_pinned_buffer;
use crate::registry::CREATION_SLOT;

/// Buffering used by user file streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamSystem {
    /// Unbuffered, read on demand.
    #[default]
    NoBuffer,
    /// Buffered, like an internet file stream.
    Buffer,
    /// Buffered, data is pushed by the caller.
    BufferPush,
}

impl StreamSystem {
    fn to_raw(self) -> DWORD {
        match self {
            StreamSystem::NoBuffer => STREAMFILE_NOBUFFER,
            StreamSystem::Buffer => STREAMFILE_BUFFER,
            StreamSystem::BufferPush => STREAMFILE_BUFFERPUSH,
        }
    }
}

/// The AC3 add-on bound to a BASS core.
#[derive(Clone)]
pub struct Ac3 {
    bass: Bass,
    raw: Arc<dyn RawAc3>,
}

impl Ac3 {
    pub fn new(bass: &Bass, raw: Arc<dyn RawAc3>) -> Self {
        Self {
            bass: bass.clone(),
            raw,
        }
    }

    /// Load `bass_ac3` from the directory in `config`.
    pub fn load(bass: &Bass, config: &BridgeConfig) -> Result<Self> {
        let library = Ac3Library::load(config)?;
        Ok(Self::new(bass, Arc::new(library)))
    }

    pub fn bass(&self) -> &Bass {
        &self.bass
    }

    /// Stream from a file. `length` 0 = to the end of the file.
    pub fn create_stream_file(&self, path: impl AsRef<Path>, offset: QWORD, length: QWORD, flags: DWORD) -> Result<HSTREAM> {
        let path = path.as_ref();
        let name = NativeText::path(path)?;
        let handle = unsafe {
            self.raw
                .stream_create_file(FALSE, name.as_ptr(), offset, length, flags | name.flags())
        };
        let handle = self.bass.check_handle(handle)?;
        debug!("AC3 stream {} from {}", handle, path.display());
        Ok(handle)
    }

    /// Stream from memory that the engine copies during the call; `data` is
    /// only lent for the duration of this call.
    ///
    /// Stock BASS memory streams keep reading the block for the life of the
    /// stream. Only use this with an engine build that copies the data,
    /// otherwise keep the buffer alive yourself and use `create_stream_ptr`.
    ///
    /// `offset`/`length` select part of `data`; `length` 0 = the rest.
    pub fn create_stream_memory(&self, data: &[u8], offset: QWORD, length: QWORD, flags: DWORD) -> Result<HSTREAM> {
        let handle = with_pinned_buffer(data, |pinned| -> Result<HSTREAM> {
            let (start, len) = pinned.region(offset, length)?;
            Ok(unsafe { self.raw.stream_create_file(TRUE, start, 0, len, flags) })
        })?;
        let handle = self.bass.check_handle(handle)?;
        debug!("AC3 stream {} from {} bytes of memory", handle, data.len());
        Ok(handle)
    }

    /// Stream from memory the caller keeps valid.
    ///
    /// # Safety
    /// `data` must point to `length` readable bytes that stay valid and
    /// unchanged until the stream is freed.
    pub unsafe fn create_stream_ptr(&self, data: *const c_void, length: QWORD, flags: DWORD) -> Result<HSTREAM> {
        let handle = self.raw.stream_create_file(TRUE, data, 0, length, flags);
        self.bass.check_handle(handle)
    }

    /// Stream through caller-supplied file procedures.
    ///
    /// `procedures` stays registered until the stream is freed.
    pub fn create_stream_user(
        &self,
        system: StreamSystem,
        flags: DWORD,
        procedures: Arc<dyn FileProcedures>,
        context: Option<UserContext>,
    ) -> Result<HSTREAM> {
        let binding = CallbackBinding::file_procedures(procedures, context);
        let user = CallbackBinding::user_ptr(&binding);
        let _lifecycle = self.bass.lifecycle();
        let handle = unsafe {
            self.raw
                .stream_create_file_user(system.to_raw(), flags, &FILE_PROCEDURES, user)
        };
        let handle = self.bass.check_handle(handle)?;
        self.bass.references().add(handle, CREATION_SLOT, binding)?;
        debug!("AC3 user file stream {} ({:?})", handle, system);
        Ok(handle)
    }

    /// Stream from an internet URL.
    ///
    /// `download` receives the raw data as it arrives (`None` once finished)
    /// and stays registered until the stream is freed. The engine may call it
    /// before this returns, so it must not free streams itself.
    pub fn create_stream_url(
        &self,
        url: &str,
        offset: DWORD,
        flags: DWORD,
        download: Option<Arc<dyn DownloadProcedure>>,
        context: Option<UserContext>,
    ) -> Result<HSTREAM> {
        let text = NativeText::text(url)?;
        let binding = download.map(|procedure| CallbackBinding::download(procedure, context));
        let (proc_, user) = match &binding {
            Some(binding) => (
                Some(download_trampoline as DownloadProc),
                CallbackBinding::user_ptr(binding),
            ),
            None => (None, std::ptr::null_mut()),
        };

        let _lifecycle = self.bass.lifecycle();
        let handle = unsafe {
            self.raw.stream_create_url(
                text.as_ptr() as *const c_char,
                offset,
                flags | text.flags(),
                proc_,
                user,
            )
        };
        let handle = self.bass.check_handle(handle)?;
        if let Some(binding) = binding {
            self.bass.references().add(handle, CREATION_SLOT, binding)?;
        }
        debug!("AC3 stream {} from {}", handle, url);
        Ok(handle)
    }

    /// Dynamic range compression enabled?
    pub fn drc(&self) -> Result<bool> {
        self.bass.get_config_bool(BASS_CONFIG_AC3_DYNRNG)
    }

    /// Enable or disable dynamic range compression for new streams.
    pub fn set_drc(&self, enabled: bool) -> Result<()> {
        self.bass.set_config_bool(BASS_CONFIG_AC3_DYNRNG, enabled)
    }
}
