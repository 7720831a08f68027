//! Callback objects handed to the engine.
//!
//! BASS keeps a raw function pointer plus a `user` pointer and calls them from
//! its own threads. The function pointer is always one of the trampolines in
//! this module; `user` is the address of an `Arc<CallbackBinding>` that the
//! handle registry keeps alive for as long as the channel exists.

use std::any::Any;
use std::ffi::c_void;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use log::error;

use crate::ffi::*;

/// Opaque caller value handed back to callbacks on every invocation.
pub type UserContext = Arc<dyn Any + Send + Sync>;

/// Receives data as an internet stream downloads.
pub trait DownloadProcedure: Send + Sync {
    /// `data` is `None` once the download has finished.
    fn on_download(&self, data: Option<&[u8]>, user: Option<&UserContext>);
}

impl<F> DownloadProcedure for F
where
    F: Fn(Option<&[u8]>, Option<&UserContext>) + Send + Sync,
{
    fn on_download(&self, data: Option<&[u8]>, user: Option<&UserContext>) {
        self(data, user)
    }
}

/// Custom file access for user file streams.
pub trait FileProcedures: Send + Sync {
    /// The stream is done with the file.
    fn close(&self, user: Option<&UserContext>);
    /// Total length in bytes, 0 if unknown.
    fn length(&self, user: Option<&UserContext>) -> u64;
    /// Fill `buffer`, returning the number of bytes written. 0 = end of file.
    fn read(&self, buffer: &mut [u8], user: Option<&UserContext>) -> usize;
    /// Seek to `offset`, returning false if not possible.
    fn seek(&self, offset: u64, user: Option<&UserContext>) -> bool;
}

/// The callback shapes the engine can hold on to.
#[derive(Clone)]
pub enum CallbackObject {
    Download(Arc<dyn DownloadProcedure>),
    FileProcedures(Arc<dyn FileProcedures>),
    /// Anything else that must outlive the handle (sync/DSP state etc).
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl fmt::Debug for CallbackObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            CallbackObject::Download(_) => "Download",
            CallbackObject::FileProcedures(_) => "FileProcedures",
            CallbackObject::Opaque(_) => "Opaque",
        };
        f.write_str(kind)
    }
}

/// A callback object together with its user context.
///
/// Always handled through `Arc` so its address is stable and can be passed
/// to the engine as the `user` pointer.
pub struct CallbackBinding {
    object: CallbackObject,
    context: Option<UserContext>,
}

impl CallbackBinding {
    pub fn new(object: CallbackObject, context: Option<UserContext>) -> Arc<Self> {
        Arc::new(Self { object, context })
    }

    pub fn download(procedure: Arc<dyn DownloadProcedure>, context: Option<UserContext>) -> Arc<Self> {
        Self::new(CallbackObject::Download(procedure), context)
    }

    pub fn file_procedures(procedures: Arc<dyn FileProcedures>, context: Option<UserContext>) -> Arc<Self> {
        Self::new(CallbackObject::FileProcedures(procedures), context)
    }

    pub fn opaque(object: Arc<dyn Any + Send + Sync>) -> Arc<Self> {
        Self::new(CallbackObject::Opaque(object), None)
    }

    pub fn object(&self) -> &CallbackObject {
        &self.object
    }

    pub fn context(&self) -> Option<&UserContext> {
        self.context.as_ref()
    }

    /// Address to give the engine as `user`. Valid while some `Arc` to the
    /// binding is alive.
    pub fn user_ptr(this: &Arc<Self>) -> *mut c_void {
        Arc::as_ptr(this) as *mut c_void
    }
}

impl fmt::Debug for CallbackBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackBinding")
            .field("object", &self.object)
            .field("has_context", &self.context.is_some())
            .finish()
    }
}

/// Run a callback body for the engine. Unwinding into the engine is UB, so a
/// panic is logged and `fallback` returned in its place.
fn call_guarded<T>(callback: &'static str, fallback: T, body: impl FnOnce() -> T) -> T {
    std::panic::catch_unwind(AssertUnwindSafe(body)).unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown cause".into());
        error!("{} callback panicked ({}), handing the engine a default", callback, reason);
        fallback
    })
}

/// Recover the binding behind a `user` pointer.
///
/// # Safety
/// `user` must be null or come from `CallbackBinding::user_ptr` on a binding
/// that is still alive.
unsafe fn binding_from_user<'a>(user: *mut c_void) -> Option<&'a CallbackBinding> {
    (user as *const CallbackBinding).as_ref()
}

/// DOWNLOADPROC trampoline.
pub(crate) unsafe extern "system" fn download_trampoline(
    buffer: *const c_void,
    length: DWORD,
    user: *mut c_void,
) {
    let Some(binding) = binding_from_user(user) else {
        return;
    };
    let CallbackObject::Download(procedure) = &binding.object else {
        return;
    };

    let data = if buffer.is_null() {
        None
    } else {
        Some(std::slice::from_raw_parts(buffer as *const u8, length as usize))
    };
    call_guarded("DOWNLOADPROC", (), || {
        procedure.on_download(data, binding.context())
    });
}

unsafe fn file_procedures_from_user<'a>(
    user: *mut c_void,
) -> Option<(&'a dyn FileProcedures, Option<&'a UserContext>)> {
    let binding = binding_from_user(user)?;
    match &binding.object {
        CallbackObject::FileProcedures(procs) => Some((procs.as_ref(), binding.context())),
        _ => None,
    }
}

unsafe extern "system" fn file_close_trampoline(user: *mut c_void) {
    if let Some((procs, context)) = file_procedures_from_user(user) {
        call_guarded("FILECLOSEPROC", (), || procs.close(context));
    }
}

unsafe extern "system" fn file_length_trampoline(user: *mut c_void) -> QWORD {
    match file_procedures_from_user(user) {
        Some((procs, context)) => call_guarded("FILELENPROC", 0, || procs.length(context)),
        None => 0,
    }
}

unsafe extern "system" fn file_read_trampoline(
    buffer: *mut c_void,
    length: DWORD,
    user: *mut c_void,
) -> DWORD {
    let Some((procs, context)) = file_procedures_from_user(user) else {
        return 0;
    };
    if buffer.is_null() || length == 0 {
        return 0;
    }

    let buf = std::slice::from_raw_parts_mut(buffer as *mut u8, length as usize);
    call_guarded("FILEREADPROC", 0, || {
        // Never report more than the engine asked for
        procs.read(buf, context).min(length as usize) as DWORD
    })
}

unsafe extern "system" fn file_seek_trampoline(offset: QWORD, user: *mut c_void) -> BOOL {
    let Some((procs, context)) = file_procedures_from_user(user) else {
        return FALSE;
    };
    if call_guarded("FILESEEKPROC", false, || procs.seek(offset, context)) {
        TRUE
    } else {
        FALSE
    }
}

/// Procedure table passed to BASS for every user file stream. The per-stream
/// state travels through `user`.
pub(crate) static FILE_PROCEDURES: BassFileProcs = BassFileProcs {
    close: Some(file_close_trampoline),
    length: Some(file_length_trampoline),
    read: Some(file_read_trampoline),
    seek: Some(file_seek_trampoline),
};
