//! BASS_AC3 add-on FFI bindings.
//! These types match the definitions in bass_ac3.h.

use std::ffi::{c_char, c_void};

use super::bass::*;

// Channel type of AC3 streams
pub const BASS_CTYPE_STREAM_AC3: DWORD = 0x11000;

// Config options
pub const BASS_CONFIG_AC3_DYNRNG: DWORD = 0x10001;

pub type BassAc3StreamCreateFileFn = unsafe extern "system" fn(
    mem: BOOL,
    file: *const c_void,
    offset: QWORD,
    length: QWORD,
    flags: DWORD,
) -> HSTREAM;
pub type BassAc3StreamCreateUrlFn = unsafe extern "system" fn(
    url: *const c_char,
    offset: DWORD,
    flags: DWORD,
    proc_: Option<DownloadProc>,
    user: *mut c_void,
) -> HSTREAM;
pub type BassAc3StreamCreateFileUserFn = unsafe extern "system" fn(
    system: DWORD,
    flags: DWORD,
    procs: *const BassFileProcs,
    user: *mut c_void,
) -> HSTREAM;
