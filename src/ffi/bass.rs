//! BASS audio library FFI type bindings.
//! These types match the definitions in bass.h from the BASS SDK.

use std::ffi::c_void;

// Basic types matching BASS definitions
pub type DWORD = u32;
pub type QWORD = u64;
pub type BOOL = i32;

// Handle types
pub type HSTREAM = DWORD;
pub type HCHANNEL = DWORD;
pub type HFX = DWORD;

// Boolean constants
pub const TRUE: BOOL = 1;
pub const FALSE: BOOL = 0;

// Error codes
pub const BASS_OK: i32 = 0;
pub const BASS_ERROR_MEM: i32 = 1;
pub const BASS_ERROR_FILEOPEN: i32 = 2;
pub const BASS_ERROR_HANDLE: i32 = 5;
pub const BASS_ERROR_FORMAT: i32 = 6;
pub const BASS_ERROR_INIT: i32 = 8;
pub const BASS_ERROR_ILLTYPE: i32 = 19;
pub const BASS_ERROR_ILLPARAM: i32 = 20;
pub const BASS_ERROR_NO3D: i32 = 21;
pub const BASS_ERROR_NOEAX: i32 = 22;
pub const BASS_ERROR_NOFX: i32 = 34;
pub const BASS_ERROR_NOTAVAIL: i32 = 37;
pub const BASS_ERROR_UNKNOWN: i32 = -1;

// Init flags
pub const BASS_DEVICE_3D: DWORD = 4;

// Config options
pub const BASS_CONFIG_3DALGORITHM: DWORD = 10;

// Stream / sample flags
pub const BASS_SAMPLE_MONO: DWORD = 2;
pub const BASS_SAMPLE_3D: DWORD = 8;
pub const BASS_SAMPLE_FX: DWORD = 0x80;
pub const BASS_SAMPLE_FLOAT: DWORD = 0x100;
pub const BASS_STREAM_AUTOFREE: DWORD = 0x40000;
pub const BASS_STREAM_DECODE: DWORD = 0x200000;
pub const BASS_UNICODE: DWORD = 0x80000000;

// BASS_StreamCreateFileUser file systems
pub const STREAMFILE_NOBUFFER: DWORD = 0;
pub const STREAMFILE_BUFFER: DWORD = 1;
pub const STREAMFILE_BUFFERPUSH: DWORD = 2;

// 3D algorithms (BASS_CONFIG_3DALGORITHM)
pub const BASS_3DALG_DEFAULT: DWORD = 0;
pub const BASS_3DALG_OFF: DWORD = 1;
pub const BASS_3DALG_FULL: DWORD = 2;
pub const BASS_3DALG_LIGHT: DWORD = 3;

// 3D channel modes
pub const BASS_3DMODE_NORMAL: i32 = 0;
pub const BASS_3DMODE_RELATIVE: i32 = 1;
pub const BASS_3DMODE_OFF: i32 = 2;

// "Leave current" sentinel for int parameters of the 3D/EAX setters
pub const BASS_LEAVE_CURRENT: i32 = -1;

// EAX environment count (values 0..EAX_ENVIRONMENT_COUNT)
pub const EAX_ENVIRONMENT_COUNT: i32 = 26;

// Effect types
pub const BASS_FX_DX8_CHORUS: DWORD = 0;
pub const BASS_FX_DX8_COMPRESSOR: DWORD = 1;
pub const BASS_FX_DX8_DISTORTION: DWORD = 2;
pub const BASS_FX_DX8_ECHO: DWORD = 3;
pub const BASS_FX_DX8_FLANGER: DWORD = 4;
pub const BASS_FX_DX8_GARGLE: DWORD = 5;
pub const BASS_FX_DX8_I3DL2REVERB: DWORD = 6;
pub const BASS_FX_DX8_PARAMEQ: DWORD = 7;
pub const BASS_FX_DX8_REVERB: DWORD = 8;
pub const BASS_FX_VOLUME: DWORD = 9;

/// 3D vector structure (BASS_3DVECTOR)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bass3DVector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// File procedures for custom file handling (BASS_FILEPROCS)
#[repr(C)]
pub struct BassFileProcs {
    pub close: Option<unsafe extern "system" fn(user: *mut c_void)>,
    pub length: Option<unsafe extern "system" fn(user: *mut c_void) -> QWORD>,
    pub read: Option<unsafe extern "system" fn(buffer: *mut c_void, length: DWORD, user: *mut c_void) -> DWORD>,
    pub seek: Option<unsafe extern "system" fn(offset: QWORD, user: *mut c_void) -> BOOL>,
}

/// Download callback function type
pub type DownloadProc = unsafe extern "system" fn(
    buffer: *const c_void,
    length: DWORD,
    user: *mut c_void,
);

// BASS library function signatures, resolved at runtime from the shared library
pub type BassInitFn = unsafe extern "system" fn(
    device: i32,
    freq: DWORD,
    flags: DWORD,
    win: *mut c_void,
    dsguid: *const c_void,
) -> BOOL;
pub type BassFreeFn = unsafe extern "system" fn() -> BOOL;
pub type BassErrorGetCodeFn = unsafe extern "system" fn() -> i32;
pub type BassGetConfigFn = unsafe extern "system" fn(option: DWORD) -> DWORD;
pub type BassSetConfigFn = unsafe extern "system" fn(option: DWORD, value: DWORD) -> BOOL;
pub type BassStreamFreeFn = unsafe extern "system" fn(handle: HSTREAM) -> BOOL;

pub type BassApply3DFn = unsafe extern "system" fn();
pub type BassGet3DFactorsFn = unsafe extern "system" fn(
    distf: *mut f32,
    rollf: *mut f32,
    doppf: *mut f32,
) -> BOOL;
pub type BassSet3DFactorsFn = unsafe extern "system" fn(distf: f32, rollf: f32, doppf: f32) -> BOOL;
pub type BassGet3DPositionFn = unsafe extern "system" fn(
    pos: *mut Bass3DVector,
    vel: *mut Bass3DVector,
    front: *mut Bass3DVector,
    top: *mut Bass3DVector,
) -> BOOL;
pub type BassSet3DPositionFn = unsafe extern "system" fn(
    pos: *const Bass3DVector,
    vel: *const Bass3DVector,
    front: *const Bass3DVector,
    top: *const Bass3DVector,
) -> BOOL;
pub type BassChannelGet3DAttributesFn = unsafe extern "system" fn(
    handle: DWORD,
    mode: *mut DWORD,
    min: *mut f32,
    max: *mut f32,
    iangle: *mut DWORD,
    oangle: *mut DWORD,
    outvol: *mut f32,
) -> BOOL;
pub type BassChannelSet3DAttributesFn = unsafe extern "system" fn(
    handle: DWORD,
    mode: i32,
    min: f32,
    max: f32,
    iangle: i32,
    oangle: i32,
    outvol: f32,
) -> BOOL;
pub type BassChannelGet3DPositionFn = unsafe extern "system" fn(
    handle: DWORD,
    pos: *mut Bass3DVector,
    orient: *mut Bass3DVector,
    vel: *mut Bass3DVector,
) -> BOOL;
pub type BassChannelSet3DPositionFn = unsafe extern "system" fn(
    handle: DWORD,
    pos: *const Bass3DVector,
    orient: *const Bass3DVector,
    vel: *const Bass3DVector,
) -> BOOL;
pub type BassGetEAXParametersFn = unsafe extern "system" fn(
    env: *mut DWORD,
    vol: *mut f32,
    decay: *mut f32,
    damp: *mut f32,
) -> BOOL;
pub type BassSetEAXParametersFn = unsafe extern "system" fn(env: i32, vol: f32, decay: f32, damp: f32) -> BOOL;

pub type BassChannelSetFXFn = unsafe extern "system" fn(handle: DWORD, type_: DWORD, priority: i32) -> HFX;
pub type BassChannelRemoveFXFn = unsafe extern "system" fn(handle: DWORD, fx: HFX) -> BOOL;
pub type BassFXSetParametersFn = unsafe extern "system" fn(handle: HFX, params: *const c_void) -> BOOL;
pub type BassFXGetParametersFn = unsafe extern "system" fn(handle: HFX, params: *mut c_void) -> BOOL;
pub type BassFXResetFn = unsafe extern "system" fn(handle: DWORD) -> BOOL;

/// DX8 echo parameters (BASS_DX8_ECHO)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BassDx8Echo {
    pub f_wet_dry_mix: f32,
    pub f_feedback: f32,
    pub f_left_delay: f32,
    pub f_right_delay: f32,
    pub l_pan_delay: BOOL,
}

/// DX8 reverb parameters (BASS_DX8_REVERB)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BassDx8Reverb {
    pub f_in_gain: f32,
    pub f_reverb_mix: f32,
    pub f_reverb_time: f32,
    pub f_high_freq_rt_ratio: f32,
}

/// Volume effect parameters (BASS_FX_VOLUME_PARAM)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BassFxVolumeParam {
    pub f_target: f32,
    pub f_current: f32,
    pub f_time: f32,
    pub l_curve: DWORD,
}
