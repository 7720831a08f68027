//! Runtime-loaded BASS and BASS_AC3 libraries.
//!
//! Every symbol is resolved when the library is loaded so a missing export is
//! reported up front instead of on first use. The `Library` is kept next to
//! the resolved pointers so they can never outlive it.

use std::ffi::{c_char, c_void};
use std::fmt;
use std::path::{Path, PathBuf};
use std::ptr;

use libloading::Library;
use log::debug;

use crate::config::BridgeConfig;
use crate::engine::{RawAc3, RawBass};
use crate::error::{BassError, Result};
use crate::ffi::*;

/// Base name of the core library ("bass.dll", "libbass.so", ...).
pub const BASS_LIBRARY: &str = "bass";
/// Base name of the AC3 add-on.
pub const AC3_LIBRARY: &str = "bass_ac3";

fn open(path: &Path) -> Result<Library> {
    // Bare file names go through the system search path
    if path.components().count() > 1 && !path.exists() {
        return Err(BassError::MissingLibrary(path.to_path_buf()));
    }
    debug!("Loading {}", path.display());
    // SAFETY: loading a shared library runs its initialisers; BASS has none
    // with preconditions on the caller.
    Ok(unsafe { Library::new(path) }?)
}

/// Resolve `name` (nul-terminated) as a function pointer of type `T`.
///
/// # Safety
/// `T` must match the exported function's real signature.
unsafe fn symbol<T: Copy>(lib: &Library, library: &str, name: &'static str) -> Result<T> {
    let bytes = name.as_bytes();
    let sym = lib
        .get::<T>(bytes)
        .map_err(|_| BassError::missing_symbol(library, name.trim_end_matches('\0')))?;
    Ok(*sym)
}

/// Like `symbol`, but a missing export is not an error.
unsafe fn optional_symbol<T: Copy>(lib: &Library, name: &'static str) -> Option<T> {
    lib.get::<T>(name.as_bytes()).ok().map(|sym| *sym)
}

/// Function table of the core library.
struct BassApi {
    init: BassInitFn,
    free: BassFreeFn,
    error_get_code: BassErrorGetCodeFn,
    get_config: BassGetConfigFn,
    set_config: BassSetConfigFn,
    stream_free: BassStreamFreeFn,
    apply_3d: BassApply3DFn,
    get_3d_factors: BassGet3DFactorsFn,
    set_3d_factors: BassSet3DFactorsFn,
    get_3d_position: BassGet3DPositionFn,
    set_3d_position: BassSet3DPositionFn,
    channel_get_3d_attributes: BassChannelGet3DAttributesFn,
    channel_set_3d_attributes: BassChannelSet3DAttributesFn,
    channel_get_3d_position: BassChannelGet3DPositionFn,
    channel_set_3d_position: BassChannelSet3DPositionFn,
    // EAX is Windows-only
    get_eax_parameters: Option<BassGetEAXParametersFn>,
    set_eax_parameters: Option<BassSetEAXParametersFn>,
    channel_set_fx: BassChannelSetFXFn,
    channel_remove_fx: BassChannelRemoveFXFn,
    fx_set_parameters: BassFXSetParametersFn,
    fx_get_parameters: BassFXGetParametersFn,
    fx_reset: BassFXResetFn,
}

impl BassApi {
    unsafe fn resolve(lib: &Library) -> Result<Self> {
        let l = BASS_LIBRARY;
        Ok(Self {
            init: symbol(lib, l, "BASS_Init\0")?,
            free: symbol(lib, l, "BASS_Free\0")?,
            error_get_code: symbol(lib, l, "BASS_ErrorGetCode\0")?,
            get_config: symbol(lib, l, "BASS_GetConfig\0")?,
            set_config: symbol(lib, l, "BASS_SetConfig\0")?,
            stream_free: symbol(lib, l, "BASS_StreamFree\0")?,
            apply_3d: symbol(lib, l, "BASS_Apply3D\0")?,
            get_3d_factors: symbol(lib, l, "BASS_Get3DFactors\0")?,
            set_3d_factors: symbol(lib, l, "BASS_Set3DFactors\0")?,
            get_3d_position: symbol(lib, l, "BASS_Get3DPosition\0")?,
            set_3d_position: symbol(lib, l, "BASS_Set3DPosition\0")?,
            channel_get_3d_attributes: symbol(lib, l, "BASS_ChannelGet3DAttributes\0")?,
            channel_set_3d_attributes: symbol(lib, l, "BASS_ChannelSet3DAttributes\0")?,
            channel_get_3d_position: symbol(lib, l, "BASS_ChannelGet3DPosition\0")?,
            channel_set_3d_position: symbol(lib, l, "BASS_ChannelSet3DPosition\0")?,
            get_eax_parameters: optional_symbol(lib, "BASS_GetEAXParameters\0"),
            set_eax_parameters: optional_symbol(lib, "BASS_SetEAXParameters\0"),
            channel_set_fx: symbol(lib, l, "BASS_ChannelSetFX\0")?,
            channel_remove_fx: symbol(lib, l, "BASS_ChannelRemoveFX\0")?,
            fx_set_parameters: symbol(lib, l, "BASS_FXSetParameters\0")?,
            fx_get_parameters: symbol(lib, l, "BASS_FXGetParameters\0")?,
            fx_reset: symbol(lib, l, "BASS_FXReset\0")?,
        })
    }
}

fn out_ptr(v: Option<&mut Bass3DVector>) -> *mut Bass3DVector {
    v.map_or(ptr::null_mut(), |v| v as *mut Bass3DVector)
}

fn in_ptr(v: Option<&Bass3DVector>) -> *const Bass3DVector {
    v.map_or(ptr::null(), |v| v as *const Bass3DVector)
}

/// The BASS core library.
pub struct BassLibrary {
    api: BassApi,
    path: PathBuf,
    // Dropped last: unloads the code `api` points into
    _lib: Library,
}

impl BassLibrary {
    /// Load `bass` from the configured directory.
    pub fn load(config: &BridgeConfig) -> Result<Self> {
        Self::load_from(config.library_path(BASS_LIBRARY))
    }

    /// Load the core library from an explicit path.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let lib = open(path)?;
        let api = unsafe { BassApi::resolve(&lib)? };
        debug!(
            "BASS loaded from {} (EAX {})",
            path.display(),
            if api.get_eax_parameters.is_some() { "available" } else { "unavailable" }
        );
        Ok(Self {
            api,
            path: path.to_path_buf(),
            _lib: lib,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for BassLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BassLibrary").field("path", &self.path).finish()
    }
}

// SAFETY (all methods): pointers passed to BASS are either null or derived
// from live references for the duration of the call.
impl RawBass for BassLibrary {
    fn init(&self, device: i32, freq: DWORD, flags: DWORD) -> BOOL {
        unsafe { (self.api.init)(device, freq, flags, ptr::null_mut(), ptr::null()) }
    }

    fn free(&self) -> BOOL {
        unsafe { (self.api.free)() }
    }

    fn error_get_code(&self) -> i32 {
        unsafe { (self.api.error_get_code)() }
    }

    fn get_config(&self, option: DWORD) -> DWORD {
        unsafe { (self.api.get_config)(option) }
    }

    fn set_config(&self, option: DWORD, value: DWORD) -> BOOL {
        unsafe { (self.api.set_config)(option, value) }
    }

    fn stream_free(&self, handle: HSTREAM) -> BOOL {
        unsafe { (self.api.stream_free)(handle) }
    }

    fn apply_3d(&self) {
        unsafe { (self.api.apply_3d)() }
    }

    fn get_3d_factors(&self, distance: &mut f32, rolloff: &mut f32, doppler: &mut f32) -> BOOL {
        unsafe { (self.api.get_3d_factors)(distance, rolloff, doppler) }
    }

    fn set_3d_factors(&self, distance: f32, rolloff: f32, doppler: f32) -> BOOL {
        unsafe { (self.api.set_3d_factors)(distance, rolloff, doppler) }
    }

    fn get_3d_position(
        &self,
        position: Option<&mut Bass3DVector>,
        velocity: Option<&mut Bass3DVector>,
        front: Option<&mut Bass3DVector>,
        top: Option<&mut Bass3DVector>,
    ) -> BOOL {
        unsafe {
            (self.api.get_3d_position)(out_ptr(position), out_ptr(velocity), out_ptr(front), out_ptr(top))
        }
    }

    fn set_3d_position(
        &self,
        position: Option<&Bass3DVector>,
        velocity: Option<&Bass3DVector>,
        front: Option<&Bass3DVector>,
        top: Option<&Bass3DVector>,
    ) -> BOOL {
        unsafe {
            (self.api.set_3d_position)(in_ptr(position), in_ptr(velocity), in_ptr(front), in_ptr(top))
        }
    }

    fn channel_get_3d_attributes(
        &self,
        handle: DWORD,
        mode: &mut DWORD,
        min: &mut f32,
        max: &mut f32,
        inside_angle: &mut DWORD,
        outside_angle: &mut DWORD,
        outside_volume: &mut f32,
    ) -> BOOL {
        unsafe {
            (self.api.channel_get_3d_attributes)(
                handle,
                mode,
                min,
                max,
                inside_angle,
                outside_angle,
                outside_volume,
            )
        }
    }

    fn channel_set_3d_attributes(
        &self,
        handle: DWORD,
        mode: i32,
        min: f32,
        max: f32,
        inside_angle: i32,
        outside_angle: i32,
        outside_volume: f32,
    ) -> BOOL {
        unsafe {
            (self.api.channel_set_3d_attributes)(
                handle,
                mode,
                min,
                max,
                inside_angle,
                outside_angle,
                outside_volume,
            )
        }
    }

    fn channel_get_3d_position(
        &self,
        handle: DWORD,
        position: Option<&mut Bass3DVector>,
        orientation: Option<&mut Bass3DVector>,
        velocity: Option<&mut Bass3DVector>,
    ) -> BOOL {
        unsafe {
            (self.api.channel_get_3d_position)(
                handle,
                out_ptr(position),
                out_ptr(orientation),
                out_ptr(velocity),
            )
        }
    }

    fn channel_set_3d_position(
        &self,
        handle: DWORD,
        position: Option<&Bass3DVector>,
        orientation: Option<&Bass3DVector>,
        velocity: Option<&Bass3DVector>,
    ) -> BOOL {
        unsafe {
            (self.api.channel_set_3d_position)(
                handle,
                in_ptr(position),
                in_ptr(orientation),
                in_ptr(velocity),
            )
        }
    }

    fn supports_eax(&self) -> bool {
        self.api.get_eax_parameters.is_some() && self.api.set_eax_parameters.is_some()
    }

    fn get_eax_parameters(&self, env: &mut DWORD, volume: &mut f32, decay: &mut f32, damp: &mut f32) -> BOOL {
        match self.api.get_eax_parameters {
            Some(get) => unsafe { get(env, volume, decay, damp) },
            None => FALSE,
        }
    }

    fn set_eax_parameters(&self, env: i32, volume: f32, decay: f32, damp: f32) -> BOOL {
        match self.api.set_eax_parameters {
            Some(set) => unsafe { set(env, volume, decay, damp) },
            None => FALSE,
        }
    }

    fn channel_set_fx(&self, handle: DWORD, fx_type: DWORD, priority: i32) -> HFX {
        unsafe { (self.api.channel_set_fx)(handle, fx_type, priority) }
    }

    fn channel_remove_fx(&self, handle: DWORD, fx: HFX) -> BOOL {
        unsafe { (self.api.channel_remove_fx)(handle, fx) }
    }

    unsafe fn fx_set_parameters(&self, fx: HFX, params: *const c_void) -> BOOL {
        (self.api.fx_set_parameters)(fx, params)
    }

    unsafe fn fx_get_parameters(&self, fx: HFX, params: *mut c_void) -> BOOL {
        (self.api.fx_get_parameters)(fx, params)
    }

    fn fx_reset(&self, handle: DWORD) -> BOOL {
        unsafe { (self.api.fx_reset)(handle) }
    }
}

/// Function table of the AC3 add-on.
struct Ac3Api {
    stream_create_file: BassAc3StreamCreateFileFn,
    stream_create_url: BassAc3StreamCreateUrlFn,
    stream_create_file_user: BassAc3StreamCreateFileUserFn,
}

/// The BASS_AC3 add-on library.
pub struct Ac3Library {
    api: Ac3Api,
    path: PathBuf,
    _lib: Library,
}

impl Ac3Library {
    /// Load `bass_ac3` from the configured directory.
    pub fn load(config: &BridgeConfig) -> Result<Self> {
        Self::load_from(config.library_path(AC3_LIBRARY))
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let lib = open(path)?;
        let l = AC3_LIBRARY;
        let api = unsafe {
            Ac3Api {
                stream_create_file: symbol(&lib, l, "BASS_AC3_StreamCreateFile\0")?,
                stream_create_url: symbol(&lib, l, "BASS_AC3_StreamCreateURL\0")?,
                stream_create_file_user: symbol(&lib, l, "BASS_AC3_StreamCreateFileUser\0")?,
            }
        };
        debug!("BASS_AC3 loaded from {}", path.display());
        Ok(Self {
            api,
            path: path.to_path_buf(),
            _lib: lib,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for Ac3Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ac3Library").field("path", &self.path).finish()
    }
}

impl RawAc3 for Ac3Library {
    unsafe fn stream_create_file(
        &self,
        mem: BOOL,
        file: *const c_void,
        offset: QWORD,
        length: QWORD,
        flags: DWORD,
    ) -> HSTREAM {
        (self.api.stream_create_file)(mem, file, offset, length, flags)
    }

    unsafe fn stream_create_url(
        &self,
        url: *const c_char,
        offset: DWORD,
        flags: DWORD,
        proc_: Option<DownloadProc>,
        user: *mut c_void,
    ) -> HSTREAM {
        (self.api.stream_create_url)(url, offset, flags, proc_, user)
    }

    unsafe fn stream_create_file_user(
        &self,
        system: DWORD,
        flags: DWORD,
        procs: &'static BassFileProcs,
        user: *mut c_void,
    ) -> HSTREAM {
        (self.api.stream_create_file_user)(system, flags, procs, user)
    }
}
