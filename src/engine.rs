//! The native engine as seen by this crate.
//!
//! `RawBass` and `RawAc3` mirror the C functions one-to-one, keeping the
//! engine's BOOL / zero-handle conventions. `Bass` and `Ac3` turn those into
//! `Result`s. The production implementation is `library::BassLibrary`.

use std::ffi::{c_char, c_void};

use crate::ffi::*;

/// BASS core functions.
pub trait RawBass: Send + Sync {
    fn init(&self, device: i32, freq: DWORD, flags: DWORD) -> BOOL;
    fn free(&self) -> BOOL;
    fn error_get_code(&self) -> i32;
    fn get_config(&self, option: DWORD) -> DWORD;
    fn set_config(&self, option: DWORD, value: DWORD) -> BOOL;
    fn stream_free(&self, handle: HSTREAM) -> BOOL;

    fn apply_3d(&self);
    fn get_3d_factors(&self, distance: &mut f32, rolloff: &mut f32, doppler: &mut f32) -> BOOL;
    fn set_3d_factors(&self, distance: f32, rolloff: f32, doppler: f32) -> BOOL;
    fn get_3d_position(
        &self,
        position: Option<&mut Bass3DVector>,
        velocity: Option<&mut Bass3DVector>,
        front: Option<&mut Bass3DVector>,
        top: Option<&mut Bass3DVector>,
    ) -> BOOL;
    fn set_3d_position(
        &self,
        position: Option<&Bass3DVector>,
        velocity: Option<&Bass3DVector>,
        front: Option<&Bass3DVector>,
        top: Option<&Bass3DVector>,
    ) -> BOOL;
    #[allow(clippy::too_many_arguments)]
    fn channel_get_3d_attributes(
        &self,
        handle: DWORD,
        mode: &mut DWORD,
        min: &mut f32,
        max: &mut f32,
        inside_angle: &mut DWORD,
        outside_angle: &mut DWORD,
        outside_volume: &mut f32,
    ) -> BOOL;
    #[allow(clippy::too_many_arguments)]
    fn channel_set_3d_attributes(
        &self,
        handle: DWORD,
        mode: i32,
        min: f32,
        max: f32,
        inside_angle: i32,
        outside_angle: i32,
        outside_volume: f32,
    ) -> BOOL;
    fn channel_get_3d_position(
        &self,
        handle: DWORD,
        position: Option<&mut Bass3DVector>,
        orientation: Option<&mut Bass3DVector>,
        velocity: Option<&mut Bass3DVector>,
    ) -> BOOL;
    fn channel_set_3d_position(
        &self,
        handle: DWORD,
        position: Option<&Bass3DVector>,
        orientation: Option<&Bass3DVector>,
        velocity: Option<&Bass3DVector>,
    ) -> BOOL;

    /// EAX exists only in the Windows build of BASS.
    fn supports_eax(&self) -> bool {
        true
    }
    fn get_eax_parameters(&self, env: &mut DWORD, volume: &mut f32, decay: &mut f32, damp: &mut f32) -> BOOL;
    fn set_eax_parameters(&self, env: i32, volume: f32, decay: f32, damp: f32) -> BOOL;

    fn channel_set_fx(&self, handle: DWORD, fx_type: DWORD, priority: i32) -> HFX;
    fn channel_remove_fx(&self, handle: DWORD, fx: HFX) -> BOOL;
    /// # Safety
    /// `params` must point to the parameter struct matching the effect type.
    unsafe fn fx_set_parameters(&self, fx: HFX, params: *const c_void) -> BOOL;
    /// # Safety
    /// `params` must point to writable storage for the effect's parameter struct.
    unsafe fn fx_get_parameters(&self, fx: HFX, params: *mut c_void) -> BOOL;
    fn fx_reset(&self, handle: DWORD) -> BOOL;
}

/// BASS_AC3 add-on functions.
pub trait RawAc3: Send + Sync {
    /// # Safety
    /// `file` must be a nul-terminated name (`mem == FALSE`) or point to
    /// `length` readable bytes (`mem == TRUE`) for the duration of the call.
    unsafe fn stream_create_file(
        &self,
        mem: BOOL,
        file: *const c_void,
        offset: QWORD,
        length: QWORD,
        flags: DWORD,
    ) -> HSTREAM;

    /// # Safety
    /// `url` must be nul-terminated; `user` must stay valid for as long as the
    /// stream may call `proc_`.
    unsafe fn stream_create_url(
        &self,
        url: *const c_char,
        offset: DWORD,
        flags: DWORD,
        proc_: Option<DownloadProc>,
        user: *mut c_void,
    ) -> HSTREAM;

    /// # Safety
    /// `user` must stay valid for as long as the stream may call `procs`.
    unsafe fn stream_create_file_user(
        &self,
        system: DWORD,
        flags: DWORD,
        procs: &'static BassFileProcs,
        user: *mut c_void,
    ) -> HSTREAM;
}
