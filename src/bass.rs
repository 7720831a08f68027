//! Checked access to the BASS core.
//!
//! Every call that the engine answers with FALSE or a zero handle becomes an
//! `Err` carrying `BASS_ErrorGetCode`. Nothing is retried or masked.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::debug;
use parking_lot::{Mutex, MutexGuard};

use crate::config::BridgeConfig;
use crate::engine::RawBass;
use crate::error::{BassError, Result};
use crate::ffi::*;
use crate::fx::EffectType;
use crate::library::BassLibrary;
use crate::registry::ChannelReferences;

/// Effects set through this wrapper: fx handle -> (channel, type).
pub(crate) type EffectTable = HashMap<HFX, (DWORD, EffectType)>;

/// Handle to the BASS core plus the callback registry its streams use.
#[derive(Clone)]
pub struct Bass {
    raw: Arc<dyn RawBass>,
    references: Arc<ChannelReferences>,
    /// Serialises handle creation + registration against free + release.
    /// The engine may hand a freed handle value to the next stream.
    lifecycle: Arc<Mutex<()>>,
    effects: Arc<Mutex<EffectTable>>,
}

impl Bass {
    /// Wrap an engine, registering callbacks in the process-wide registry.
    pub fn new(raw: Arc<dyn RawBass>) -> Self {
        Self::with_references(raw, ChannelReferences::global())
    }

    /// Wrap an engine with a dedicated registry.
    pub fn with_references(raw: Arc<dyn RawBass>, references: Arc<ChannelReferences>) -> Self {
        Self {
            raw,
            references,
            lifecycle: Arc::new(Mutex::new(())),
            effects: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Load the native library described by `config`.
    pub fn load(config: &BridgeConfig) -> Result<Self> {
        let library = BassLibrary::load(config)?;
        Ok(Self::new(Arc::new(library)))
    }

    pub fn raw(&self) -> &dyn RawBass {
        self.raw.as_ref()
    }

    /// The registry keeping this engine's callbacks alive.
    pub fn references(&self) -> &Arc<ChannelReferences> {
        &self.references
    }

    /// Held while a handle is created and its callbacks registered, or freed
    /// and its callbacks released. Callbacks must not free streams from
    /// inside a creation call.
    pub(crate) fn lifecycle(&self) -> MutexGuard<'_, ()> {
        self.lifecycle.lock()
    }

    pub(crate) fn effects(&self) -> MutexGuard<'_, EffectTable> {
        self.effects.lock()
    }

    /// The error behind the last failed call on this thread.
    pub fn last_error(&self) -> BassError {
        BassError::from_code(self.raw.error_get_code())
    }

    /// Translate a BOOL result.
    pub fn check(&self, ok: BOOL) -> Result<()> {
        if ok == FALSE {
            Err(self.last_error())
        } else {
            Ok(())
        }
    }

    /// Translate a handle result; 0 is failure.
    pub fn check_handle(&self, handle: DWORD) -> Result<DWORD> {
        if handle == 0 {
            Err(self.last_error())
        } else {
            Ok(handle)
        }
    }

    /// Initialise an output device (-1 = default device).
    pub fn init(&self, device: i32, freq: DWORD, flags: DWORD) -> Result<()> {
        self.check(self.raw.init(device, freq, flags))?;
        debug!("BASS initialised (device {}, {} Hz, flags {:#x})", device, freq, flags);
        Ok(())
    }

    /// Shut the engine down. Every handle dies with it, so every registered
    /// callback is released.
    pub fn free(&self) -> Result<()> {
        let _lifecycle = self.lifecycle();
        self.check(self.raw.free())?;
        self.references.clear();
        self.effects().clear();
        debug!("BASS freed");
        Ok(())
    }

    /// Free a stream and release the callbacks registered against it.
    ///
    /// If the engine says the handle is already gone the registrations are
    /// released as well. Streams created with `BASS_STREAM_AUTOFREE` are
    /// freed by the engine on their own and never come through here; their
    /// callbacks stay registered until this is called for the handle (the
    /// engine then reports `InvalidHandle`), `references().remove(handle)` is
    /// called, or `free` shuts the engine down.
    pub fn stream_free(&self, handle: HSTREAM) -> Result<()> {
        let _lifecycle = self.lifecycle();
        let result = self.check(self.raw.stream_free(handle));
        if matches!(result, Ok(()) | Err(BassError::InvalidHandle)) {
            self.references.remove(handle);
            self.effects().retain(|_, (channel, _)| *channel != handle);
            debug!("Released stream {}", handle);
        }
        result
    }

    /// Read a config option.
    pub fn get_config(&self, option: DWORD) -> Result<DWORD> {
        let value = self.raw.get_config(option);
        // -1 is the failure value, but also a legal setting for some options
        if value == DWORD::MAX && self.raw.error_get_code() != BASS_OK {
            return Err(self.last_error());
        }
        Ok(value)
    }

    pub fn get_config_bool(&self, option: DWORD) -> Result<bool> {
        Ok(self.get_config(option)? != 0)
    }

    pub fn set_config(&self, option: DWORD, value: DWORD) -> Result<()> {
        self.check(self.raw.set_config(option, value))
    }

    pub fn set_config_bool(&self, option: DWORD, value: bool) -> Result<()> {
        self.set_config(option, value as DWORD)
    }
}

impl fmt::Debug for Bass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bass")
            .field("registered_handles", &self.references.handle_count())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::callback::CallbackBinding;
    use crate::engine::mock::MockEngine;
    use std::any::Any;

    pub(crate) fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Engine + wrapper sharing a private registry.
    pub(crate) fn mock_bass() -> (Arc<MockEngine>, Bass) {
        init_logging();
        let engine = Arc::new(MockEngine::initialized());
        let bass = Bass::with_references(engine.clone(), Arc::new(ChannelReferences::new()));
        (engine, bass)
    }

    fn fake_stream(engine: &MockEngine) -> HSTREAM {
        let mut state = engine.state.lock();
        let handle = state.next_handle;
        state.next_handle += 1;
        state.streams.insert(handle);
        handle
    }

    #[test]
    fn test_not_initialised_surfaces() {
        init_logging();
        let engine = Arc::new(MockEngine::new());
        let bass = Bass::with_references(engine, Arc::new(ChannelReferences::new()));
        assert!(matches!(bass.free(), Err(BassError::NotInitialised)));
        bass.init(-1, 44100, 0).unwrap();
        bass.free().unwrap();
    }

    #[test]
    fn test_double_init_passes_code_through() {
        let (_engine, bass) = mock_bass();
        match bass.init(-1, 48000, BASS_DEVICE_3D) {
            Err(BassError::Engine(14)) => {}
            other => panic!("expected already-initialised error, got {:?}", other),
        }
    }

    #[test]
    fn test_stream_free_releases_callbacks() {
        let (engine, bass) = mock_bass();
        let handle = fake_stream(&engine);
        let object: Arc<dyn Any + Send + Sync> = Arc::new(String::from("state"));
        let weak = Arc::downgrade(&object);
        bass.references().add(handle, 0, CallbackBinding::opaque(object)).unwrap();
        assert!(weak.upgrade().is_some());

        bass.stream_free(handle).unwrap();
        assert!(!engine.is_live(handle));
        assert!(weak.upgrade().is_none());
        assert!(bass.references().is_empty());
    }

    #[test]
    fn test_stream_free_on_dead_handle_still_releases() {
        let (_engine, bass) = mock_bass();
        let object: Arc<dyn Any + Send + Sync> = Arc::new(1u8);
        let weak = Arc::downgrade(&object);
        bass.references().add(555, 0, CallbackBinding::opaque(object)).unwrap();

        assert!(matches!(bass.stream_free(555), Err(BassError::InvalidHandle)));
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_auto_freed_stream_keeps_callbacks_until_freed() {
        let (engine, bass) = mock_bass();
        let handle = fake_stream(&engine);
        let object: Arc<dyn Any + Send + Sync> = Arc::new(3u8);
        let weak = Arc::downgrade(&object);
        bass.references().add(handle, 0, CallbackBinding::opaque(object)).unwrap();

        // Engine ends the stream by itself
        engine.state.lock().streams.remove(&handle);
        assert!(bass.references().is_registered(handle, 0));
        assert!(weak.upgrade().is_some());

        assert!(matches!(bass.stream_free(handle), Err(BassError::InvalidHandle)));
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_stream_free_other_error_keeps_callbacks() {
        let (engine, bass) = mock_bass();
        let handle = fake_stream(&engine);
        bass.references()
            .add(handle, 0, CallbackBinding::opaque(Arc::new(0u8)))
            .unwrap();
        engine.state.lock().initialized = false;

        assert!(matches!(bass.stream_free(handle), Err(BassError::NotInitialised)));
        assert!(bass.references().is_registered(handle, 0));
    }

    #[test]
    fn test_free_clears_registry() {
        let (engine, bass) = mock_bass();
        let a = fake_stream(&engine);
        let b = fake_stream(&engine);
        bass.references().add(a, 0, CallbackBinding::opaque(Arc::new(0u8))).unwrap();
        bass.references().add(b, 4, CallbackBinding::opaque(Arc::new(0u8))).unwrap();

        bass.free().unwrap();
        assert!(bass.references().is_empty());
    }

    #[test]
    fn test_config_roundtrip() {
        let (_engine, bass) = mock_bass();
        assert!(matches!(bass.get_config(0x1234), Err(BassError::IllegalType)));
        bass.set_config(0x1234, 7).unwrap();
        assert_eq!(bass.get_config(0x1234).unwrap(), 7);
        bass.set_config_bool(0x1235, true).unwrap();
        assert!(bass.get_config_bool(0x1235).unwrap());
    }

    #[test]
    fn test_config_minus_one_is_a_value() {
        let (_engine, bass) = mock_bass();
        bass.set_config(0x2000, DWORD::MAX).unwrap();
        assert_eq!(bass.get_config(0x2000).unwrap(), DWORD::MAX);
    }

    #[test]
    fn test_check_handle() {
        let (engine, bass) = mock_bass();
        engine.state.lock().last_error = BASS_ERROR_FORMAT;
        assert!(matches!(bass.check_handle(0), Err(BassError::UnsupportedSampleFormat)));
        assert_eq!(bass.check_handle(9).unwrap(), 9);
    }
}
