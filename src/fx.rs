//! Effects on channels (DX8 effects and the volume effect).

use std::ffi::c_void;

use log::debug;

use crate::bass::{Bass, EffectTable};
use crate::error::{BassError, Result};
use crate::ffi::*;

/// Effect types understood by `BASS_ChannelSetFX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectType {
    Chorus,
    Compressor,
    Distortion,
    Echo,
    Flanger,
    Gargle,
    I3DL2Reverb,
    ParamEq,
    Reverb,
    Volume,
}

impl EffectType {
    pub fn to_raw(self) -> DWORD {
        match self {
            EffectType::Chorus => BASS_FX_DX8_CHORUS,
            EffectType::Compressor => BASS_FX_DX8_COMPRESSOR,
            EffectType::Distortion => BASS_FX_DX8_DISTORTION,
            EffectType::Echo => BASS_FX_DX8_ECHO,
            EffectType::Flanger => BASS_FX_DX8_FLANGER,
            EffectType::Gargle => BASS_FX_DX8_GARGLE,
            EffectType::I3DL2Reverb => BASS_FX_DX8_I3DL2REVERB,
            EffectType::ParamEq => BASS_FX_DX8_PARAMEQ,
            EffectType::Reverb => BASS_FX_DX8_REVERB,
            EffectType::Volume => BASS_FX_VOLUME,
        }
    }
}

/// Parameter struct of one effect type.
///
/// # Safety
/// Implementors must be `#[repr(C)]` with exactly the layout BASS expects for
/// `EFFECT`, since they are passed to the engine by pointer.
pub unsafe trait EffectParameters: Copy + Default {
    const EFFECT: EffectType;
}

/// DX8 echo.
pub type DxEchoParameters = BassDx8Echo;
/// DX8 (music) reverb.
pub type DxReverbParameters = BassDx8Reverb;
/// Volume effect with optional fade.
pub type VolumeParameters = BassFxVolumeParam;

unsafe impl EffectParameters for BassDx8Echo {
    const EFFECT: EffectType = EffectType::Echo;
}

unsafe impl EffectParameters for BassDx8Reverb {
    const EFFECT: EffectType = EffectType::Reverb;
}

unsafe impl EffectParameters for BassFxVolumeParam {
    const EFFECT: EffectType = EffectType::Volume;
}

impl Bass {
    /// Attach an effect to a channel. Higher `priority` runs first.
    ///
    /// Channels need `BASS_SAMPLE_FX` for DX8 effects.
    pub fn channel_set_fx(&self, handle: DWORD, effect: EffectType, priority: i32) -> Result<HFX> {
        let mut effects = self.effects();
        let fx = self.check_handle(self.raw().channel_set_fx(handle, effect.to_raw(), priority))?;
        effects.insert(fx, (handle, effect));
        debug!("Set {:?} effect {} on channel {}", effect, fx, handle);
        Ok(fx)
    }

    pub fn channel_remove_fx(&self, handle: DWORD, fx: HFX) -> Result<()> {
        let mut effects = self.effects();
        self.check(self.raw().channel_remove_fx(handle, fx))?;
        effects.remove(&fx);
        Ok(())
    }

    /// The engine reads as many bytes as the effect's own parameter struct
    /// has, so `P` must match the type `fx` was created with.
    fn check_effect<P: EffectParameters>(effects: &EffectTable, fx: HFX) -> Result<()> {
        match effects.get(&fx) {
            Some((_, effect)) if *effect == P::EFFECT => Ok(()),
            Some((_, effect)) => {
                debug!("{:?} parameters used on {:?} effect {}", P::EFFECT, effect, fx);
                Err(BassError::IllegalType)
            }
            None => Err(BassError::InvalidHandle),
        }
    }

    pub fn fx_set_parameters<P: EffectParameters>(&self, fx: HFX, params: &P) -> Result<()> {
        let effects = self.effects();
        Self::check_effect::<P>(&effects, fx)?;
        let ok = unsafe { self.raw().fx_set_parameters(fx, params as *const P as *const c_void) };
        self.check(ok)
    }

    pub fn fx_get_parameters<P: EffectParameters>(&self, fx: HFX) -> Result<P> {
        let effects = self.effects();
        Self::check_effect::<P>(&effects, fx)?;
        let mut params = P::default();
        let ok = unsafe { self.raw().fx_get_parameters(fx, &mut params as *mut P as *mut c_void) };
        self.check(ok)?;
        Ok(params)
    }

    /// Reset an effect's state, or every effect on a channel.
    pub fn fx_reset(&self, handle: DWORD) -> Result<()> {
        self.check(self.raw().fx_reset(handle))
    }
}

impl VolumeParameters {
    /// Fade from the current level to `target` over `seconds`.
    pub fn fade(target: f32, seconds: f32) -> Self {
        Self {
            f_target: target,
            f_current: -1.0,
            f_time: seconds,
            l_curve: 0,
        }
    }
}

impl From<EffectType> for DWORD {
    fn from(effect: EffectType) -> DWORD {
        effect.to_raw()
    }
}

impl TryFrom<DWORD> for EffectType {
    type Error = BassError;

    fn try_from(value: DWORD) -> Result<Self> {
        Ok(match value {
            BASS_FX_DX8_CHORUS => EffectType::Chorus,
            BASS_FX_DX8_COMPRESSOR => EffectType::Compressor,
            BASS_FX_DX8_DISTORTION => EffectType::Distortion,
            BASS_FX_DX8_ECHO => EffectType::Echo,
            BASS_FX_DX8_FLANGER => EffectType::Flanger,
            BASS_FX_DX8_GARGLE => EffectType::Gargle,
            BASS_FX_DX8_I3DL2REVERB => EffectType::I3DL2Reverb,
            BASS_FX_DX8_PARAMEQ => EffectType::ParamEq,
            BASS_FX_DX8_REVERB => EffectType::Reverb,
            BASS_FX_VOLUME => EffectType::Volume,
            _ => return Err(BassError::IllegalType),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bass::tests::mock_bass;

    fn stream(engine: &crate::engine::mock::MockEngine) -> HSTREAM {
        engine.state.lock().streams.insert(300);
        300
    }

    #[test]
    fn test_echo_parameters_roundtrip() {
        let (engine, bass) = mock_bass();
        let handle = stream(&engine);
        let fx = bass.channel_set_fx(handle, EffectType::Echo, 0).unwrap();

        let echo = DxEchoParameters {
            f_wet_dry_mix: 50.0,
            f_feedback: 30.0,
            f_left_delay: 333.0,
            f_right_delay: 250.0,
            l_pan_delay: TRUE,
        };
        bass.fx_set_parameters(fx, &echo).unwrap();
        let read: DxEchoParameters = bass.fx_get_parameters(fx).unwrap();
        assert_eq!(read, echo);
    }

    #[test]
    fn test_volume_fade() {
        let (engine, bass) = mock_bass();
        let handle = stream(&engine);
        let fx = bass.channel_set_fx(handle, EffectType::Volume, 10).unwrap();
        bass.fx_set_parameters(fx, &VolumeParameters::fade(0.0, 2.5)).unwrap();

        let read: VolumeParameters = bass.fx_get_parameters(fx).unwrap();
        assert_eq!(read.f_target, 0.0);
        assert_eq!(read.f_time, 2.5);
        assert_eq!(read.f_current, -1.0);
    }

    #[test]
    fn test_set_fx_on_unknown_channel() {
        let (_engine, bass) = mock_bass();
        assert!(matches!(
            bass.channel_set_fx(999, EffectType::Reverb, 0),
            Err(BassError::InvalidHandle)
        ));
    }

    #[test]
    fn test_remove_fx() {
        let (engine, bass) = mock_bass();
        let handle = stream(&engine);
        let fx = bass.channel_set_fx(handle, EffectType::Reverb, 0).unwrap();

        // Wrong owner
        assert!(matches!(
            bass.channel_remove_fx(handle + 1, fx),
            Err(BassError::InvalidHandle)
        ));
        bass.channel_remove_fx(handle, fx).unwrap();
        assert!(matches!(
            bass.fx_get_parameters::<DxReverbParameters>(fx),
            Err(BassError::InvalidHandle)
        ));
    }

    #[test]
    fn test_reset() {
        let (engine, bass) = mock_bass();
        let handle = stream(&engine);
        let fx = bass.channel_set_fx(handle, EffectType::Echo, 0).unwrap();
        bass.fx_reset(fx).unwrap();
        bass.fx_reset(handle).unwrap();
        assert_eq!(engine.state.lock().resets, vec![fx, handle]);
        assert!(matches!(bass.fx_reset(12345), Err(BassError::InvalidHandle)));
    }

    #[test]
    fn test_mismatched_parameter_type_rejected() {
        let (engine, bass) = mock_bass();
        let handle = stream(&engine);
        let fx = bass.channel_set_fx(handle, EffectType::Echo, 0).unwrap();

        assert!(matches!(
            bass.fx_set_parameters(fx, &VolumeParameters::fade(0.5, 1.0)),
            Err(BassError::IllegalType)
        ));
        assert!(matches!(
            bass.fx_get_parameters::<VolumeParameters>(fx),
            Err(BassError::IllegalType)
        ));
        // Nothing reached the engine
        assert!(engine.state.lock().fx[&fx].2.is_empty());
    }

    #[test]
    fn test_effects_forgotten_with_their_channel() {
        let (engine, bass) = mock_bass();
        let handle = stream(&engine);
        let fx = bass.channel_set_fx(handle, EffectType::Reverb, 0).unwrap();
        bass.stream_free(handle).unwrap();

        // The engine may reuse the value for an effect of another type
        assert!(matches!(
            bass.fx_get_parameters::<DxReverbParameters>(fx),
            Err(BassError::InvalidHandle)
        ));
    }

    #[test]
    fn test_effect_type_codes() {
        for raw in 0..=BASS_FX_VOLUME {
            let effect = EffectType::try_from(raw).unwrap();
            assert_eq!(DWORD::from(effect), raw);
        }
        assert!(matches!(EffectType::try_from(10u32), Err(BassError::IllegalType)));
        assert_eq!(DxEchoParameters::EFFECT, EffectType::Echo);
        assert_eq!(VolumeParameters::EFFECT.to_raw(), BASS_FX_VOLUME);
    }
}
