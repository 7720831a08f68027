//! 3D positioning and EAX environments.
//!
//! Changes made with the 3D setters only take effect after `apply_3d`.
//! EAX changes apply immediately but need an EAX capable device (Windows).

use crate::bass::Bass;
use crate::error::{BassError, Result};
use crate::ffi::*;

/// 3D vector (BASS_3DVECTOR). BASS uses a left-handed coordinate system.
pub type Vector3D = Bass3DVector;

impl Bass3DVector {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Global factors for the 3D calculations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Factors3D {
    /// Units per metre (1.0 = metres, 0.9144 = yards). <= 0 leaves it unchanged.
    pub distance: f32,
    /// Rolloff, 0.0 (none) to 10.0. 1.0 is real-world. < 0 leaves it unchanged.
    pub rolloff: f32,
    /// Doppler, 0.0 (none) to 10.0. 1.0 is real-world. < 0 leaves it unchanged.
    pub doppler: f32,
}

impl Default for Factors3D {
    fn default() -> Self {
        Self {
            distance: 1.0,
            rolloff: 1.0,
            doppler: 1.0,
        }
    }
}

/// Listener position and orientation. `None` fields are left unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Listener3D {
    pub position: Option<Vector3D>,
    pub velocity: Option<Vector3D>,
    pub front: Option<Vector3D>,
    pub top: Option<Vector3D>,
}

/// How a channel is positioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode3D {
    /// Leave the current mode (setters only).
    LeaveCurrent,
    /// Position is relative to the world.
    Normal,
    /// Position is relative to the listener.
    Relative,
    /// 3D processing off, the channel plays from the centre.
    Off,
}

impl Mode3D {
    fn to_raw(self) -> i32 {
        match self {
            Mode3D::LeaveCurrent => BASS_LEAVE_CURRENT,
            Mode3D::Normal => BASS_3DMODE_NORMAL,
            Mode3D::Relative => BASS_3DMODE_RELATIVE,
            Mode3D::Off => BASS_3DMODE_OFF,
        }
    }

    fn from_raw(value: DWORD) -> Result<Self> {
        match value as i32 {
            BASS_3DMODE_NORMAL => Ok(Mode3D::Normal),
            BASS_3DMODE_RELATIVE => Ok(Mode3D::Relative),
            BASS_3DMODE_OFF => Ok(Mode3D::Off),
            other => Err(BassError::InvalidArgument(format!("unknown 3D mode {}", other))),
        }
    }
}

/// 3D algorithm used for software-mixed 3D channels (BASS_CONFIG_3DALGORITHM).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm3D {
    Default,
    Off,
    Full,
    Light,
}

impl Algorithm3D {
    fn to_raw(self) -> DWORD {
        match self {
            Algorithm3D::Default => BASS_3DALG_DEFAULT,
            Algorithm3D::Off => BASS_3DALG_OFF,
            Algorithm3D::Full => BASS_3DALG_FULL,
            Algorithm3D::Light => BASS_3DALG_LIGHT,
        }
    }

    fn from_raw(value: DWORD) -> Result<Self> {
        match value {
            BASS_3DALG_DEFAULT => Ok(Algorithm3D::Default),
            BASS_3DALG_OFF => Ok(Algorithm3D::Off),
            BASS_3DALG_FULL => Ok(Algorithm3D::Full),
            BASS_3DALG_LIGHT => Ok(Algorithm3D::Light),
            other => Err(BassError::InvalidArgument(format!("unknown 3D algorithm {}", other))),
        }
    }
}

/// Per-channel 3D attributes.
///
/// In setters, negative distances/volume and `None` angles leave the current
/// value. Angles are in degrees (0..=360).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel3DAttributes {
    pub mode: Mode3D,
    pub min_distance: f32,
    pub max_distance: f32,
    pub inside_angle: Option<u32>,
    pub outside_angle: Option<u32>,
    /// Volume outside the outer cone, 0.0..=1.0.
    pub outside_volume: f32,
}

impl Channel3DAttributes {
    /// Attributes that change nothing; override the fields you want to set.
    pub fn unchanged() -> Self {
        Self {
            mode: Mode3D::LeaveCurrent,
            min_distance: -1.0,
            max_distance: -1.0,
            inside_angle: None,
            outside_angle: None,
            outside_volume: -1.0,
        }
    }
}

/// Channel position, orientation and velocity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Channel3DPosition {
    pub position: Vector3D,
    /// Direction the channel faces, only relevant with sound cones.
    pub orientation: Vector3D,
    /// Units per second, used for doppler.
    pub velocity: Vector3D,
}

/// EAX environment types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EaxEnvironment {
    LeaveCurrent,
    Generic,
    PaddedCell,
    Room,
    Bathroom,
    Livingroom,
    Stoneroom,
    Auditorium,
    ConcertHall,
    Cave,
    Arena,
    Hangar,
    CarpetedHallway,
    Hallway,
    StoneCorridor,
    Alley,
    Forest,
    City,
    Mountains,
    Quarry,
    Plain,
    ParkingLot,
    SewerPipe,
    Underwater,
    Drugged,
    Dizzy,
    Psychotic,
}

impl EaxEnvironment {
    /// Every real environment, in engine order.
    pub const ALL: [EaxEnvironment; 26] = [
        EaxEnvironment::Generic,
        EaxEnvironment::PaddedCell,
        EaxEnvironment::Room,
        EaxEnvironment::Bathroom,
        EaxEnvironment::Livingroom,
        EaxEnvironment::Stoneroom,
        EaxEnvironment::Auditorium,
        EaxEnvironment::ConcertHall,
        EaxEnvironment::Cave,
        EaxEnvironment::Arena,
        EaxEnvironment::Hangar,
        EaxEnvironment::CarpetedHallway,
        EaxEnvironment::Hallway,
        EaxEnvironment::StoneCorridor,
        EaxEnvironment::Alley,
        EaxEnvironment::Forest,
        EaxEnvironment::City,
        EaxEnvironment::Mountains,
        EaxEnvironment::Quarry,
        EaxEnvironment::Plain,
        EaxEnvironment::ParkingLot,
        EaxEnvironment::SewerPipe,
        EaxEnvironment::Underwater,
        EaxEnvironment::Drugged,
        EaxEnvironment::Dizzy,
        EaxEnvironment::Psychotic,
    ];

    fn to_raw(self) -> i32 {
        match self {
            EaxEnvironment::LeaveCurrent => BASS_LEAVE_CURRENT,
            env => Self::ALL.iter().position(|e| *e == env).map_or(BASS_LEAVE_CURRENT, |i| i as i32),
        }
    }

    fn from_raw(value: DWORD) -> Result<Self> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| BassError::InvalidArgument(format!("unknown EAX environment {}", value)))
    }

    /// Stock (volume, decay, damp) for this environment.
    pub fn preset(self) -> Option<EaxParameters> {
        let (volume, decay, damp) = match self {
            EaxEnvironment::LeaveCurrent => return None,
            EaxEnvironment::Generic => (0.5, 1.493, 0.5),
            EaxEnvironment::PaddedCell => (0.25, 0.1, 0.0),
            EaxEnvironment::Room => (0.417, 0.4, 0.666),
            EaxEnvironment::Bathroom => (0.653, 1.499, 0.166),
            EaxEnvironment::Livingroom => (0.208, 0.478, 0.0),
            EaxEnvironment::Stoneroom => (0.5, 2.309, 0.888),
            EaxEnvironment::Auditorium => (0.403, 4.279, 0.5),
            EaxEnvironment::ConcertHall => (0.5, 3.961, 0.5),
            EaxEnvironment::Cave => (0.5, 2.886, 1.304),
            EaxEnvironment::Arena => (0.361, 7.284, 0.332),
            EaxEnvironment::Hangar => (0.5, 10.0, 0.3),
            EaxEnvironment::CarpetedHallway => (0.153, 0.259, 2.0),
            EaxEnvironment::Hallway => (0.361, 1.493, 0.0),
            EaxEnvironment::StoneCorridor => (0.444, 2.697, 0.638),
            EaxEnvironment::Alley => (0.25, 1.752, 0.776),
            EaxEnvironment::Forest => (0.111, 3.145, 0.472),
            EaxEnvironment::City => (0.111, 2.767, 0.224),
            EaxEnvironment::Mountains => (0.194, 7.841, 0.472),
            EaxEnvironment::Quarry => (1.0, 1.499, 0.5),
            EaxEnvironment::Plain => (0.097, 2.767, 0.224),
            EaxEnvironment::ParkingLot => (0.208, 1.652, 1.5),
            EaxEnvironment::SewerPipe => (0.652, 2.886, 0.25),
            EaxEnvironment::Underwater => (1.0, 1.499, 0.0),
            EaxEnvironment::Drugged => (0.875, 8.392, 1.388),
            EaxEnvironment::Dizzy => (0.139, 17.234, 0.666),
            EaxEnvironment::Psychotic => (0.486, 7.563, 0.806),
        };
        Some(EaxParameters {
            environment: self,
            volume,
            decay,
            damp,
        })
    }
}

/// EAX reverb settings. Negative values leave the current setting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EaxParameters {
    pub environment: EaxEnvironment,
    /// Reverb volume, 0.0..=1.0.
    pub volume: f32,
    /// Decay time in seconds, 0.1..=20.0.
    pub decay: f32,
    /// Damping, 0.0 (high frequencies decay faster) ..= 2.0 (low ones do).
    pub damp: f32,
}

impl Bass {
    /// Apply pending 3D changes on every initialised device.
    pub fn apply_3d(&self) {
        self.raw().apply_3d();
    }

    pub fn get_3d_factors(&self) -> Result<Factors3D> {
        let mut f = Factors3D::default();
        self.check(self.raw().get_3d_factors(&mut f.distance, &mut f.rolloff, &mut f.doppler))?;
        Ok(f)
    }

    pub fn set_3d_factors(&self, factors: Factors3D) -> Result<()> {
        self.check(
            self.raw()
                .set_3d_factors(factors.distance, factors.rolloff, factors.doppler),
        )
    }

    /// Listener position, velocity and orientation.
    pub fn get_3d_position(&self) -> Result<Listener3D> {
        let mut v = [Vector3D::ZERO; 4];
        let [position, velocity, front, top] = &mut v;
        self.check(self.raw().get_3d_position(
            Some(position),
            Some(velocity),
            Some(front),
            Some(top),
        ))?;
        Ok(Listener3D {
            position: Some(v[0]),
            velocity: Some(v[1]),
            front: Some(v[2]),
            top: Some(v[3]),
        })
    }

    pub fn set_3d_position(&self, listener: &Listener3D) -> Result<()> {
        self.check(self.raw().set_3d_position(
            listener.position.as_ref(),
            listener.velocity.as_ref(),
            listener.front.as_ref(),
            listener.top.as_ref(),
        ))
    }

    /// Current 3D algorithm.
    pub fn algorithm_3d(&self) -> Result<Algorithm3D> {
        Algorithm3D::from_raw(self.get_config(BASS_CONFIG_3DALGORITHM)?)
    }

    /// Affects channels created after the call.
    pub fn set_algorithm_3d(&self, algorithm: Algorithm3D) -> Result<()> {
        self.set_config(BASS_CONFIG_3DALGORITHM, algorithm.to_raw())
    }

    pub fn channel_get_3d_attributes(&self, handle: DWORD) -> Result<Channel3DAttributes> {
        let (mut mode, mut min, mut max) = (0, 0.0, 0.0);
        let (mut iangle, mut oangle, mut outvol) = (0, 0, 0.0);
        self.check(self.raw().channel_get_3d_attributes(
            handle,
            &mut mode,
            &mut min,
            &mut max,
            &mut iangle,
            &mut oangle,
            &mut outvol,
        ))?;
        Ok(Channel3DAttributes {
            mode: Mode3D::from_raw(mode)?,
            min_distance: min,
            max_distance: max,
            inside_angle: Some(iangle),
            outside_angle: Some(oangle),
            outside_volume: outvol,
        })
    }

    pub fn channel_set_3d_attributes(&self, handle: DWORD, attributes: &Channel3DAttributes) -> Result<()> {
        let angle = |a: Option<u32>| -> Result<i32> {
            match a {
                None => Ok(BASS_LEAVE_CURRENT),
                Some(deg) if deg <= 360 => Ok(deg as i32),
                Some(deg) => Err(BassError::InvalidArgument(format!("cone angle {} > 360", deg))),
            }
        };
        let inside = angle(attributes.inside_angle)?;
        let outside = angle(attributes.outside_angle)?;
        self.check(self.raw().channel_set_3d_attributes(
            handle,
            attributes.mode.to_raw(),
            attributes.min_distance,
            attributes.max_distance,
            inside,
            outside,
            attributes.outside_volume,
        ))
    }

    pub fn channel_get_3d_position(&self, handle: DWORD) -> Result<Channel3DPosition> {
        let mut p = Channel3DPosition::default();
        self.check(self.raw().channel_get_3d_position(
            handle,
            Some(&mut p.position),
            Some(&mut p.orientation),
            Some(&mut p.velocity),
        ))?;
        Ok(p)
    }

    /// `None` leaves that vector unchanged.
    pub fn channel_set_3d_position(
        &self,
        handle: DWORD,
        position: Option<&Vector3D>,
        orientation: Option<&Vector3D>,
        velocity: Option<&Vector3D>,
    ) -> Result<()> {
        self.check(
            self.raw()
                .channel_set_3d_position(handle, position, orientation, velocity),
        )
    }

    pub fn get_eax_parameters(&self) -> Result<EaxParameters> {
        if !self.raw().supports_eax() {
            return Err(BassError::NoEAX);
        }
        let (mut env, mut volume, mut decay, mut damp) = (0, 0.0, 0.0, 0.0);
        self.check(
            self.raw()
                .get_eax_parameters(&mut env, &mut volume, &mut decay, &mut damp),
        )?;
        Ok(EaxParameters {
            environment: EaxEnvironment::from_raw(env)?,
            volume,
            decay,
            damp,
        })
    }

    pub fn set_eax_parameters(&self, params: &EaxParameters) -> Result<()> {
        if !self.raw().supports_eax() {
            return Err(BassError::NoEAX);
        }
        self.check(self.raw().set_eax_parameters(
            params.environment.to_raw(),
            params.volume,
            params.decay,
            params.damp,
        ))
    }

    /// Switch to an environment with its stock parameters.
    pub fn set_eax_preset(&self, environment: EaxEnvironment) -> Result<()> {
        let params = environment.preset().ok_or_else(|| {
            BassError::InvalidArgument("LeaveCurrent has no preset".into())
        })?;
        self.set_eax_parameters(&params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bass::tests::mock_bass;

    #[test]
    fn test_factors_roundtrip() {
        let (_engine, bass) = mock_bass();
        let factors = Factors3D {
            distance: 0.9144,
            rolloff: 2.0,
            doppler: 0.5,
        };
        bass.set_3d_factors(factors).unwrap();
        assert_eq!(bass.get_3d_factors().unwrap(), factors);
    }

    #[test]
    fn test_factors_rejected_by_engine() {
        let (_engine, bass) = mock_bass();
        let result = bass.set_3d_factors(Factors3D {
            rolloff: 50.0,
            ..Default::default()
        });
        assert!(matches!(result, Err(BassError::IllegalParameter)));
    }

    #[test]
    fn test_listener_partial_update() {
        let (_engine, bass) = mock_bass();
        bass.set_3d_position(&Listener3D {
            position: Some(Vector3D::new(1.0, 2.0, 3.0)),
            front: Some(Vector3D::new(0.0, 0.0, 1.0)),
            top: Some(Vector3D::new(0.0, 1.0, 0.0)),
            ..Default::default()
        })
        .unwrap();
        bass.set_3d_position(&Listener3D {
            velocity: Some(Vector3D::new(5.0, 0.0, 0.0)),
            ..Default::default()
        })
        .unwrap();
        bass.apply_3d();

        let listener = bass.get_3d_position().unwrap();
        assert_eq!(listener.position, Some(Vector3D::new(1.0, 2.0, 3.0)));
        assert_eq!(listener.velocity, Some(Vector3D::new(5.0, 0.0, 0.0)));
        assert_eq!(listener.top, Some(Vector3D::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_channel_attributes() {
        let (engine, bass) = mock_bass();
        let handle = {
            let mut state = engine.state.lock();
            state.streams.insert(77);
            77
        };

        // Channel not created with 3D
        assert!(matches!(bass.channel_get_3d_attributes(handle), Err(BassError::No3D)));

        bass.channel_set_3d_attributes(
            handle,
            &Channel3DAttributes {
                mode: Mode3D::Relative,
                min_distance: 2.0,
                max_distance: 50.0,
                inside_angle: Some(90),
                outside_angle: Some(180),
                outside_volume: 0.25,
            },
        )
        .unwrap();

        // Only the outer volume changes
        bass.channel_set_3d_attributes(
            handle,
            &Channel3DAttributes {
                outside_volume: 0.5,
                ..Channel3DAttributes::unchanged()
            },
        )
        .unwrap();

        let attrs = bass.channel_get_3d_attributes(handle).unwrap();
        assert_eq!(attrs.mode, Mode3D::Relative);
        assert_eq!(attrs.min_distance, 2.0);
        assert_eq!(attrs.max_distance, 50.0);
        assert_eq!(attrs.inside_angle, Some(90));
        assert_eq!(attrs.outside_angle, Some(180));
        assert_eq!(attrs.outside_volume, 0.5);
    }

    #[test]
    fn test_cone_angle_validated() {
        let (_engine, bass) = mock_bass();
        let result = bass.channel_set_3d_attributes(
            1,
            &Channel3DAttributes {
                inside_angle: Some(400),
                ..Channel3DAttributes::unchanged()
            },
        );
        assert!(matches!(result, Err(BassError::InvalidArgument(_))));
    }

    #[test]
    fn test_channel_position_on_unknown_handle() {
        let (_engine, bass) = mock_bass();
        assert!(matches!(
            bass.channel_get_3d_position(4242),
            Err(BassError::InvalidHandle)
        ));
    }

    #[test]
    fn test_channel_position_roundtrip() {
        let (engine, bass) = mock_bass();
        engine.state.lock().streams.insert(12);
        let pos = Vector3D::new(3.0, 0.0, -4.0);
        bass.channel_set_3d_position(12, Some(&pos), None, None).unwrap();
        let read = bass.channel_get_3d_position(12).unwrap();
        assert_eq!(read.position, pos);
        assert_eq!(read.velocity, Vector3D::ZERO);
    }

    #[test]
    fn test_algorithm_config() {
        let (_engine, bass) = mock_bass();
        bass.set_algorithm_3d(Algorithm3D::Light).unwrap();
        assert_eq!(bass.algorithm_3d().unwrap(), Algorithm3D::Light);
    }

    #[test]
    fn test_eax_preset_table() {
        assert_eq!(EaxEnvironment::ALL.len() as i32, EAX_ENVIRONMENT_COUNT);
        assert!(EaxEnvironment::LeaveCurrent.preset().is_none());
        for env in EaxEnvironment::ALL {
            let preset = env.preset().unwrap();
            assert_eq!(preset.environment, env);
            assert!((0.0..=1.0).contains(&preset.volume));
            assert!((0.1..=20.0).contains(&preset.decay));
            assert!((0.0..=2.0).contains(&preset.damp));
        }
        let hangar = EaxEnvironment::Hangar.preset().unwrap();
        assert_eq!((hangar.volume, hangar.decay, hangar.damp), (0.5, 10.0, 0.3));
    }

    #[test]
    fn test_eax_preset_applied() {
        let (_engine, bass) = mock_bass();
        bass.set_eax_preset(EaxEnvironment::Cave).unwrap();
        let params = bass.get_eax_parameters().unwrap();
        assert_eq!(params, EaxEnvironment::Cave.preset().unwrap());
    }

    #[test]
    fn test_eax_leave_current_environment() {
        let (_engine, bass) = mock_bass();
        bass.set_eax_preset(EaxEnvironment::Arena).unwrap();
        bass.set_eax_parameters(&EaxParameters {
            environment: EaxEnvironment::LeaveCurrent,
            volume: 0.1,
            decay: -1.0,
            damp: -1.0,
        })
        .unwrap();
        let params = bass.get_eax_parameters().unwrap();
        assert_eq!(params.environment, EaxEnvironment::Arena);
        assert_eq!(params.volume, 0.1);
        assert_eq!(params.decay, 7.284);
    }

    #[test]
    fn test_eax_unavailable() {
        let (engine, bass) = mock_bass();
        engine.state.lock().eax_supported = false;
        assert!(matches!(bass.get_eax_parameters(), Err(BassError::NoEAX)));
        assert!(matches!(
            bass.set_eax_preset(EaxEnvironment::Room),
            Err(BassError::NoEAX)
        ));
    }
}
