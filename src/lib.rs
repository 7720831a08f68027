//! BASS bridge
//!
//! Safe access to the BASS audio library and its AC3 add-on, loaded at runtime.
//! - Handle registry: keeps download procedures, file procedure sets and other
//!   callback state alive for as long as the engine may call them
//! - Pinned buffers: lend caller memory to one synchronous creation call
//! - Checked API: every FALSE / zero-handle result becomes a `BassError`
//!
//! Threading notes:
//! - The engine calls back on its own threads; callbacks must be `Send + Sync`
//! - Registry updates happen before a creation call returns to the caller

pub mod ac3;
pub mod bass;
pub mod callback;
pub mod config;
pub mod engine;
pub mod error;
pub mod ffi;
pub mod fx;
pub mod library;
pub mod pin;
pub mod registry;
pub mod spatial;

pub use ac3::{Ac3, StreamSystem};
pub use bass::Bass;
pub use callback::{CallbackBinding, CallbackObject, DownloadProcedure, FileProcedures, UserContext};
pub use config::{BridgeConfig, Retention};
pub use engine::{RawAc3, RawBass};
pub use error::{BassError, Result};
pub use fx::{DxEchoParameters, DxReverbParameters, EffectParameters, EffectType, VolumeParameters};
pub use library::{Ac3Library, BassLibrary};
pub use pin::{with_pinned_buffer, PinnedBuffer};
pub use registry::{ChannelReferences, CREATION_SLOT};
pub use spatial::{
    Algorithm3D, Channel3DAttributes, Channel3DPosition, EaxEnvironment, EaxParameters, Factors3D, Listener3D,
    Mode3D, Vector3D,
};

pub use ffi::{DWORD, HFX, HSTREAM, QWORD};
