//! Error types for the BASS bridge.

use std::path::PathBuf;

use thiserror::Error;

use crate::ffi::*;

/// Errors surfaced by the bridge.
///
/// The first group mirrors the engine's own error codes and is passed through
/// unchanged from `BASS_ErrorGetCode`. The rest originate in this crate.
#[derive(Error, Debug)]
pub enum BassError {
    #[error("BASS_Init has not been successfully called")]
    NotInitialised,

    #[error("invalid handle")]
    InvalidHandle,

    #[error("an illegal parameter was specified")]
    IllegalParameter,

    #[error("an illegal type was specified")]
    IllegalType,

    #[error("the channel does not have 3D functionality")]
    No3D,

    #[error("the output device does not support EAX")]
    NoEAX,

    #[error("effects are not available")]
    EffectsNotAvailable,

    #[error("unsupported sample format")]
    UnsupportedSampleFormat,

    #[error("unknown engine error")]
    Unknown,

    #[error("engine error code {0}")]
    Engine(i32),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("library not found at {0}")]
    MissingLibrary(PathBuf),

    #[error("failed to load library: {0}")]
    LibraryLoad(#[from] libloading::Error),

    #[error("symbol `{symbol}` missing from {library}")]
    MissingSymbol {
        library: String,
        symbol: &'static str,
    },
}

impl BassError {
    /// Map a `BASS_ErrorGetCode` value to an error.
    ///
    /// Called only after the engine reported failure, so `BASS_OK` here means
    /// the engine failed without saying why.
    pub fn from_code(code: i32) -> Self {
        match code {
            BASS_OK | BASS_ERROR_UNKNOWN => BassError::Unknown,
            BASS_ERROR_INIT => BassError::NotInitialised,
            BASS_ERROR_HANDLE => BassError::InvalidHandle,
            BASS_ERROR_ILLPARAM => BassError::IllegalParameter,
            BASS_ERROR_ILLTYPE => BassError::IllegalType,
            BASS_ERROR_NO3D => BassError::No3D,
            BASS_ERROR_NOEAX => BassError::NoEAX,
            BASS_ERROR_NOFX => BassError::EffectsNotAvailable,
            BASS_ERROR_FORMAT => BassError::UnsupportedSampleFormat,
            other => BassError::Engine(other),
        }
    }

    /// The engine error code behind this error, if it came from the engine.
    pub fn code(&self) -> Option<i32> {
        match self {
            BassError::NotInitialised => Some(BASS_ERROR_INIT),
            BassError::InvalidHandle => Some(BASS_ERROR_HANDLE),
            BassError::IllegalParameter => Some(BASS_ERROR_ILLPARAM),
            BassError::IllegalType => Some(BASS_ERROR_ILLTYPE),
            BassError::No3D => Some(BASS_ERROR_NO3D),
            BassError::NoEAX => Some(BASS_ERROR_NOEAX),
            BassError::EffectsNotAvailable => Some(BASS_ERROR_NOFX),
            BassError::UnsupportedSampleFormat => Some(BASS_ERROR_FORMAT),
            BassError::Unknown => Some(BASS_ERROR_UNKNOWN),
            BassError::Engine(code) => Some(*code),
            _ => None,
        }
    }

    pub(crate) fn missing_symbol(library: &str, symbol: &'static str) -> Self {
        BassError::MissingSymbol {
            library: library.to_string(),
            symbol,
        }
    }
}

pub type Result<T> = std::result::Result<T, BassError>;
