//! File names and URLs in the encoding BASS expects.
//!
//! Windows gets UTF-16 with `BASS_UNICODE` set, everything else a
//! nul-terminated UTF-8 (or raw OS bytes for paths) string.

use std::ffi::c_void;
use std::path::Path;

use super::bass::{DWORD, BASS_UNICODE};
use crate::error::{BassError, Result};

/// Nul-terminated string owned for the duration of one native call.
pub struct NativeText {
    #[cfg(windows)]
    wide: Vec<u16>,
    #[cfg(not(windows))]
    narrow: std::ffi::CString,
}

impl NativeText {
    /// Encode a file system path.
    pub fn path(path: &Path) -> Result<Self> {
        #[cfg(windows)]
        {
            use std::os::windows::ffi::OsStrExt;
            Self::from_wide(path.as_os_str().encode_wide().collect())
        }
        #[cfg(unix)]
        {
            use std::os::unix::ffi::OsStrExt;
            Self::from_bytes(path.as_os_str().as_bytes().to_vec())
        }
        #[cfg(not(any(windows, unix)))]
        {
            let s = path.to_str().ok_or_else(|| {
                BassError::InvalidArgument(format!("path is not valid UTF-8: {}", path.display()))
            })?;
            Self::from_bytes(s.as_bytes().to_vec())
        }
    }

    /// Encode a URL or other text argument.
    pub fn text(s: &str) -> Result<Self> {
        #[cfg(windows)]
        {
            Self::from_wide(s.encode_utf16().collect())
        }
        #[cfg(not(windows))]
        {
            Self::from_bytes(s.as_bytes().to_vec())
        }
    }

    #[cfg(windows)]
    fn from_wide(mut wide: Vec<u16>) -> Result<Self> {
        if wide.contains(&0) {
            return Err(BassError::InvalidArgument("string contains an interior nul".into()));
        }
        wide.push(0);
        Ok(Self { wide })
    }

    #[cfg(not(windows))]
    fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let narrow = std::ffi::CString::new(bytes)
            .map_err(|_| BassError::InvalidArgument("string contains an interior nul".into()))?;
        Ok(Self { narrow })
    }

    /// Pointer to the first character, valid while `self` lives.
    pub fn as_ptr(&self) -> *const c_void {
        #[cfg(windows)]
        {
            self.wide.as_ptr() as *const c_void
        }
        #[cfg(not(windows))]
        {
            self.narrow.as_ptr() as *const c_void
        }
    }

    /// Flags to OR into the creation call so BASS reads the right encoding.
    pub fn flags(&self) -> DWORD {
        if cfg!(windows) {
            BASS_UNICODE
        } else {
            0
        }
    }

    /// Decode back to a Rust string (lossy), mostly for logging.
    pub fn to_string_lossy(&self) -> String {
        #[cfg(windows)]
        {
            String::from_utf16_lossy(&self.wide[..self.wide.len() - 1])
        }
        #[cfg(not(windows))]
        {
            self.narrow.to_string_lossy().into_owned()
        }
    }
}
