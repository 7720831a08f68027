//! FFI module for BASS audio library bindings.
//! Contains type definitions and function signatures for BASS core and the AC3 add-on.

pub mod bass;
pub mod ac3;
pub mod text;

pub use bass::*;
pub use ac3::*;
pub use text::NativeText;
