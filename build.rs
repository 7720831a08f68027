//! Build script for bass-bridge.
//! Records the default directory to look for the BASS libraries in.

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let base_path = std::path::Path::new(&manifest_dir).parent().unwrap();

    // Same SDK layout the BASS plugin crates link against
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let bass_path = match target_os.as_str() {
        "windows" => base_path.join("bass24/c/x64"),
        "macos" => base_path.join("bass24-osx"),
        _ => base_path.join("bass24-linux/libs/x86_64"),
    };

    println!("cargo:rustc-env=BASS_BRIDGE_DEFAULT_LIB_DIR={}", bass_path.display());
    println!("cargo:rerun-if-changed=build.rs");
}
