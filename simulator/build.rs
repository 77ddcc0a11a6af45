//! Windows only: link against a vendored SDL2 and place `SDL2.dll` next to
//! the simulator binary. Other platforms use the system SDL2.

use std::path::{Path, PathBuf};
use std::{env, fs};

fn main() {
    if env::var("CARGO_CFG_TARGET_OS").unwrap_or_default() != "windows" {
        return;
    }
    let Some(manifest_dir) = env::var_os("CARGO_MANIFEST_DIR").map(PathBuf::from) else {
        return;
    };
    let Some(workspace) = manifest_dir.parent() else {
        return;
    };
    let vendor_sdl2 = workspace.join("vendor").join("sdl2");
    println!("cargo:rerun-if-changed={}", vendor_sdl2.display());

    if !vendor_sdl2.exists() {
        println!("cargo:warning=SDL2 not found at {}; put SDL2.lib and SDL2.dll there", vendor_sdl2.display());
        return;
    }
    println!("cargo:rustc-link-search=native={}", vendor_sdl2.display());

    // OUT_DIR is target/<profile>/build/<pkg>-<hash>/out
    if let Some(profile_dir) = env::var_os("OUT_DIR").as_deref().map(Path::new).and_then(profile_dir) {
        copy_dll(&vendor_sdl2.join("SDL2.dll"), &profile_dir.join("SDL2.dll"));
    }
}

fn profile_dir(out_dir: &Path) -> Option<PathBuf> {
    out_dir
        .ancestors()
        .find(|p| p.file_name().is_some_and(|n| n == "release" || n == "debug"))
        .map(Path::to_path_buf)
}

fn copy_dll(src: &Path, dst: &Path) {
    if !src.exists() || dst.exists() {
        return;
    }
    if let Err(err) = fs::copy(src, dst) {
        println!("cargo:warning=failed to copy SDL2.dll: {err}");
    }
}
