//! Stage-two build script.
//!
//! Applies the bare-metal linker script when building for the boot
//! target; hosted builds (tests) are left untouched.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=linker/stage2.ld");

    let target = env::var("TARGET").unwrap_or_default();
    if target == "x86_64-unknown-none" {
        let script = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap())
            .join("linker")
            .join("stage2.ld");
        println!("cargo:rustc-link-arg=-T{}", script.display());
        println!("cargo:rustc-link-arg=--gc-sections");
    } else {
        // Hosted builds compile the `no_std` binary only so `cargo build`
        // and `cargo test` link; rustc passes `-nodefaultlibs` for a
        // `no_std` crate, so pull libc back in for the C startup object.
        println!("cargo:rustc-link-arg-bins=-lc");
    }
}
