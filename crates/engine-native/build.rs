use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-env-changed=ENGINEKEEP_NATIVE_DIR");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR"));

    // Allows building against a patched copy of the native sources.
    let native_dir = env::var("ENGINEKEEP_NATIVE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| manifest_dir.join("native"));

    println!(
        "cargo:rerun-if-changed={}",
        native_dir.join("enginekeep.c").display()
    );
    println!(
        "cargo:rerun-if-changed={}",
        native_dir.join("enginekeep.h").display()
    );

    cc::Build::new()
        .file(native_dir.join("enginekeep.c"))
        .include(&native_dir)
        .flag_if_supported("-std=c11")
        .warnings(true)
        .compile("enginekeep");

    // The engine counters use C11 atomics; libatomic backs them on some 32-bit targets.
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let pointer_width = env::var("CARGO_CFG_TARGET_POINTER_WIDTH").unwrap_or_default();
    if target_os == "linux" && pointer_width == "32" {
        println!("cargo:rustc-link-lib=atomic");
    }
}
