// Author: Lukas Bower
//! Build script that stamps the firmware banner with the build time.

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    let stamp = chrono::Utc::now().format("%Y-%m-%d %H:%M UTC").to_string();
    println!("cargo:rustc-env=SIDERITE_BUILD_STAMP={stamp}");
}
