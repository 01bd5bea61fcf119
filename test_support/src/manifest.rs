//! Helpers for constructing manifest fixtures in tests.

use std::fs;
use std::path::{Path, PathBuf};

/// Default toolchain declared by [`manifest_yaml`].
pub const HOST_TOOLCHAIN: &str = "//tc:host";

/// Prefix `body` with the manifest header, including the default toolchain.
pub fn manifest_yaml(body: &str) -> String {
    format!("musubi_version: \"1.0.0\"\ndefault_toolchain: \"{HOST_TOOLCHAIN}\"\n{body}")
}

/// YAML for a `//tc/` build file declaring the host toolchain with every
/// tool, indented to sit under `build_files:`.
pub fn host_toolchain_build_file() -> &'static str {
    concat!(
        "  \"//tc/\":\n",
        "    items:\n",
        "      - kind: toolchain\n",
        "        name: host\n",
        "        tools:\n",
        "          link: { command: ld }\n",
        "          solink: { command: ld -shared }\n",
        "          alink: { command: ar }\n",
        "          copy: { command: cp }\n",
        "          stamp: { command: touch }\n",
    )
}

/// Write a `Musubifile` with [`manifest_yaml`]`(body)` into `dir`.
///
/// # Panics
///
/// Panics if the file cannot be written.
pub fn write_manifest(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("Musubifile");
    fs::write(&path, manifest_yaml(body)).expect("write Musubifile");
    path
}

/// A complete manifest body: `//:app` and the testonly `//:unit` link
/// `//lib`, which exports the `//lib:warnings` config. With the host
/// toolchain that makes five items.
pub fn app_manifest_body() -> String {
    format!(
        concat!(
            "build_config: //build/BUILDCONFIG.gn\n",
            "build_files:\n",
            "{}",
            "  \"//\":\n",
            "    items:\n",
            "      - kind: target\n",
            "        name: app\n",
            "        type: executable\n",
            "        sources: main.cc\n",
            "        deps: //lib\n",
            "      - kind: target\n",
            "        name: unit\n",
            "        type: executable\n",
            "        testonly: true\n",
            "        sources: unit.cc\n",
            "        deps: //lib\n",
            "  \"//lib/\":\n",
            "    items:\n",
            "      - kind: config\n",
            "        name: warnings\n",
            "        defines: WARN\n",
            "      - kind: target\n",
            "        name: lib\n",
            "        type: static_library\n",
            "        sources: lib.cc\n",
            "        public_configs: :warnings\n",
        ),
        host_toolchain_build_file()
    )
}
