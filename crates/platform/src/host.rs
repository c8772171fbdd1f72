use serde::{Deserialize, Serialize};

use crate::known::COMPILER_GC;

/// The `GOOS`/`GOARCH`/compiler of the machine running the tool, used to fill
/// empty fields of a build context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPlatform {
    pub goos: String,
    pub goarch: String,
    pub compiler: String,
}

impl HostPlatform {
    #[must_use]
    pub fn new(goos: impl Into<String>, goarch: impl Into<String>) -> Self {
        Self {
            goos: goos.into(),
            goarch: goarch.into(),
            compiler: COMPILER_GC.to_string(),
        }
    }

    /// Detect the host from the Rust target this binary was built for.
    #[must_use]
    pub fn detect() -> Self {
        Self::new(
            goos_from_rust(std::env::consts::OS),
            goarch_from_rust(std::env::consts::ARCH),
        )
    }
}

impl Default for HostPlatform {
    fn default() -> Self {
        Self::detect()
    }
}

/// Maps a Rust `target_os` onto the Go name.
#[must_use]
pub fn goos_from_rust(os: &str) -> String {
    match os {
        "macos" => "darwin",
        other => other,
    }
    .to_string()
}

/// Maps a Rust `target_arch` onto the Go name.
#[must_use]
pub fn goarch_from_rust(arch: &str) -> String {
    match arch {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc" => "ppc",
        "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        "wasm32" => "wasm",
        "sparc64" => "sparc64",
        "mips64" if cfg!(target_endian = "little") => "mips64le",
        "mips" if cfg!(target_endian = "little") => "mipsle",
        other => other,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::known::{is_known_arch, is_known_os};

    #[test]
    fn maps_rust_names() {
        assert_eq!(goos_from_rust("macos"), "darwin");
        assert_eq!(goos_from_rust("linux"), "linux");
        assert_eq!(goarch_from_rust("x86_64"), "amd64");
        assert_eq!(goarch_from_rust("aarch64"), "arm64");
        assert_eq!(goarch_from_rust("x86"), "386");
        assert_eq!(goarch_from_rust("riscv64"), "riscv64");
    }

    #[test]
    fn detected_host_is_known() {
        let host = HostPlatform::detect();
        assert!(is_known_os(&host.goos), "{host:?}");
        assert!(is_known_arch(&host.goarch), "{host:?}");
        assert_eq!(host.compiler, "gc");
    }
}
