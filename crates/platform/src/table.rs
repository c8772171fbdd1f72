use serde::{Deserialize, Serialize};

/// A `GOOS/GOARCH` pair supported by the Go toolchain, as reported by
/// `go tool dist list -json`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GoPlatform {
    #[serde(rename = "GOOS")]
    pub goos: String,

    #[serde(rename = "GOARCH")]
    pub goarch: String,

    #[serde(rename = "CgoSupported")]
    pub cgo_supported: bool,

    #[serde(rename = "FirstClass", default)]
    pub first_class: bool,
}

impl GoPlatform {
    #[must_use]
    pub fn new(
        goos: impl Into<String>,
        goarch: impl Into<String>,
        cgo_supported: bool,
        first_class: bool,
    ) -> Self {
        Self {
            goos: goos.into(),
            goarch: goarch.into(),
            cgo_supported,
            first_class,
        }
    }

    /// `GOOS/GOARCH`
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}/{}", self.goos, self.goarch)
    }
}

// go1.21 `go tool dist list -json`, first class platforms first.
const DEFAULT_PLATFORMS: &[(&str, &str, bool, bool)] = &[
    // first class platforms
    ("darwin", "amd64", true, true),
    ("darwin", "arm64", true, true),
    ("linux", "amd64", true, true),
    ("linux", "arm64", true, true),
    ("windows", "amd64", true, true),
    ("linux", "386", true, true),
    ("linux", "arm", true, true),
    ("windows", "386", true, true),
    // second class platforms
    ("aix", "ppc64", true, false),
    ("android", "386", true, false),
    ("android", "amd64", true, false),
    ("android", "arm", true, false),
    ("android", "arm64", true, false),
    ("dragonfly", "amd64", true, false),
    ("freebsd", "386", true, false),
    ("freebsd", "amd64", true, false),
    ("freebsd", "arm", true, false),
    ("freebsd", "arm64", true, false),
    ("freebsd", "riscv64", true, false),
    ("illumos", "amd64", true, false),
    ("ios", "amd64", true, false),
    ("ios", "arm64", true, false),
    ("js", "wasm", false, false),
    ("linux", "loong64", true, false),
    ("linux", "mips", true, false),
    ("linux", "mips64", true, false),
    ("linux", "mips64le", true, false),
    ("linux", "mipsle", true, false),
    ("linux", "ppc64", false, false),
    ("linux", "ppc64le", true, false),
    ("linux", "riscv64", true, false),
    ("linux", "s390x", true, false),
    ("netbsd", "386", true, false),
    ("netbsd", "amd64", true, false),
    ("netbsd", "arm", true, false),
    ("netbsd", "arm64", true, false),
    ("openbsd", "386", true, false),
    ("openbsd", "amd64", true, false),
    ("openbsd", "arm", true, false),
    ("openbsd", "arm64", true, false),
    ("openbsd", "ppc64", false, false),
    ("plan9", "386", false, false),
    ("plan9", "amd64", false, false),
    ("plan9", "arm", false, false),
    ("solaris", "amd64", true, false),
    ("wasip1", "wasm", false, false),
    ("windows", "arm", false, false),
    ("windows", "arm64", true, false),
];

/// The built-in platform table, ordered by preference.
#[must_use]
pub fn default_platforms() -> Vec<GoPlatform> {
    DEFAULT_PLATFORMS
        .iter()
        .map(|&(goos, goarch, cgo, first_class)| GoPlatform::new(goos, goarch, cgo, first_class))
        .collect()
}

/// Stable sort putting first class platforms first, and within them
/// 64-bit platforms ahead of `386`/`arm`.
pub fn sort_by_preference(platforms: &mut [GoPlatform]) {
    platforms.sort_by_key(|p| {
        let legacy_arch = p.goarch == "386" || p.goarch == "arm";
        match (p.first_class, legacy_arch) {
            (true, false) => 0u8,
            (true, true) => 1,
            (false, _) => 2,
        }
    });
}
