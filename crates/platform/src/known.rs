use once_cell::sync::Lazy;
use regex::Regex;

/// Known `GOOS` values, sorted.
pub const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

/// Known `GOARCH` values, sorted.
pub const KNOWN_ARCH: &[&str] = &[
    "386",
    "amd64",
    "amd64p32",
    "arm",
    "arm64",
    "arm64be",
    "armbe",
    "loong64",
    "mips",
    "mips64",
    "mips64le",
    "mips64p32",
    "mips64p32le",
    "mipsle",
    "ppc",
    "ppc64",
    "ppc64le",
    "riscv",
    "riscv64",
    "s390",
    "s390x",
    "sparc",
    "sparc64",
    "wasm",
];

/// Operating systems satisfied by the `unix` build tag.
pub const UNIX_OS: &[&str] = &[
    "aix",
    "android",
    "darwin",
    "dragonfly",
    "freebsd",
    "hurd",
    "illumos",
    "ios",
    "linux",
    "netbsd",
    "openbsd",
    "solaris",
];

/// The release that introduced the `unix` build tag.
pub const UNIX_TAG_RELEASE: &str = "go1.19";

/// Pseudo tag satisfied when cgo is enabled.
pub const CGO_TAG: &str = "cgo";

/// Pseudo tag satisfied by any [`UNIX_OS`].
pub const UNIX_TAG: &str = "unix";

/// The two mutually exclusive Go compilers.
pub const COMPILER_GC: &str = "gc";
pub const COMPILER_GCCGO: &str = "gccgo";

/// Prefix of the tags `GOEXPERIMENT` sets.
pub const EXPERIMENT_PREFIX: &str = "goexperiment.";

/// Newest minor release known to this table (`go1.21`).
pub const LATEST_MINOR_RELEASE: u32 = 21;

// NB: needs updating for go2
static RELEASE_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^go1\.\d+$").expect("release tag pattern is valid")
});

/// An OS that also satisfies the tag of another OS (`android` builds `linux` files).
pub const OS_IMPLICATIONS: &[(&str, &str)] =
    &[("android", "linux"), ("illumos", "solaris"), ("ios", "darwin")];

#[must_use]
pub fn is_known_os(name: &str) -> bool {
    KNOWN_OS.binary_search(&name).is_ok()
}

#[must_use]
pub fn is_known_arch(name: &str) -> bool {
    KNOWN_ARCH.binary_search(&name).is_ok()
}

#[must_use]
pub fn is_unix_os(name: &str) -> bool {
    UNIX_OS.contains(&name)
}

#[must_use]
pub fn is_compiler(name: &str) -> bool {
    name == COMPILER_GC || name == COMPILER_GCCGO
}

/// Reports whether `name` names a Go release (`go1.N`).
#[must_use]
pub fn is_release_tag(name: &str) -> bool {
    name.starts_with("go1.") && RELEASE_TAG_RE.is_match(name)
}

/// Reports whether `name` is a `GOEXPERIMENT` tag.
#[must_use]
pub fn is_experiment_tag(name: &str) -> bool {
    name.starts_with(EXPERIMENT_PREFIX)
}

/// The OS whose tag is also satisfied by `goos`, if any.
#[must_use]
pub fn implied_os(goos: &str) -> Option<&'static str> {
    OS_IMPLICATIONS
        .iter()
        .find(|(os, _)| *os == goos)
        .map(|(_, implied)| *implied)
}

/// Every OS accepted where `goos` is required: `goos` itself plus the OSes
/// implying it. `linux` yields `["linux", "android"]`.
#[must_use]
pub fn accepted_oses(goos: &str) -> Vec<String> {
    let mut accepted = vec![goos.to_string()];
    accepted.extend(
        OS_IMPLICATIONS
            .iter()
            .filter(|(_, implied)| *implied == goos)
            .map(|(os, _)| (*os).to_string()),
    );
    accepted
}

/// Release tags `go1.1` through `go1.{latest_minor}`.
#[must_use]
pub fn release_tags_through(latest_minor: u32) -> Vec<String> {
    (1..=latest_minor).map(|minor| format!("go1.{minor}")).collect()
}

/// Release tags of the newest release known to this table.
#[must_use]
pub fn default_release_tags() -> Vec<String> {
    release_tags_through(LATEST_MINOR_RELEASE)
}

/// Parses `go1.N` into `N`.
#[must_use]
pub fn release_minor(tag: &str) -> Option<u32> {
    if !is_release_tag(tag) {
        return None;
    }
    tag["go1.".len()..].parse().ok()
}
