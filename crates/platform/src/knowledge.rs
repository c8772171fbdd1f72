use once_cell::sync::Lazy;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{PlatformError, Result};
use crate::host::HostPlatform;
use crate::table::{default_platforms, GoPlatform};

const PREFERRED_OS: &[&str] = &["darwin", "linux", "windows", "openbsd", "freebsd", "netbsd"];
const PREFERRED_ARCH: &[&str] = &["amd64", "arm64", "arm", "386", "ppc64"];

static BUILTIN: Lazy<KnowledgeBase> =
    Lazy::new(|| KnowledgeBase::from_platforms(default_platforms(), &HostPlatform::detect()));

/// Read-only tables describing which platforms exist and which ones to try
/// first. Built once and shared by every matcher.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    platforms: Vec<GoPlatform>,
    os_arches: BTreeMap<String, Vec<String>>,
    arch_oses: BTreeMap<String, Vec<String>>,
    cgo_pairs: BTreeSet<(String, String)>,
    preferred_os: Vec<String>,
    preferred_arch: Vec<String>,
}

impl KnowledgeBase {
    /// The process-wide knowledge base for the built-in platform table.
    #[must_use]
    pub fn builtin() -> &'static KnowledgeBase {
        &BUILTIN
    }

    /// Build a knowledge base from a platform table given in preference order.
    #[must_use]
    pub fn from_platforms(platforms: Vec<GoPlatform>, host: &HostPlatform) -> Self {
        let mut os_arches: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut arch_oses: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut cgo_pairs = BTreeSet::new();

        for p in &platforms {
            let arches = os_arches.entry(p.goos.clone()).or_default();
            if !arches.contains(&p.goarch) {
                arches.push(p.goarch.clone());
            }
            let oses = arch_oses.entry(p.goarch.clone()).or_default();
            if !oses.contains(&p.goos) {
                oses.push(p.goos.clone());
            }
            if p.cgo_supported {
                cgo_pairs.insert((p.goos.clone(), p.goarch.clone()));
            }
        }

        let preferred_os = preferred_list(&host.goos, PREFERRED_OS, &platforms, |p| &p.goos);
        let preferred_arch =
            preferred_list(&host.goarch, PREFERRED_ARCH, &platforms, |p| &p.goarch);

        Self {
            platforms,
            os_arches,
            arch_oses,
            cgo_pairs,
            preferred_os,
            preferred_arch,
        }
    }

    /// Build a knowledge base from the output of `go tool dist list -json`.
    pub fn from_dist_list_json(json: &str, host: &HostPlatform) -> Result<Self> {
        let mut platforms: Vec<GoPlatform> = serde_json::from_str(json)?;
        if platforms.is_empty() {
            return Err(PlatformError::Empty);
        }
        crate::table::sort_by_preference(&mut platforms);
        Ok(Self::from_platforms(platforms, host))
    }

    /// Every platform, in preference order.
    #[must_use]
    pub fn platforms(&self) -> &[GoPlatform] {
        &self.platforms
    }

    /// OS values to try, host first.
    #[must_use]
    pub fn preferred_os(&self) -> &[String] {
        &self.preferred_os
    }

    /// Arch values to try, host first.
    #[must_use]
    pub fn preferred_arch(&self) -> &[String] {
        &self.preferred_arch
    }

    /// Arches valid for `goos`, or `None` if the table has no entry for it.
    #[must_use]
    pub fn arches_for(&self, goos: &str) -> Option<&[String]> {
        self.os_arches.get(goos).map(Vec::as_slice)
    }

    /// OSes valid for `goarch`, or `None` if the table has no entry for it.
    #[must_use]
    pub fn oses_for(&self, goarch: &str) -> Option<&[String]> {
        self.arch_oses.get(goarch).map(Vec::as_slice)
    }

    #[must_use]
    pub fn is_valid_pair(&self, goos: &str, goarch: &str) -> bool {
        self.arches_for(goos)
            .is_some_and(|arches| arches.iter().any(|a| a == goarch))
    }

    #[must_use]
    pub fn cgo_supported(&self, goos: &str, goarch: &str) -> bool {
        self.cgo_pairs
            .contains(&(goos.to_string(), goarch.to_string()))
    }

    /// Pick an arch compatible with `goos`, keeping `current` when the pair is
    /// valid or `goos` is not in the table.
    #[must_use]
    pub fn supported_arch(&self, goos: &str, current: &str) -> Option<String> {
        let Some(arches) = self.arches_for(goos) else {
            return Some(current.to_string());
        };
        pick_compatible(arches, current, &self.preferred_arch)
    }

    /// Pick an OS compatible with `goarch`, keeping `current` when the pair is
    /// valid or `goarch` is not in the table.
    #[must_use]
    pub fn supported_os(&self, goarch: &str, current: &str) -> Option<String> {
        let Some(oses) = self.oses_for(goarch) else {
            return Some(current.to_string());
        };
        pick_compatible(oses, current, &self.preferred_os)
    }
}

fn pick_compatible(valid: &[String], current: &str, preferred: &[String]) -> Option<String> {
    if valid.iter().any(|v| v == current) {
        return Some(current.to_string());
    }
    preferred
        .iter()
        .find(|p| valid.contains(p))
        .or_else(|| valid.first())
        .cloned()
}

fn preferred_list(
    host: &str,
    fixed: &[&str],
    platforms: &[GoPlatform],
    field: impl Fn(&GoPlatform) -> &String,
) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let candidates = std::iter::once(host)
        .chain(fixed.iter().copied())
        .chain(platforms.iter().map(|p| field(p).as_str()));
    for name in candidates {
        if !name.is_empty() && !out.iter().any(|s| s == name) {
            out.push(name.to_string());
        }
    }
    out
}
