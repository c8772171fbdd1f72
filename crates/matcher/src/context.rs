use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use gomatch_platform::known::{release_tags_through, COMPILER_GC, LATEST_MINOR_RELEASE};
use gomatch_platform::HostPlatform;

/// A Go build configuration: target platform, compiler, cgo and tags.
///
/// Tag sets are ordered so two equal contexts always serialize the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildContext {
    pub goos: String,
    pub goarch: String,
    pub compiler: String,
    pub cgo_enabled: bool,

    /// `-tags` given by the user
    pub build_tags: BTreeSet<String>,

    /// Tags set by the toolchain, e.g. `goexperiment.*`
    pub tool_tags: BTreeSet<String>,

    /// `go1.1` through the release being built with
    pub release_tags: BTreeSet<String>,
}

impl BuildContext {
    /// A context for `goos/goarch` built by `gc` with the newest known
    /// release tags and cgo disabled.
    pub fn new(goos: impl Into<String>, goarch: impl Into<String>) -> Self {
        Self {
            goos: goos.into(),
            goarch: goarch.into(),
            compiler: COMPILER_GC.to_string(),
            release_tags: release_tags_through(LATEST_MINOR_RELEASE)
                .into_iter()
                .collect(),
            ..Default::default()
        }
    }

    /// A context targeting the host platform.
    #[must_use]
    pub fn for_host(host: &HostPlatform) -> Self {
        Self::new(host.goos.clone(), host.goarch.clone()).with_compiler(host.compiler.clone())
    }

    #[must_use]
    pub fn with_goos(mut self, goos: impl Into<String>) -> Self {
        self.goos = goos.into();
        self
    }

    #[must_use]
    pub fn with_goarch(mut self, goarch: impl Into<String>) -> Self {
        self.goarch = goarch.into();
        self
    }

    #[must_use]
    pub fn with_compiler(mut self, compiler: impl Into<String>) -> Self {
        self.compiler = compiler.into();
        self
    }

    #[must_use]
    pub fn with_cgo(mut self, enabled: bool) -> Self {
        self.cgo_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_build_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.build_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_tool_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tool_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_release_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.release_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Release tags `go1.1` through `go1.{minor}`.
    #[must_use]
    pub fn with_go_version(self, minor: u32) -> Self {
        self.with_release_tags(release_tags_through(minor))
    }

    /// `GOOS/GOARCH`
    #[must_use]
    pub fn platform(&self) -> String {
        format!("{}/{}", self.goos, self.goarch)
    }

    /// Fill empty `goos`, `goarch` and `compiler` from `host`.
    pub fn fill_defaults(&mut self, host: &HostPlatform) {
        if self.goos.is_empty() {
            self.goos = host.goos.clone();
        }
        if self.goarch.is_empty() {
            self.goarch = host.goarch.clone();
        }
        if self.compiler.is_empty() {
            self.compiler = host.compiler.clone();
        }
    }

    /// Set or clear a user build tag.
    pub fn set_build_tag(&mut self, tag: &str, on: bool) {
        set_tag(&mut self.build_tags, tag, on);
    }

    /// Set or clear a toolchain tag.
    pub fn set_tool_tag(&mut self, tag: &str, on: bool) {
        set_tag(&mut self.tool_tags, tag, on);
    }

    /// Whether `tag` is in any of the three tag sets.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.build_tags.contains(tag)
            || self.tool_tags.contains(tag)
            || self.release_tags.contains(tag)
    }
}

fn set_tag(tags: &mut BTreeSet<String>, tag: &str, on: bool) {
    if on {
        if !tags.contains(tag) {
            tags.insert(tag.to_string());
        }
    } else {
        tags.remove(tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_context_defaults() {
        let ctx = BuildContext::new("linux", "amd64");
        assert_eq!(ctx.compiler, "gc");
        assert!(!ctx.cgo_enabled);
        assert!(ctx.build_tags.is_empty());
        assert!(ctx.release_tags.contains("go1.1"));
        assert!(ctx.release_tags.contains("go1.21"));
        assert!(!ctx.release_tags.contains("go1.22"));
        assert_eq!(ctx.platform(), "linux/amd64");
    }

    #[test]
    fn builders_dedupe_and_sort() {
        let ctx = BuildContext::new("linux", "amd64").with_build_tags(["b", "a", "b"]);
        assert_eq!(ctx.build_tags.iter().collect::<Vec<_>>(), vec!["a", "b"]);

        let ctx = ctx.with_go_version(18);
        assert_eq!(ctx.release_tags.len(), 18);
        assert!(!ctx.release_tags.contains("go1.19"));
    }

    #[test]
    fn fill_defaults_only_touches_empty_fields() {
        let host = HostPlatform::new("darwin", "arm64");
        let mut ctx = BuildContext {
            goarch: "386".to_string(),
            ..Default::default()
        };
        ctx.fill_defaults(&host);
        assert_eq!(ctx.goos, "darwin");
        assert_eq!(ctx.goarch, "386");
        assert_eq!(ctx.compiler, "gc");
    }

    #[test]
    fn set_tags() {
        let mut ctx = BuildContext::new("linux", "amd64");
        ctx.set_build_tag("purego", true);
        ctx.set_build_tag("purego", true);
        assert_eq!(ctx.build_tags.len(), 1);
        assert!(ctx.has_tag("purego"));
        ctx.set_build_tag("purego", false);
        assert!(!ctx.has_tag("purego"));

        ctx.set_tool_tag("goexperiment.arenas", true);
        assert!(ctx.has_tag("goexperiment.arenas"));
        assert!(ctx.has_tag("go1.20"));
    }

    #[test]
    fn clone_does_not_share_tags() {
        let orig = BuildContext::new("linux", "amd64").with_build_tags(["a"]);
        let mut copy = orig.clone();
        copy.set_build_tag("b", true);
        assert_eq!(orig.build_tags.len(), 1);
    }

    #[test]
    fn serde_uses_field_names_and_defaults() {
        let ctx: BuildContext =
            serde_json::from_str(r#"{"goos":"windows","build_tags":["x"]}"#).unwrap();
        assert_eq!(ctx.goos, "windows");
        assert_eq!(ctx.goarch, "");
        assert!(ctx.build_tags.contains("x"));
        assert!(ctx.release_tags.is_empty());

        let json = serde_json::to_string(&BuildContext::new("linux", "arm").with_go_version(2))
            .unwrap();
        assert_eq!(
            json,
            r#"{"goos":"linux","goarch":"arm","compiler":"gc","cgo_enabled":false,"build_tags":[],"tool_tags":[],"release_tags":["go1.1","go1.2"]}"#
        );
    }
}
