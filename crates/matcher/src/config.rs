use serde::{Deserialize, Serialize};

use gomatch_platform::HostPlatform;

use crate::strategy::{Resolution, Seed};

/// Configuration for the context matcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Fill an empty GOOS, GOARCH or compiler from the host
    pub fill_host_defaults: bool,

    /// Host used for defaults and preference order (`None` = detect)
    pub host: Option<HostPlatform>,

    /// Try adding and removing `goexperiment.*` and user build tags
    pub toggle_tags: bool,

    /// Try flipping cgo
    pub toggle_cgo: bool,

    /// Try other GOOS/GOARCH pairs
    pub search_platforms: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            fill_host_defaults: true,
            host: None,
            toggle_tags: true,
            toggle_cgo: true,
            search_platforms: true,
        }
    }
}

impl MatcherConfig {
    /// Only apply the file name and evaluate; never search.
    pub fn strict() -> Self {
        Self {
            toggle_tags: false,
            toggle_cgo: false,
            search_platforms: false,
            ..Default::default()
        }
    }

    /// Use a fixed host instead of detecting one.
    pub fn with_host(mut self, host: HostPlatform) -> Self {
        self.host = Some(host);
        self
    }

    /// Load from TOML; missing keys take their default.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(host) = &self.host {
            if host.goos.is_empty() || host.goarch.is_empty() || host.compiler.is_empty() {
                return Err(format!(
                    "host must name goos, goarch and compiler (got {:?}/{:?}/{:?})",
                    host.goos, host.goarch, host.compiler
                ));
            }
        }
        Ok(())
    }

    /// Whether `step` runs under this configuration.
    pub(crate) fn allows(&self, step: Resolution) -> bool {
        match step {
            Resolution::Direct | Resolution::ReleaseGate | Resolution::CompilerGate => true,
            Resolution::Experiments | Resolution::SingleTag | Resolution::AllTags => {
                self.toggle_tags
            }
            Resolution::Cgo(seed) => self.toggle_cgo && self.seed_allowed(seed),
            Resolution::Platform(seed) => self.search_platforms && self.seed_allowed(seed),
        }
    }

    fn seed_allowed(&self, seed: Seed) -> bool {
        seed == Seed::Base || self.toggle_tags
    }
}
