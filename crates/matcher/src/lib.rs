//! # Go build context matching
//!
//! Decides whether a [`BuildContext`] selects a Go file and, when it does not,
//! searches for a modified context that does.
//!
//! ```text
//!   start context ─┐
//!   file name ─────┼──► ContextMatcher ──► BuildContext | MatchError
//!   file header ───┘         │
//!                            ▼
//!        defaults ─► file name ─► Resolution::ORDER
//!                                   Direct
//!                                   Experiments, SingleTag, AllTags
//!                                   ReleaseGate, CompilerGate   (permanent)
//!                                   Cgo, Platform               (base, then adjusted)
//!                                      │
//!                                      ▼
//!                         tag oracle ◄─► KnowledgeBase
//! ```
//!
//! ## Example
//!
//! ```
//! use gomatch_matcher::{BuildContext, ContextMatcher, MatcherConfig};
//!
//! let matcher = ContextMatcher::new(MatcherConfig::default());
//! let start = BuildContext::new("darwin", "arm64");
//! let src = b"//go:build linux && amd64\n\npackage p\n";
//!
//! let ctx = matcher.match_context(&start, "p.go", src).unwrap();
//! assert_eq!(ctx.platform(), "linux/amd64");
//! assert_eq!(start.platform(), "darwin/arm64");
//! ```

mod build;
mod config;
mod context;
mod error;
mod matcher;
mod oracle;
mod strategy;

pub use build::{collect_tags, good_os_arch_file, match_file, should_build, BuildCheck};
pub use config::MatcherConfig;
pub use context::BuildContext;
pub use error::{MatchError, MatchErrorKind};
pub use matcher::{match_context, ContextMatcher};
pub use oracle::{eval, match_tag};
pub use strategy::{Resolution, Restriction, Seed};
