use gomatch_constraint::{filename_constraint, parse_file_header};
use gomatch_platform::{default_platforms, HostPlatform, KnowledgeBase};
use std::borrow::Cow;

use crate::config::MatcherConfig;
use crate::context::BuildContext;
use crate::error::{MatchError, MatchErrorKind};
use crate::strategy::{Resolution, Restriction, Search};

/// Finds a [`BuildContext`] under which a Go file would be built.
///
/// The matcher holds no per-file state and is safe to share between threads.
#[derive(Debug, Clone)]
pub struct ContextMatcher<'kb> {
    kb: Cow<'kb, KnowledgeBase>,
    config: MatcherConfig,
    host: HostPlatform,
}

impl Default for ContextMatcher<'static> {
    fn default() -> Self {
        Self::new(MatcherConfig::default())
    }
}

impl ContextMatcher<'static> {
    /// A matcher over the built-in platform table, in the preference order of
    /// `config.host` when one is set and of the detected host otherwise.
    pub fn new(config: MatcherConfig) -> Self {
        let kb = match &config.host {
            Some(host) => Cow::Owned(KnowledgeBase::from_platforms(default_platforms(), host)),
            None => Cow::Borrowed(KnowledgeBase::builtin()),
        };
        Self::build(kb, config)
    }
}

impl<'kb> ContextMatcher<'kb> {
    /// A matcher over `kb`. Its preference order is used as is; `config.host`
    /// only fills defaults.
    pub fn with_knowledge_base(kb: &'kb KnowledgeBase, config: MatcherConfig) -> Self {
        Self::build(Cow::Borrowed(kb), config)
    }

    fn build(kb: Cow<'kb, KnowledgeBase>, config: MatcherConfig) -> Self {
        let host = config.host.clone().unwrap_or_else(HostPlatform::detect);
        Self { kb, config, host }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    /// Return a context, derived from `start`, under which the file at
    /// `filename` with leading bytes `header` would be built.
    ///
    /// `start` is never modified. Platform values implied by the file name
    /// are always honoured.
    pub fn match_context(
        &self,
        start: &BuildContext,
        filename: &str,
        header: &[u8],
    ) -> Result<BuildContext, MatchError> {
        let fail = |kind: MatchErrorKind| MatchError::new(filename, kind);

        let mut base = start.clone();
        if self.config.fill_host_defaults {
            base.fill_defaults(&self.host);
        }

        let restriction = Restriction::from_filename(&filename_constraint(filename));
        restriction.apply(&self.kb, &mut base);
        if base.platform() != start.platform() {
            log::trace!("{filename}: file name moves {} to {}", start.platform(), base.platform());
        }

        let file_header = parse_file_header(header).map_err(|err| fail(err.into()))?;
        let Some(expr) = file_header.constraint().map_err(|err| fail(err.into()))? else {
            log::debug!("{filename}: no build constraint, matched {}", base.platform());
            return Ok(base);
        };

        let search = Search::new(&self.kb, &expr, &restriction, base);
        for step in Resolution::ORDER {
            if !self.config.allows(step) {
                continue;
            }
            match step.run(&search) {
                Ok(Some(ctx)) => {
                    log::debug!("{filename}: {step:?} matched {} ({expr})", ctx.platform());
                    return Ok(ctx);
                }
                Ok(None) => log::trace!("{filename}: {step:?} found nothing"),
                Err(kind) => {
                    log::debug!("{filename}: {step:?} failed: {kind}");
                    return Err(fail(kind));
                }
            }
        }

        log::debug!(
            "{filename}: no context satisfies {expr} (tags {:?})",
            search.consulted()
        );
        Err(fail(MatchErrorKind::NoMatch))
    }
}

/// Match with the default configuration and the built-in platform table.
pub fn match_context(
    start: &BuildContext,
    filename: &str,
    header: &[u8],
) -> Result<BuildContext, MatchError> {
    ContextMatcher::default().match_context(start, filename, header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::match_file;
    use gomatch_constraint::ConstraintError;
    use pretty_assertions::assert_eq;

    const LATEST: &str = "go1.21";
    const PRIOR: &str = "go1.20";

    fn kb() -> KnowledgeBase {
        KnowledgeBase::from_platforms(default_platforms(), &HostPlatform::new("linux", "amd64"))
    }

    fn config() -> MatcherConfig {
        MatcherConfig::default().with_host(HostPlatform::new("linux", "amd64"))
    }

    fn source(directive: &str) -> String {
        if directive.is_empty() {
            "package test\n".to_string()
        } else {
            format!("{directive}\n\npackage test\n")
        }
    }

    struct Case {
        filename: &'static str,
        directive: String,
        start: BuildContext,
    }

    impl Case {
        fn new(filename: &'static str, directive: impl Into<String>) -> Self {
            Self {
                filename,
                directive: directive.into(),
                start: BuildContext::new("linux", "amd64"),
            }
        }

        fn start(mut self, start: BuildContext) -> Self {
            self.start = start;
            self
        }

        fn run(&self) -> Result<BuildContext, MatchError> {
            let kb = kb();
            let matcher = ContextMatcher::with_knowledge_base(&kb, config());
            let src = source(&self.directive);
            let got = matcher.match_context(&self.start, self.filename, src.as_bytes());
            if let Ok(ctx) = &got {
                assert!(
                    match_file(ctx, self.filename, src.as_bytes()).unwrap(),
                    "{} not built by {ctx:?}",
                    self.filename
                );
            }
            got
        }

        fn kind(&self) -> MatchErrorKind {
            self.run().unwrap_err().kind
        }
    }

    #[test]
    fn unconstrained_file() {
        let ctx = Case::new("main.go", "").run().unwrap();
        assert_eq!(ctx, BuildContext::new("linux", "amd64"));
    }

    #[test]
    fn prior_release_tag() {
        Case::new("main.go", format!("//go:build {PRIOR}")).run().unwrap();
    }

    #[test]
    fn negated_prior_release_is_impossible() {
        let err = Case::new("main.go", format!("//go:build !{PRIOR}"))
            .run()
            .unwrap_err();
        assert!(err.permanent);
        assert_eq!(
            err.kind,
            MatchErrorKind::ImpossibleVersion {
                tag: PRIOR.to_string()
            }
        );
    }

    #[test]
    fn negated_latest_release_is_impossible() {
        assert!(matches!(
            Case::new("main.go", format!("//go:build !{LATEST}")).kind(),
            MatchErrorKind::ImpossibleVersion { .. }
        ));
    }

    #[test]
    fn future_release_is_impossible() {
        let err = Case::new("main.go", "//go:build go1.99").run().unwrap_err();
        assert!(err.is_permanent());
        assert_eq!(
            err.kind,
            MatchErrorKind::ImpossibleVersion {
                tag: "go1.99".to_string()
            }
        );
    }

    #[test]
    fn tag_with_latest_release() {
        let ctx = Case::new("main.go", format!("//go:build yes && {LATEST}"))
            .run()
            .unwrap();
        assert_eq!(ctx.build_tags.into_iter().collect::<Vec<_>>(), vec!["yes"]);
    }

    #[test]
    fn tag_or_negated_release() {
        let ctx = Case::new("main.go", format!("//go:build ok || !{LATEST}"))
            .run()
            .unwrap();
        assert!(ctx.build_tags.contains("ok"));
    }

    #[test]
    fn adds_tags() {
        let ctx = Case::new("add_tags.go", "//go:build tag1 && tag2 && !tag3 && tag4")
            .run()
            .unwrap();
        assert_eq!(
            ctx.build_tags.into_iter().collect::<Vec<_>>(),
            vec!["tag1", "tag2", "tag4"]
        );
    }

    #[test]
    fn removes_one_tag() {
        let ctx = Case::new("remove_one_tag.go", "//go:build !tag1")
            .start(BuildContext::new("linux", "amd64").with_build_tags(["tag1"]))
            .run()
            .unwrap();
        assert!(ctx.build_tags.is_empty());
    }

    #[test]
    fn removes_tags() {
        let ctx = Case::new("remove_tags.go", "//go:build tag1 && tag2 && !tag3 && tag4")
            .start(BuildContext::new("linux", "amd64").with_build_tags(["tag3", "tag4"]))
            .run()
            .unwrap();
        assert_eq!(
            ctx.build_tags.into_iter().collect::<Vec<_>>(),
            vec!["tag1", "tag2", "tag4"]
        );
    }

    #[test]
    fn negated_arch_picks_another_arch() {
        let ctx = Case::new("main.go", "//go:build !amd64")
            .start(BuildContext::new("darwin", "amd64"))
            .run()
            .unwrap();
        assert_eq!(ctx.goos, "darwin");
        assert_eq!(ctx.goarch, "arm64");
    }

    #[test]
    fn filename_sets_os() {
        let ctx = Case::new("sys_linux.go", "")
            .start(BuildContext::new("darwin", "amd64"))
            .run()
            .unwrap();
        assert_eq!(ctx.platform(), "linux/amd64");

        let ctx = Case::new("sys_windows.go", "")
            .start(BuildContext::new("darwin", "arm64"))
            .run()
            .unwrap();
        assert_eq!(ctx.platform(), "windows/arm64");
    }

    #[test]
    fn adds_goexperiment() {
        let ctx = Case::new("add_goexperiment.go", "//go:build goexperiment.exp1")
            .start(BuildContext::new("darwin", "arm64").with_tool_tags(["goexperiment.other"]))
            .run()
            .unwrap();
        assert_eq!(
            ctx.tool_tags.into_iter().collect::<Vec<_>>(),
            vec!["goexperiment.exp1", "goexperiment.other"]
        );
        assert!(ctx.build_tags.is_empty());
    }

    #[test]
    fn removes_goexperiment() {
        let ctx = Case::new("remove_goexperiment.go", "//go:build !goexperiment.fieldtrack")
            .start(BuildContext::new("darwin", "arm64").with_tool_tags(["goexperiment.fieldtrack"]))
            .run()
            .unwrap();
        assert!(ctx.tool_tags.is_empty());
    }

    #[test]
    fn filename_os_and_arch() {
        let ctx = Case::new("sys_linux_amd64.go", "")
            .start(BuildContext::new("darwin", "arm64"))
            .run()
            .unwrap();
        assert_eq!(ctx.platform(), "linux/amd64");
    }

    #[test]
    fn filename_os_and_arch_with_tag() {
        let ctx = Case::new("sys_linux_amd64.go", "//go:build mytag")
            .start(BuildContext::new("darwin", "arm64"))
            .run()
            .unwrap();
        assert_eq!(ctx.platform(), "linux/amd64");
        assert!(ctx.build_tags.contains("mytag"));
    }

    // golang.org/x/crypto/chacha20/chacha_noasm.go
    #[test]
    fn chacha_noasm_uses_purego() {
        let ctx = Case::new(
            "chacha_noasm.go",
            "//go:build (!arm64 && !s390x && !ppc64le) || (arm64 && !go1.11) || !gc || purego",
        )
        .start(BuildContext::new("darwin", "arm64"))
        .run()
        .unwrap();
        assert_eq!(ctx.platform(), "darwin/arm64");
        assert_eq!(ctx.build_tags.into_iter().collect::<Vec<_>>(), vec!["purego"]);
    }

    #[test]
    fn contradiction_is_no_match() {
        let err = Case::new("impossible.go", "//go:build ok && !ok").run().unwrap_err();
        assert_eq!(err.kind, MatchErrorKind::NoMatch);
        assert!(!err.permanent);
        assert_eq!(err.path, "impossible.go");
    }

    #[test]
    fn compiler_errors_are_permanent() {
        let err = Case::new("gccgo.go", "//go:build gccgo && linux").run().unwrap_err();
        assert!(err.permanent);
        assert_eq!(
            err.kind,
            MatchErrorKind::CompilerMismatch {
                required: "gccgo".to_string()
            }
        );

        assert_eq!(
            Case::new("nogc.go", "//go:build !gc").kind(),
            MatchErrorKind::CompilerNegated {
                compiler: "gc".to_string()
            }
        );
    }

    #[test]
    fn syntax_errors_surface() {
        let err = Case::new("bad.go", "//go:build linux &&").run().unwrap_err();
        assert!(!err.permanent);
        assert!(matches!(err.kind, MatchErrorKind::Syntax(ConstraintError::Syntax { .. })));

        let err = Case::new("twice.go", "//go:build a\n//go:build b").run().unwrap_err();
        assert_eq!(err.kind, MatchErrorKind::Syntax(ConstraintError::MultipleGoBuild));
    }

    #[test]
    fn os_tag_with_user_tag_uses_adjusted_seed() {
        let ctx = Case::new("both.go", "//go:build windows && purego")
            .run()
            .unwrap();
        assert_eq!(ctx.goos, "windows");
        assert!(ctx.build_tags.contains("purego"));
    }

    #[test]
    fn filename_restriction_beats_directive() {
        let err = Case::new("x_linux.go", "//go:build windows")
            .start(BuildContext::new("darwin", "arm64"))
            .run()
            .unwrap_err();
        assert_eq!(err.kind, MatchErrorKind::NoMatch);

        let ctx = Case::new("x_linux.go", "//go:build android")
            .start(BuildContext::new("darwin", "arm64"))
            .run()
            .unwrap();
        assert_eq!(ctx.platform(), "android/arm64");
    }

    #[test]
    fn filename_os_keeps_implying_start_os() {
        let ctx = Case::new("x_linux.go", "")
            .start(BuildContext::new("android", "arm64"))
            .run()
            .unwrap();
        assert_eq!(ctx.platform(), "android/arm64");

        let ctx = Case::new("x_linux.go", "//go:build !cgo")
            .start(BuildContext::new("ios", "arm64"))
            .run()
            .unwrap();
        assert_eq!(ctx.platform(), "linux/arm64");
    }

    #[test]
    fn fills_empty_fields_from_host() {
        let ctx = Case::new("main.go", "").start(BuildContext::default()).run().unwrap();
        assert_eq!(ctx.platform(), "linux/amd64");
        assert_eq!(ctx.compiler, "gc");
    }

    #[test]
    fn strict_config_does_not_search() {
        let kb = kb();
        let matcher = ContextMatcher::with_knowledge_base(
            &kb,
            MatcherConfig::strict().with_host(HostPlatform::new("linux", "amd64")),
        );
        let src = source("//go:build purego");
        let err = matcher
            .match_context(&BuildContext::new("linux", "amd64"), "p.go", src.as_bytes())
            .unwrap_err();
        assert_eq!(err.kind, MatchErrorKind::NoMatch);

        let src = source("//go:build go1.99");
        let err = matcher
            .match_context(&BuildContext::new("linux", "amd64"), "p.go", src.as_bytes())
            .unwrap_err();
        assert!(err.permanent);
    }

    #[test]
    fn default_matcher_uses_builtin_table() {
        let src = source("//go:build linux && arm64");
        let ctx = match_context(&BuildContext::new("windows", "amd64"), "x.go", src.as_bytes())
            .unwrap();
        assert_eq!(ctx.platform(), "linux/arm64");
    }

    #[test]
    fn configured_host_orders_the_builtin_search() {
        let matcher = ContextMatcher::new(
            MatcherConfig::default().with_host(HostPlatform::new("linux", "riscv64")),
        );
        assert_eq!(matcher.knowledge_base().preferred_arch()[0], "riscv64");

        let src = source("//go:build !amd64");
        let ctx = matcher
            .match_context(&BuildContext::new("linux", "amd64"), "x.go", src.as_bytes())
            .unwrap();
        assert_eq!(ctx.platform(), "linux/riscv64");
    }

    #[test]
    fn explicit_knowledge_base_keeps_its_order() {
        let kb = kb();
        let matcher = ContextMatcher::with_knowledge_base(
            &kb,
            MatcherConfig::default().with_host(HostPlatform::new("linux", "riscv64")),
        );
        assert_eq!(matcher.knowledge_base().preferred_arch()[0], "amd64");

        let src = source("//go:build !amd64");
        let ctx = matcher
            .match_context(&BuildContext::new("linux", "amd64"), "x.go", src.as_bytes())
            .unwrap();
        assert_eq!(ctx.platform(), "linux/arm64");
    }

    #[test]
    fn matcher_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ContextMatcher<'static>>();
    }
}
