//! Resolution strategies tried, in order, when a file's build constraint does
//! not hold for the starting context.
//!
//! Every strategy is a pure function of the [`Search`] state: it clones the
//! context it starts from and never writes back, so a failed attempt leaves
//! nothing behind for the next one.

use std::collections::BTreeSet;

use gomatch_constraint::{Expr, FilenameConstraint, Polarity};
use gomatch_platform::known::{
    accepted_oses, is_compiler, is_experiment_tag, is_known_arch, is_known_os, is_release_tag,
    CGO_TAG, COMPILER_GC, COMPILER_GCCGO, UNIX_TAG,
};
use gomatch_platform::KnowledgeBase;

use crate::context::BuildContext;
use crate::error::MatchErrorKind;
use crate::oracle::{eval, match_tag};

/// Which context a cgo or platform strategy starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seed {
    /// The starting context after the file name has been applied.
    Base,
    /// [`Seed::Base`] plus every experiment and build tag set the way the
    /// expression wants it.
    Adjusted,
}

/// One step of the search, in the order [`Resolution::ORDER`] runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// Evaluate as is.
    Direct,
    /// Set every `goexperiment.*` tag to the polarity the expression wants.
    Experiments,
    /// Set one user build tag at a time.
    SingleTag,
    /// Set every experiment and user build tag at once.
    AllTags,
    /// Fail for good if the Go release rules the file out.
    ReleaseGate,
    /// Fail for good if the compiler rules the file out.
    CompilerGate,
    /// Flip cgo.
    Cgo(Seed),
    /// Try other GOOS/GOARCH values.
    Platform(Seed),
}

impl Resolution {
    pub const ORDER: [Resolution; 10] = [
        Resolution::Direct,
        Resolution::Experiments,
        Resolution::SingleTag,
        Resolution::AllTags,
        Resolution::ReleaseGate,
        Resolution::CompilerGate,
        Resolution::Cgo(Seed::Base),
        Resolution::Platform(Seed::Base),
        Resolution::Cgo(Seed::Adjusted),
        Resolution::Platform(Seed::Adjusted),
    ];

    /// Run this step. `Ok(None)` passes on to the next step.
    pub(crate) fn run(self, search: &Search<'_>) -> Result<Option<BuildContext>, MatchErrorKind> {
        match self {
            Resolution::Direct => Ok(try_context(search, search.base.clone())),
            Resolution::Experiments => Ok(experiments(search)),
            Resolution::SingleTag => Ok(single_tag(search)),
            Resolution::AllTags => Ok(try_context(search, search.adjusted.clone())),
            Resolution::ReleaseGate => release_gate(search).map(|()| None),
            Resolution::CompilerGate => compiler_gate(search).map(|()| None),
            Resolution::Cgo(seed) => Ok(search.seed(seed).and_then(|ctx| toggle_cgo(search, ctx))),
            Resolution::Platform(seed) => {
                Ok(search.seed(seed).and_then(|ctx| platforms(search, ctx)))
            }
        }
    }
}

/// Platform values the file name allows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Restriction {
    /// Acceptable GOOS values: the named OS and every OS implying it.
    pub os: Option<Vec<String>>,
    pub arch: Option<String>,
}

impl Restriction {
    #[must_use]
    pub fn from_filename(required: &FilenameConstraint) -> Self {
        Self {
            os: required.os.as_deref().map(accepted_oses),
            arch: required.arch.clone(),
        }
    }

    #[must_use]
    pub fn allows_os(&self, goos: &str) -> bool {
        self.os
            .as_ref()
            .map_or(true, |accepted| accepted.iter().any(|os| os == goos))
    }

    #[must_use]
    pub fn allows_arch(&self, goarch: &str) -> bool {
        self.arch.as_deref().map_or(true, |arch| arch == goarch)
    }

    /// Move `ctx` onto a platform the file name allows, changing only the
    /// fields that are not already acceptable.
    pub fn apply(&self, kb: &KnowledgeBase, ctx: &mut BuildContext) {
        let before = (ctx.goos.clone(), ctx.goarch.clone());

        if let Some(accepted) = &self.os {
            if !self.allows_os(&ctx.goos) {
                ctx.goos = accepted[0].clone();
            }
        }
        if let Some(arch) = &self.arch {
            if ctx.goarch != *arch {
                ctx.goarch = arch.clone();
            }
        }

        match (&self.os, &self.arch) {
            (Some(_), None) => {
                if let Some(arch) = kb.supported_arch(&ctx.goos, &ctx.goarch) {
                    ctx.goarch = arch;
                }
            }
            (None, Some(_)) => {
                if let Some(os) = kb.supported_os(&ctx.goarch, &ctx.goos) {
                    ctx.goos = os;
                }
            }
            _ => {}
        }

        let moved = ctx.goos != before.0 || ctx.goarch != before.1;
        if moved && !kb.cgo_supported(&ctx.goos, &ctx.goarch) {
            ctx.cgo_enabled = false;
        }
    }
}

/// Everything a strategy may read. Built once per file.
pub(crate) struct Search<'a> {
    kb: &'a KnowledgeBase,
    expr: &'a Expr,
    restriction: &'a Restriction,
    base: BuildContext,
    adjusted: BuildContext,
    consulted: BTreeSet<String>,
}

impl<'a> Search<'a> {
    pub(crate) fn new(
        kb: &'a KnowledgeBase,
        expr: &'a Expr,
        restriction: &'a Restriction,
        base: BuildContext,
    ) -> Self {
        let mut consulted = BTreeSet::new();
        eval(&base, expr, Some(&mut consulted));

        let mut search = Self {
            kb,
            expr,
            restriction,
            adjusted: base.clone(),
            base,
            consulted,
        };
        let mut adjusted = search.with_experiments(search.base.clone());
        for (tag, polarity) in search.ordinary_tags() {
            adjusted.set_build_tag(tag, polarity.is_positive());
        }
        search.adjusted = adjusted;
        search
    }

    /// Tags the expression mentions, sorted.
    pub(crate) fn consulted(&self) -> &BTreeSet<String> {
        &self.consulted
    }

    fn seed(&self, seed: Seed) -> Option<&BuildContext> {
        match seed {
            Seed::Base => Some(&self.base),
            Seed::Adjusted => (self.adjusted != self.base).then_some(&self.adjusted),
        }
    }

    fn holds(&self, ctx: &BuildContext) -> bool {
        eval(ctx, self.expr, None)
    }

    /// Consulted tags matching `filter`, with the polarity the expression
    /// first requires of them.
    fn polarities(&self, filter: impl Fn(&str) -> bool) -> Vec<(&str, Polarity)> {
        self.consulted
            .iter()
            .map(String::as_str)
            .filter(|tag| filter(tag))
            .filter_map(|tag| self.expr.lookup(tag).map(|polarity| (tag, polarity)))
            .collect()
    }

    fn with_experiments(&self, mut ctx: BuildContext) -> BuildContext {
        for (tag, polarity) in self.polarities(is_experiment_tag) {
            ctx.set_tool_tag(tag, polarity.is_positive());
        }
        ctx
    }

    /// User build tags worth toggling: everything that is not a platform,
    /// compiler, release, experiment or toolchain tag.
    fn ordinary_tags(&self) -> Vec<(&str, Polarity)> {
        let base = &self.base;
        self.polarities(|tag| !is_internal_tag(base, tag))
    }
}

fn is_internal_tag(ctx: &BuildContext, name: &str) -> bool {
    is_compiler(name)
        || is_known_os(name)
        || is_known_arch(name)
        || is_experiment_tag(name)
        || is_release_tag(name)
        || name == CGO_TAG
        || name == UNIX_TAG
        || ctx.tool_tags.contains(name)
        || ctx.release_tags.contains(name)
}

fn try_context(search: &Search<'_>, ctx: BuildContext) -> Option<BuildContext> {
    log::trace!(
        "trying {} cgo={} tags={:?} tool_tags={:?}",
        ctx.platform(),
        ctx.cgo_enabled,
        ctx.build_tags,
        ctx.tool_tags
    );
    search.holds(&ctx).then_some(ctx)
}

fn experiments(search: &Search<'_>) -> Option<BuildContext> {
    let ctx = search.with_experiments(search.base.clone());
    if ctx == search.base {
        return None;
    }
    try_context(search, ctx)
}

fn single_tag(search: &Search<'_>) -> Option<BuildContext> {
    search.ordinary_tags().into_iter().find_map(|(tag, polarity)| {
        let mut ctx = search.base.clone();
        ctx.set_build_tag(tag, polarity.is_positive());
        if ctx == search.base {
            return None;
        }
        try_context(search, ctx)
    })
}

/// Release tags are fixed by the toolchain. If the expression is false for
/// every value of the other tags once they are pinned, no search can help.
fn release_gate(search: &Search<'_>) -> Result<(), MatchErrorKind> {
    let base = &search.base;
    let folded = search
        .expr
        .partial_eval(&mut |tag| is_release_tag(tag).then(|| base.has_tag(tag)));
    if folded != Some(false) {
        return Ok(());
    }

    let releases = search.polarities(is_release_tag);
    let contradicted = releases
        .iter()
        .find(|(tag, polarity)| polarity.is_positive() != base.has_tag(tag))
        .or_else(|| releases.first());
    let tag = contradicted.map_or_else(String::new, |(tag, _)| (*tag).to_string());
    log::debug!("release tags rule out the file: {tag}");
    Err(MatchErrorKind::ImpossibleVersion { tag })
}

/// `gc` and `gccgo` are fixed by the toolchain too.
fn compiler_gate(search: &Search<'_>) -> Result<(), MatchErrorKind> {
    let base = &search.base;
    let other = match base.compiler.as_str() {
        COMPILER_GC => COMPILER_GCCGO,
        COMPILER_GCCGO => COMPILER_GC,
        _ => return Ok(()),
    };
    let folded = search
        .expr
        .partial_eval(&mut |tag| is_compiler(tag).then(|| match_tag(base, tag, None)));
    if folded != Some(false) {
        return Ok(());
    }

    log::debug!("compiler {} rules out the file", base.compiler);
    if search.expr.lookup(other) == Some(Polarity::Positive) {
        Err(MatchErrorKind::CompilerMismatch {
            required: other.to_string(),
        })
    } else {
        Err(MatchErrorKind::CompilerNegated {
            compiler: base.compiler.clone(),
        })
    }
}

/// Disabling cgo is always possible; enabling it needs a pair that supports it.
fn toggle_cgo(search: &Search<'_>, seed: &BuildContext) -> Option<BuildContext> {
    if !search.consulted.contains(CGO_TAG) {
        return None;
    }
    let mut ctx = seed.clone();
    if ctx.cgo_enabled {
        ctx.cgo_enabled = false;
    } else if search.kb.cgo_supported(&ctx.goos, &ctx.goarch) {
        ctx.cgo_enabled = true;
    } else {
        return None;
    }
    try_context(search, ctx)
}

fn platforms(search: &Search<'_>, seed: &BuildContext) -> Option<BuildContext> {
    let has_os = search
        .consulted
        .iter()
        .any(|tag| is_known_os(tag) || tag == UNIX_TAG);
    let has_arch = search.consulted.iter().any(|tag| is_known_arch(tag));

    match (has_os, has_arch) {
        (true, true) => search_pairs(search, seed),
        (true, false) => search_os(search, seed),
        (false, true) => search_arch(search, seed),
        (false, false) => None,
    }
}

/// Move `seed` to `goos/goarch`, keeping cgo only where the pair supports it.
fn retarget(search: &Search<'_>, seed: &BuildContext, goos: &str, goarch: &str) -> BuildContext {
    let mut ctx = seed.clone();
    ctx.goos = goos.to_string();
    ctx.goarch = goarch.to_string();
    if !search.kb.cgo_supported(goos, goarch) {
        ctx.cgo_enabled = false;
    }
    ctx
}

/// Try `goos/goarch` with the seed's cgo setting, then with cgo flipped when
/// the expression mentions cgo and the pair supports it.
fn try_pair(
    search: &Search<'_>,
    seed: &BuildContext,
    goos: &str,
    goarch: &str,
) -> Option<BuildContext> {
    let ctx = retarget(search, seed, goos, goarch);
    if search.holds(&ctx) {
        return Some(ctx);
    }
    if !search.consulted.contains(CGO_TAG) || !search.kb.cgo_supported(goos, goarch) {
        return None;
    }
    let mut flipped = ctx;
    flipped.cgo_enabled = !flipped.cgo_enabled;
    try_context(search, flipped)
}

/// Walk the platform table in preference order.
fn search_pairs(search: &Search<'_>, seed: &BuildContext) -> Option<BuildContext> {
    let restriction = search.restriction;
    search
        .kb
        .platforms()
        .iter()
        .filter(|p| !(p.goos == seed.goos && p.goarch == seed.goarch))
        .filter(|p| restriction.allows_os(&p.goos) && restriction.allows_arch(&p.goarch))
        .find_map(|p| try_pair(search, seed, &p.goos, &p.goarch))
}

/// Values of one dimension to pair with `other`: `current` when the pair is
/// valid, else every valid value in preference order.
fn counterparts<'k>(
    valid: Option<&'k [String]>,
    current: &'k str,
    preferred: &'k [String],
) -> Vec<&'k str> {
    match valid {
        None => vec![current],
        Some(valid) if valid.iter().any(|v| v == current) => vec![current],
        Some(valid) => preferred
            .iter()
            .filter(|p| valid.contains(p))
            .map(String::as_str)
            .collect(),
    }
}

fn search_os(search: &Search<'_>, seed: &BuildContext) -> Option<BuildContext> {
    let kb = search.kb;
    let restriction = search.restriction;
    kb.preferred_os()
        .iter()
        .filter(|os| **os != seed.goos && restriction.allows_os(os))
        .find_map(|os| {
            counterparts(kb.arches_for(os), &seed.goarch, kb.preferred_arch())
                .into_iter()
                .filter(|arch| restriction.allows_arch(arch))
                .find_map(|arch| try_pair(search, seed, os, arch))
        })
}

fn search_arch(search: &Search<'_>, seed: &BuildContext) -> Option<BuildContext> {
    let kb = search.kb;
    let restriction = search.restriction;
    kb.preferred_arch()
        .iter()
        .filter(|arch| **arch != seed.goarch && restriction.allows_arch(arch))
        .find_map(|arch| {
            counterparts(kb.oses_for(arch), &seed.goos, kb.preferred_os())
                .into_iter()
                .filter(|os| restriction.allows_os(os))
                .find_map(|os| try_pair(search, seed, os, arch))
        })
}
