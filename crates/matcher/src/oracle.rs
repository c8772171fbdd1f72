use std::collections::BTreeSet;

use gomatch_constraint::Expr;
use gomatch_platform::known::{implied_os, is_unix_os, CGO_TAG, UNIX_TAG, UNIX_TAG_RELEASE};

use crate::context::BuildContext;

/// Old spelling of `goexperiment.boringcrypto`, honoured from the same
/// release as `unix`.
const BORINGCRYPTO_TAG: &str = "boringcrypto";
const BORINGCRYPTO_EXPERIMENT: &str = "goexperiment.boringcrypto";

/// Reports whether the tag `name` is satisfied by `ctx`:
///
/// - `cgo` when cgo is enabled
/// - `$GOOS`, `$GOARCH` and the compiler
/// - `linux` under android, `solaris` under illumos, `darwin` under ios
/// - `unix` on a Unix-like OS, from go1.19
/// - any tag in the build, tool or release tag sets
///
/// `name` is recorded in `consulted` whatever the outcome.
pub fn match_tag(ctx: &BuildContext, name: &str, consulted: Option<&mut BTreeSet<String>>) -> bool {
    if let Some(consulted) = consulted {
        if !consulted.contains(name) {
            consulted.insert(name.to_string());
        }
    }

    if ctx.cgo_enabled && name == CGO_TAG {
        return true;
    }
    if name == ctx.goos || name == ctx.goarch || name == ctx.compiler {
        return true;
    }
    if implied_os(&ctx.goos) == Some(name) {
        return true;
    }

    let modern = ctx.release_tags.contains(UNIX_TAG_RELEASE);
    if modern && name == UNIX_TAG && is_unix_os(&ctx.goos) {
        return true;
    }
    if modern && name == BORINGCRYPTO_TAG && ctx.has_tag(BORINGCRYPTO_EXPERIMENT) {
        return true;
    }

    ctx.has_tag(name)
}

/// Evaluate `expr` under `ctx`, recording every tag it mentions.
pub fn eval(ctx: &BuildContext, expr: &Expr, mut consulted: Option<&mut BTreeSet<String>>) -> bool {
    expr.eval(&mut |tag| match_tag(ctx, tag, consulted.as_deref_mut()))
}
