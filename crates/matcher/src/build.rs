use std::collections::BTreeSet;

use gomatch_constraint::{
    filename_constraint, parse_file_header, parse_line, ConstraintError,
};

use crate::context::BuildContext;
use crate::oracle::{eval, match_tag};

/// Outcome of checking a file's header against a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildCheck {
    pub should_build: bool,
    /// The file carries `//go:binary-only-package`.
    pub binary_only: bool,
}

/// Reports whether the `_GOOS`/`_GOARCH` suffix of `name` is satisfied by `ctx`.
pub fn good_os_arch_file(
    ctx: &BuildContext,
    name: &str,
    mut consulted: Option<&mut BTreeSet<String>>,
) -> bool {
    let required = filename_constraint(name);
    let mut ok = true;
    if let Some(arch) = &required.arch {
        ok &= match_tag(ctx, arch, consulted.as_deref_mut());
    }
    if let Some(os) = &required.os {
        ok &= match_tag(ctx, os, consulted.as_deref_mut());
    }
    ok
}

/// Reports whether the build directives in `content` select the file under
/// `ctx`.
///
/// A `//go:build` line governs when present and a malformed one is an error.
/// Otherwise every `// +build` line must hold; lines that fail to parse are
/// skipped.
pub fn should_build(
    ctx: &BuildContext,
    content: &[u8],
    mut consulted: Option<&mut BTreeSet<String>>,
) -> Result<BuildCheck, ConstraintError> {
    let header = parse_file_header(content)?;

    let should_build = match &header.go_build {
        Some(line) => {
            let expr = parse_line(line)?;
            eval(ctx, &expr, consulted)
        }
        None => {
            let mut ok = true;
            for line in &header.plus_build {
                match parse_line(line) {
                    Ok(expr) => ok &= eval(ctx, &expr, consulted.as_deref_mut()),
                    Err(err) => log::debug!("skipping {line:?}: {err}"),
                }
            }
            ok
        }
    };

    Ok(BuildCheck {
        should_build,
        binary_only: header.binary_only,
    })
}

/// Reports whether `ctx` selects the file: its name suffix and its build
/// directives must both hold.
pub fn match_file(
    ctx: &BuildContext,
    filename: &str,
    content: &[u8],
) -> Result<bool, ConstraintError> {
    if !good_os_arch_file(ctx, filename, None) {
        return Ok(false);
    }
    Ok(should_build(ctx, content, None)?.should_build)
}

/// Every tag referenced by the file name and the build directives of a file.
/// Headers that fail to parse contribute nothing.
#[must_use]
pub fn collect_tags(filename: &str, content: &[u8]) -> BTreeSet<String> {
    let mut tags: BTreeSet<String> = filename_constraint(filename)
        .tags()
        .map(str::to_string)
        .collect();

    let Ok(header) = parse_file_header(content) else {
        return tags;
    };
    let lines = header.go_build.iter().chain(header.plus_build.iter());
    for line in lines {
        if let Ok(expr) = parse_line(line) {
            tags.extend(expr.tags());
        }
    }
    tags
}
