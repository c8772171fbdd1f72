use gomatch_constraint::{package_name, parse_file_header};
use gomatch_matcher::{BuildContext, MatchError};
use gomatch_platform::known::{COMPILER_GC, EXPERIMENT_PREFIX};
use serde::Serialize;

/// What the tool found for one file.
#[derive(Debug, Serialize)]
pub struct FileReport {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// Normalized constraint expression, if the file has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Matched { context: BuildContext },
    Failed { error: String, permanent: bool },
}

impl FileReport {
    pub fn new(path: &str, source: &[u8], result: Result<BuildContext, MatchError>) -> Self {
        let constraint = parse_file_header(source)
            .ok()
            .and_then(|header| header.constraint().ok().flatten())
            .map(|expr| expr.to_string());
        let outcome = match result {
            Ok(context) => Outcome::Matched { context },
            Err(err) => Outcome::Failed {
                error: err.kind.to_string(),
                permanent: err.permanent,
            },
        };
        Self {
            path: path.to_string(),
            package: package_name(source).ok(),
            constraint,
            outcome,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failed { .. })
    }

    /// One line: `path: GOOS=.. GOARCH=.. CGO_ENABLED=..` plus any compiler,
    /// tags and experiments that differ from a plain build.
    pub fn render_text(&self) -> String {
        match &self.outcome {
            Outcome::Matched { context } => format!("{}: {}", self.path, render_env(context)),
            Outcome::Failed { error, permanent } => {
                let mut line = format!("{}: error: {error}", self.path);
                if *permanent {
                    line.push_str(" (permanent)");
                }
                line
            }
        }
    }
}

fn render_env(ctx: &BuildContext) -> String {
    let mut parts = vec![
        format!("GOOS={}", ctx.goos),
        format!("GOARCH={}", ctx.goarch),
        format!("CGO_ENABLED={}", u8::from(ctx.cgo_enabled)),
    ];

    let experiments: Vec<&str> = ctx
        .tool_tags
        .iter()
        .filter_map(|tag| tag.strip_prefix(EXPERIMENT_PREFIX))
        .collect();
    if !experiments.is_empty() {
        parts.push(format!("GOEXPERIMENT={}", experiments.join(",")));
    }
    if ctx.compiler != COMPILER_GC {
        parts.push(format!("-compiler={}", ctx.compiler));
    }
    if !ctx.build_tags.is_empty() {
        let tags: Vec<&str> = ctx.build_tags.iter().map(String::as_str).collect();
        parts.push(format!("-tags={}", tags.join(",")));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use gomatch_matcher::MatchErrorKind;
    use pretty_assertions::assert_eq;

    const SRC: &[u8] = b"// +build linux,amd64\n\npackage sys\n";

    #[test]
    fn renders_matched_context() {
        let ctx = BuildContext::new("linux", "amd64")
            .with_cgo(true)
            .with_build_tags(["purego", "netgo"])
            .with_tool_tags(["goexperiment.arenas"])
            .with_compiler("gccgo");
        let report = FileReport::new("sys/a.go", SRC, Ok(ctx));

        assert!(!report.is_failure());
        assert_eq!(report.package.as_deref(), Some("sys"));
        assert_eq!(report.constraint.as_deref(), Some("linux && amd64"));
        assert_eq!(
            report.render_text(),
            "sys/a.go: GOOS=linux GOARCH=amd64 CGO_ENABLED=1 GOEXPERIMENT=arenas \
             -compiler=gccgo -tags=netgo,purego"
        );
    }

    #[test]
    fn renders_permanent_failure() {
        let err = MatchError::new(
            "b.go",
            MatchErrorKind::ImpossibleVersion {
                tag: "go1.99".to_string(),
            },
        );
        let report = FileReport::new("b.go", b"//go:build go1.99\n\npackage b\n", Err(err));

        assert!(report.is_failure());
        let line = report.render_text();
        assert!(line.starts_with("b.go: error: "), "{line}");
        assert!(line.contains("go1.99"), "{line}");
        assert!(line.ends_with("(permanent)"), "{line}");
    }

    #[test]
    fn json_flattens_outcome() {
        let report = FileReport::new("c.go", b"package c\n", Ok(BuildContext::new("js", "wasm")));
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["status"], "matched");
        assert_eq!(value["package"], "c");
        assert_eq!(value["context"]["goos"], "js");
        assert!(value.get("constraint").is_none());
    }
}
