use thiserror::Error;

use gomatch_constraint::ConstraintError;

/// Why no context could be found for a file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchErrorKind {
    /// The file's build directives are malformed.
    #[error(transparent)]
    Syntax(#[from] ConstraintError),

    /// The expression cannot hold with the configured Go release.
    #[error("cannot satisfy go version: {tag}")]
    ImpossibleVersion { tag: String },

    /// The file requires the other compiler.
    #[error("compiler mismatch: {required}")]
    CompilerMismatch { required: String },

    /// The file excludes the configured compiler.
    #[error("compiler negated: {compiler}")]
    CompilerNegated { compiler: String },

    /// Every resolution strategy failed.
    #[error("cannot match context to file")]
    NoMatch,
}

impl MatchErrorKind {
    /// Whether retrying with a different starting context is pointless.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::ImpossibleVersion { .. }
                | Self::CompilerMismatch { .. }
                | Self::CompilerNegated { .. }
        )
    }
}

/// A failure to match a context to the file at `path`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot match {path}: {kind}")]
pub struct MatchError {
    pub path: String,
    /// The failure does not depend on the starting context.
    pub permanent: bool,
    #[source]
    pub kind: MatchErrorKind,
}

impl MatchError {
    pub fn new(path: impl Into<String>, kind: MatchErrorKind) -> Self {
        Self {
            path: path.into(),
            permanent: kind.is_permanent(),
            kind,
        }
    }

    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.permanent
    }
}
