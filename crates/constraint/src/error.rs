use thiserror::Error;

/// Result type for constraint parsing
pub type Result<T> = std::result::Result<T, ConstraintError>;

/// Errors that can occur while reading build constraints
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstraintError {
    /// Malformed `//go:build` expression
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// More than one `//go:build` line in the file header
    #[error("multiple //go:build comments")]
    MultipleGoBuild,

    /// Expression exceeds the parser's size limit
    #[error("build expression too large")]
    TooComplex,

    /// The line is neither a `//go:build` nor a `// +build` line
    #[error("not a build constraint")]
    NotConstraint,

    /// No `package` clause where one was expected
    #[error("expected 'package' clause")]
    MissingPackage,
}

impl ConstraintError {
    /// Create a syntax error
    pub fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            message: message.into(),
        }
    }
}
