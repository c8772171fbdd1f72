use gomatch_platform::known::{is_known_arch, is_known_os};

/// Platform a file name restricts its file to, e.g. `x_linux_amd64.go`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilenameConstraint {
    pub os: Option<String>,
    pub arch: Option<String>,
}

impl FilenameConstraint {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.os.is_none() && self.arch.is_none()
    }

    /// The mandated tags, OS first.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.os.as_deref().into_iter().chain(self.arch.as_deref())
    }
}

/// Apply the `name_GOOS_GOARCH` suffix rule to the base name of `path`.
///
/// A name with no `_` before its first `.` (such as `linux.go`) is
/// unconstrained, and a trailing `_test` is ignored.
#[must_use]
pub fn filename_constraint(path: &str) -> FilenameConstraint {
    let base = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let stem = base.split('.').next().unwrap_or(base);
    let Some(i) = stem.find('_') else {
        return FilenameConstraint::default();
    };

    let mut parts: Vec<&str> = stem[i..].split('_').collect();
    if parts.last() == Some(&"test") {
        parts.pop();
    }

    let n = parts.len();
    if n >= 2 && is_known_os(parts[n - 2]) && is_known_arch(parts[n - 1]) {
        return FilenameConstraint {
            os: Some(parts[n - 2].to_string()),
            arch: Some(parts[n - 1].to_string()),
        };
    }
    match parts.last() {
        Some(last) if is_known_os(last) => FilenameConstraint {
            os: Some((*last).to_string()),
            arch: None,
        },
        Some(last) if is_known_arch(last) => FilenameConstraint {
            os: None,
            arch: Some((*last).to_string()),
        },
        _ => FilenameConstraint::default(),
    }
}
