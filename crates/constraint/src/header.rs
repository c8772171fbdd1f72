use crate::error::{ConstraintError, Result};
use crate::expr::Expr;
use crate::parse::{is_plus_build, parse_line};

const BOM: &[u8] = b"\xEF\xBB\xBF";
const SLASH_SLASH: &[u8] = b"//";
const SLASH_STAR: &[u8] = b"/*";
const STAR_SLASH: &[u8] = b"*/";
const GO_BUILD: &[u8] = b"//go:build";
const BINARY_ONLY: &[u8] = b"//go:binary-only-package";

/// Limit on `// +build` lines combined into one expression.
const MAX_PLUS_BUILD_LINES: usize = 1000;

/// Build directives found in the leading comments of a Go file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHeader {
    /// The `//go:build` line, trimmed.
    pub go_build: Option<String>,
    /// `// +build` lines in the directive block, trimmed, in file order.
    pub plus_build: Vec<String>,
    /// Whether `//go:binary-only-package` was present.
    pub binary_only: bool,
}

impl FileHeader {
    /// Whether the file carries any build constraint.
    #[must_use]
    pub fn is_constrained(&self) -> bool {
        self.go_build.is_some() || !self.plus_build.is_empty()
    }

    /// The expression governing the file: the `//go:build` line if present,
    /// otherwise every `// +build` line ANDed together. `None` means the file
    /// is unconstrained. More than 1000 `// +build` lines is
    /// [`ConstraintError::TooComplex`].
    pub fn constraint(&self) -> Result<Option<Expr>> {
        if let Some(line) = &self.go_build {
            return parse_line(line).map(Some);
        }

        if self.plus_build.len() > MAX_PLUS_BUILD_LINES {
            return Err(ConstraintError::TooComplex);
        }

        let mut x: Option<Expr> = None;
        for line in &self.plus_build {
            let y = parse_line(line)?;
            x = Some(match x {
                None => y,
                Some(prev) => Expr::and(prev, y),
            });
        }
        Ok(x)
    }
}

/// Scan the header of a Go source file for build directives.
///
/// `// +build` lines only count inside the leading run of comments and blank
/// lines that ends at the last blank line before the first line of code.
/// The `//go:build` line may appear anywhere in the leading comments, but not
/// inside a `/* */` comment.
pub fn parse_file_header(content: &[u8]) -> Result<FileHeader> {
    let content = content.strip_prefix(BOM).unwrap_or(content);

    let mut header = FileHeader::default();
    let mut end = 0usize;
    let mut ended = false;
    let mut in_slash_star = false;
    let mut offset = 0usize;

    'lines: while offset < content.len() {
        let rest = &content[offset..];
        let (raw, next) = match rest.iter().position(|&b| b == b'\n') {
            Some(i) => (&rest[..i], offset + i + 1),
            None => (rest, content.len()),
        };
        offset = next;

        let mut line = raw.trim_ascii();
        if line.is_empty() && !ended {
            end = offset;
            continue;
        }
        if !line.starts_with(SLASH_SLASH) {
            ended = true;
        }

        if !in_slash_star && is_go_build_comment(line) {
            if header.go_build.is_some() {
                return Err(ConstraintError::MultipleGoBuild);
            }
            header.go_build = Some(String::from_utf8_lossy(line).into_owned());
        }
        if !in_slash_star && line == BINARY_ONLY {
            header.binary_only = true;
        }

        while !line.is_empty() {
            if in_slash_star {
                match find(line, STAR_SLASH) {
                    Some(i) => {
                        in_slash_star = false;
                        line = line[i + STAR_SLASH.len()..].trim_ascii();
                        continue;
                    }
                    None => continue 'lines,
                }
            }
            if line.starts_with(SLASH_SLASH) {
                continue 'lines;
            }
            if line.starts_with(SLASH_STAR) {
                in_slash_star = true;
                line = line[SLASH_STAR.len()..].trim_ascii();
                continue;
            }
            break 'lines;
        }
    }

    header.plus_build = content[..end]
        .split(|&b| b == b'\n')
        .map(<[u8]>::trim_ascii)
        .filter(|line| line.starts_with(SLASH_SLASH) && find(line, b"+build").is_some())
        .map(|line| String::from_utf8_lossy(line).into_owned())
        .filter(|line| is_plus_build(line))
        .collect();

    log::trace!(
        "file header: go:build={:?}, {} +build line(s), binary_only={}",
        header.go_build,
        header.plus_build.len(),
        header.binary_only
    );
    Ok(header)
}

fn is_go_build_comment(line: &[u8]) -> bool {
    let Some(rest) = line.trim_ascii().strip_prefix(GO_BUILD) else {
        return false;
    };
    rest.is_empty() || rest.trim_ascii().len() < rest.len()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Read the package name from the package clause, skipping leading comments
/// and whitespace.
pub fn package_name(content: &[u8]) -> Result<String> {
    let content = content.strip_prefix(BOM).unwrap_or(content);
    let rest = skip_space_and_comments(content);
    let rest = rest
        .strip_prefix(b"package")
        .ok_or(ConstraintError::MissingPackage)?;

    let after = skip_space_and_comments(rest);
    if after.len() == rest.len() {
        // `packagefoo`
        return Err(ConstraintError::MissingPackage);
    }

    let text = String::from_utf8_lossy(after);
    let name: String = text
        .chars()
        .take_while(|&c| c.is_alphanumeric() || c == '_')
        .collect();
    match name.chars().next() {
        Some(first) if !first.is_ascii_digit() => Ok(name),
        _ => Err(ConstraintError::MissingPackage),
    }
}

fn skip_space_and_comments(mut s: &[u8]) -> &[u8] {
    loop {
        let trimmed = s.trim_ascii_start();
        if let Some(rest) = trimmed.strip_prefix(SLASH_SLASH) {
            s = match rest.iter().position(|&b| b == b'\n') {
                Some(i) => &rest[i + 1..],
                None => &[],
            };
        } else if let Some(rest) = trimmed.strip_prefix(SLASH_STAR) {
            s = match find(rest, STAR_SLASH) {
                Some(i) => &rest[i + STAR_SLASH.len()..],
                None => &[],
            };
        } else {
            return trimmed;
        }
    }
}
