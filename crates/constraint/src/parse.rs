use crate::error::{ConstraintError, Result};
use crate::expr::Expr;

const GO_BUILD_PREFIX: &str = "//go:build";
const PLUS_BUILD_PREFIX: &str = "+build";

/// Node limit for `//go:build` expressions.
const MAX_SIZE: usize = 1000;

/// Operator limit for `// +build` lines.
const MAX_OLD_SIZE: usize = 100;

/// Tag substituted for legacy tokens that can never be satisfied.
pub const IGNORE_TAG: &str = "ignore";

/// Reports whether `line` is a `//go:build` constraint line.
#[must_use]
pub fn is_go_build(line: &str) -> bool {
    split_go_build(line).is_some()
}

/// Reports whether `line` is a `// +build` constraint line.
#[must_use]
pub fn is_plus_build(line: &str) -> bool {
    split_plus_build(line).is_some()
}

/// Parse a single constraint line of either syntax.
pub fn parse_line(line: &str) -> Result<Expr> {
    if let Some(text) = split_go_build(line) {
        return parse_go_build(text);
    }
    if let Some(text) = split_plus_build(line) {
        return parse_plus_build(text);
    }
    Err(ConstraintError::NotConstraint)
}

fn split_go_build(line: &str) -> Option<&str> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    if line.contains('\n') || !line.starts_with(GO_BUILD_PREFIX) {
        return None;
    }
    let rest = &line.trim()[GO_BUILD_PREFIX.len()..];
    let text = rest.trim();
    // `//go:buildx` is not a directive; the prefix must be followed by space.
    if text.len() == rest.len() && !rest.is_empty() {
        return None;
    }
    Some(text)
}

fn split_plus_build(line: &str) -> Option<&str> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    if line.contains('\n') {
        return None;
    }
    let rest = line.strip_prefix("//")?.trim();
    let rest = rest.strip_prefix(PLUS_BUILD_PREFIX)?;
    let text = rest.trim();
    if text.len() == rest.len() && !rest.is_empty() {
        return None;
    }
    Some(text)
}

fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn is_valid_tag(word: &str) -> bool {
    !word.is_empty() && word.chars().all(is_tag_char)
}

/// Parse the text of a `// +build` line (after the `+build` marker).
///
/// Space separated terms are ORed, comma separated factors are ANDed.
/// Malformed factors become the tag `ignore` instead of failing.
pub fn parse_plus_build(text: &str) -> Result<Expr> {
    let mut size = 0usize;
    let mut x: Option<Expr> = None;

    for clause in text.split_whitespace() {
        let mut y: Option<Expr> = None;
        for lit in clause.split(',') {
            let z = if lit.starts_with("!!") || lit == "!" {
                Expr::tag(IGNORE_TAG)
            } else {
                let (negated, name) = match lit.strip_prefix('!') {
                    Some(name) => (true, name),
                    None => (false, lit),
                };
                let atom = if is_valid_tag(name) {
                    Expr::tag(name)
                } else {
                    Expr::tag(IGNORE_TAG)
                };
                if negated {
                    Expr::negate(atom)
                } else {
                    atom
                }
            };
            y = Some(match y {
                None => z,
                Some(prev) => {
                    size += 1;
                    if size > MAX_OLD_SIZE {
                        return Err(ConstraintError::TooComplex);
                    }
                    Expr::and(prev, z)
                }
            });
        }
        let Some(y) = y else { continue };
        x = Some(match x {
            None => y,
            Some(prev) => {
                size += 1;
                if size > MAX_OLD_SIZE {
                    return Err(ConstraintError::TooComplex);
                }
                Expr::or(prev, y)
            }
        });
    }

    Ok(x.unwrap_or_else(|| Expr::tag(IGNORE_TAG)))
}

/// Parse the text of a `//go:build` line (after the `//go:build` marker).
pub fn parse_go_build(text: &str) -> Result<Expr> {
    let mut p = ExprParser::new(text);
    let x = p.or()?;
    if !p.tok.is_empty() {
        return Err(ConstraintError::syntax(
            p.pos,
            format!("unexpected token {}", p.tok),
        ));
    }
    Ok(x)
}

/// Recursive descent parser. After each production `tok` holds the
/// lookahead token; an empty `tok` means end of input.
struct ExprParser<'a> {
    s: &'a str,
    i: usize,
    tok: &'a str,
    is_tag: bool,
    pos: usize,
    size: usize,
}

impl<'a> ExprParser<'a> {
    fn new(s: &'a str) -> Self {
        Self {
            s,
            i: 0,
            tok: "",
            is_tag: false,
            pos: 0,
            size: 0,
        }
    }

    fn or(&mut self) -> Result<Expr> {
        let mut x = self.and()?;
        while self.tok == "||" {
            let y = self.and()?;
            x = Expr::or(x, y);
        }
        Ok(x)
    }

    fn and(&mut self) -> Result<Expr> {
        let mut x = self.not()?;
        while self.tok == "&&" {
            let y = self.not()?;
            x = Expr::and(x, y);
        }
        Ok(x)
    }

    fn not(&mut self) -> Result<Expr> {
        self.size += 1;
        if self.size > MAX_SIZE {
            return Err(ConstraintError::TooComplex);
        }
        self.lex()?;
        if self.tok == "!" {
            self.lex()?;
            if self.tok == "!" {
                return Err(ConstraintError::syntax(self.pos, "double negation not allowed"));
            }
            return Ok(Expr::negate(self.atom()?));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expr> {
        if self.tok == "(" {
            let open = self.pos;
            let x = self.or().map_err(|err| match err {
                ConstraintError::Syntax { offset, message }
                    if message == "unexpected end of expression" =>
                {
                    ConstraintError::syntax(offset, "missing close paren")
                }
                other => other,
            })?;
            if self.tok != ")" {
                return Err(ConstraintError::syntax(open, "missing close paren"));
            }
            self.lex()?;
            return Ok(x);
        }

        if !self.is_tag {
            if self.tok.is_empty() {
                return Err(ConstraintError::syntax(
                    self.pos,
                    "unexpected end of expression",
                ));
            }
            return Err(ConstraintError::syntax(
                self.pos,
                format!("unexpected token {}", self.tok),
            ));
        }
        let tag = self.tok;
        self.lex()?;
        Ok(Expr::tag(tag))
    }

    fn lex(&mut self) -> Result<()> {
        self.is_tag = false;
        let bytes = self.s.as_bytes();
        while self.i < bytes.len() && (bytes[self.i] == b' ' || bytes[self.i] == b'\t') {
            self.i += 1;
        }
        if self.i >= bytes.len() {
            self.tok = "";
            self.pos = self.i;
            return Ok(());
        }

        match bytes[self.i] {
            b'(' | b')' | b'!' => {
                self.pos = self.i;
                self.i += 1;
                self.tok = &self.s[self.pos..self.i];
                return Ok(());
            }
            c @ (b'&' | b'|') => {
                if bytes.get(self.i + 1) != Some(&c) {
                    return Err(ConstraintError::syntax(
                        self.i,
                        format!("invalid syntax at {}", char::from(c)),
                    ));
                }
                self.pos = self.i;
                self.i += 2;
                self.tok = &self.s[self.pos..self.i];
                return Ok(());
            }
            _ => {}
        }

        let rest = &self.s[self.i..];
        let len = rest
            .char_indices()
            .find(|&(_, c)| !is_tag_char(c))
            .map_or(rest.len(), |(idx, _)| idx);
        if len == 0 {
            let c = rest.chars().next().unwrap_or_default();
            return Err(ConstraintError::syntax(
                self.i,
                format!("invalid syntax at {c}"),
            ));
        }
        self.pos = self.i;
        self.i += len;
        self.tok = &self.s[self.pos..self.i];
        self.is_tag = true;
        Ok(())
    }
}
