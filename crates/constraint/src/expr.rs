use std::collections::BTreeSet;
use std::fmt;

/// A build constraint expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Tag(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

/// The value an expression needs a tag to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    #[must_use]
    pub fn is_positive(self) -> bool {
        self == Self::Positive
    }

    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            Self::Positive => Self::Negative,
            Self::Negative => Self::Positive,
        }
    }
}

impl Expr {
    pub fn tag(name: impl Into<String>) -> Self {
        Self::Tag(name.into())
    }

    #[must_use]
    pub fn negate(x: Expr) -> Self {
        Self::Not(Box::new(x))
    }

    #[must_use]
    pub fn and(x: Expr, y: Expr) -> Self {
        Self::And(Box::new(x), Box::new(y))
    }

    #[must_use]
    pub fn or(x: Expr, y: Expr) -> Self {
        Self::Or(Box::new(x), Box::new(y))
    }

    /// Evaluate the expression, asking `ok` for the value of each tag.
    ///
    /// Both operands of `&&` and `||` are always evaluated so that `ok` sees
    /// every tag the expression mentions.
    pub fn eval<F>(&self, ok: &mut F) -> bool
    where
        F: FnMut(&str) -> bool,
    {
        match self {
            Self::Tag(name) => ok(name),
            Self::Not(x) => !x.eval(ok),
            Self::And(x, y) => {
                let left = x.eval(ok);
                let right = y.eval(ok);
                left && right
            }
            Self::Or(x, y) => {
                let left = x.eval(ok);
                let right = y.eval(ok);
                left || right
            }
        }
    }

    /// Three-valued evaluation: `value` returns `None` for tags that are
    /// free. The result is `None` unless the pinned tags alone decide it.
    pub fn partial_eval<F>(&self, value: &mut F) -> Option<bool>
    where
        F: FnMut(&str) -> Option<bool>,
    {
        match self {
            Self::Tag(name) => value(name),
            Self::Not(x) => x.partial_eval(value).map(|v| !v),
            Self::And(x, y) => {
                let left = x.partial_eval(value);
                let right = y.partial_eval(value);
                match (left, right) {
                    (Some(false), _) | (_, Some(false)) => Some(false),
                    (Some(true), Some(true)) => Some(true),
                    _ => None,
                }
            }
            Self::Or(x, y) => {
                let left = x.partial_eval(value);
                let right = y.partial_eval(value);
                match (left, right) {
                    (Some(true), _) | (_, Some(true)) => Some(true),
                    (Some(false), Some(false)) => Some(false),
                    _ => None,
                }
            }
        }
    }

    /// Polarity of the first occurrence of `tag`, or `None` if the
    /// expression never mentions it.
    #[must_use]
    pub fn lookup(&self, tag: &str) -> Option<Polarity> {
        match self {
            Self::Tag(name) => (name == tag).then_some(Polarity::Positive),
            Self::Not(x) => x.lookup(tag).map(Polarity::flip),
            Self::And(x, y) | Self::Or(x, y) => x.lookup(tag).or_else(|| y.lookup(tag)),
        }
    }

    /// Every tag mentioned by the expression.
    #[must_use]
    pub fn tags(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_tags(&mut out);
        out
    }

    fn collect_tags(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::Tag(name) => {
                out.insert(name.clone());
            }
            Self::Not(x) => x.collect_tags(out),
            Self::And(x, y) | Self::Or(x, y) => {
                x.collect_tags(out);
                y.collect_tags(out);
            }
        }
    }
}

/// Formats in `//go:build` syntax, adding only the parentheses needed.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(name) => f.write_str(name),
            Self::Not(x) => match x.as_ref() {
                Self::Not(..) | Self::And(..) | Self::Or(..) => write!(f, "!({x})"),
                _ => write!(f, "!{x}"),
            },
            Self::And(x, y) => {
                write_operand(f, x, matches!(x.as_ref(), Self::Or(..)))?;
                f.write_str(" && ")?;
                write_operand(f, y, matches!(y.as_ref(), Self::Or(..)))
            }
            Self::Or(x, y) => {
                write_operand(f, x, matches!(x.as_ref(), Self::And(..)))?;
                f.write_str(" || ")?;
                write_operand(f, y, matches!(y.as_ref(), Self::And(..)))
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, x: &Expr, paren: bool) -> fmt::Result {
    if paren {
        write!(f, "({x})")
    } else {
        write!(f, "{x}")
    }
}
