//! # Go build constraints
//!
//! Turns the two sources of platform requirements in a Go file into data:
//!
//! - the file name suffix (`x_linux_amd64.go`) via [`filename_constraint`]
//! - the directive comments in the file header (`//go:build`, `// +build`)
//!   via [`parse_file_header`] and [`FileHeader::constraint`]
//!
//! ```text
//! file name ──► filename_constraint ──► FilenameConstraint { os, arch }
//!
//! file bytes ──► parse_file_header ──► FileHeader ──► constraint() ──► Expr
//!                                                      │
//!                               parse_go_build ◄───────┤
//!                               parse_plus_build ◄─────┘
//! ```
//!
//! Expressions are plain values; evaluating them against a build
//! configuration is the caller's business ([`Expr::eval`] takes the tag
//! oracle as a closure).
//!
//! ## Example
//!
//! ```
//! use gomatch_constraint::{parse_file_header, Expr};
//!
//! let header = parse_file_header(b"//go:build linux && !cgo\n\npackage p\n").unwrap();
//! let expr = header.constraint().unwrap().unwrap();
//! assert_eq!(expr.to_string(), "linux && !cgo");
//! assert!(expr.eval(&mut |tag| tag == "linux"));
//! ```

mod error;
mod expr;
mod filename;
mod header;
mod parse;

pub use error::{ConstraintError, Result};
pub use expr::{Expr, Polarity};
pub use filename::{filename_constraint, FilenameConstraint};
pub use header::{package_name, parse_file_header, FileHeader};
pub use parse::{is_go_build, is_plus_build, parse_go_build, parse_line, parse_plus_build, IGNORE_TAG};
