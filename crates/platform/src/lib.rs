//! # Go platform knowledge
//!
//! Static tables about the Go toolchain that the constraint parser and the
//! context matcher consult: the known `GOOS`/`GOARCH` names, the supported
//! `GOOS/GOARCH` pairs with their cgo capability, and the preference order
//! in which alternative platforms are tried.
//!
//! ```text
//! ┌──────────────┐   ┌────────────────┐   ┌──────────────────┐
//! │ known names  │   │ platform table │   │   host platform  │
//! │ (known.rs)   │   │ (table.rs)     │   │   (host.rs)      │
//! └──────┬───────┘   └───────┬────────┘   └────────┬─────────┘
//!        │                   ▼                     │
//!        │           ┌────────────────┐            │
//!        └─────────► │ KnowledgeBase  │ ◄──────────┘
//!                    │ pairs, cgo,    │
//!                    │ preference     │
//!                    └────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use gomatch_platform::KnowledgeBase;
//!
//! let kb = KnowledgeBase::builtin();
//! assert!(kb.is_valid_pair("linux", "arm64"));
//! assert!(!kb.cgo_supported("js", "wasm"));
//! ```

mod error;
mod host;
pub mod known;
mod knowledge;
mod table;

pub use error::{PlatformError, Result};
pub use host::{goarch_from_rust, goos_from_rust, HostPlatform};
pub use knowledge::KnowledgeBase;
pub use table::{default_platforms, sort_by_preference, GoPlatform};
