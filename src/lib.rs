//! A `file(1)`-style content sniffer.
//!
//! A [`RuleSet`] is parsed from a line-oriented table of magic-number
//! rules and evaluated against any seekable byte source. Rules are tried
//! in file order; the first one whose decoded match data equals the bytes
//! read at its resolved offset supplies the classification, either a MIME
//! type or a free-text description. When nothing matches, the caller's
//! default is returned instead.
//!
//! ```
//! use mime_magic::{MatchResult, RuleSet};
//! use std::io::Cursor;
//!
//! let rules = RuleSet::parse("0 beshort 0xffd8 image/jpeg");
//! let mut source = Cursor::new(vec![0xff, 0xd8, 0xff, 0xe0]);
//! assert_eq!(
//!     MatchResult::Matches("image/jpeg".to_string()),
//!     rules.classify(&mut source),
//! );
//! ```

pub mod error;
pub mod escape;
pub mod magic;
pub mod parser;
pub mod rule;

pub use crate::error::{SniffResult, SnifferError};
pub use crate::magic::{MatchResult, RuleSet};
pub use crate::rule::{MatchType, Rule};
