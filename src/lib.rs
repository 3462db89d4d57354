//! A parser, annotator and changelog writer for bracket-tagged commits.
//!
//! A tagged commit starts with one of six codes between brackets, followed by
//! an optional scope and the subject, optionally ending in an issue token:
//!
//! ```text
//! [FIX] api: correct timeout #BUG-42
//! ```
//!
//! # Example
//!
//! ```rust
//! use indoc::indoc;
//! use turbo_commit::{annotate, Commit, Context, TypeCode};
//!
//! let message = indoc!("
//!     [BRK] config: move settings file #OPS-7
//!
//!     The settings file now lives under the XDG config directory.
//!
//!     BREAKING CHANGE: `~/.turbo.toml` is ignored.
//! ");
//!
//! let commit = Commit::parse(message).unwrap();
//!
//! // The header is split into its parts; the subject keeps the issue token.
//! assert_eq!(commit.code(), Some(TypeCode::Brk));
//! assert_eq!(commit.scope(), Some("config"));
//! assert_eq!(commit.subject(), "move settings file #OPS-7");
//! assert_eq!(commit.issue(), Some("#OPS-7"));
//!
//! // Footer lines starting with a note keyword become notes.
//! assert_eq!(commit.notes()[0].title(), "BREAKING CHANGE");
//!
//! // Annotation gets the commit ready for a changelog.
//! let annotated = annotate(&commit, &Context::new());
//! assert_eq!(annotated.type_(), "💥 Breaking Changes");
//! assert_eq!(annotated.subject(), "move settings file ");
//! assert_eq!(annotated.references()[0].issue(), "OPS-7");
//! ```
//!
//! Whole changelogs are written with [`Changelog`].

#![warn(missing_docs)]

mod annotate;
mod commit;
mod error;
mod options;
mod parser;
mod template;
mod writer;

pub use annotate::{annotate, Action, Context, Reference};
pub use commit::{Commit, Note, NoteTitle, Revert, TypeCode};
pub use error::{Error, ErrorKind};
pub use options::{
    CommitField, GroupSort, NoteSort, ParserOptions, RevertField, Transform, WriterOptions,
    COMMIT_PARTIAL, FOOTER_PARTIAL, HEADER_PARTIAL, HEADER_PATTERN, MAIN_TEMPLATE,
    REVERT_PATTERN,
};
pub use writer::{Changelog, CommitGroup, NoteGroup};

#[doc = include_str!("../README.md")]
#[cfg(doctest)]
pub struct ReadmeDoctests;
