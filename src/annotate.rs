//! Turning a parsed commit into a display-ready one.

use std::borrow::Cow;

use crate::{Commit, TypeCode};

/// Render-time values shared by every commit of a changelog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Context<'c> {
    version: Option<&'c str>,
    date: Option<&'c str>,
}

impl<'c> Context<'c> {
    /// An empty context.
    pub const fn new() -> Self {
        Self {
            version: None,
            date: None,
        }
    }

    /// Set the version being released.
    pub fn with_version(mut self, version: &'c str) -> Self {
        self.version = Some(version);
        self
    }

    /// Set the release date, already formatted.
    pub fn with_date(mut self, date: &'c str) -> Self {
        self.date = Some(date);
        self
    }

    /// The version being released.
    pub const fn version(&self) -> Option<&'c str> {
        self.version
    }

    /// The release date.
    pub const fn date(&self) -> Option<&'c str> {
        self.date
    }
}

/// What a commit does to the issue it references.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Action {
    /// The commit closes the issue.
    Closes,
}

impl Action {
    /// Access `str` representation of Action
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Closes => "closes",
        }
    }
}

/// A link from a commit to an issue tracker item.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reference<'a> {
    action: Action,
    owner: Option<&'a str>,
    repository: Option<&'a str>,
    issue: &'a str,
    raw: &'a str,
    prefix: &'static str,
}

impl<'a> Reference<'a> {
    /// A reference closing the issue spelled `raw`, e.g. `#PROJ-123`.
    pub fn closes(raw: &'a str) -> Self {
        Self {
            action: Action::Closes,
            owner: None,
            repository: None,
            issue: raw.strip_prefix('#').unwrap_or(raw),
            raw,
            prefix: "#",
        }
    }

    /// What the commit does to the issue.
    pub const fn action(&self) -> Action {
        self.action
    }

    /// The repository owner; never resolved here.
    pub const fn owner(&self) -> Option<&'a str> {
        self.owner
    }

    /// The repository name; never resolved here.
    pub const fn repository(&self) -> Option<&'a str> {
        self.repository
    }

    /// The issue identifier without its prefix, e.g. `PROJ-123`.
    pub const fn issue(&self) -> &'a str {
        self.issue
    }

    /// The issue token as written in the commit.
    pub const fn raw(&self) -> &'a str {
        self.raw
    }

    /// The prefix stripped from `raw`.
    pub const fn prefix(&self) -> &'static str {
        self.prefix
    }
}

/// Prepare a commit for the changelog.
///
/// - A known type code is replaced by its section title, see
///   [`TypeCode::label`]. Anything else is kept as is, so annotating twice
///   leaves the type alone.
/// - When the commit has an issue, the first occurrence of the issue token is
///   cut out of the subject and the references are replaced by a single
///   [`Reference`] closing it. Whitespace around the removed token is left in
///   place.
///
/// `context` is not consulted. The input is left untouched; a new commit is
/// returned.
///
/// ```rust
/// use turbo_commit::{annotate, Commit, Context};
///
/// let commit = Commit::parse("[FIX] api: correct timeout #BUG-42").unwrap();
/// let annotated = annotate(&commit, &Context::new());
///
/// assert_eq!(annotated.type_(), "🐛 Bug Fixes");
/// assert_eq!(annotated.subject(), "correct timeout ");
/// assert_eq!(annotated.references()[0].issue(), "BUG-42");
/// ```
pub fn annotate<'a>(commit: &Commit<'a>, _context: &Context<'_>) -> Commit<'a> {
    let mut annotated = commit.clone();

    if let Some(code) = TypeCode::from_code(commit.ty) {
        annotated.ty = code.label();
    }

    if let Some(issue) = commit.issue.filter(|issue| !issue.is_empty()) {
        annotated.subject = remove_first(&commit.subject, issue);
        annotated.references = vec![Reference::closes(issue)];
    }

    annotated
}

fn remove_first<'a>(subject: &Cow<'a, str>, needle: &str) -> Cow<'a, str> {
    let text: &str = subject;
    match text.find(needle) {
        Some(at) => Cow::Owned([&text[..at], &text[at + needle.len()..]].concat()),
        None => subject.clone(),
    }
}
