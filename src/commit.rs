//! The tagged commit record and the pieces parsed out of a commit message.

use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use winnow::Parser;

use crate::annotate::Reference;
use crate::options::{CommitField, ParserOptions};
use crate::{Error, ErrorKind};

/// One of the six tags a commit header starts with.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeCode {
    /// `[ADD]`: new functionality.
    #[cfg_attr(feature = "serde", serde(rename = "ADD"))]
    Add,
    /// `[FIX]`: bug fix.
    #[cfg_attr(feature = "serde", serde(rename = "FIX"))]
    Fix,
    /// `[MOD]`: change to existing behavior.
    #[cfg_attr(feature = "serde", serde(rename = "MOD"))]
    Mod,
    /// `[DEL]`: removal.
    #[cfg_attr(feature = "serde", serde(rename = "DEL"))]
    Del,
    /// `[REF]`: refactoring without behavior change.
    #[cfg_attr(feature = "serde", serde(rename = "REF"))]
    Ref,
    /// `[BRK]`: breaking change.
    #[cfg_attr(feature = "serde", serde(rename = "BRK"))]
    Brk,
}

impl TypeCode {
    /// Every known code, in declaration order.
    pub const ALL: [TypeCode; 6] = [
        TypeCode::Add,
        TypeCode::Fix,
        TypeCode::Mod,
        TypeCode::Del,
        TypeCode::Ref,
        TypeCode::Brk,
    ];

    /// Access `str` representation of the code, as written between the brackets.
    pub const fn as_str(self) -> &'static str {
        match self {
            TypeCode::Add => "ADD",
            TypeCode::Fix => "FIX",
            TypeCode::Mod => "MOD",
            TypeCode::Del => "DEL",
            TypeCode::Ref => "REF",
            TypeCode::Brk => "BRK",
        }
    }

    /// Look up the code written between the brackets, e.g. `ADD`.
    pub fn from_code(code: &str) -> Option<Self> {
        TypeCode::ALL.into_iter().find(|c| c.as_str() == code)
    }

    /// The changelog section title for this code.
    pub const fn label(self) -> &'static str {
        match self {
            TypeCode::Add => "🚀 Features",
            TypeCode::Fix => "🐛 Bug Fixes",
            TypeCode::Mod => "🔧 Changes",
            TypeCode::Del => "🗑️ Removals",
            TypeCode::Ref => "♻️ Refactor",
            TypeCode::Brk => "💥 Breaking Changes",
        }
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeCode::from_code(s).ok_or_else(|| {
            Error::new(ErrorKind::InvalidType).set_context(Box::new(format!("{s:?}")))
        })
    }
}

/// A tagged commit.
///
/// Produced by [`Commit::parse`] from a raw message, or built by hand with
/// [`Commit::new`]. Parsed commits borrow from the message they came from.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit<'a> {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub(crate) ty: &'a str,
    pub(crate) scope: Option<&'a str>,
    pub(crate) subject: Cow<'a, str>,
    pub(crate) issue: Option<&'a str>,
    pub(crate) references: Vec<Reference<'a>>,
    pub(crate) header: Option<&'a str>,
    pub(crate) body: Option<&'a str>,
    pub(crate) notes: Vec<Note<'a>>,
    pub(crate) hash: Option<&'a str>,
}

impl<'a> Commit<'a> {
    /// Create a commit from its type and subject, without going through the
    /// header grammar.
    ///
    /// Unlike [`Commit::parse`], any type is accepted.
    pub fn new(ty: &'a str, subject: impl Into<Cow<'a, str>>) -> Self {
        Self {
            ty,
            scope: None,
            subject: subject.into(),
            issue: None,
            references: Vec::new(),
            header: None,
            body: None,
            notes: Vec::new(),
            hash: None,
        }
    }

    /// Set the scope.
    pub fn with_scope(mut self, scope: &'a str) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Set the issue token, e.g. `#PROJ-123`.
    pub fn with_issue(mut self, issue: &'a str) -> Self {
        self.issue = Some(issue);
        self
    }

    /// Set the commit hash.
    pub fn with_hash(mut self, hash: &'a str) -> Self {
        self.hash = Some(hash);
        self
    }

    /// Attach a footer note.
    pub fn with_note(mut self, note: Note<'a>) -> Self {
        self.notes.push(note);
        self
    }

    /// Parse a commit message with the default [`ParserOptions`].
    ///
    /// # Errors
    ///
    /// This function returns an error if the first line of the message is not
    /// a tagged header.
    pub fn parse(message: &'a str) -> Result<Self, Error> {
        Self::parse_with(message, &ParserOptions::default())
    }

    /// Parse a commit message.
    ///
    /// Leading blank lines are skipped; the first line after them is the
    /// header. Everything after it is body, up to the
    /// first line starting with one of [`ParserOptions::note_keywords`]; from
    /// there on the message is split into notes.
    ///
    /// # Errors
    ///
    /// This function returns an error if the first line of the message is not
    /// a tagged header.
    pub fn parse_with(message: &'a str, options: &ParserOptions) -> Result<Self, Error> {
        let message = message.trim_start_matches(['\r', '\n']);
        let (line, remainder) = match message.split_once('\n') {
            Some((line, remainder)) => (line, remainder),
            None => (message, ""),
        };
        let line = line.trim_end();

        let (ty, scope, subject, issue) = crate::parser::header
            .parse(line)
            .map_err(|err| Error::with_parser(message, err.into_inner()))?;
        let (body, notes) = split_footer(remainder, &options.note_keywords);

        Ok(Self {
            ty,
            scope,
            subject: Cow::Borrowed(subject),
            issue,
            references: Vec::new(),
            header: Some(line),
            body,
            notes,
            hash: None,
        })
    }

    /// The type of the commit: a code before annotation, a section title after.
    pub fn type_(&self) -> &'a str {
        self.ty
    }

    /// The type as a known code, if it is one.
    pub fn code(&self) -> Option<TypeCode> {
        TypeCode::from_code(self.ty)
    }

    /// The optional scope of the commit.
    pub fn scope(&self) -> Option<&'a str> {
        self.scope
    }

    /// The commit subject.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The issue token ending the header, including its `#`.
    pub fn issue(&self) -> Option<&'a str> {
        self.issue
    }

    /// Issue links attached by annotation.
    pub fn references(&self) -> &[Reference<'a>] {
        &self.references
    }

    /// The header line, for parsed commits.
    pub fn header(&self) -> Option<&'a str> {
        self.header
    }

    /// The free-form text between the header and the first note.
    pub fn body(&self) -> Option<&'a str> {
        self.body
    }

    /// Breaking-change notes found in the footer.
    pub fn notes(&self) -> &[Note<'a>] {
        &self.notes
    }

    /// The commit hash, when known.
    pub fn hash(&self) -> Option<&'a str> {
        self.hash
    }

    /// Look up a field by name.
    pub fn field(&self, field: CommitField) -> Option<&str> {
        match field {
            CommitField::Type => Some(self.ty),
            CommitField::Scope => self.scope,
            CommitField::Subject => Some(&*self.subject),
            CommitField::Issue => self.issue,
            CommitField::Hash => self.hash,
        }
    }
}

impl fmt::Display for Commit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.ty)?;

        if let Some(scope) = self.scope {
            write!(f, "{scope}: ")?;
        }

        f.write_str(&self.subject)
    }
}

fn split_footer<'a, K: AsRef<str>>(
    remainder: &'a str,
    keywords: &[K],
) -> (Option<&'a str>, Vec<Note<'a>>) {
    let mut body_end = remainder.len();
    let mut notes: Vec<(&'a str, usize, usize)> = Vec::new();

    let mut offset = 0;
    for line in remainder.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let content = line.trim_end();

        let mut input = content;
        if let Ok((title, text)) = crate::parser::note(&mut input, keywords) {
            if notes.is_empty() {
                body_end = start;
            }
            let text_start = start + content.len() - text.len();
            notes.push((title, text_start, start + content.len()));
        } else if let Some((_, _, end)) = notes.last_mut() {
            *end = start + content.len();
        }
    }

    let body = Some(remainder[..body_end].trim()).filter(|b| !b.is_empty());
    let notes = notes
        .into_iter()
        .map(|(title, start, end)| Note::new(title, remainder[start..end].trim()))
        .collect();
    (body, notes)
}

/// A footer note, such as a `BREAKING CHANGE:` explanation.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note<'a> {
    title: NoteTitle<'a>,
    text: &'a str,
}

impl<'a> Note<'a> {
    /// Piece together a note.
    pub const fn new(title: &'a str, text: &'a str) -> Self {
        Self {
            title: NoteTitle::new_unchecked(title),
            text,
        }
    }

    /// The keyword that introduced the note, as written.
    pub const fn title(&self) -> NoteTitle<'a> {
        self.title
    }

    /// The note text, including continuation lines.
    pub const fn text(&self) -> &'a str {
        self.text
    }
}

/// The keyword of a note; compares case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteTitle<'a>(unicase::UniCase<&'a str>);

impl<'a> NoteTitle<'a> {
    /// Wrap a keyword without checking it against the configured keywords.
    pub const fn new_unchecked(value: &'a str) -> Self {
        NoteTitle(unicase::UniCase::unicode(value))
    }

    /// Access `str` representation
    pub fn as_str(&self) -> &'a str {
        self.0.into_inner()
    }
}

impl Deref for NoteTitle<'_> {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl PartialEq<&'_ str> for NoteTitle<'_> {
    fn eq(&self, other: &&str) -> bool {
        *self == NoteTitle::new_unchecked(other)
    }
}

impl fmt::Display for NoteTitle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for NoteTitle<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self)
    }
}

/// The target of a `revert: <header> This reverts commit <hash>.` message.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Revert<'a> {
    header: &'a str,
    hash: &'a str,
}

impl<'a> Revert<'a> {
    /// Recognize a revert message.
    pub fn parse(message: &'a str) -> Option<Self> {
        let mut input = message;
        crate::parser::revert(&mut input)
            .ok()
            .map(|(header, hash)| Self { header, hash })
    }

    /// The header of the reverted commit.
    pub const fn header(&self) -> &'a str {
        self.header
    }

    /// The hash of the reverted commit; may be empty.
    pub const fn hash(&self) -> &'a str {
        self.hash
    }

    /// Whether `commit` is the one this revert undoes.
    ///
    /// Headers must be equal. When both sides carry a hash, one must be a
    /// prefix of the other, so abbreviated hashes match.
    pub fn reverts(&self, commit: &Commit<'_>) -> bool {
        if commit.header() != Some(self.header) {
            return false;
        }
        match commit.hash() {
            Some(hash) if !self.hash.is_empty() => {
                hash.starts_with(self.hash) || self.hash.starts_with(hash)
            }
            _ => true,
        }
    }
}
