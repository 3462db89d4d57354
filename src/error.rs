//! All errors related to tagged commits and changelog rendering.

use std::fmt;

use winnow::error::{ContextError, StrContext};

/// The error returned when parsing a commit or rendering a changelog fails.
pub struct Error {
    kind: ErrorKind,

    context: Option<Box<dyn fmt::Display + Send + Sync>>,
    commit: Option<String>,
}

impl Error {
    /// Create a new error from a `ErrorKind`.
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
            commit: None,
        }
    }

    pub(crate) fn with_parser(commit: &str, err: ContextError) -> Self {
        use ErrorKind::{InvalidFormat, InvalidType, MissingType};

        let kind = err
            .context()
            .find_map(|context| match context {
                StrContext::Label(label) => Some(*label),
                _ => None,
            })
            .map_or(InvalidFormat, |label| match label {
                crate::parser::TYPE => MissingType,
                crate::parser::TYPE_CODE => InvalidType,
                _ => InvalidFormat,
            });

        Self {
            kind,
            context: None,
            commit: Some(commit.to_owned()),
        }
    }

    pub(crate) fn set_context(mut self, context: Box<dyn fmt::Display + Send + Sync>) -> Self {
        self.context = Some(context);
        self
    }

    /// The kind of error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The input that failed to parse, if any.
    pub fn commit(&self) -> Option<&str> {
        self.commit.as_deref()
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("context", &self.context.as_ref().map(|s| s.to_string()))
            .field("commit", &self.commit)
            .finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = self.context.as_ref() {
            write!(f, "{}: {}", self.kind, context)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

impl std::error::Error for Error {}

/// All possible error kinds returned by this crate.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The header does not start with a bracketed type code.
    MissingType,

    /// The bracketed type code is not one of the known codes.
    InvalidType,

    /// Any other part of the commit does not conform to the tagged format.
    InvalidFormat,

    /// A template could not be parsed or evaluated.
    InvalidTemplate,

    /// A template includes a partial that was not provided.
    UnknownPartial,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::MissingType => "missing type definition",
            ErrorKind::InvalidType => "unknown type code",
            ErrorKind::InvalidFormat => "invalid commit format",
            ErrorKind::InvalidTemplate => "invalid template",
            ErrorKind::UnknownPartial => "unknown partial",
        };
        f.write_str(s)
    }
}
