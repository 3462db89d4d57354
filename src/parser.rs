use winnow::ascii::{digit1, space0, Caseless};
use winnow::combinator::{alt, cut_err, opt, preceded, terminated};
use winnow::error::{ContextError, ErrMode, StrContext};
use winnow::prelude::*;
use winnow::token::{literal, one_of, rest, take_until, take_while};

pub(crate) type Header<'a> = (&'a str, Option<&'a str>, &'a str, Option<&'a str>);

// <word>            ::= "A"-"Z" | "a"-"z" | "0"-"9" | "_"
fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// <header>          ::= "[", <type>, "]", <space>*, [<scope>, ":"], <space>*, <subject>
pub(crate) fn header<'a>(i: &mut &'a str) -> ModalResult<Header<'a>> {
    (
        type_block,
        space0,
        opt(terminated(scope, ':')),
        space0,
        rest,
    )
        .map(|(ty, _, scope, _, subject)| {
            (
                ty,
                scope.filter(|s: &&str| !s.is_empty()),
                subject,
                trailing_issue(subject),
            )
        })
        .parse_next(i)
}

fn type_block<'a>(i: &mut &'a str) -> ModalResult<&'a str> {
    preceded(
        '['.context(StrContext::Label(TYPE)),
        cut_err(terminated(type_code, ']').context(StrContext::Label(TYPE_CODE))),
    )
    .parse_next(i)
}

pub(crate) const TYPE: &str = "type";

// <type>            ::= "ADD" | "FIX" | "MOD" | "DEL" | "REF" | "BRK"
pub(crate) fn type_code<'a>(i: &mut &'a str) -> ModalResult<&'a str> {
    alt(("ADD", "FIX", "MOD", "DEL", "REF", "BRK")).parse_next(i)
}

pub(crate) const TYPE_CODE: &str = "type code";

// <scope>           ::= <word>*
fn scope<'a>(i: &mut &'a str) -> ModalResult<&'a str> {
    take_while(0.., is_word).parse_next(i)
}

// <issue>           ::= "#", <word>+, "-", <digit>+
pub(crate) fn issue<'a>(i: &mut &'a str) -> ModalResult<&'a str> {
    ('#', take_while(1.., is_word), '-', digit1)
        .take()
        .context(StrContext::Label(ISSUE))
        .parse_next(i)
}

pub(crate) const ISSUE: &str = "issue";

/// The issue token ending `subject`, if any.
///
/// Only the last `#` can start the token since the token itself never
/// contains one.
fn trailing_issue(subject: &str) -> Option<&str> {
    let start = subject.rfind('#')?;
    let candidate = &subject[start..];
    issue.parse(candidate).ok()
}

// <note>            ::= (<space> | "|" | "*")*, <keyword>, (":" | <space>)+, <text>
pub(crate) fn note<'a, K: AsRef<str>>(
    i: &mut &'a str,
    keywords: &[K],
) -> ModalResult<(&'a str, &'a str)> {
    (
        take_while(0.., |c: char| c.is_whitespace() || c == '|' || c == '*'),
        |i: &mut &'a str| keyword(i, keywords),
        take_while(1.., |c: char| c == ':' || c.is_whitespace()),
        rest,
    )
        .map(|(_, title, _, text)| (title, text))
        .parse_next(i)
}

fn keyword<'a, K: AsRef<str>>(i: &mut &'a str, keywords: &[K]) -> ModalResult<&'a str> {
    for keyword in keywords.iter().map(AsRef::as_ref) {
        if keyword.is_empty() {
            continue;
        }
        let mut attempt = *i;
        let matched: ModalResult<&'a str> = literal(Caseless(keyword)).parse_next(&mut attempt);
        if let Ok(title) = matched {
            *i = attempt;
            return Ok(title);
        }
    }
    Err(ErrMode::Backtrack(ContextError::new()))
}

// <revert>          ::= "revert:", <whitespace>, <header>, <whitespace>*,
//                       "This reverts commit ", <word>*, "."
pub(crate) fn revert<'a>(i: &mut &'a str) -> ModalResult<(&'a str, &'a str)> {
    (
        "revert:",
        one_of(|c: char| c.is_whitespace()),
        take_until(0.., REVERT_MARKER).map(str::trim_end),
        REVERT_MARKER,
        take_while(0.., is_word),
        '.',
    )
        .map(|(_, _, header, _, hash, _)| (header, hash))
        .parse_next(i)
}

const REVERT_MARKER: &str = "This reverts commit ";
