//! Logic-less templates: `{{name}}`, `{{#if name}}`, `{{#each name}}` and
//! `{{> partial}}`.
//!
//! Values are written as is, without escaping. A block tag alone on its line
//! takes the whole line with it, newline included, so templates can put
//! block tags on lines of their own without leaving blank lines behind.
//! Unlike Handlebars, a partial tag alone on its line keeps its newline.

use std::borrow::Cow;
use std::collections::BTreeMap;

use winnow::ascii::{space0, space1};
use winnow::combinator::{alt, cut_err, delimited, preceded, repeat, terminated};
use winnow::error::StrContext;
use winnow::prelude::*;
use winnow::token::{rest, take_till, take_until, take_while};

use crate::{Error, ErrorKind};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const MAX_DEPTH: usize = 32;

/// Data a template is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Value<'v> {
    Null,
    Bool(bool),
    Str(Cow<'v, str>),
    List(Vec<Value<'v>>),
    Object(BTreeMap<&'static str, Value<'v>>),
}

impl<'v> Value<'v> {
    pub(crate) fn object<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Value<'v>)>,
    {
        Value::Object(fields.into_iter().collect())
    }

    fn get(&self, name: &str) -> Option<&Value<'v>> {
        match self {
            _ if name == "this" => Some(self),
            Value::Object(fields) => fields.get(name),
            _ => None,
        }
    }

    fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Object(_) => true,
        }
    }

    fn write_to(&self, out: &mut String) {
        match self {
            Value::Str(s) => out.push_str(s),
            Value::Bool(true) => out.push_str("true"),
            Value::Bool(false) => out.push_str("false"),
            Value::Null | Value::List(_) | Value::Object(_) => {}
        }
    }
}

impl<'v> From<&'v str> for Value<'v> {
    fn from(s: &'v str) -> Self {
        Value::Str(Cow::Borrowed(s))
    }
}

impl<'v> From<Option<&'v str>> for Value<'v> {
    fn from(s: Option<&'v str>) -> Self {
        s.map_or(Value::Null, Value::from)
    }
}

/// Partials by the name templates include them under.
pub(crate) type Partials<'t> = BTreeMap<&'static str, Template<'t>>;

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Template<'t> {
    nodes: Vec<Node<'t>>,
}

impl<'t> Template<'t> {
    pub(crate) fn parse(source: &'t str) -> Result<Self, Error> {
        let mut tokens = tokens.parse(source).map_err(|err| {
            invalid(format!("malformed tag at offset {}", err.offset()))
        })?;
        strip_standalone(&mut tokens);
        let nodes = build(tokens)?;
        Ok(Self { nodes })
    }

    pub(crate) fn render(&self, data: &Value<'_>, partials: &Partials<'_>) -> Result<String, Error> {
        let mut out = String::new();
        render_nodes(&self.nodes, data, partials, 0, &mut out)?;
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    If,
    Each,
}

impl Block {
    fn as_str(self) -> &'static str {
        match self {
            Block::If => "if",
            Block::Each => "each",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'t> {
    Text(&'t str),
    Var(&'t str),
    Partial(&'t str),
    Open(Block, &'t str),
    Close(Block),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node<'t> {
    Text(&'t str),
    Var(&'t str),
    Partial(&'t str),
    Block(Block, &'t str, Vec<Node<'t>>),
}

fn invalid(message: String) -> Error {
    Error::new(ErrorKind::InvalidTemplate).set_context(Box::new(message))
}

// <template>        ::= (<tag> | <text>)*
fn tokens<'t>(i: &mut &'t str) -> ModalResult<Vec<Token<'t>>> {
    repeat(0.., alt((tag, text))).parse_next(i)
}

// <text>            ::= <anything up to the next "{{">+
fn text<'t>(i: &mut &'t str) -> ModalResult<Token<'t>> {
    alt((
        take_until(1.., OPEN),
        rest.verify(|s: &str| !s.is_empty()),
    ))
    .map(Token::Text)
    .parse_next(i)
}

// <tag>             ::= "{{", <space>*, <tag-body>, <space>*, "}}"
fn tag<'t>(i: &mut &'t str) -> ModalResult<Token<'t>> {
    preceded(
        OPEN,
        cut_err(terminated(delimited(space0, tag_body, space0), CLOSE))
            .context(StrContext::Label("tag")),
    )
    .parse_next(i)
}

// <tag-body>        ::= "#", <block>, <space>+, <name>
//                    |  "/", <block>
//                    |  ">", <space>*, <name>, <hash-args>
//                    |  <name>
fn tag_body<'t>(i: &mut &'t str) -> ModalResult<Token<'t>> {
    alt((
        preceded('#', (block, space1, name)).map(|(block, _, name)| Token::Open(block, name)),
        preceded('/', block).map(Token::Close),
        preceded(('>', space0), (name, take_till(0.., '}')))
            .map(|(name, _args)| Token::Partial(name)),
        name.map(Token::Var),
    ))
    .parse_next(i)
}

fn block(i: &mut &str) -> ModalResult<Block> {
    alt(("if".value(Block::If), "each".value(Block::Each))).parse_next(i)
}

// <name>            ::= (<alphanumeric> | "_" | "-" | "." | "@")+
fn name<'t>(i: &mut &'t str) -> ModalResult<&'t str> {
    take_while(1.., |c: char| {
        c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '@')
    })
    .parse_next(i)
}

/// Blank out the line around every block tag that has it to itself.
fn strip_standalone<'t>(tokens: &mut [Token<'t>]) {
    let mut bounds: Vec<(usize, usize)> = tokens
        .iter()
        .map(|token| match token {
            Token::Text(text) => (0, text.len()),
            _ => (0, 0),
        })
        .collect();
    let last = tokens.len().saturating_sub(1);

    for idx in 0..tokens.len() {
        if !matches!(tokens[idx], Token::Open(..) | Token::Close(_)) {
            continue;
        }
        let before = match idx.checked_sub(1) {
            None => Some(None),
            Some(prev) => match tokens[prev] {
                Token::Text(text) => line_start(text, prev == 0).map(Some),
                _ => None,
            },
        };
        let after = match tokens.get(idx + 1) {
            None => Some(None),
            Some(Token::Text(text)) => line_end(text, idx + 1 == last).map(Some),
            Some(_) => None,
        };
        if let (Some(before), Some(after)) = (before, after) {
            if let Some(cut) = before {
                bounds[idx - 1].1 = bounds[idx - 1].1.min(cut);
            }
            if let Some(cut) = after {
                bounds[idx + 1].0 = bounds[idx + 1].0.max(cut);
            }
        }
    }

    for (token, (start, end)) in tokens.iter_mut().zip(bounds) {
        if let Token::Text(text) = token {
            let source: &'t str = *text;
            *text = &source[start..end.max(start)];
        }
    }
}

/// Where the indentation before a tag starts, if only blanks separate the
/// tag from the start of its line.
fn line_start(text: &str, at_template_start: bool) -> Option<usize> {
    let cut = match text.rfind('\n') {
        Some(newline) => newline + 1,
        None if at_template_start => 0,
        None => return None,
    };
    is_blank(&text[cut..]).then_some(cut)
}

/// Where the line after a tag ends, newline included, if only blanks
/// separate the tag from the end of its line.
fn line_end(text: &str, at_template_end: bool) -> Option<usize> {
    match text.find('\n') {
        Some(newline) => is_blank(&text[..newline]).then_some(newline + 1),
        None => (at_template_end && is_blank(text)).then_some(text.len()),
    }
}

fn is_blank(s: &str) -> bool {
    s.chars().all(|c| c == ' ' || c == '\t' || c == '\r')
}

fn build(tokens: Vec<Token<'_>>) -> Result<Vec<Node<'_>>, Error> {
    let mut stack = Vec::new();
    let mut current = Vec::new();

    for token in tokens {
        match token {
            Token::Text("") => {}
            Token::Text(text) => current.push(Node::Text(text)),
            Token::Var(name) => current.push(Node::Var(name)),
            Token::Partial(name) => current.push(Node::Partial(name)),
            Token::Open(block, name) => stack.push((block, name, std::mem::take(&mut current))),
            Token::Close(block) => {
                let (open, name, parent) = stack.pop().ok_or_else(|| {
                    invalid(format!("`/{}` closes nothing", block.as_str()))
                })?;
                if open != block {
                    return Err(invalid(format!(
                        "`#{} {}` closed by `/{}`",
                        open.as_str(),
                        name,
                        block.as_str()
                    )));
                }
                let body = std::mem::replace(&mut current, parent);
                current.push(Node::Block(block, name, body));
            }
        }
    }

    if let Some((block, name, _)) = stack.pop() {
        return Err(invalid(format!("`#{} {}` is never closed", block.as_str(), name)));
    }
    Ok(current)
}

fn render_nodes(
    nodes: &[Node<'_>],
    frame: &Value<'_>,
    partials: &Partials<'_>,
    depth: usize,
    out: &mut String,
) -> Result<(), Error> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var(name) => {
                if let Some(value) = frame.get(name) {
                    value.write_to(out);
                }
            }
            Node::Block(Block::If, name, body) => {
                if frame.get(name).is_some_and(Value::is_truthy) {
                    render_nodes(body, frame, partials, depth, out)?;
                }
            }
            Node::Block(Block::Each, name, body) => {
                if let Some(Value::List(items)) = frame.get(name) {
                    for item in items {
                        render_nodes(body, item, partials, depth, out)?;
                    }
                }
            }
            Node::Partial(name) => {
                let partial = partials.get(*name).ok_or_else(|| {
                    Error::new(ErrorKind::UnknownPartial).set_context(Box::new((*name).to_owned()))
                })?;
                if depth >= MAX_DEPTH {
                    return Err(invalid(format!("partial `{name}` nested too deeply")));
                }
                render_nodes(&partial.nodes, frame, partials, depth + 1, out)?;
            }
        }
    }
    Ok(())
}
