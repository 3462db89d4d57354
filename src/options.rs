//! The parser and writer presets, as handed to changelog tooling.
//!
//! Both option sets are plain data. With the `serde` feature they serialize
//! with the camel-cased keys changelog tools expect (`headerPattern`,
//! `commitsSort`, ...) and deserialize from partial documents, missing keys
//! falling back to the preset.

use std::fmt;

use crate::annotate::{annotate, Context};
use crate::Commit;

/// Regular expression matching a tagged header.
///
/// Capture groups, in [`ParserOptions::header_correspondence`] order: type,
/// scope, subject, issue. The subject group encloses the issue group, so the
/// subject keeps the issue token for [`annotate`] to cut out.
pub const HEADER_PATTERN: &str =
    r"^\[(ADD|FIX|MOD|DEL|REF|BRK)\]\s*(?:(\w*):)?\s*(.*?(?:\s*(#\w+-\d+))?)$";

/// Regular expression matching a revert message; captures header and hash.
pub const REVERT_PATTERN: &str = r"^revert:\s([\s\S]*?)\s*This reverts commit (\w*)\.";

/// Layout of the whole changelog.
pub const MAIN_TEMPLATE: &str = "{{> header}}\n\n{{#each commitGroups}}\n### {{title}}\n\n{{#each commits}}\n{{> commit root=@root}}\n{{/each}}\n{{/each}}\n\n{{> footer}}";

/// Release heading.
pub const HEADER_PARTIAL: &str = "# {{version}}{{#if date}} ({{date}}){{/if}}";

/// One bullet per commit.
pub const COMMIT_PARTIAL: &str =
    "- {{#if scope}}**{{scope}}:** {{/if}}{{subject}}{{#if issue}} ({{issue}}){{/if}}";

/// Breaking-change notes, grouped by keyword.
pub const FOOTER_PARTIAL: &str = "{{#if noteGroups}}{{#each noteGroups}}\n### {{title}}\n\n{{#each notes}}\n{{text}}\n{{/each}}\n{{/each}}{{/if}}";

/// A commit field, as named in the options.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitField {
    /// `type`
    Type,
    /// `scope`
    Scope,
    /// `subject`
    Subject,
    /// `issue`
    Issue,
    /// `hash`
    Hash,
}

/// A field of a revert message.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RevertField {
    /// Header of the reverted commit.
    Header,
    /// Hash of the reverted commit.
    Hash,
}

/// How commit and note groups are ordered.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum GroupSort {
    /// By group title.
    Title,
}

/// How notes within a group are ordered.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum NoteSort {
    /// By note text.
    Text,
}

/// How commit messages are taken apart.
///
/// The patterns and their correspondences describe the header and revert
/// grammar for tools that work with regular expressions. They are exported
/// as data only: [`Commit::parse_with`] always applies the built-in grammar,
/// which matches the same messages. Only `note_keywords` changes parsing.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// Pattern for the header line, see [`HEADER_PATTERN`]; not used for
    /// parsing.
    pub header_pattern: String,
    /// Which commit field each capture group of `header_pattern` fills.
    pub header_correspondence: Vec<CommitField>,
    /// Keywords starting a footer note; matched case-insensitively.
    pub note_keywords: Vec<String>,
    /// Pattern for revert messages, see [`REVERT_PATTERN`]; not used for
    /// parsing.
    pub revert_pattern: String,
    /// Which revert field each capture group of `revert_pattern` fills.
    pub revert_correspondence: Vec<RevertField>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            header_pattern: HEADER_PATTERN.to_owned(),
            header_correspondence: vec![
                CommitField::Type,
                CommitField::Scope,
                CommitField::Subject,
                CommitField::Issue,
            ],
            note_keywords: vec!["BREAKING CHANGE".to_owned(), "BRK".to_owned()],
            revert_pattern: REVERT_PATTERN.to_owned(),
            revert_correspondence: vec![RevertField::Header, RevertField::Hash],
        }
    }
}

/// Signature of [`WriterOptions::transform`].
pub type Transform = for<'a, 'c> fn(&Commit<'a>, &Context<'c>) -> Commit<'a>;

/// How parsed commits become a changelog.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Clone)]
pub struct WriterOptions {
    /// Applied to every commit before grouping; [`annotate`] by default.
    #[cfg_attr(feature = "serde", serde(skip, default = "default_transform"))]
    #[cfg_attr(feature = "schemars", schemars(skip))]
    pub transform: Transform,
    /// The field commits are grouped by; group titles are its values.
    pub group_by: CommitField,
    /// Order of commit groups; `None` keeps first-seen order.
    pub commit_groups_sort: Option<GroupSort>,
    /// Fields commits are ordered by within a group, compared in turn.
    pub commits_sort: Vec<CommitField>,
    /// Order of note groups; `None` keeps first-seen order.
    pub note_groups_sort: Option<GroupSort>,
    /// Order of notes within a group; `None` keeps commit order.
    pub notes_sort: Option<NoteSort>,
    /// Drop commits that a later revert message undoes.
    pub ignore_reverted: bool,
    /// Template for the whole document.
    pub main_template: String,
    /// Partial included as `{{> header}}`.
    pub header_partial: String,
    /// Partial included as `{{> commit}}`.
    pub commit_partial: String,
    /// Partial included as `{{> footer}}`.
    pub footer_partial: String,
}

#[cfg(feature = "serde")]
fn default_transform() -> Transform {
    annotate
}

impl fmt::Debug for WriterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterOptions")
            .field("group_by", &self.group_by)
            .field("commit_groups_sort", &self.commit_groups_sort)
            .field("commits_sort", &self.commits_sort)
            .field("note_groups_sort", &self.note_groups_sort)
            .field("notes_sort", &self.notes_sort)
            .field("ignore_reverted", &self.ignore_reverted)
            .field("main_template", &self.main_template)
            .field("header_partial", &self.header_partial)
            .field("commit_partial", &self.commit_partial)
            .field("footer_partial", &self.footer_partial)
            .finish_non_exhaustive()
    }
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            transform: annotate,
            group_by: CommitField::Type,
            commit_groups_sort: Some(GroupSort::Title),
            commits_sort: vec![CommitField::Scope, CommitField::Subject],
            note_groups_sort: Some(GroupSort::Title),
            notes_sort: Some(NoteSort::Text),
            ignore_reverted: true,
            main_template: MAIN_TEMPLATE.to_owned(),
            header_partial: HEADER_PARTIAL.to_owned(),
            commit_partial: COMMIT_PARTIAL.to_owned(),
            footer_partial: FOOTER_PARTIAL.to_owned(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use regex::Regex;
    #[cfg(feature = "serde")]
    use serde_test::Token;
    use winnow::Parser;

    #[test]
    fn test_header_pattern_matches_grammar() {
        let pattern = Regex::new(HEADER_PATTERN).unwrap();

        for header in [
            "[ADD] auth: add login #PROJ-1",
            "[FIX] api: correct timeout #BUG-42",
            "[ADD] add dark mode",
            "[BRK] config: move settings",
            "[REF]core:tight",
            "[MOD] : empty scope",
            "[DEL]",
        ] {
            let captures = pattern.captures(header).unwrap();
            let group = |n| captures.get(n).map(|m| m.as_str());
            let (ty, scope, subject, issue) = crate::parser::header.parse(header).unwrap();

            assert_eq!(group(1), Some(ty), "{header}");
            assert_eq!(group(2).filter(|s| !s.is_empty()), scope, "{header}");
            assert_eq!(group(3), Some(subject), "{header}");
            assert_eq!(group(4), issue, "{header}");
        }

        for header in ["[XYZ] unknown", "feat: conventional", ""] {
            assert!(!pattern.is_match(header), "{header}");
            assert!(crate::parser::header.parse(header).is_err(), "{header}");
        }
    }

    #[test]
    fn test_revert_pattern_matches_grammar() {
        let pattern = Regex::new(REVERT_PATTERN).unwrap();

        for message in [
            "revert: [ADD] auth: add login\n\nThis reverts commit 0123abcd.\n",
            "revert: [FIX] x This reverts commit .",
        ] {
            let captures = pattern.captures(message).unwrap();
            let mut input = message;
            let (header, hash) = crate::parser::revert(&mut input).unwrap();

            assert_eq!(&captures[1], header, "{message:?}");
            assert_eq!(&captures[2], hash, "{message:?}");
        }

        assert!(!pattern.is_match("[ADD] not a revert"));
        assert!(crate::parser::revert(&mut "[ADD] not a revert").is_err());
    }

    #[test]
    fn test_parser_defaults() {
        let options = ParserOptions::default();

        assert_eq!(
            options.header_correspondence,
            [
                CommitField::Type,
                CommitField::Scope,
                CommitField::Subject,
                CommitField::Issue
            ]
        );
        assert_eq!(options.note_keywords, ["BREAKING CHANGE", "BRK"]);
        assert_eq!(
            options.revert_correspondence,
            [RevertField::Header, RevertField::Hash]
        );
        assert!(options.header_pattern.starts_with(r"^\[(ADD|FIX|MOD|DEL|REF|BRK)\]"));
    }

    #[test]
    fn test_writer_defaults() {
        let options = WriterOptions::default();

        assert_eq!(options.group_by, CommitField::Type);
        assert_eq!(options.commit_groups_sort, Some(GroupSort::Title));
        assert_eq!(
            options.commits_sort,
            [CommitField::Scope, CommitField::Subject]
        );
        assert_eq!(options.note_groups_sort, Some(GroupSort::Title));
        assert!(options.ignore_reverted);
        assert_eq!(options.header_partial, "# {{version}}{{#if date}} ({{date}}){{/if}}");

        let commit = Commit::new("ADD", "x");
        assert_eq!((options.transform)(&commit, &Context::new()).type_(), "🚀 Features");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_parser_options_serialize() {
        serde_test::assert_tokens(
            &ParserOptions::default(),
            &[
                Token::Struct {
                    name: "ParserOptions",
                    len: 5,
                },
                Token::Str("headerPattern"),
                Token::Str(HEADER_PATTERN),
                Token::Str("headerCorrespondence"),
                Token::Seq { len: Some(4) },
                Token::UnitVariant {
                    name: "CommitField",
                    variant: "type",
                },
                Token::UnitVariant {
                    name: "CommitField",
                    variant: "scope",
                },
                Token::UnitVariant {
                    name: "CommitField",
                    variant: "subject",
                },
                Token::UnitVariant {
                    name: "CommitField",
                    variant: "issue",
                },
                Token::SeqEnd,
                Token::Str("noteKeywords"),
                Token::Seq { len: Some(2) },
                Token::Str("BREAKING CHANGE"),
                Token::Str("BRK"),
                Token::SeqEnd,
                Token::Str("revertPattern"),
                Token::Str(REVERT_PATTERN),
                Token::Str("revertCorrespondence"),
                Token::Seq { len: Some(2) },
                Token::UnitVariant {
                    name: "RevertField",
                    variant: "header",
                },
                Token::UnitVariant {
                    name: "RevertField",
                    variant: "hash",
                },
                Token::SeqEnd,
                Token::StructEnd,
            ],
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_parser_options_partial_deserialize() {
        let expected = ParserOptions {
            note_keywords: vec!["BRK".to_owned()],
            ..ParserOptions::default()
        };
        serde_test::assert_de_tokens(
            &expected,
            &[
                Token::Struct {
                    name: "ParserOptions",
                    len: 1,
                },
                Token::Str("noteKeywords"),
                Token::Seq { len: Some(1) },
                Token::Str("BRK"),
                Token::SeqEnd,
                Token::StructEnd,
            ],
        );
    }
}
