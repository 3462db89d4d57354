//! Turning a batch of commit messages into a changelog document.

use std::cmp::Ordering;

use tracing::{debug, trace};

use crate::annotate::{Context, Reference};
use crate::commit::{Note, NoteTitle, Revert};
use crate::options::{CommitField, GroupSort, NoteSort, ParserOptions, WriterOptions};
use crate::template::{Partials, Template, Value};
use crate::{Commit, Error};

/// Commits sharing the same [`WriterOptions::group_by`] value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitGroup<'a> {
    title: String,
    commits: Vec<Commit<'a>>,
}

impl<'a> CommitGroup<'a> {
    /// The shared value, e.g. `🚀 Features` when grouping annotated commits by type.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The commits of the group, in [`WriterOptions::commits_sort`] order.
    pub fn commits(&self) -> &[Commit<'a>] {
        &self.commits
    }
}

/// Notes introduced by the same keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteGroup<'a> {
    title: NoteTitle<'a>,
    notes: Vec<Note<'a>>,
}

impl<'a> NoteGroup<'a> {
    /// The keyword, as first seen.
    pub fn title(&self) -> NoteTitle<'a> {
        self.title
    }

    /// The notes of the group.
    pub fn notes(&self) -> &[Note<'a>] {
        &self.notes
    }
}

/// Collects commit messages and writes them out as a changelog.
///
/// ```rust
/// use turbo_commit::{Changelog, Context};
///
/// let mut changelog = Changelog::new();
/// changelog.push("[ADD] auth: add login #PROJ-1").unwrap();
///
/// let markdown = changelog
///     .render(&Context::new().with_version("1.0.0"))
///     .unwrap();
/// assert!(markdown.starts_with("# 1.0.0\n\n### 🚀 Features\n\n- **auth:** add login  (#PROJ-1)\n"));
/// ```
#[derive(Debug, Clone)]
pub struct Changelog<'a> {
    parser: ParserOptions,
    writer: WriterOptions,
    commits: Vec<Commit<'a>>,
    reverts: Vec<Revert<'a>>,
}

impl<'a> Changelog<'a> {
    /// An empty changelog using the default presets.
    pub fn new() -> Self {
        Self::with_options(ParserOptions::default(), WriterOptions::default())
    }

    /// An empty changelog using custom presets.
    pub fn with_options(parser: ParserOptions, writer: WriterOptions) -> Self {
        Self {
            parser,
            writer,
            commits: Vec::new(),
            reverts: Vec::new(),
        }
    }

    /// Add one commit message.
    ///
    /// Revert messages are remembered so the commits they undo can be left
    /// out; any other message must have a tagged header.
    ///
    /// # Errors
    ///
    /// Returns the parse error of a message that is neither a revert nor a
    /// tagged commit.
    pub fn push(&mut self, message: &'a str) -> Result<(), Error> {
        if let Some(revert) = Revert::parse(message) {
            trace!(header = revert.header(), hash = revert.hash(), "recorded revert");
            self.reverts.push(revert);
            return Ok(());
        }

        let commit = Commit::parse_with(message, &self.parser)?;
        self.commits.push(commit);
        Ok(())
    }

    /// Add one commit message along with its hash.
    ///
    /// # Errors
    ///
    /// See [`Changelog::push`].
    pub fn push_with_hash(&mut self, hash: &'a str, message: &'a str) -> Result<(), Error> {
        self.push(message)?;
        if Revert::parse(message).is_none() {
            if let Some(commit) = self.commits.last_mut() {
                commit.hash = Some(hash);
            }
        }
        Ok(())
    }

    /// Add an already parsed or hand-built commit.
    pub fn push_commit(&mut self, commit: Commit<'a>) {
        self.commits.push(commit);
    }

    /// Add every message, skipping the ones that do not parse.
    ///
    /// Returns how many messages were taken.
    pub fn push_all<I>(&mut self, messages: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut accepted = 0;
        for message in messages {
            match self.push(message) {
                Ok(()) => accepted += 1,
                Err(err) => {
                    debug!(%err, header = message.lines().next(), "skipping untagged commit message");
                }
            }
        }
        accepted
    }

    /// The commits collected so far, as parsed.
    pub fn commits(&self) -> &[Commit<'a>] {
        &self.commits
    }

    /// Transformed commits, grouped and sorted.
    pub fn commit_groups(&self, context: &Context<'_>) -> Vec<CommitGroup<'a>> {
        group_commits(self.transformed(context), &self.writer)
    }

    /// Notes of the transformed commits, grouped and sorted.
    pub fn note_groups(&self, context: &Context<'_>) -> Vec<NoteGroup<'a>> {
        group_notes(&self.transformed(context), &self.writer)
    }

    /// Write the changelog through the configured templates.
    ///
    /// # Errors
    ///
    /// Fails when one of the templates is malformed or includes an unknown
    /// partial.
    pub fn render(&self, context: &Context<'_>) -> Result<String, Error> {
        let main = Template::parse(&self.writer.main_template)?;
        let partials: Partials<'_> = [
            ("header", Template::parse(&self.writer.header_partial)?),
            ("commit", Template::parse(&self.writer.commit_partial)?),
            ("footer", Template::parse(&self.writer.footer_partial)?),
        ]
        .into_iter()
        .collect();

        let commits = self.transformed(context);
        let note_groups = group_notes(&commits, &self.writer);
        let commit_groups = group_commits(commits, &self.writer);

        let data = Value::object([
            ("version", context.version().into()),
            ("date", context.date().into()),
            (
                "commitGroups",
                Value::List(commit_groups.iter().map(commit_group_value).collect()),
            ),
            (
                "noteGroups",
                Value::List(note_groups.iter().map(note_group_value).collect()),
            ),
        ]);
        let output = main.render(&data, &partials)?;

        debug!(
            version = context.version(),
            groups = commit_groups.len(),
            note_groups = note_groups.len(),
            "rendered changelog"
        );
        Ok(output)
    }

    fn transformed(&self, context: &Context<'_>) -> Vec<Commit<'a>> {
        self.commits
            .iter()
            .filter(|commit| {
                let reverted = self.writer.ignore_reverted
                    && self.reverts.iter().any(|revert| revert.reverts(commit));
                if reverted {
                    trace!(header = commit.header(), "dropping reverted commit");
                }
                !reverted
            })
            .map(|commit| (self.writer.transform)(commit, context))
            .collect()
    }
}

impl Default for Changelog<'_> {
    fn default() -> Self {
        Self::new()
    }
}

fn group_commits<'a>(commits: Vec<Commit<'a>>, options: &WriterOptions) -> Vec<CommitGroup<'a>> {
    let mut groups: Vec<CommitGroup<'a>> = Vec::new();
    for commit in commits {
        let title = commit.field(options.group_by).unwrap_or_default().to_owned();
        match groups.iter_mut().find(|group| group.title == title) {
            Some(group) => group.commits.push(commit),
            None => groups.push(CommitGroup {
                title,
                commits: vec![commit],
            }),
        }
    }

    if let Some(GroupSort::Title) = options.commit_groups_sort {
        groups.sort_by(|a, b| a.title.cmp(&b.title));
    }
    for group in &mut groups {
        group
            .commits
            .sort_by(|a, b| compare_commits(a, b, &options.commits_sort));
    }
    groups
}

/// Compare field by field; an absent value sorts before any present one.
fn compare_commits(a: &Commit<'_>, b: &Commit<'_>, fields: &[CommitField]) -> Ordering {
    fields
        .iter()
        .map(|field| a.field(*field).cmp(&b.field(*field)))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn group_notes<'a>(commits: &[Commit<'a>], options: &WriterOptions) -> Vec<NoteGroup<'a>> {
    let mut groups: Vec<NoteGroup<'a>> = Vec::new();
    for note in commits.iter().flat_map(|commit| commit.notes().iter().copied()) {
        match groups.iter_mut().find(|group| group.title == note.title()) {
            Some(group) => group.notes.push(note),
            None => groups.push(NoteGroup {
                title: note.title(),
                notes: vec![note],
            }),
        }
    }

    if let Some(GroupSort::Title) = options.note_groups_sort {
        groups.sort_by(|a, b| a.title.cmp(&b.title));
    }
    if let Some(NoteSort::Text) = options.notes_sort {
        for group in &mut groups {
            group.notes.sort_by(|a, b| a.text().cmp(b.text()));
        }
    }
    groups
}

fn commit_group_value<'v>(group: &'v CommitGroup<'_>) -> Value<'v> {
    Value::object([
        ("title", group.title().into()),
        (
            "commits",
            Value::List(group.commits().iter().map(commit_value).collect()),
        ),
    ])
}

fn commit_value<'v>(commit: &'v Commit<'_>) -> Value<'v> {
    Value::object([
        ("type", commit.type_().into()),
        ("scope", commit.scope().into()),
        ("subject", commit.subject().into()),
        ("issue", commit.issue().into()),
        ("hash", commit.hash().into()),
        ("header", commit.header().into()),
        ("body", commit.body().into()),
        (
            "references",
            Value::List(commit.references().iter().map(reference_value).collect()),
        ),
        (
            "notes",
            Value::List(commit.notes().iter().map(note_value).collect()),
        ),
    ])
}

fn reference_value<'v>(reference: &'v Reference<'_>) -> Value<'v> {
    Value::object([
        ("action", reference.action().as_str().into()),
        ("owner", reference.owner().into()),
        ("repository", reference.repository().into()),
        ("issue", reference.issue().into()),
        ("raw", reference.raw().into()),
        ("prefix", reference.prefix().into()),
    ])
}

fn note_group_value<'v>(group: &'v NoteGroup<'_>) -> Value<'v> {
    Value::object([
        ("title", group.title().as_str().into()),
        (
            "notes",
            Value::List(group.notes().iter().map(note_value).collect()),
        ),
    ])
}

fn note_value<'v>(note: &'v Note<'_>) -> Value<'v> {
    Value::object([
        ("title", note.title().as_str().into()),
        ("text", note.text().into()),
    ])
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ErrorKind;
    use indoc::indoc;

    const MESSAGES: &[&str] = &[
        "[ADD] auth: add login #PROJ-1",
        "[FIX] api: correct timeout #BUG-42",
        "[ADD] add dark mode",
        indoc! {"
            [BRK] config: move settings

            Settings are looked up in one place only.

            BREAKING CHANGE: config moved to the XDG directory
        "},
        "Merge branch 'main' into feature",
    ];

    fn context() -> Context<'static> {
        Context::new().with_version("1.0.0").with_date("2024-05-01")
    }

    #[test]
    fn test_render_default_preset() {
        let mut changelog = Changelog::new();
        assert_eq!(changelog.push_all(MESSAGES.iter().copied()), 4);

        let markdown = changelog.render(&context()).unwrap();

        let expected = concat!(
            "# 1.0.0 (2024-05-01)\n",
            "\n",
            "### 🐛 Bug Fixes\n",
            "\n",
            "- **api:** correct timeout  (#BUG-42)\n",
            "### 💥 Breaking Changes\n",
            "\n",
            "- **config:** move settings\n",
            "### 🚀 Features\n",
            "\n",
            "- add dark mode\n",
            "- **auth:** add login  (#PROJ-1)\n",
            "\n",
            "\n",
            "### BREAKING CHANGE\n",
            "\n",
            "config moved to the XDG directory\n",
        );
        assert_eq!(markdown, expected);
    }

    #[test]
    fn test_render_without_commits() {
        let changelog = Changelog::new();

        let markdown = changelog.render(&Context::new().with_version("0.1.0")).unwrap();

        assert_eq!(markdown, "# 0.1.0\n\n\n");
    }

    #[test]
    fn test_commit_groups_are_sorted() {
        let mut changelog = Changelog::new();
        changelog.push_all(MESSAGES.iter().copied());

        let groups = changelog.commit_groups(&context());

        let titles: Vec<_> = groups.iter().map(CommitGroup::title).collect();
        assert_eq!(titles, ["🐛 Bug Fixes", "💥 Breaking Changes", "🚀 Features"]);
        let features: Vec<_> = groups[2].commits().iter().map(Commit::subject).collect();
        assert_eq!(features, ["add dark mode", "add login "]);
        assert_eq!(groups[2].commits()[1].references()[0].issue(), "PROJ-1");
    }

    #[test]
    fn test_unsorted_groups_keep_first_seen_order() {
        let writer = WriterOptions {
            commit_groups_sort: None,
            commits_sort: Vec::new(),
            ..WriterOptions::default()
        };
        let mut changelog = Changelog::with_options(ParserOptions::default(), writer);
        changelog.push_all(MESSAGES.iter().copied());

        let groups = changelog.commit_groups(&context());

        let titles: Vec<_> = groups.iter().map(CommitGroup::title).collect();
        assert_eq!(titles, ["🚀 Features", "🐛 Bug Fixes", "💥 Breaking Changes"]);
        let features: Vec<_> = groups[0].commits().iter().map(Commit::subject).collect();
        assert_eq!(features, ["add login ", "add dark mode"]);
    }

    #[test]
    fn test_reverted_commits_are_dropped() {
        let messages = [
            "[ADD] ui: add banner",
            "[FIX] ui: fix banner colors",
            "revert: [ADD] ui: add banner\n\nThis reverts commit 0a1b2c3.",
        ];

        let mut changelog = Changelog::new();
        changelog.push_with_hash("0a1b2c3d4e5f", messages[0]).unwrap();
        changelog.push_with_hash("9f8e7d6c5b4a", messages[1]).unwrap();
        changelog.push_with_hash("5555555", messages[2]).unwrap();
        assert_eq!(changelog.commits().len(), 2);
        assert_eq!(changelog.commits()[0].hash(), Some("0a1b2c3d4e5f"));

        let groups = changelog.commit_groups(&context());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].title(), "🐛 Bug Fixes");

        let writer = WriterOptions {
            ignore_reverted: false,
            ..WriterOptions::default()
        };
        let mut changelog = Changelog::with_options(ParserOptions::default(), writer);
        changelog.push_all(messages);
        assert_eq!(changelog.commit_groups(&context()).len(), 2);
    }

    #[test]
    fn test_note_groups() {
        let mut changelog = Changelog::new();
        changelog.push_all([
            "[BRK] drop v1\n\nbrk: zeta endpoint removed",
            "[BRK] drop v2\n\nBRK: alpha endpoint removed\nBREAKING CHANGE: config moved",
            "[FIX] no notes here",
        ]);

        let groups = changelog.note_groups(&context());

        let titles: Vec<_> = groups.iter().map(|group| group.title().as_str()).collect();
        assert_eq!(titles, ["BREAKING CHANGE", "brk"]);
        let texts: Vec<_> = groups[1].notes().iter().map(Note::text).collect();
        assert_eq!(texts, ["alpha endpoint removed", "zeta endpoint removed"]);
    }

    #[test]
    fn test_hand_built_commits() {
        let mut changelog = Changelog::new();
        changelog.push_commit(Commit::new("XYZ", "unknown type commit"));

        let markdown = changelog.render(&context()).unwrap();

        assert!(markdown.contains("### XYZ\n\n- unknown type commit\n"));
    }

    #[test]
    fn test_push_reports_parse_errors() {
        let mut changelog = Changelog::new();

        let err = changelog.push("[XYZ] not a known code").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
        let err = changelog.push("plain message").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingType);
        assert!(changelog.commits().is_empty());
    }

    #[test]
    fn test_custom_templates() {
        let writer = WriterOptions {
            main_template: "{{#each commitGroups}}{{#each commits}}{{> commit}};{{/each}}{{/each}}"
                .to_owned(),
            commit_partial: "{{type}}|{{#each references}}{{action}} {{issue}}{{/each}}".to_owned(),
            ..WriterOptions::default()
        };
        let mut changelog = Changelog::with_options(ParserOptions::default(), writer);
        changelog.push("[FIX] api: correct timeout #BUG-42").unwrap();

        let output = changelog.render(&context()).unwrap();

        assert_eq!(output, "🐛 Bug Fixes|closes BUG-42;");
    }

    #[test]
    fn test_broken_template() {
        let writer = WriterOptions {
            main_template: "{{> header}}{{> missing}}".to_owned(),
            ..WriterOptions::default()
        };
        let changelog = Changelog::with_options(ParserOptions::default(), writer);

        let err = changelog.render(&context()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownPartial);
    }
}
