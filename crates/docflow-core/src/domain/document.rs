//! Document model: identity, version marker, content kind and the loaded
//! working copy a session operates on.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Namespaces that own a companion discussion namespace (`"{ns} talk"`).
///
/// Titles without one of these prefixes live in the main namespace, whose
/// companion namespace is plain `Talk`.
const SUBJECT_NAMESPACES: &[&str] = &[
    "User",
    "Wikipedia",
    "File",
    "MediaWiki",
    "Template",
    "Help",
    "Category",
    "Module",
];

/// Where a document lives, derived from its name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Main,
    Talk,
    Subject(&'static str),
    SubjectTalk(&'static str),
}

impl Namespace {
    pub fn is_talk(self) -> bool {
        matches!(self, Namespace::Talk | Namespace::SubjectTalk(_))
    }
}

/// Stable name of a document in the store.
///
/// Underscores are normalized to spaces and surrounding whitespace is trimmed,
/// so `"Foo_bar"` and `" Foo bar "` are the same identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self(name.replace('_', " ").trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn split(&self) -> (Namespace, &str) {
        let Some((prefix, rest)) = self.0.split_once(':') else {
            return (Namespace::Main, &self.0);
        };
        let rest = rest.trim_start();
        if prefix == "Talk" {
            return (Namespace::Talk, rest);
        }
        for &ns in SUBJECT_NAMESPACES {
            if prefix == ns {
                return (Namespace::Subject(ns), rest);
            }
            if prefix.strip_suffix(" talk") == Some(ns) {
                return (Namespace::SubjectTalk(ns), rest);
            }
        }
        (Namespace::Main, &self.0)
    }

    pub fn namespace(&self) -> Namespace {
        self.split().0
    }

    /// Title without the namespace prefix.
    pub fn title(&self) -> &str {
        self.split().1
    }

    /// The associated discussion document.
    ///
    /// A discussion document is its own companion, which is how callers detect
    /// that no distinct substitute exists.
    pub fn companion(&self) -> DocumentId {
        match self.split() {
            (Namespace::Main, title) => DocumentId::new(format!("Talk:{title}")),
            (Namespace::Subject(ns), title) => DocumentId::new(format!("{ns} talk:{title}")),
            (Namespace::Talk, _) | (Namespace::SubjectTalk(_), _) => self.clone(),
        }
    }

    /// Discussion page of a user account.
    pub fn user_talk(user: &str) -> DocumentId {
        DocumentId::new(format!("User talk:{}", user.trim()))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        DocumentId::new(value)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        DocumentId::new(value)
    }
}

impl From<DocumentId> for String {
    fn from(value: DocumentId) -> Self {
        value.0
    }
}

/// Optimistic-concurrency version marker handed out by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(pub u64);

impl Version {
    pub fn next(self) -> Version {
        Version(self.0 + 1)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Content model of a document.
///
/// Only the first five kinds can carry an inserted marker; the others are
/// routed to the fallback target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    #[default]
    Wikitext,
    Scribunto,
    Javascript,
    Css,
    SanitizedCss,
    Json,
    Text,
}

impl ContentKind {
    pub fn is_taggable(self) -> bool {
        matches!(
            self,
            ContentKind::Wikitext
                | ContentKind::Scribunto
                | ContentKind::Javascript
                | ContentKind::Css
                | ContentKind::SanitizedCss
        )
    }
}

/// A loaded working copy.
///
/// `version` is `None` when the document does not exist yet; the text is
/// empty in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub text: String,
    pub kind: ContentKind,
    pub protected: bool,
    pub version: Option<Version>,
    pub loaded_at: DateTime<Utc>,
}

impl Document {
    pub fn missing(id: DocumentId, loaded_at: DateTime<Utc>) -> Self {
        Self {
            id,
            text: String::new(),
            kind: ContentKind::default(),
            protected: false,
            version: None,
            loaded_at,
        }
    }

    pub fn exists(&self) -> bool {
        self.version.is_some()
    }

    pub fn can_edit(&self) -> bool {
        !self.protected && self.kind.is_taggable()
    }
}
