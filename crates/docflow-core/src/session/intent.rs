//! Intents: pure transformations from a loaded document to its new text.
//!
//! An intent never touches the store. The session re-applies it to a fresh
//! copy when a save hits a version conflict.

use std::sync::Arc;

use regex::Regex;

use super::wrap::wrap_marker;
use crate::conflict::MarkerSet;
use crate::domain::{ActionError, Document, Namespace};

/// `text` is the working text after conflict resolution, which may differ
/// from `doc.text` when markers were stripped.
pub trait Intent: Send + Sync {
    fn apply(&self, doc: &Document, text: &str) -> Result<String, ActionError>;
}

impl<F> Intent for F
where
    F: Fn(&Document, &str) -> Result<String, ActionError> + Send + Sync,
{
    fn apply(&self, doc: &Document, text: &str) -> Result<String, ActionError> {
        self(doc, text)
    }
}

/// Put a marker at the top of the document (or replace it, for redaction).
#[derive(Debug, Clone)]
pub struct TagDocument {
    code: String,
    noinclude: bool,
    redact: bool,
    /// Tags the new marker supersedes on media file pages.
    superseded_on_files: Option<Arc<MarkerSet>>,
}

impl TagDocument {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            noinclude: false,
            redact: false,
            superseded_on_files: None,
        }
    }

    pub fn noinclude(mut self, noinclude: bool) -> Self {
        self.noinclude = noinclude;
        self
    }

    /// Replace the whole text with the marker.
    pub fn redact(mut self, redact: bool) -> Self {
        self.redact = redact;
        self
    }

    pub fn superseding_on_files(mut self, markers: Arc<MarkerSet>) -> Self {
        self.superseded_on_files = Some(markers);
        self
    }
}

impl Intent for TagDocument {
    fn apply(&self, doc: &Document, text: &str) -> Result<String, ActionError> {
        let code = wrap_marker(&self.code, doc, self.noinclude);
        if self.redact {
            return Ok(code);
        }
        let body = match &self.superseded_on_files {
            Some(markers) if doc.id.namespace() == Namespace::Subject("File") => markers.strip(text),
            _ => text.to_string(),
        };
        Ok(format!("{code}\n{body}"))
    }
}

/// Insert an entry right after the first match of an anchor.
///
/// The anchor's first capture group is kept; the entry follows it on a new
/// line.
#[derive(Debug, Clone)]
pub struct InsertAfterAnchor {
    anchor: Regex,
    entry: String,
}

impl InsertAfterAnchor {
    pub fn new(anchor: Regex, entry: impl Into<String>) -> Self {
        Self {
            anchor,
            entry: entry.into(),
        }
    }
}

impl Intent for InsertAfterAnchor {
    fn apply(&self, _doc: &Document, text: &str) -> Result<String, ActionError> {
        let Some(caps) = self.anchor.captures(text) else {
            return Err(ActionError::failed("failed to find target spot for the discussion"));
        };
        let (Some(whole), Some(kept)) = (caps.get(0), caps.get(1).or_else(|| caps.get(0))) else {
            return Err(ActionError::failed("failed to find target spot for the discussion"));
        };
        Ok(format!(
            "{}{}{}\n{}",
            &text[..whole.start()],
            kept.as_str(),
            self.entry,
            &text[whole.end()..]
        ))
    }
}

/// Replace the whole text.
#[derive(Debug, Clone)]
pub struct ReplaceText(pub String);

impl Intent for ReplaceText {
    fn apply(&self, _doc: &Document, _text: &str) -> Result<String, ActionError> {
        Ok(self.0.clone())
    }
}

/// Append a new `== title ==` section.
#[derive(Debug, Clone)]
pub struct AppendSection {
    pub title: String,
    pub body: String,
}

impl Intent for AppendSection {
    fn apply(&self, _doc: &Document, text: &str) -> Result<String, ActionError> {
        let section = format!("== {} ==\n{}", self.title, self.body);
        if text.trim().is_empty() {
            Ok(section)
        } else {
            Ok(format!("{}\n\n{section}", text.trim_end()))
        }
    }
}

/// Append a line; a document that does not exist yet starts with `header`.
#[derive(Debug, Clone)]
pub struct AppendText {
    pub line: String,
    pub header: Option<String>,
}

impl Intent for AppendText {
    fn apply(&self, doc: &Document, text: &str) -> Result<String, ActionError> {
        let mut out = match (&self.header, doc.exists()) {
            (Some(header), false) => format!("{header}\n\n"),
            _ => text.to_string(),
        };
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&self.line);
        Ok(out)
    }
}
