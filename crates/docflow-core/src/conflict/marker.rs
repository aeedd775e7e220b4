//! Conflict markers: textual signatures of a prior or competing action.

use regex::Regex;

/// A pattern plus a human-readable label.
///
/// If the pattern has a capture group, the first group is reported as the
/// matched marker name (e.g. the template that was found).
#[derive(Debug, Clone)]
pub struct ConflictMarker {
    label: String,
    pattern: Regex,
}

impl ConflictMarker {
    pub fn new(label: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            label: label.into(),
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

/// One hit of a marker in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerMatch {
    pub label: String,
    /// The full matched text.
    pub matched: String,
    /// First capture group, if the pattern has one and it participated.
    pub name: Option<String>,
    pub start: usize,
}

impl MarkerMatch {
    /// Name to show the user: the captured name, else the marker label.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.label)
    }
}

/// An ordered set of markers treated as one conflict signal.
#[derive(Debug, Clone, Default)]
pub struct MarkerSet {
    markers: Vec<ConflictMarker>,
}

impl MarkerSet {
    pub fn new(markers: Vec<ConflictMarker>) -> Self {
        Self { markers }
    }

    /// Build from `(label, pattern)` pairs.
    pub fn from_patterns(patterns: &[(&str, &str)]) -> Result<Self, regex::Error> {
        let markers = patterns
            .iter()
            .map(|(label, pattern)| ConflictMarker::new(*label, pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(markers))
    }

    /// Earliest match of any marker in `text`.
    pub fn scan(&self, text: &str) -> Option<MarkerMatch> {
        self.markers
            .iter()
            .filter_map(|marker| {
                let caps = marker.pattern.captures(text)?;
                let whole = caps.get(0)?;
                Some(MarkerMatch {
                    label: marker.label.clone(),
                    matched: whole.as_str().to_string(),
                    name: caps.get(1).map(|m| m.as_str().to_string()),
                    start: whole.start(),
                })
            })
            .min_by_key(|m| m.start)
    }

    /// `text` with every occurrence of every marker removed.
    pub fn strip(&self, text: &str) -> String {
        self.markers
            .iter()
            .fold(text.to_string(), |acc, marker| {
                marker.pattern.replace_all(&acc, "").into_owned()
            })
    }
}
