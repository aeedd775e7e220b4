//! Marker catalog: the tag families each action kind checks for.
//!
//! Patterns are compiled when a policy is built, so a bad pattern is a
//! bootstrap error and never reaches a running graph.

use super::marker::MarkerSet;

/// Existing deletion-discussion tag on the target (strip form).
pub fn discussion_tag() -> Result<MarkerSet, regex::Error> {
    MarkerSet::from_patterns(&[(
        "deletion discussion tag",
        r"\{\{\s*(RfD|RfDM|Requests for deletion/dated)\s*(\|(?:\{\{[^{}]*\}\}|[^{}])*)?\}\}\s*",
    )])
}

/// Quick-deletion and hang-on tags (strip form).
pub fn quick_deletion_tags() -> Result<MarkerSet, regex::Error> {
    MarkerSet::from_patterns(&[(
        "quick deletion tag",
        r"(?i)\{\{\s*(db(?:-\w*)?|qd|delete|(?:hang|hold)[- ]?on)\s*(\|(?:\{\{[^{}]*\}\}|[^{}])*)?\}\}\s*",
    )])
}

/// Quick-deletion tags as reported before adding another one.
pub fn existing_quick_deletion() -> Result<MarkerSet, regex::Error> {
    MarkerSet::from_patterns(&[(
        "quick deletion tag",
        r"\{\{\s*(qd|qd-multiple|db|delete|db-.*?)(?:\s*\||\s*\}\})",
    )])
}

/// Any deletion-process tag (discussions and proposed deletion).
pub fn existing_deletion_process() -> Result<MarkerSet, regex::Error> {
    MarkerSet::from_patterns(&[(
        "deletion process tag",
        r"(?i)\{\{([rsaiftcm]fd|md1|proposed deletion)[^{}]*?\}\}",
    )])
}

/// "Move to the shared media repository" tags, which a deletion tag supersedes.
pub fn commons_move_tags() -> Result<MarkerSet, regex::Error> {
    MarkerSet::from_patterns(&[(
        "move to commons tag",
        r"(?i)\{\{(mtc|(?:copy |move )?to ?commons|move to wikimedia commons|copy to wikimedia commons)[^}]*\}\}",
    )])
}

pub const DISCUSSION_TAG_PROMPT: &str = "A deletion discussion tag ({{{marker}}}) was found on this page. Maybe someone beat you to it.\n\
Answer yes to replace the current tag (not recommended), or no to abandon your nomination.";

pub const QUICK_DELETION_STRIP_PROMPT: &str =
    "A quick deletion tag ({{{marker}}}) was found on this page. Should it be removed?";

pub const QUICK_DELETION_AGAIN_PROMPT: &str =
    "The page already has the quick deletion template {{{marker}}} on it. Do you want to add another one?";

pub const DELETION_PROCESS_PROMPT: &str =
    "The deletion-related template {{{marker}}} was found on the page. Do you still want to add a quick deletion tag?";
