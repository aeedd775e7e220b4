//! Mutation session - 1 文書への楽観的並行性付き書き込み

pub mod intent;
pub mod request;
pub mod session;
pub mod wrap;

pub use intent::{AppendSection, AppendText, InsertAfterAnchor, Intent, ReplaceText, TagDocument};
pub use request::{Fallback, MutationRequest};
pub use session::MutationSession;
pub use wrap::wrap_marker;
