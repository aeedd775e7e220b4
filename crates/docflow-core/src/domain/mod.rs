//! Domain model (documents, params, errors, decisions, outcomes).
//!
//! ここには I/O を持たない型だけを置きます。store や confirm などの外部依存は
//! `ports` を参照してください。

pub mod decision;
pub mod document;
pub mod errors;
pub mod ids;
pub mod outcome;
pub mod params;
pub mod state;

pub use decision::{Decider, Decision, DefaultDecider, RetryPolicy};
pub use document::{ContentKind, Document, DocumentId, Namespace, Version};
pub use errors::{ActionError, ErrorKind, GraphError};
pub use ids::{RunId, SessionId};
pub use outcome::{ActionReport, FailureReport, SessionOutcome, WriteTarget};
pub use params::{ActionParams, Criterion};
pub use state::TaskState;
